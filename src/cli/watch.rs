//! `watch` command: re-render whenever the templates change.

use anyhow::{Context, Result};
use crossbeam::channel::{self, select};
use livetmpl::{LiveCache, config::Config};

use super::{RenderArgs, builtin_functions, render::load_data, render::render_to_stdout};

pub fn watch(config: &Config, args: &RenderArgs) -> Result<()> {
    let data = load_data(args)?;
    let root = config.root_dir();

    let (reload_tx, reload_rx) = channel::unbounded();
    let (shutdown_tx, shutdown_rx) = channel::bounded(1);

    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;

    let cache: LiveCache = LiveCache::builder(&root, config.extension())
        .on_error(|err| {
            livetmpl::log!("error"; "{}", livetmpl::error_chain(&err));
        })
        .on_reload(move |reloaded| {
            let _ = reload_tx.send(*reloaded);
        })
        .build();
    cache
        .activate(builtin_functions())
        .with_context(|| format!("failed to load templates from {}", root.display()))?;

    livetmpl::log!("watch"; "watching {} (ctrl+c to stop)", root.display());
    render_logged(&cache, &args.name, &data);

    loop {
        select! {
            recv(reload_rx) -> reloaded => {
                let Ok(reloaded) = reloaded else { break };
                livetmpl::log!(
                    "watch";
                    "reloaded {} templates (generation {})",
                    reloaded.entries,
                    reloaded.generation
                );
                render_logged(&cache, &args.name, &data);
            }
            recv(shutdown_rx) -> _ => break,
        }
    }

    livetmpl::log!("watch"; "shutting down...");
    cache.close();
    Ok(())
}

/// Render failures keep the watcher running; the next change may fix them.
fn render_logged(cache: &LiveCache, name: &str, data: &serde_json::Value) {
    if let Err(e) = render_to_stdout(cache, name, data) {
        livetmpl::log!("error"; "{}", e);
    }
}
