//! Command-line interface module.

mod args;
mod render;
mod watch;

pub use args::{Cli, Commands, RenderArgs};

use anyhow::{Context, Result};
use livetmpl::{FunctionTable, LiveCache, config::Config};
use serde_json::{Value, json};

/// Dispatch the parsed command.
pub fn run(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Commands::Render { args } => render::render_once(config, args),
        Commands::Watch { args } => watch::watch(config, args),
        Commands::List => list(config),
    }
}

/// Activate a cache over the configured root with the CLI helper functions.
pub(crate) fn open_cache(config: &Config) -> Result<LiveCache> {
    let root = config.root_dir();
    let cache = LiveCache::new(&root, config.extension(), |err| {
        livetmpl::log!("error"; "{}", livetmpl::error_chain(&err));
    });
    cache
        .activate(builtin_functions())
        .with_context(|| format!("failed to load templates from {}", root.display()))?;
    livetmpl::debug!("render"; "loaded {} templates", cache.entries().len());
    Ok(cache)
}

/// Helpers available to every template rendered from the command line.
///
/// - `env(name, default?)`: environment variable lookup
pub(crate) fn builtin_functions() -> FunctionTable {
    FunctionTable::new().with("env", |args| {
        let name = args
            .get("name")
            .and_then(Value::as_str)
            .ok_or("env: missing `name` argument")?;
        match std::env::var(name) {
            Ok(value) => Ok(json!(value)),
            Err(_) => args
                .get("default")
                .cloned()
                .ok_or_else(|| format!("env: `{name}` is not set")),
        }
    })
}

fn list(config: &Config) -> Result<()> {
    let cache = open_cache(config)?;
    for name in cache.entries() {
        println!("{name}");
    }
    cache.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_function() {
        let functions = builtin_functions();
        let env = functions.get("env").unwrap();

        let mut args = HashMap::new();
        args.insert("name".to_string(), json!("LIVETMPL_SURELY_UNSET_VAR"));
        assert!(env(&args).is_err());

        args.insert("default".to_string(), json!("fallback"));
        assert_eq!(env(&args).unwrap(), json!("fallback"));

        assert!(env(&HashMap::new()).is_err());
    }
}
