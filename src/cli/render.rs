//! `render` command and render data loading.

use anyhow::{Context, Result, bail};
use livetmpl::{FunctionTable, LiveCache, config::Config};
use serde_json::{Map, Value};
use std::{fs, io::Write};

use super::{RenderArgs, open_cache};

pub fn render_once(config: &Config, args: &RenderArgs) -> Result<()> {
    let data = load_data(args)?;
    let cache = open_cache(config)?;
    let result = render_to_stdout(&cache, &args.name, &data);
    cache.close();
    result
}

/// Render `name` and write it to stdout in one piece.
pub(super) fn render_to_stdout(cache: &LiveCache, name: &str, data: &Value) -> Result<()> {
    let mut buffer = Vec::new();
    cache
        .execute(&mut buffer, name, data, &FunctionTable::new())
        .map_err(|e| anyhow::anyhow!(livetmpl::error_chain(&e)))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&buffer)?;
    stdout.flush()?;
    Ok(())
}

/// Build the render context from `--data` and `--set`.
pub(super) fn load_data(args: &RenderArgs) -> Result<Value> {
    let mut data = match &args.data {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<Value>(&content)
                .with_context(|| format!("invalid JSON in {}", path.display()))?
        }
        None => Value::Object(Map::new()),
    };

    let Value::Object(map) = &mut data else {
        bail!("render data must be a JSON object");
    };

    for pair in &args.set {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid --set `{pair}`, expected KEY=VALUE");
        };
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
        map.insert(key.trim().to_owned(), value);
    }

    Ok(data)
}
