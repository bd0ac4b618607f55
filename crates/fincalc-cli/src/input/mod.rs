pub mod file;
pub mod stdin;
pub mod store;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use store::{layer, InputStore};

/// Build a typed calculator input from, lowest to highest precedence:
/// built-in defaults, the last input stored under `key`, an `--input`
/// file or piped stdin, and explicit flags. The resolved input is written
/// back to the store.
pub fn resolve_input<T>(
    key: &str,
    defaults: Value,
    file: Option<&str>,
    flags: Value,
    store: &mut dyn InputStore,
) -> Result<T, Box<dyn std::error::Error>>
where
    T: DeserializeOwned + Serialize,
{
    let stored = store.get(key)?;
    let supplied = match file {
        Some(path) => Some(file::read_value(path)?),
        None => stdin::read_stdin()?,
    };
    debug!(
        key,
        stored = stored.is_some(),
        supplied = supplied.is_some(),
        "resolving calculator input"
    );

    let mut layers = vec![defaults];
    layers.extend(stored);
    layers.extend(supplied);
    layers.push(flags);

    let merged = layer(layers);
    let typed: T = serde_json::from_value(merged)
        .map_err(|e| format!("Invalid input for '{key}': {e}"))?;

    store.set(key, serde_json::to_value(&typed)?)?;
    Ok(typed)
}
