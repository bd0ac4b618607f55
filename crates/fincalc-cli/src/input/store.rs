use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key-value persistence for the last input of each calculator.
pub trait InputStore {
    fn get(&self, key: &str) -> Result<Option<Value>, Box<dyn std::error::Error>>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), Box<dyn std::error::Error>>;
}

/// Process-lifetime store; nothing survives the run.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl InputStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), Box<dyn std::error::Error>> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// A single JSON object on disk, keyed by calculator. Rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read state file '{}': {}", path.display(), e))?;
            match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(format!(
                        "State file '{}' is not a JSON object; fix or remove it",
                        path.display()
                    )
                    .into())
                }
                Err(e) => {
                    return Err(format!(
                        "Failed to parse state file '{}': {}; fix or remove it",
                        path.display(),
                        e
                    )
                    .into())
                }
            }
        } else {
            Map::new()
        };
        debug!(path = %path.display(), keys = entries.len(), "opened state file");
        Ok(JsonFileStore { path, entries })
    }
}

impl InputStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), Box<dyn std::error::Error>> {
        self.entries.insert(key.to_string(), value);
        let contents = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, contents)
            .map_err(|e| format!("Failed to write state file '{}': {}", self.path.display(), e))?;
        Ok(())
    }
}

/// Shallow merge of JSON objects, later layers winning. Null fields never
/// override, so unset flags leave lower layers intact. A non-object layer
/// replaces everything below it.
pub fn layer(layers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Map::new();
    for value in layers {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    if !v.is_null() {
                        merged.insert(k, v);
                    }
                }
            }
            Value::Null => {}
            other => return other,
        }
    }
    Value::Object(merged)
}
