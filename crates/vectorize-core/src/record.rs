use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Directory bare file names are resolved against.
pub const DEFAULT_DATA_DIR: &str = "files";
pub const DEFAULT_OUTPUT_FILE: &str = "output.json";

const EMBEDDING_KEY: &str = "embedding";

/// One input object. `content` and `origin` are guaranteed strings; every
/// field, including any `embedding` already present, is kept as loaded and
/// in its original key order. A generated embedding is held separately and
/// written in place of (or after) the loaded one.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Map<String, Value>,
    embedding: Option<Vec<f32>>,
}

impl Record {
    pub fn new(content: impl Into<String>, origin: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("content".to_string(), Value::String(content.into()));
        fields.insert("origin".to_string(), Value::String(origin.into()));
        Self {
            fields,
            embedding: None,
        }
    }

    pub fn content(&self) -> &str {
        self.str_field("content")
    }

    pub fn origin(&self) -> &str {
        self.str_field("origin")
    }

    /// A field as it was loaded.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The embedding produced for this record, if any.
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    /// Copy of this record carrying `embedding`.
    #[must_use]
    pub fn with_embedding(&self, embedding: Vec<f32>) -> Self {
        Self {
            fields: self.fields.clone(),
            embedding: Some(embedding),
        }
    }

    fn str_field(&self, key: &str) -> &str {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let generated = self.embedding.as_ref();
        let appended = generated.is_some() && !self.fields.contains_key(EMBEDDING_KEY);
        let mut map = serializer.serialize_map(Some(self.fields.len() + usize::from(appended)))?;
        for (key, value) in &self.fields {
            match generated {
                Some(embedding) if key == EMBEDDING_KEY => map.serialize_entry(key, embedding)?,
                _ => map.serialize_entry(key, value)?,
            }
        }
        if appended {
            map.serialize_entry(EMBEDDING_KEY, &generated)?;
        }
        map.end()
    }
}

/// Bare file names (no directory component) live under [`DEFAULT_DATA_DIR`].
pub fn resolve_data_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let bare = path
        .parent()
        .is_none_or(|parent| parent.as_os_str().is_empty());
    if bare {
        Path::new(DEFAULT_DATA_DIR).join(path)
    } else {
        path.to_path_buf()
    }
}

/// Load and validate a JSON array of records.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::Io(format!("file not found: {}", path.display())),
        _ => Error::Io(format!("failed to read {}: {e}", path.display())),
    })?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::Io(format!("error decoding JSON in {}: {e}", path.display())))?;
    parse_records(value)
}

/// Validate the shape of an already-decoded document and convert it.
pub fn parse_records(value: Value) -> Result<Vec<Record>> {
    let Value::Array(items) = value else {
        return Err(Error::Validation("JSON file must contain an array".to_string()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let Value::Object(fields) = item else {
                return Err(Error::Validation(format!("item {i} is not a valid object")));
            };
            for field in ["content", "origin"] {
                match fields.get(field) {
                    None => {
                        return Err(Error::Validation(format!(
                            "item {i} does not have '{field}' field"
                        )));
                    }
                    Some(Value::String(_)) => {}
                    Some(_) => {
                        return Err(Error::Validation(format!(
                            "item {i} field '{field}' must be a string"
                        )));
                    }
                }
            }
            Ok(Record {
                fields,
                embedding: None,
            })
        })
        .collect()
}

/// Write records as a two-space indented JSON array, creating the parent
/// directory if needed. Non-ASCII text is written as-is.
pub fn save_records(records: &[Record], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Io(format!("error saving file {}: {e}", path.display())))?;
    }

    let file = fs::File::create(path)
        .map_err(|e| Error::Io(format!("error saving file {}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
