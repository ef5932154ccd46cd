//! JSON document storage shared by the personal-data tools
//!
//! Each tool owns one pretty-printed JSON file under the data directory.
//! A missing file reads as the empty document.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::Result;

/// A JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonFile<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Bind to `<dir>/<file_name>`; nothing is touched until load or save
    pub fn new(dir: &Path, file_name: &str) -> Self {
        Self {
            path: dir.join(file_name),
            _doc: PhantomData,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, or the empty document if the file does not exist
    pub fn load(&self) -> Result<T> {
        if !self.path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the document, creating the data directory if needed
    pub fn save(&self, doc: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(doc)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Fresh 8-character lowercase hex identifier
pub fn new_id() -> String {
    format!("{:08x}", rand::rng().random::<u32>())
}

/// Local timestamp in ISO-8601 seconds
pub fn timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        items: Vec<String>,
    }

    #[test]
    fn test_missing_file_is_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let file: JsonFile<Doc> = JsonFile::new(dir.path(), "doc.json");
        assert_eq!(file.load().unwrap(), Doc::default());
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let file: JsonFile<Doc> = JsonFile::new(&nested, "doc.json");

        let doc = Doc {
            items: vec!["x".to_string()],
        };
        file.save(&doc).unwrap();

        assert!(file.path().exists());
        assert_eq!(file.load().unwrap(), doc);
        let raw = fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains('\n'), "document should be pretty-printed");
    }

    #[test]
    fn test_ids_are_eight_hex_chars() {
        let id = new_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
