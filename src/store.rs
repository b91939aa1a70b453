use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use directories::BaseDirs;
use tempfile::Builder;

use crate::cache::{CacheEntry, DurableTier};
use crate::domain::Category;
use crate::error::CatalogError;

pub const CATEGORIES_FILE: &str = "awesome-video-categories.json";
pub const TIMESTAMP_FILE: &str = "awesome-video-timestamp";

#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, CatalogError> {
        let root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("awesome-video"))
                    .ok()
            })
            .ok_or_else(|| CatalogError::Storage("unable to resolve cache directory".to_string()))?;
        Ok(Self { root })
    }

    pub fn new_with_path(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn categories_path(&self) -> Utf8PathBuf {
        self.root.join(CATEGORIES_FILE)
    }

    pub fn timestamp_path(&self) -> Utf8PathBuf {
        self.root.join(TIMESTAMP_FILE)
    }

    pub fn ensure_root(&self) -> Result<(), CatalogError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| CatalogError::Storage(err.to_string()))
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), CatalogError> {
        let parent = path
            .parent()
            .ok_or_else(|| CatalogError::Storage("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix(".avc-cache")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        Ok(())
    }

    fn read_optional(path: &Utf8Path) -> Result<Option<String>, CatalogError> {
        match fs::read_to_string(path.as_std_path()) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(CatalogError::Storage(format!("{path}: {err}"))),
        }
    }
}

impl DurableTier for Store {
    fn load(&self) -> Result<Option<CacheEntry>, CatalogError> {
        let Some(timestamp) = Self::read_optional(&self.timestamp_path())? else {
            return Ok(None);
        };
        let Some(categories) = Self::read_optional(&self.categories_path())? else {
            return Ok(None);
        };

        let millis = timestamp
            .trim()
            .parse::<i64>()
            .map_err(|err| CatalogError::Storage(format!("corrupt timestamp: {err}")))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| CatalogError::Storage(format!("timestamp out of range: {millis}")))?;
        let data: Vec<Category> = serde_json::from_str(&categories)
            .map_err(|err| CatalogError::Storage(format!("corrupt categories: {err}")))?;

        Ok(Some(CacheEntry { data, timestamp }))
    }

    fn save(&self, entry: &CacheEntry) -> Result<(), CatalogError> {
        self.ensure_root()?;
        let content = serde_json::to_vec(&entry.data)
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        Self::write_bytes_atomic(&self.categories_path(), &content)?;
        Self::write_bytes_atomic(
            &self.timestamp_path(),
            entry.timestamp.timestamp_millis().to_string().as_bytes(),
        )
    }

    fn clear(&self) -> Result<(), CatalogError> {
        for path in [self.categories_path(), self.timestamp_path()] {
            match fs::remove_file(path.as_std_path()) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(CatalogError::Storage(format!("{path}: {err}"))),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new_with_path(Utf8PathBuf::from("/tmp/avc"));
        assert!(store.categories_path().ends_with(CATEGORIES_FILE));
        assert!(store.timestamp_path().ends_with(TIMESTAMP_FILE));
        assert_eq!(store.root().as_str(), "/tmp/avc");
    }
}
