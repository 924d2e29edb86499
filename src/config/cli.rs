use crate::core::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Export artifacts land under `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        Ok(tokio::fs::read(full_path).await?)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        Ok(full_path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("exports"));

        let path = storage
            .write_file("CDR Report 01-02-2024 10.00.00.xlsx", b"bytes")
            .await
            .unwrap();
        assert!(path.ends_with("CDR Report 01-02-2024 10.00.00.xlsx"));
        assert_eq!(
            storage
                .read_file("CDR Report 01-02-2024 10.00.00.xlsx")
                .await
                .unwrap(),
            b"bytes"
        );
    }
}
