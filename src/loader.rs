//! Dictionary loader backed by a directory of JSON files.

use crate::coordinator::DictionaryLoader;
use anyhow::{bail, Context, Result};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads `<dir>/<lang>.json` as the dictionary for `lang`.
#[derive(Debug, Clone)]
pub struct JsonDirLoader {
    dir: PathBuf,
}

impl JsonDirLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the dictionary file for `lang`.
    ///
    /// Language codes are file stems, so anything that could escape the
    /// directory is rejected.
    pub fn path_for(&self, lang: &str) -> Result<PathBuf> {
        if lang.is_empty()
            || lang.starts_with('.')
            || lang.contains(['/', '\\'])
            || lang.contains("..")
        {
            bail!("Invalid language code for file lookup: '{}'", lang);
        }
        Ok(self.dir.join(format!("{}.json", lang)))
    }

    /// Language codes with a dictionary file in the directory, sorted.
    pub async fn available(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to read dictionary directory {}", self.dir.display()))?;

        let mut langs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                langs.push(stem.to_string());
            }
        }
        langs.sort();
        Ok(langs)
    }
}

impl DictionaryLoader<Value> for JsonDirLoader {
    fn load(&self, lang: &str) -> BoxFuture<'static, Result<Value>> {
        let path = self.path_for(lang);
        let lang = lang.to_string();

        async move {
            let path = path?;
            debug!("Loading dictionary for '{}' from {}", lang, path.display());

            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read dictionary {}", path.display()))?;
            let dictionary: Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse dictionary {}", path.display()))?;
            Ok(dictionary)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("en.json"), r#"{"hello":"Hello"}"#).unwrap();
        std::fs::write(dir.path().join("ru.json"), r#"{"hello":"Привет"}"#).unwrap();
        std::fs::write(dir.path().join("README.md"), "not a dictionary").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_existing_dictionary() {
        let dir = fixture();
        let loader = JsonDirLoader::new(dir.path());

        let dictionary = loader.load("ru").await.expect("Should load");
        assert_eq!(dictionary, json!({ "hello": "Привет" }));
    }

    #[tokio::test]
    async fn test_load_missing_dictionary() {
        let dir = fixture();
        let loader = JsonDirLoader::new(dir.path());

        let err = loader.load("fr").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read dictionary"));
    }

    #[tokio::test]
    async fn test_load_malformed_dictionary() {
        let dir = fixture();
        std::fs::write(dir.path().join("de.json"), "{not json").unwrap();
        let loader = JsonDirLoader::new(dir.path());

        let err = loader.load("de").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse dictionary"));
    }

    #[test]
    fn test_path_for_rejects_traversal() {
        let loader = JsonDirLoader::new("/tmp/dictionaries");
        assert!(loader.path_for("../etc/passwd").is_err());
        assert!(loader.path_for("en/us").is_err());
        assert!(loader.path_for(".hidden").is_err());
        assert!(loader.path_for("").is_err());
        assert_eq!(
            loader.path_for("pt-BR").unwrap(),
            PathBuf::from("/tmp/dictionaries/pt-BR.json")
        );
    }

    #[tokio::test]
    async fn test_available_lists_json_files() {
        let dir = fixture();
        let loader = JsonDirLoader::new(dir.path());

        let langs = loader.available().await.expect("Should list");
        assert_eq!(langs, vec!["en".to_string(), "ru".to_string()]);
    }
}
