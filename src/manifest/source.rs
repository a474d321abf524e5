//! Reading and parsing manifest sources

use crate::error::{GlacierError, GlacierResult};
use crate::value::Value;
use std::path::Path;
use std::sync::Arc;

/// Synchronous source of manifest text
pub trait SourceReader: Send + Sync {
    /// Read the full contents of `path`
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
}

/// Reads manifests from the local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

impl<R: SourceReader + ?Sized> SourceReader for Arc<R> {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        (**self).read_to_string(path)
    }
}

/// Structured document formats understood by the parse strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from the file extension; anything but `.toml` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }

    /// Parse `content` read from `path`
    pub fn parse(self, path: &Path, content: &str) -> GlacierResult<Value> {
        let malformed = |reason: String| GlacierError::MalformedDocument {
            path: path.to_path_buf(),
            reason,
        };

        match self {
            Self::Json => serde_json::from_str::<serde_json::Value>(content)
                .map(Value::from)
                .map_err(|e| malformed(e.to_string())),
            Self::Toml => toml::from_str::<toml::Table>(content)
                .map(|table| Value::from(toml::Value::Table(table)))
                .map_err(|e| malformed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("A.TOML")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("manifest")), DocumentFormat::Json);
    }

    #[test]
    fn parse_json() {
        let value = DocumentFormat::Json
            .parse(Path::new("a.json"), r#"{"x": [1, 2, {"y": 3}]}"#)
            .unwrap();
        assert_eq!(value.pointer("/x/2/y").and_then(|v| v.as_i64()), Some(3));
        assert!(!value.is_frozen());
    }

    #[test]
    fn parse_json_scalar_document() {
        let value = DocumentFormat::Json.parse(Path::new("n.json"), "42").unwrap();
        assert_eq!(value.as_i64(), Some(42));
    }

    #[test]
    fn parse_toml() {
        let value = DocumentFormat::Toml
            .parse(Path::new("a.toml"), "[server]\nport = 3000\n")
            .unwrap();
        assert_eq!(value.pointer("/server/port").and_then(|v| v.as_i64()), Some(3000));
    }

    #[test]
    fn malformed_documents_name_the_path() {
        let err = DocumentFormat::Json
            .parse(Path::new("bad.json"), "{\"x\": ")
            .unwrap_err();
        match err {
            GlacierError::MalformedDocument { path, .. } => {
                assert_eq!(path, PathBuf::from("bad.json"))
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = DocumentFormat::Toml
            .parse(Path::new("bad.toml"), "= nope")
            .unwrap_err();
        assert!(matches!(err, GlacierError::MalformedDocument { .. }));
    }

    #[test]
    fn fs_reader_reads_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("m.json");
        std::fs::write(&path, "{}").unwrap();

        assert_eq!(FsReader.read_to_string(&path).unwrap(), "{}");
        let err = FsReader
            .read_to_string(&temp.path().join("missing.json"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
