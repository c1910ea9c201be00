//! Format detection, file discovery, and deserialization helpers.
//!
//! Data files may be RON, TOML or JSON; the format is chosen by extension.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use log::debug;

// ===========================================================================
// Errors
// ===========================================================================

/// Failures while locating or parsing a config or scenario file.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("no '{file}' data file in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// Extension is not `.ron`, `.toml` or `.json`.
    #[error("{file} is not a RON, TOML or JSON file")]
    UnsupportedFormat { file: PathBuf },

    /// The same base name exists in more than one format.
    #[error("both {a} and {b} exist; keep one")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("cannot parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// On-disk format of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// File extensions in discovery order.
    pub const EXTENSIONS: [&'static str; 3] = ["ron", "toml", "json"];
}

/// Pick the format from a path's extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in Format::EXTENSIONS {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    if let Some(path) = &found {
        debug!("found data file {}", path.display());
    }
    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` in the given format. `origin` is only used in error
/// messages.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    debug!("loading {:?} data from {}", format, path.display());
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        name: String,
        level: i32,
    }

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cawater_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_known_formats() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        assert!(matches!(
            detect_format(Path::new("a.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("a")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // find_data_file / require_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_found() {
        let dir = make_test_dir("find");
        fs::write(dir.join("water.toml"), "").unwrap();

        let result = find_data_file(&dir, "water").unwrap();
        assert_eq!(result, Some(dir.join("water.toml")));

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_missing() {
        let dir = make_test_dir("find_missing");
        assert_eq!(find_data_file(&dir, "water").unwrap(), None);
        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("water.ron"), "()").unwrap();
        fs::write(dir.join("water.json"), "{}").unwrap();

        assert!(matches!(
            find_data_file(&dir, "water"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require_missing");
        let err = require_data_file(&dir, "water").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingRequired { .. }));
        assert!(err.to_string().contains("'water'"));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // deserialize
    // -----------------------------------------------------------------------

    #[test]
    fn same_data_in_every_format() {
        let dir = make_test_dir("deser");
        let files = [
            ("probe.ron", r#"(name: "basin", level: 3)"#),
            ("probe.toml", "name = \"basin\"\nlevel = 3\n"),
            ("probe.json", r#"{"name": "basin", "level": 3}"#),
        ];
        let expected = Probe {
            name: "basin".to_string(),
            level: 3,
        };
        for (file, content) in files {
            let path = dir.join(file);
            fs::write(&path, content).unwrap();
            let probe: Probe = deserialize_file(&path).unwrap();
            assert_eq!(probe, expected, "{file}");
        }
        cleanup(&dir);
    }

    #[test]
    fn parse_error_names_the_file() {
        let err = deserialize_str::<Probe>("{", Format::Json, Path::new("broken.json"))
            .unwrap_err();
        assert!(matches!(err, DataLoadError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result: Result<Probe, _> = deserialize_file(Path::new("/nonexistent/probe.ron"));
        assert!(matches!(result, Err(DataLoadError::Io(_))));
    }
}
