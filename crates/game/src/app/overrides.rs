use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub(crate) const OVERRIDES_SUFFIX: &str = ".titles.json";

/// Optional per-level text, e.g. `{ "tasks": { "wash": "Scrub in" } }`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub(crate) struct TitleOverrides {
    #[serde(default)]
    pub(crate) tasks: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub(crate) enum OverridesError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path} at '{at}': {source}")]
    Parse {
        path: PathBuf,
        at: String,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn overrides_path(levels_dir: &Path, scene: &str) -> PathBuf {
    levels_dir.join(format!("{scene}{OVERRIDES_SUFFIX}"))
}

/// Reads the override file for `scene`. A missing file is not an error.
pub(crate) fn load_title_overrides(
    levels_dir: &Path,
    scene: &str,
) -> Result<Option<TitleOverrides>, OverridesError> {
    let path = overrides_path(levels_dir, scene);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(OverridesError::Io { path, source }),
    };
    parse_title_overrides(&raw)
        .map(Some)
        .map_err(|(at, source)| OverridesError::Parse { path, at, source })
}

fn parse_title_overrides(raw: &str) -> Result<TitleOverrides, (String, serde_json::Error)> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|error| (error.path().to_string(), error.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = load_title_overrides(dir.path(), "clinic").expect("no error");
        assert_eq!(loaded, None);
    }

    #[test]
    fn titles_are_read_by_task_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            overrides_path(dir.path(), "clinic"),
            r#"{ "tasks": { "wash": "Scrub in", "deliver": "Treat patient" } }"#,
        )
        .expect("write");

        let loaded = load_title_overrides(dir.path(), "clinic")
            .expect("parsed")
            .expect("present");
        assert_eq!(loaded.tasks.get("wash").map(String::as_str), Some("Scrub in"));
        assert_eq!(loaded.tasks.len(), 2);
    }

    #[test]
    fn object_without_tasks_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(overrides_path(dir.path(), "cell"), "{}").expect("write");
        let loaded = load_title_overrides(dir.path(), "cell")
            .expect("parsed")
            .expect("present");
        assert!(loaded.tasks.is_empty());
    }

    #[test]
    fn parse_error_reports_failing_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            overrides_path(dir.path(), "clinic"),
            r#"{ "tasks": { "wash": 42 } }"#,
        )
        .expect("write");

        let error = load_title_overrides(dir.path(), "clinic").unwrap_err();
        match error {
            OverridesError::Parse { at, .. } => assert_eq!(at, "tasks.wash"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
