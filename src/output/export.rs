//! JSON export of the end-of-test summary

use crate::{
    error::{AppError, Result},
    models::RunReport,
};
use std::fs;
use std::path::Path;

/// Write `report` as pretty-printed JSON, creating parent directories
pub fn export_json(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::io(format!("Failed to create directory '{}': {}", parent.display(), e))
            })?;
        }
    }

    let content = serde_json::to_string_pretty(report)
        .map_err(|e| AppError::internal(format!("Failed to serialize summary: {}", e)))?;

    fs::write(path, content)
        .map_err(|e| AppError::io(format!("Failed to write summary to '{}': {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_report;
    use tempfile::TempDir;

    #[test]
    fn test_export_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results").join("summary.json");

        export_json(&test_report(), &path).unwrap();

        let loaded: RunReport = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.plan, "warmup");
        assert_eq!(loaded.thresholds.len(), 2);
        assert_eq!(loaded.endpoints["list-books"].path, "/books");
    }

    #[test]
    fn test_exported_json_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.json");
        export_json(&test_report(), &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["scenarios"][0]["stop_reason"], "completed");
        assert_eq!(value["checks"][0]["name"], "status was 200");
        assert!(value["totals"]["http_req_duration"]["p99"].is_number());
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("results");
        fs::write(&blocker, "not a directory").unwrap();

        let err = export_json(&test_report(), &blocker.join("summary.json")).unwrap_err();
        assert_eq!(err.category(), "IO");
        assert_eq!(err.exit_code(), 5);
    }
}
