use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::Month;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::distribute::Assignment;
use crate::household::Household;

#[tracing::instrument(skip(path), fields(file = %path.display()))]
pub fn load_household(path: &Path, default_month: Month) -> anyhow::Result<Household> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read household file {}", path.display()))?;
    Household::from_toml_str(&raw, default_month)
        .with_context(|| format!("failed to load household from {}", path.display()))
}

pub fn assignments_json(assignments: &[Assignment]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(assignments).context("failed to serialize assignments")
}

/// Writes the assignment list as JSON, replacing `path` in one step.
#[tracing::instrument(skip(path, assignments), fields(file = %path.display()))]
pub fn export_assignments(path: &Path, assignments: &[Assignment]) -> anyhow::Result<()> {
    debug!(count = assignments.len(), "exporting assignments");
    let payload = assignments_json(assignments)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    writeln!(temp, "{payload}")?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    info!(file = %path.display(), count = assignments.len(), "exported assignments");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Month, NaiveDate};
    use tempfile::tempdir;

    use super::{assignments_json, export_assignments, load_household};
    use crate::distribute::Assignment;

    #[test]
    fn json_uses_iso_dates_and_camel_case() {
        let entry = Assignment {
            date: NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"),
            person_id: 2,
            task: "Vaisselle".to_string(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&assignments_json(&[entry]).expect("json")).expect("parse");
        assert_eq!(value[0]["date"], "2025-03-01");
        assert_eq!(value[0]["personId"], 2);
        assert_eq!(value[0]["task"], "Vaisselle");
    }

    #[test]
    fn export_replaces_existing_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("march.json");
        std::fs::write(&path, "stale").expect("write stale");

        export_assignments(&path, &[]).expect("export");
        let text = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(text.trim(), "[]");
    }

    #[test]
    fn missing_household_file_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let err = load_household(&temp.path().join("nope.toml"), Month::May)
            .expect_err("missing file");
        assert!(format!("{err:#}").contains("nope.toml"));
    }
}
