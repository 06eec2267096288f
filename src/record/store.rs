//! Loading and saving `meta.json`.
//!
//! Writes go to a temporary file in the target directory which is then
//! renamed over the destination, so a reader never sees a half-written
//! record. Directories are never created or removed here.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::ModuleRecord;
use crate::errors::{PipelineError, Result};
use crate::layout::ModuleDir;

/// Load the record stored in `dir`.
pub fn load(dir: &ModuleDir) -> Result<ModuleRecord> {
    let path = dir.record_file();
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::RecordNotFound { path });
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&contents).map_err(|source| PipelineError::RecordCorrupt {
        path,
        contents,
        source,
    })
}

/// Replace the record stored in `dir`.
pub fn save(record: &ModuleRecord, dir: &ModuleDir) -> Result<()> {
    let json = serde_json::to_vec_pretty(record)?;
    write_atomic(&dir.record_file(), &json)
}

/// Write `bytes` to `path` via a sibling temp file and an atomic rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        ))
    })?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| PipelineError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ClassifiedModule, Port};
    use tempfile::TempDir;

    fn sample_record() -> ModuleRecord {
        ModuleRecord::from_classified(
            ClassifiedModule {
                name: "and_gate".to_string(),
                parameters: vec![],
                ports: vec![Port::input("a"), Port::input("b"), Port::output("y")],
            },
            "module and_gate(input a, input b, output y); endmodule",
        )
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let dir = ModuleDir::new(temp.path());
        let record = sample_record();

        save(&record, &dir).unwrap();
        assert_eq!(load(&dir).unwrap(), record);
    }

    #[test]
    fn test_load_missing_record() {
        let temp = TempDir::new().unwrap();
        let err = load(&ModuleDir::new(temp.path())).unwrap_err();
        assert!(matches!(err, PipelineError::RecordNotFound { .. }));
    }

    #[test]
    fn test_load_corrupt_record_preserves_contents() {
        let temp = TempDir::new().unwrap();
        let dir = ModuleDir::new(temp.path());
        fs::write(dir.record_file(), "{\"module_name\": ").unwrap();

        match load(&dir).unwrap_err() {
            PipelineError::RecordCorrupt { contents, .. } => {
                assert_eq!(contents, "{\"module_name\": ");
            }
            other => panic!("expected corrupt record, got {other}"),
        }
        // The corrupt file is left in place for diagnostics
        assert!(dir.record_file().exists());
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let dir = ModuleDir::new(temp.path());
        let mut record = sample_record();
        save(&record, &dir).unwrap();

        record.parameters.push("N".to_string());
        save(&record, &dir).unwrap();

        assert_eq!(load(&dir).unwrap().parameters, vec!["N"]);
        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_save_does_not_create_directories() {
        let temp = TempDir::new().unwrap();
        let dir = ModuleDir::new(temp.path().join("missing"));
        assert!(save(&sample_record(), &dir).is_err());
        assert!(!dir.path().exists());
    }
}
