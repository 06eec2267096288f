//! Turning raw HDL source text into dataset module directories.

pub mod source;

pub use source::{collect_sources, find_source_files, split_modules, strip_comments, SourceBlob};

use std::fs;
use std::path::Path;

use crate::errors::{ClassificationFailure, Result};
use crate::layout::ModuleDir;
use crate::record::{self, write_atomic, ModuleRecord};
use crate::tools::Toolchain;

/// A single module candidate with its dataset id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: usize,
    pub text: String,
}

/// Split every blob and number the candidates sequentially across blobs.
pub fn prepare_candidates(sources: &[SourceBlob]) -> Vec<Candidate> {
    sources
        .iter()
        .flat_map(|blob| split_modules(&blob.text))
        .enumerate()
        .map(|(id, text)| Candidate { id, text })
        .collect()
}

/// Whether a record passes the data-port filter.
pub fn accepts(record: &ModuleRecord, max_ports: usize) -> bool {
    record.data_port_count() <= max_ports
}

/// Classify one candidate and, if accepted, materialize `ds_<id>/`.
///
/// Nothing is written for a rejected candidate.
pub fn ingest_candidate(
    root: &Path,
    candidate: &Candidate,
    toolchain: &dyn Toolchain,
    max_ports: usize,
) -> Result<ModuleRecord> {
    let module = toolchain
        .classify(&candidate.text)?
        .ok_or(ClassificationFailure::NoModule)?;

    let record = ModuleRecord::from_classified(module, candidate.text.as_str());
    if !accepts(&record, max_ports) {
        return Err(ClassificationFailure::TooManyPorts {
            data: record.data_port_count(),
            max: max_ports,
        }
        .into());
    }

    let dir = ModuleDir::for_id(root, candidate.id);
    create_module_dir(&dir, |dir| {
        write_atomic(&dir.source_file(), record.source_code.as_bytes())?;
        record::save(&record, dir)
    })?;
    Ok(record)
}

/// Create `dir` and fill it; a half-written directory is removed again so
/// it never shows up in the dataset.
fn create_module_dir<F>(dir: &ModuleDir, fill: F) -> Result<()>
where
    F: FnOnce(&ModuleDir) -> Result<()>,
{
    fs::create_dir(dir.path())?;
    if let Err(e) = fill(dir) {
        if let Err(cleanup) = fs::remove_dir_all(dir.path()) {
            log::debug!("Could not remove partial {}: {}", dir.name(), cleanup);
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Port;

    fn record_with(ports: Vec<Port>) -> ModuleRecord {
        ModuleRecord::from_classified(
            crate::record::ClassifiedModule {
                name: "m".to_string(),
                parameters: vec![],
                ports,
            },
            "",
        )
    }

    #[test]
    fn test_candidates_numbered_across_blobs() {
        let sources = vec![
            SourceBlob::new("a.v", "module a; endmodule module b; endmodule"),
            SourceBlob::new("c.v", "module c; endmodule"),
        ];
        let candidates = prepare_candidates(&sources);
        let ids: Vec<usize> = candidates.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(candidates[2].text.contains("module c"));
    }

    #[test]
    fn test_accepts_counts_only_data_ports() {
        let mut ports = vec![Port::input("clk"), Port::input("rst")];
        ports.extend((0..6).map(|i| Port::input(format!("d{i}"))));
        let record = record_with(ports);

        assert_eq!(record.data_port_count(), 6);
        assert!(accepts(&record, 6));
        assert!(!accepts(&record, 5));
    }

    #[test]
    fn test_failed_write_removes_module_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = ModuleDir::for_id(temp.path(), 3);

        let result = create_module_dir(&dir, |dir| {
            write_atomic(&dir.source_file(), b"module m; endmodule")?;
            write_atomic(&dir.path().join("missing").join("meta.json"), b"{}")
        });

        assert!(result.is_err());
        assert!(!dir.path().exists());
        assert_eq!(crate::pipeline::count(temp.path()).unwrap().total, 0);
    }

    #[test]
    fn test_module_dir_kept_when_filled() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = ModuleDir::for_id(temp.path(), 0);

        create_module_dir(&dir, |dir| write_atomic(&dir.source_file(), b"module m; endmodule"))
            .unwrap();

        assert!(dir.source_file().is_file());
    }
}
