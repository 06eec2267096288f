//! On-disk layout of a dataset module directory.
//!
//! Every module owns one directory under the dataset root. The files in it
//! form the contract between stages: each stage reads the artifacts of the
//! previous ones and leaves its own completion marker behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub const SOURCE_FILE: &str = "module.v";
pub const RECORD_FILE: &str = "meta.json";
pub const TESTBENCH_FILE: &str = "tb.v";
pub const COMPILED_FILE: &str = "iverilog_out";
pub const DUMP_FILE: &str = "dump.vcd";
pub const TRACE_CONFIG_FILE: &str = "trace_config.json";
pub const RAW_TRACE_FILE: &str = "wavedrom_raw.json";
pub const TRACE_FILE: &str = "wavedrom.json";
pub const IMAGES_DIR: &str = "images";

/// Prefix for module directories created during ingestion
pub const MODULE_DIR_PREFIX: &str = "ds_";

/// Extension of rendered waveform images
pub const IMAGE_EXTENSION: &str = "png";

/// Handle to a single module directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleDir {
    path: PathBuf,
}

impl ModuleDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Directory for the module with the given ingestion id
    pub fn for_id(root: &Path, id: usize) -> Self {
        Self::new(root.join(format!("{MODULE_DIR_PREFIX}{id}")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory name, used as the module label in logs
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn source_file(&self) -> PathBuf {
        self.path.join(SOURCE_FILE)
    }

    pub fn record_file(&self) -> PathBuf {
        self.path.join(RECORD_FILE)
    }

    pub fn testbench_file(&self) -> PathBuf {
        self.path.join(TESTBENCH_FILE)
    }

    pub fn compiled_file(&self) -> PathBuf {
        self.path.join(COMPILED_FILE)
    }

    pub fn dump_file(&self) -> PathBuf {
        self.path.join(DUMP_FILE)
    }

    pub fn trace_config_file(&self) -> PathBuf {
        self.path.join(TRACE_CONFIG_FILE)
    }

    pub fn raw_trace_file(&self) -> PathBuf {
        self.path.join(RAW_TRACE_FILE)
    }

    pub fn trace_file(&self) -> PathBuf {
        self.path.join(TRACE_FILE)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.path.join(IMAGES_DIR)
    }

    /// JSON descriptor for the variant at `index`
    pub fn variant_descriptor(&self, index: usize) -> PathBuf {
        self.images_dir().join(format!("variant_{index}.json"))
    }

    /// Rendered image for the variant at `index`
    pub fn variant_image(&self, index: usize) -> PathBuf {
        self.images_dir()
            .join(format!("variant_{index}.{IMAGE_EXTENSION}"))
    }

    /// Captured standard output of `tool` (debug mode only)
    pub fn diagnostic_stdout(&self, tool: &str) -> PathBuf {
        self.path.join(format!("{tool}_stdout"))
    }

    /// Captured standard error of `tool` (debug mode only)
    pub fn diagnostic_stderr(&self, tool: &str) -> PathBuf {
        self.path.join(format!("{tool}_stderr"))
    }

    /// Failure reason recorded for `tool` (debug mode only)
    pub fn error_marker(&self, tool: &str) -> PathBuf {
        self.path.join(format!("{tool}_err.txt"))
    }

    pub fn has_error_marker(&self, tool: &str) -> bool {
        self.error_marker(tool).exists()
    }

    /// True when the images directory holds at least one rendered image.
    pub fn has_images(&self) -> bool {
        let Ok(entries) = fs::read_dir(self.images_dir()) else {
            return false;
        };
        entries.flatten().any(|entry| {
            let path = entry.path();
            path.extension().is_some_and(|ext| ext == IMAGE_EXTENSION)
                && entry.metadata().is_ok_and(|m| m.is_file() && m.len() > 0)
        })
    }

    /// Remove the whole module directory.
    pub fn discard(&self) -> io::Result<()> {
        fs::remove_dir_all(&self.path)
    }
}

/// Snapshot of the module directories under `root`.
///
/// The listing is taken once; directories created afterwards are not seen
/// by the stage that requested it.
pub fn list_module_dirs(root: &Path) -> io::Result<Vec<ModuleDir>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("dataset root {} does not exist", root.display()),
        ));
    }

    let mut dirs: Vec<ModuleDir> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| ModuleDir::new(entry.into_path()))
        .collect();

    dirs.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(dirs)
}
