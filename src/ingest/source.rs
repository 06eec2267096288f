//! Source text preparation: comment stripping and module splitting.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::errors::Result;

static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)//.*$").unwrap());

const END_KEYWORD: &str = "endmodule";

const SOURCE_EXTENSIONS: &[&str] = &["v", "sv"];

/// One unit of HDL text handed to ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlob {
    /// Where the text came from, for logging
    pub origin: String,
    pub text: String,
}

impl SourceBlob {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }
}

/// Remove block comments (across lines) and line comments.
pub fn strip_comments(code: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(code, "");
    LINE_COMMENT.replace_all(&without_blocks, "").into_owned()
}

/// Split a blob into module candidates.
///
/// Text with at most one `endmodule` is returned whole. Otherwise every
/// piece before an `endmodule` becomes a candidate with the keyword put
/// back; whatever follows the last `endmodule` is dropped.
pub fn split_modules(code: &str) -> Vec<String> {
    let stripped = strip_comments(code);
    if stripped.matches(END_KEYWORD).count() <= 1 {
        return vec![stripped];
    }

    let mut pieces: Vec<&str> = stripped.split(END_KEYWORD).collect();
    pieces.pop();
    pieces
        .into_iter()
        .map(|piece| format!("{piece}{END_KEYWORD}"))
        .collect()
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Every `.v` / `.sv` file under `dir`, sorted by path.
pub fn find_source_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_source_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Read every HDL source file under `dir` into a blob.
///
/// Files that are not valid UTF-8 are read lossily; unreadable files are
/// skipped with a warning.
pub fn collect_sources(dir: &Path) -> Result<Vec<SourceBlob>> {
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("source directory {} does not exist", dir.display()),
        )
        .into());
    }

    let blobs = find_source_files(dir)
        .into_iter()
        .filter_map(|path| match fs::read(&path) {
            Ok(bytes) => Some(SourceBlob::new(
                path.display().to_string(),
                String::from_utf8_lossy(&bytes).into_owned(),
            )),
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        })
        .collect();
    Ok(blobs)
}
