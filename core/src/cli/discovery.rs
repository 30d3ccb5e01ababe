use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_FILE_NAMES: &[&str] = &[".DS_Store"];

/// Collects every regular file under `root`, sorted by path
///
/// There is no extension filter: anything that fails to parse shows up as
/// a per-file error in the batch report. Unreadable entries are skipped.
pub fn collect_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map_or(true, |name| !IGNORED_FILE_NAMES.contains(&name))
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}
