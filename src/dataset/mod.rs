//! Dataset preparation for training the severity classifier.
//!
//! The training set is a directory of class folders (`minor/`, `moderate/`,
//! `major/`, ...) holding image files. These helpers remove byte-identical
//! duplicates, split class folders into train/test sets and sort a flat
//! directory into class folders from a CSV of labels.

mod dedup;
mod sort;
mod split;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

pub use dedup::{remove_duplicates, DedupReport};
pub use sort::{sort_by_csv, SortOptions, SortReport};
pub use split::{split_dataset, SplitOptions, SplitReport};

/// Immediate subdirectories of `dir`, sorted by name.
fn class_dirs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Regular files directly inside `dir`, sorted by name.
fn files_in(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Moves a file, falling back to copy + delete across filesystems.
fn move_file(from: &Path, to: &Path) -> anyhow::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)
        .with_context(|| format!("copy {} -> {}", from.display(), to.display()))?;
    fs::remove_file(from).with_context(|| format!("remove {}", from.display()))?;
    Ok(())
}
