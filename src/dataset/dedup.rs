use std::{collections::HashMap, fs, path::{Path, PathBuf}};

use anyhow::Context;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{class_dirs, files_in};

#[derive(Debug, Default)]
pub struct DedupReport {
    pub scanned: usize,
    /// `(duplicate, kept original)` pairs.
    pub duplicates: Vec<(PathBuf, PathBuf)>,
    pub removed: usize,
}

fn file_digest(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Finds byte-identical files across all class folders of `dataset`.
///
/// The first file seen (class folders and files in name order) is kept;
/// later copies are deleted unless `dry_run` is set.
pub fn remove_duplicates(dataset: &Path, dry_run: bool) -> anyhow::Result<DedupReport> {
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut report = DedupReport::default();

    for class_dir in class_dirs(dataset)? {
        for file in files_in(&class_dir)? {
            report.scanned += 1;
            let digest = file_digest(&file)?;
            match seen.get(&digest) {
                Some(original) => {
                    debug!(duplicate = %file.display(), original = %original.display(), "duplicate");
                    report.duplicates.push((file, original.clone()));
                }
                None => {
                    seen.insert(digest, file);
                }
            }
        }
    }

    if !dry_run {
        for (dup, _) in &report.duplicates {
            fs::remove_file(dup).with_context(|| format!("remove {}", dup.display()))?;
            info!(path = %dup.display(), "deleted duplicate");
            report.removed += 1;
        }
    }

    Ok(report)
}
