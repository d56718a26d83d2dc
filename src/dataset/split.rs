use std::path::{Path, PathBuf};

use anyhow::Context;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::info;

use super::{class_dirs, files_in, move_file};

#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Fraction of each class that goes to the training set.
    pub ratio: f64,
    /// Fixes the shuffle so a split can be reproduced.
    pub seed: Option<u64>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            ratio: 0.8,
            seed: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SplitReport {
    /// `(class, train count, test count)` per class folder.
    pub classes: Vec<(String, usize, usize)>,
}

impl SplitReport {
    pub fn train_total(&self) -> usize {
        self.classes.iter().map(|(_, train, _)| train).sum()
    }

    pub fn test_total(&self) -> usize {
        self.classes.iter().map(|(_, _, test)| test).sum()
    }
}

/// Shuffles every class folder of `source` and moves the first
/// `floor(len * ratio)` files to `train/<class>/`, the rest to `test/<class>/`.
pub fn split_dataset(
    source: &Path,
    train: &Path,
    test: &Path,
    opts: &SplitOptions,
) -> anyhow::Result<SplitReport> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&opts.ratio),
        "split ratio must be within [0, 1], got {}",
        opts.ratio
    );

    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut report = SplitReport::default();

    for class_dir in class_dirs(source)? {
        let class = class_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut files = files_in(&class_dir)?;
        files.shuffle(&mut rng);

        let split_point = (files.len() as f64 * opts.ratio).floor() as usize;
        let (train_files, test_files) = files.split_at(split_point);

        // both class folders exist afterwards, even when one side is empty
        for dest in [train.join(&class), test.join(&class)] {
            std::fs::create_dir_all(&dest)
                .with_context(|| format!("create {}", dest.display()))?;
        }
        move_all(train_files, &train.join(&class))?;
        move_all(test_files, &test.join(&class))?;

        info!(
            class = %class,
            train = train_files.len(),
            test = test_files.len(),
            "class split"
        );
        report
            .classes
            .push((class, train_files.len(), test_files.len()));
    }

    Ok(report)
}

fn move_all(files: &[PathBuf], dest: &Path) -> anyhow::Result<()> {
    for file in files {
        if let Some(name) = file.file_name() {
            move_file(file, &dest.join(name))?;
        }
    }
    Ok(())
}
