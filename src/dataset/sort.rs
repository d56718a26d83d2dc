use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use super::move_file;

/// Extensions tried, in order, when resolving an image id to a file.
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];

#[derive(Debug, Clone)]
pub struct SortOptions {
    pub image_column: String,
    pub label_column: String,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            image_column: "Image ID".into(),
            label_column: "Level".into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SortReport {
    pub moved: usize,
    /// Image ids listed in the CSV with no matching file.
    pub missing: Vec<String>,
}

/// True for a non-empty name that stays inside the directory it is joined to.
fn is_plain_component(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn find_image(images: &Path, name: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| images.join(format!("{}.{}", name, ext)))
        .find(|p| p.is_file())
}

/// Moves every image listed in `csv_path` from `images` into
/// `output/<label>/`, using the configured id and label columns.
pub fn sort_by_csv(
    csv_path: &Path,
    images: &Path,
    output: &Path,
    opts: &SortOptions,
) -> anyhow::Result<SortReport> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("open csv {}", csv_path.display()))?;

    let headers = reader.headers().context("read csv header")?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("csv has no column {:?}", name))
    };
    let image_idx = column(&opts.image_column)?;
    let label_idx = column(&opts.label_column)?;

    let mut report = SortReport::default();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("read csv row {}", line + 2))?;
        let (Some(name), Some(label)) = (row.get(image_idx), row.get(label_idx)) else {
            warn!(row = line + 2, "short csv row skipped");
            continue;
        };
        let (name, label) = (name.trim(), label.trim());
        anyhow::ensure!(
            is_plain_component(name),
            "invalid image id {:?} on csv row {}",
            name,
            line + 2
        );
        anyhow::ensure!(
            is_plain_component(label),
            "invalid label {:?} on csv row {}",
            label,
            line + 2
        );

        match find_image(images, name) {
            Some(source) => {
                let file_name = source.file_name().context("image path has no file name")?;
                move_file(&source, &output.join(label).join(file_name))?;
                info!(image = %name, label = %label, "moved");
                report.moved += 1;
            }
            None => {
                warn!(image = %name, "file not found");
                report.missing.push(name.to_string());
            }
        }
    }

    Ok(report)
}
