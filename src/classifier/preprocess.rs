use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use thiserror::Error;
use tract_onnx::prelude::tract_ndarray::Array4;

/// Width and height the classifier expects.
pub const INPUT_SIZE: u32 = 224;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decodes an in-memory image into the classifier's input tensor.
pub fn preprocess_bytes(bytes: &[u8]) -> Result<Array4<f32>, PreprocessError> {
    let img = image::load_from_memory(bytes)?;
    Ok(to_tensor(&img))
}

pub fn preprocess_path(path: &Path) -> Result<Array4<f32>, PreprocessError> {
    let img = image::open(path)?;
    Ok(to_tensor(&img))
}

/// RGB, 224x224 bilinear, scaled to [0, 1], shaped `[1, H, W, 3]`.
fn to_tensor(img: &DynamicImage) -> Array4<f32> {
    let rgb = img
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
        .to_rgb8();
    let side = INPUT_SIZE as usize;
    Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
}
