use crate::{
    error::SegmentationError,
    model_service::OUTPUT_SHAPE,
    palette::{LandCoverClass, CLASSES, CLASS_COLORS, NUM_CLASSES},
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use image::{imageops::FilterType, ImageBuffer, Luma, RgbImage};
use ndarray::{Array4, Axis};
use std::io::Cursor;

/// Per-pixel class indices, one byte per pixel.
pub type ClassMap = ImageBuffer<Luma<u8>, Vec<u8>>;

pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Reduces a `[1, H, W, C]` probability tensor to class indices. Ties keep
/// the lowest index, and the first NaN score wins like numpy's `argmax`.
pub fn class_map(probabilities: &Array4<f32>) -> Result<ClassMap, SegmentationError> {
    let shape = probabilities.shape();
    if shape[0] != 1 || shape[3] != NUM_CLASSES {
        return Err(SegmentationError::Shape {
            expected: OUTPUT_SHAPE.to_vec(),
            actual: shape.to_vec(),
        });
    }

    let (height, width) = (shape[1], shape[2]);
    let batch = probabilities.index_axis(Axis(0), 0);
    let mut classes = ClassMap::new(width as u32, height as u32);
    for ((y, x), scores) in batch
        .lanes(Axis(2))
        .into_iter()
        .enumerate()
        .map(|(i, lane)| ((i / width, i % width), lane))
    {
        let (best, _) = scores
            .iter()
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |(best, best_score), (index, &score)| {
                if !best_score.is_nan() && (score.is_nan() || score > best_score) {
                    (index, score)
                } else {
                    (best, best_score)
                }
            });
        classes.put_pixel(x as u32, y as u32, Luma([best as u8]));
    }

    Ok(classes)
}

/// Pixel count per class, in table order.
pub fn class_histogram(classes: &ClassMap) -> [u64; NUM_CLASSES] {
    let mut counts = [0u64; NUM_CLASSES];
    for Luma([index]) in classes.pixels() {
        counts[*index as usize] += 1;
    }
    counts
}

/// Histogram as `(label, count)` pairs, skipping absent classes.
pub fn describe_histogram(counts: &[u64; NUM_CLASSES]) -> Vec<(&'static str, u64)> {
    CLASSES
        .iter()
        .zip(counts.iter())
        .filter(|(_, &count)| count > 0)
        .map(|(class, &count)| (class.label(), count))
        .collect()
}

pub fn colorize(classes: &ClassMap) -> RgbImage {
    RgbImage::from_fn(classes.width(), classes.height(), |x, y| {
        let Luma([index]) = *classes.get_pixel(x, y);
        LandCoverClass::from_index(index as usize)
            .map(LandCoverClass::color)
            .unwrap_or(CLASS_COLORS[NUM_CLASSES - 1])
    })
}

/// Nearest-neighbour so class boundaries never produce blended colors.
pub fn resize_mask(mask: &RgbImage, width: u32, height: u32) -> RgbImage {
    if mask.dimensions() == (width, height) {
        return mask.clone();
    }
    image::imageops::resize(mask, width, height, FilterType::Nearest)
}

pub fn encode_png(mask: &RgbImage) -> Result<Vec<u8>, SegmentationError> {
    let mut buffer = Vec::new();
    mask.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| SegmentationError::Encode(e.to_string()))?;
    Ok(buffer)
}

pub fn to_data_uri(png: &[u8]) -> String {
    format!("{}{}", DATA_URI_PREFIX, BASE64_STANDARD.encode(png))
}
