use crate::{error::SegmentationError, model_service::INPUT_SIZE};
use image::{imageops::FilterType, DynamicImage, RgbImage};
use ndarray::Array4;

/// Decodes an uploaded file, guessing the format from its contents.
pub fn decode_image(image_data: &[u8]) -> Result<DynamicImage, SegmentationError> {
    let image_reader = image::ImageReader::new(std::io::Cursor::new(image_data))
        .with_guessed_format()
        .map_err(|e| SegmentationError::Upload(format!("failed to sniff image format: {}", e)))?;

    Ok(image_reader.decode()?)
}

/// Drops alpha, stretches to the model's square input and scales to [0, 1].
/// Aspect ratio is not preserved.
pub fn to_input_tensor(image: &DynamicImage) -> Array4<f32> {
    let rgb: RgbImage = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);

    let size = INPUT_SIZE as usize;
    let mut input = Array4::<f32>::zeros((1, size, size, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let (x, y) = (x as usize, y as usize);
        input[[0, y, x, 0]] = (r as f32) / 255.;
        input[[0, y, x, 1]] = (g as f32) / 255.;
        input[[0, y, x, 2]] = (b as f32) / 255.;
    }

    input
}
