use crate::error::DetectionError;
use crate::tensor::{ImageTensor, MODEL_INPUT_HEIGHT, MODEL_INPUT_WIDTH};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};

/// Decode an encoded image (format sniffed from the bytes) into the model
/// input tensor: RGB, stretched to 640x640 with bilinear interpolation,
/// NCHW float, normalized to `[0.0, 1.0]`.
///
/// Any decodable image is accepted; there is no size or format allow-list.
pub fn prepare_image(bytes: &[u8]) -> Result<ImageTensor, DetectionError> {
    if bytes.is_empty() {
        return Err(DetectionError::ImageDecode(
            "empty image payload".to_string(),
        ));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| DetectionError::ImageDecode(e.to_string()))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    tracing::trace!(width, height, payload_bytes = bytes.len(), "Decoded image");

    let mut rgb_data = rgb.into_raw();
    let src = Image::from_slice_u8(width, height, &mut rgb_data, PixelType::U8x3)
        .map_err(|e| DetectionError::ImageDecode(e.to_string()))?;

    // Stretch to the input size regardless of aspect ratio; the model was
    // trained on stretched inputs, not letterboxed ones.
    let mut resized = Image::new(MODEL_INPUT_WIDTH, MODEL_INPUT_HEIGHT, PixelType::U8x3);
    Resizer::new()
        .resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )
        .map_err(|e| DetectionError::ImageDecode(e.to_string()))?;

    normalize(resized.buffer())
}

fn normalize(buf: &[u8]) -> Result<ImageTensor, DetectionError> {
    let spatial = (MODEL_INPUT_WIDTH * MODEL_INPUT_HEIGHT) as usize;
    let mut pixels = vec![0.0f32; 3 * spatial];

    for (i, px) in buf.chunks_exact(3).enumerate() {
        pixels[i] = px[0] as f32 / 255.0;
        pixels[i + spatial] = px[1] as f32 / 255.0;
        pixels[i + 2 * spatial] = px[2] as f32 / 255.0;
    }

    ImageTensor::from_pixels(pixels)
}
