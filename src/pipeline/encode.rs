//! Image encoding: `DynamicImage` → base64 PNG wrapped in `ImageData`.
//!
//! The model API accepts images as base64 data embedded in the JSON request
//! body. PNG is chosen over JPEG because it is lossless — text crispness on
//! the rendered page matters far more than payload size for extraction
//! accuracy. `detail: "high"` asks GPT-4-class models to spend their full
//! image tile budget; without it fine print and small tables are lost.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as a base64 PNG ready for the model API.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(bytes = b64.len(), "Encoded page image");

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let data = encode_page(&img).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        assert!(!data.data.is_empty());
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        // PNG magic bytes survive the round trip.
        assert_eq!(&decoded[..4], &[0x89, b'P', b'N', b'G']);
    }
}
