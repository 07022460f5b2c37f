//! Best-effort page rasterisation via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking thread pool
//! so Tokio workers never stall during rendering.
//!
//! ## Why `Option`, not `Result`?
//!
//! This stage is strictly advisory: the page image only enriches the model
//! request. A missing pdfium library, a corrupt page, or a render failure
//! must downgrade the request to text-only — never abort it. Every failure
//! path logs at warn and returns `None`.

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

/// Rasterise one page (zero-based index) of a PDF held in memory.
///
/// `max_pixels` caps the longest edge of the output regardless of physical
/// page size, keeping memory bounded for oversized pages.
pub async fn render_page(bytes: &[u8], page_index: usize, max_pixels: u32) -> Option<DynamicImage> {
    let owned = bytes.to_vec();
    match tokio::task::spawn_blocking(move || render_page_blocking(&owned, page_index, max_pixels))
        .await
    {
        Ok(image) => image,
        Err(e) => {
            warn!(error = %e, "Render task panicked; continuing without page image");
            None
        }
    }
}

/// Blocking implementation of page rendering.
fn render_page_blocking(bytes: &[u8], page_index: usize, max_pixels: u32) -> Option<DynamicImage> {
    let bindings = match Pdfium::bind_to_system_library() {
        Ok(bindings) => bindings,
        Err(e) => {
            warn!(error = %e, "pdfium unavailable; continuing without page image");
            return None;
        }
    };
    let pdfium = Pdfium::new(bindings);

    let document = match pdfium.load_pdf_from_byte_slice(bytes, None) {
        Ok(document) => document,
        Err(e) => {
            warn!(error = ?e, "pdfium could not open document; continuing without page image");
            return None;
        }
    };

    let pages = document.pages();
    let page = match pages.get(page_index as u16) {
        Ok(page) => page,
        Err(e) => {
            warn!(page = page_index + 1, error = ?e, "Page unavailable for rendering");
            return None;
        }
    };

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let rendered = page.render_with_config(&render_config);
    match rendered {
        Ok(bitmap) => {
            let image = bitmap.as_image();
            debug!(
                page = page_index + 1,
                width = image.width(),
                height = image.height(),
                "Rendered page"
            );
            Some(image)
        }
        Err(e) => {
            warn!(page = page_index + 1, error = ?e, "Rasterisation failed; continuing without page image");
            None
        }
    }
}
