//! Buffered document assembly: render all slides, then build one PDF.
//!
//! ## Why buffered vs. streaming?
//!
//! Unlike the archive in [`crate::stream`], a paginated document cannot be
//! finalized incrementally: every page embeds one fully decoded image into a
//! single evolving document object, and the cross-reference table is only
//! known once all pages exist. So this variant waits for the whole image
//! set (the pool still renders out of order, but results come back aligned
//! with slide order) and only then builds the container in memory.
//!
//! Each page is sized to the preset's pixel dimensions in points and carries
//! its slide's image full-bleed.

use crate::config::RenderOptions;
use crate::error::AssemblyError;
use crate::pipeline::markup::{build_slide_markup, SlideMarkup};
use crate::pipeline::pool;
use crate::pipeline::render::{render_slide, SlideRenderer};
use crate::post::{PostTheme, StructuredSlide};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info};

/// Render all slides and assemble them into a multi-page PDF.
///
/// Returns the complete PDF bytes. Render failures and undecodable image
/// bytes are terminal for the whole batch.
pub async fn render_slides_to_pdf(
    slides: &[StructuredSlide],
    theme: &PostTheme,
    renderer: Arc<dyn SlideRenderer>,
    options: &RenderOptions,
) -> Result<Vec<u8>, AssemblyError> {
    if slides.is_empty() {
        return Err(AssemblyError::NoSlides);
    }

    let total = slides.len();
    let markups: Vec<SlideMarkup> = slides
        .iter()
        .enumerate()
        .map(|(index, slide)| build_slide_markup(slide, theme, options.preset, index, total))
        .collect::<Result<_, _>>()?;

    info!(slides = total, concurrency = options.concurrency, "starting document assembly");
    let viewport = options.preset.viewport();
    let images = pool::run_limited(markups, options.concurrency, |index, markup| {
        let renderer = Arc::clone(&renderer);
        async move { render_slide(renderer.as_ref(), index, &markup, viewport).await }
    })
    .await?;

    let (page_width, page_height) = options.preset.dimensions();
    build_pdf(&images, page_width as i64, page_height as i64)
}

/// Build the PDF container from per-slide image bytes, in slide order.
fn build_pdf(images: &[Vec<u8>], page_width: i64, page_height: i64) -> Result<Vec<u8>, AssemblyError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(images.len());

    for (index, bytes) in images.iter().enumerate() {
        let decoded = image::load_from_memory(bytes).map_err(|e| AssemblyError::BadImage {
            position: index + 1,
            detail: e.to_string(),
        })?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        debug!(slide = index + 1, width, height, "embedding page image");

        let image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb.into_raw(),
        );
        let image_id = doc.add_object(image_stream);

        // Full-bleed: scale the unit image square to the page box.
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        page_width.into(),
                        0.into(),
                        0.into(),
                        page_height.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| AssemblyError::Document(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut Cursor::new(&mut bytes))
        .map_err(|e| AssemblyError::Document(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RenderPreset, Viewport};
    use crate::pipeline::render::RenderCallError;
    use async_trait::async_trait;
    use image::{ImageFormat, Rgb, RgbImage};

    /// Renderer producing a real PNG so PDF embedding can decode it.
    struct SolidPngRenderer;

    #[async_trait]
    impl SlideRenderer for SolidPngRenderer {
        async fn render(
            &self,
            _markup: &SlideMarkup,
            _viewport: Viewport,
        ) -> Result<Vec<u8>, RenderCallError> {
            let img = RgbImage::from_pixel(4, 5, Rgb([10, 20, 30]));
            let mut bytes = Vec::new();
            image::DynamicImage::ImageRgb8(img)
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                .map_err(|e| RenderCallError::new(e.to_string()))?;
            Ok(bytes)
        }
    }

    fn slides() -> Vec<StructuredSlide> {
        vec![
            StructuredSlide::Hero {
                variant: None,
                title: "T".into(),
                subtitle: "S".into(),
            },
            StructuredSlide::Paragraph {
                title: "P".into(),
                text: "Body".into(),
            },
            StructuredSlide::Cta {
                variant: None,
                text: "Go".into(),
            },
        ]
    }

    fn theme() -> PostTheme {
        PostTheme {
            background_color: "#111827".into(),
        }
    }

    #[tokio::test]
    async fn builds_one_page_per_slide() {
        let options = RenderOptions::builder()
            .preset(RenderPreset::LinkedIn)
            .build()
            .unwrap();
        let bytes = render_slides_to_pdf(&slides(), &theme(), Arc::new(SolidPngRenderer), &options)
            .await
            .unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[tokio::test]
    async fn empty_slides_are_rejected() {
        let err = render_slides_to_pdf(
            &[],
            &theme(),
            Arc::new(SolidPngRenderer),
            &RenderOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AssemblyError::NoSlides));
    }

    #[tokio::test]
    async fn undecodable_image_bytes_are_classified() {
        struct GarbageRenderer;

        #[async_trait]
        impl SlideRenderer for GarbageRenderer {
            async fn render(
                &self,
                _markup: &SlideMarkup,
                _viewport: Viewport,
            ) -> Result<Vec<u8>, RenderCallError> {
                Ok(b"not an image".to_vec())
            }
        }

        let err = render_slides_to_pdf(
            &slides(),
            &theme(),
            Arc::new(GarbageRenderer),
            &RenderOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AssemblyError::BadImage { position: 1, .. }));
    }
}
