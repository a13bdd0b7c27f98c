//! Visual-snapshot PDF export.
//!
//! The resume is captured from its rendered surface, not from the data model,
//! and embedded as one full-width image on a single page.
//!
//! # Page geometry
//! Page width is fixed (A4). Page height follows the image's aspect ratio:
//! `page_height = image_height * page_width / image_width`.
//!
//! Known limitation: content taller than an A4 page is not split across pages.
//! It lands on one tall page and shrinks accordingly when printed on A4.
//! True pagination needs a layout-aware renderer, not a raster snapshot.

use std::io::Write;

use bytes::Bytes;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::export::error::ExportError;
use crate::export::surface::RenderSurface;
use crate::export::{ExportArtifact, ExportFormat};

const IMAGE_RESOURCE_NAME: &str = "Im1";

/// Fixed page geometry, in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_pt: f32,
}

impl PageGeometry {
    /// A4 portrait: 210mm wide.
    pub const A4: PageGeometry = PageGeometry { width_pt: 595.28 };

    /// Height of a page that shows an image of the given pixel size at full width.
    pub fn page_height_for(&self, image_width: u32, image_height: u32) -> f32 {
        image_height as f32 * self.width_pt / image_width as f32
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Captures the surface and returns a finished `resume.pdf` artifact.
pub async fn format_as_pdf(
    surface: &dyn RenderSurface,
    geometry: &PageGeometry,
) -> Result<ExportArtifact, ExportError> {
    let image = surface.rasterize().await?;
    if image.width() == 0 || image.height() == 0 {
        return Err(ExportError::Capture(format!(
            "surface rasterized to an empty {}x{} image",
            image.width(),
            image.height()
        )));
    }

    let geometry = *geometry;
    let bytes = tokio::task::spawn_blocking(move || embed_image(&image, &geometry)).await??;

    Ok(ExportArtifact::new(ExportFormat::Pdf, Bytes::from(bytes)))
}

fn deflate(raw: &[u8]) -> Result<Vec<u8>, ExportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(raw)
        .map_err(|e| ExportError::Encoding(format!("compressing image: {e}")))?;
    encoder
        .finish()
        .map_err(|e| ExportError::Encoding(format!("compressing image: {e}")))
}

fn image_xobject(width: u32, height: u32, color_space: &str, data: Vec<u8>) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        data,
    )
}

/// Builds a single-page PDF with the image drawn at full page width from the origin.
///
/// Transparency survives as a soft mask, so transparent regions show the
/// white page instead of black pixels.
pub fn embed_image(image: &DynamicImage, geometry: &PageGeometry) -> Result<Vec<u8>, ExportError> {
    let rgb = image.to_rgb8();
    let (px_width, px_height) = rgb.dimensions();
    let page_width = geometry.width_pt;
    let page_height = geometry.page_height_for(px_width, px_height);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut xobject = image_xobject(px_width, px_height, "DeviceRGB", deflate(rgb.as_raw())?);
    if image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let smask_id = doc.add_object(image_xobject(
            px_width,
            px_height,
            "DeviceGray",
            deflate(&alpha)?,
        ));
        xobject.dict.set("SMask", smask_id);
    }
    let image_id = doc.add_object(xobject);

    // Scale the unit square to the page; the image covers the whole page.
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
            Operation::new("Do", vec![IMAGE_RESOURCE_NAME.into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_RESOURCE_NAME => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ExportError::Encoding(format!("writing pdf: {e}")))?;

    debug!(
        "Embedded {}x{} snapshot on {:.2}x{:.2}pt page ({} bytes)",
        px_width,
        px_height,
        page_width,
        page_height,
        out.len()
    );
    Ok(out)
}
