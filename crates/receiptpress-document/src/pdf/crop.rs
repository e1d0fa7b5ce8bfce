// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Whitespace cropping — trim the blank tail off receipt pages.
//
// Cropping is best-effort: any failure while inspecting or rewriting the PDF
// is logged and the input is returned unchanged.

use lopdf::{Document, Object, ObjectId};
use receiptpress_core::error::{ReceiptpressError, Result};
use tracing::{debug, info, instrument, warn};

use super::assembler::inherited_attribute;
use super::geometry::{ContentBlock, page_blocks, page_box};

/// Space kept below the deepest content, in points (about 5mm).
pub const DEFAULT_BOTTOM_BUFFER: f32 = 15.0;
/// Pages are only cropped when at least this much would be saved, in points.
pub const DEFAULT_MIN_SAVING: f32 = 20.0;

/// Crops trailing whitespace from each page of a PDF.
#[derive(Debug, Clone, Copy)]
pub struct WhitespaceCropper {
    bottom_buffer: f32,
    min_saving: f32,
}

impl Default for WhitespaceCropper {
    fn default() -> Self {
        Self::new(DEFAULT_BOTTOM_BUFFER, DEFAULT_MIN_SAVING)
    }
}

impl WhitespaceCropper {
    pub fn new(bottom_buffer: f32, min_saving: f32) -> Self {
        Self {
            bottom_buffer,
            min_saving,
        }
    }

    /// Crop `pdf`, falling back to the original bytes on any failure.
    #[instrument(skip_all, fields(bytes_len = pdf.len()))]
    pub fn crop(&self, pdf: &[u8]) -> Vec<u8> {
        match self.try_crop(pdf) {
            Ok(Some(cropped)) => cropped,
            Ok(None) => pdf.to_vec(),
            Err(err) => {
                warn!(%err, "PDF cropping failed, keeping original");
                pdf.to_vec()
            }
        }
    }

    /// Crop `pdf`. Returns `None` when no page needed cropping.
    pub fn try_crop(&self, pdf: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut doc = Document::load_mem(pdf).map_err(|err| {
            ReceiptpressError::PdfError(format!("failed to load PDF for cropping: {}", err))
        })?;

        let mut cropped_pages = 0usize;
        for (page_number, page_id) in doc.get_pages() {
            let rotation = page_rotation(&doc, page_id);
            if rotation != 0 {
                warn!(page_number, rotation, "rotated page, not cropping");
                continue;
            }

            let blocks = page_blocks(&doc, page_id)?;
            let Some(deepest) = content_bottom(&blocks) else {
                continue;
            };

            let page_box = page_box(&doc, page_id)?;
            let new_bottom = deepest + self.bottom_buffer;
            let saving = page_box.height() - new_bottom;
            if saving <= self.min_saving {
                debug!(page_number, saving, "page already tight");
                continue;
            }

            // Keep the left, right and top edges; raise the bottom.
            let crop_box = vec![
                Object::Real(page_box.llx),
                Object::Real(page_box.ury - new_bottom),
                Object::Real(page_box.urx),
                Object::Real(page_box.ury),
            ];
            doc.get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|err| {
                    ReceiptpressError::PdfError(format!("cannot update page {}: {}", page_number, err))
                })?
                .set("CropBox", Object::Array(crop_box));

            debug!(page_number, new_height = new_bottom, saving, "page cropped");
            cropped_pages += 1;
        }

        if cropped_pages == 0 {
            return Ok(None);
        }

        let mut output = Vec::new();
        doc.save_to(&mut output).map_err(|err| {
            ReceiptpressError::PdfError(format!("failed to serialise cropped PDF: {}", err))
        })?;

        info!(cropped_pages, output_bytes = output.len(), "PDF whitespace cropped");
        Ok(Some(output))
    }
}

/// The page's `/Rotate` in degrees, normalised to 0..360.
fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
        return 0;
    };
    let rotate = match page.get(b"Rotate") {
        Ok(value) => Some(value.clone()),
        Err(_) => inherited_attribute(doc, page, b"Rotate"),
    };
    rotate
        .and_then(|value| value.as_i64().ok())
        .map_or(0, |degrees| degrees.rem_euclid(360))
}

/// Lowest content edge across all blocks and their lines, in top-down
/// coordinates. `None` when nothing sits below the page top.
pub fn content_bottom(blocks: &[ContentBlock]) -> Option<f32> {
    let deepest = blocks
        .iter()
        .flat_map(|block| block.bbox.iter().chain(block.lines.iter()))
        .map(|rect| rect.y1)
        .fold(0.0_f32, f32::max);
    (deepest > 0.0).then_some(deepest)
}
