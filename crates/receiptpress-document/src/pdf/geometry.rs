// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page content geometry — where text and images land on a page.
//
// The page's content stream is interpreted just far enough to place things:
// the graphics state stack (q/Q/cm), the text state (BT/ET, Tf, TL, Ts,
// Td/TD/Tm/T*), text showing (Tj, TJ, ', ") and XObjects (Do). Glyph extents
// are approximated from the font size, which is exact enough vertically for
// finding where content stops.
//
// Coordinates are returned top-down: y grows from the top edge of the page
// box, matching how the cropper reasons about "space below the content".

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use receiptpress_core::error::{ReceiptpressError, Result};

use super::assembler::inherited_attribute;

/// Portion of the font size above the baseline.
const ASCENT: f32 = 0.8;
/// Portion of the font size below the baseline.
const DESCENT: f32 = 0.2;
/// Average advance width of a glyph, as a fraction of the font size.
const AVERAGE_ADVANCE: f32 = 0.5;
/// Nesting limit for form XObjects.
const MAX_FORM_DEPTH: usize = 8;

/// Axis-aligned rectangle in top-down page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    fn union(self, other: Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A unit of page content: one text object or one image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentBlock {
    pub bbox: Option<Rect>,
    /// Text lines inside the block; empty for images.
    pub lines: Vec<Rect>,
}

/// The page box in PDF user space, `[llx, lly, urx, ury]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// Convert a user-space point into top-down coordinates.
    fn to_top_down(self, x: f32, y: f32) -> (f32, f32) {
        (x - self.llx, self.ury - y)
    }
}

/// Visible page box: CropBox when present, otherwise MediaBox. Either may be
/// inherited.
pub fn page_box(doc: &Document, page_id: ObjectId) -> Result<PageBox> {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|err| pdf_error(format!("cannot read page {:?}: {}", page_id, err)))?;

    for key in [b"CropBox".as_slice(), b"MediaBox".as_slice()] {
        let value = match page.get(key) {
            Ok(value) => Some(value.clone()),
            Err(_) => inherited_attribute(doc, page, key),
        };
        if let Some(value) = value {
            return parse_box(doc, &value);
        }
    }
    Err(pdf_error(format!("page {:?} has no MediaBox", page_id)))
}

fn parse_box(doc: &Document, value: &Object) -> Result<PageBox> {
    let items = resolve(doc, value)
        .as_array()
        .map_err(|err| pdf_error(format!("page box is not an array: {}", err)))?;
    let numbers: Vec<f32> = items
        .iter()
        .filter_map(|item| number(resolve(doc, item)))
        .collect();
    let &[a, b, c, d] = numbers.as_slice() else {
        return Err(pdf_error(format!("page box has {} numbers", numbers.len())));
    };
    Ok(PageBox {
        llx: a.min(c),
        lly: b.min(d),
        urx: a.max(c),
        ury: b.max(d),
    })
}

/// Extract the content blocks drawn on a page.
pub fn page_blocks(doc: &Document, page_id: ObjectId) -> Result<Vec<ContentBlock>> {
    let page_box = page_box(doc, page_id)?;
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|err| pdf_error(format!("cannot read page {:?}: {}", page_id, err)))?;

    let resources = match page.get(b"Resources") {
        Ok(value) => Some(value.clone()),
        Err(_) => inherited_attribute(doc, page, b"Resources"),
    };
    let resources = resources.and_then(|value| resolve(doc, &value).as_dict().ok().cloned());

    let bytes = doc
        .get_page_content(page_id)
        .map_err(|err| pdf_error(format!("cannot read page content: {}", err)))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let content = Content::decode(&bytes)
        .map_err(|err| pdf_error(format!("cannot decode page content: {}", err)))?;

    let mut walker = ContentWalker::new(doc, page_box);
    walker.walk(&content.operations, resources.as_ref(), Matrix::IDENTITY, 0);
    Ok(walker.blocks)
}

/// Row-vector affine transform `[a b c d e f]`, as PDF writes it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f32, ty: f32) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self` applied first, then `other`.
    fn then(self, other: Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn apply(self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        let values: Vec<f32> = operands.iter().filter_map(number).collect();
        let &[a, b, c, d, e, f] = values.as_slice() else {
            return None;
        };
        Some(Matrix([a, b, c, d, e, f]))
    }
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    font_size: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_size: 0.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

impl TextState {
    fn next_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).then(self.line_matrix);
        self.matrix = self.line_matrix;
    }
}

struct ContentWalker<'a> {
    doc: &'a Document,
    page_box: PageBox,
    blocks: Vec<ContentBlock>,
}

impl<'a> ContentWalker<'a> {
    fn new(doc: &'a Document, page_box: PageBox) -> Self {
        Self {
            doc,
            page_box,
            blocks: Vec::new(),
        }
    }

    fn walk(
        &mut self,
        operations: &[Operation],
        resources: Option<&Dictionary>,
        base: Matrix,
        depth: usize,
    ) {
        let mut ctm = base;
        let mut stack: Vec<Matrix> = Vec::new();
        // Font size, leading and rise persist across text objects.
        let mut text = TextState::default();
        let mut block: Option<ContentBlock> = None;

        for op in operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => stack.push(ctm),
                "Q" => ctm = stack.pop().unwrap_or(base),
                "cm" => {
                    if let Some(matrix) = Matrix::from_operands(operands) {
                        ctm = matrix.then(ctm);
                    }
                }
                "BT" => {
                    text.matrix = Matrix::IDENTITY;
                    text.line_matrix = Matrix::IDENTITY;
                    block = Some(ContentBlock::default());
                }
                "ET" => {
                    if let Some(finished) = block.take().filter(|b| b.bbox.is_some()) {
                        self.blocks.push(finished);
                    }
                }
                "Tf" => {
                    if let Some(size) = operands.get(1).and_then(number) {
                        text.font_size = size;
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(number) {
                        text.leading = leading;
                    }
                }
                "Ts" => {
                    if let Some(rise) = operands.first().and_then(number) {
                        text.rise = rise;
                    }
                }
                "Td" | "TD" => {
                    if let (Some(tx), Some(ty)) = (
                        operands.first().and_then(number),
                        operands.get(1).and_then(number),
                    ) {
                        if op.operator == "TD" {
                            text.leading = -ty;
                        }
                        text.next_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(matrix) = Matrix::from_operands(operands) {
                        text.line_matrix = matrix;
                        text.matrix = matrix;
                    }
                }
                "T*" => text.next_line(0.0, -text.leading),
                "Tj" => self.show_text(&mut text, ctm, block.as_mut(), operands),
                "TJ" => self.show_text(&mut text, ctm, block.as_mut(), operands),
                "'" => {
                    text.next_line(0.0, -text.leading);
                    self.show_text(&mut text, ctm, block.as_mut(), operands);
                }
                "\"" => {
                    text.next_line(0.0, -text.leading);
                    self.show_text(&mut text, ctm, block.as_mut(), operands.get(2..).unwrap_or(&[]));
                }
                "Do" => {
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        self.draw_xobject(name, resources, ctm, depth);
                    }
                }
                _ => {}
            }
        }
    }

    /// Record the extent of a text-showing operation and advance the text
    /// matrix past it.
    fn show_text(
        &self,
        text: &mut TextState,
        ctm: Matrix,
        block: Option<&mut ContentBlock>,
        operands: &[Object],
    ) {
        let size = text.font_size;
        let mut advance = 0.0;
        let mut glyphs = 0usize;
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    glyphs += bytes.len();
                    advance += bytes.len() as f32 * AVERAGE_ADVANCE * size;
                }
                Object::Array(items) => {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                glyphs += bytes.len();
                                advance += bytes.len() as f32 * AVERAGE_ADVANCE * size;
                            }
                            other => {
                                if let Some(adjust) = number(other) {
                                    advance -= adjust / 1000.0 * size;
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        if glyphs > 0 && size != 0.0 {
            let trm = text.matrix.then(ctm);
            let bottom = text.rise - DESCENT * size.abs();
            let top = text.rise + ASCENT * size.abs();
            let line = self.bounds(trm, [(0.0, bottom), (advance, bottom), (0.0, top), (advance, top)]);
            if let Some(block) = block {
                block.bbox = Some(block.bbox.map_or(line, |bbox| bbox.union(line)));
                block.lines.push(line);
            }
        }

        text.matrix = Matrix::translate(advance, 0.0).then(text.matrix);
    }

    fn draw_xobject(&mut self, name: &[u8], resources: Option<&Dictionary>, ctm: Matrix, depth: usize) {
        let Some(stream) = resources
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|xobjects| resolve(self.doc, xobjects).as_dict().ok())
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|xobject| resolve(self.doc, xobject).as_stream().ok())
        else {
            return;
        };

        let subtype = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .unwrap_or_default();

        match subtype {
            b"Image" => {
                let bbox = self.bounds(ctm, [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
                self.blocks.push(ContentBlock {
                    bbox: Some(bbox),
                    lines: Vec::new(),
                });
            }
            b"Form" if depth < MAX_FORM_DEPTH => {
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|m| resolve(self.doc, m).as_array().ok())
                    .and_then(|m| Matrix::from_operands(m))
                    .unwrap_or(Matrix::IDENTITY);
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve(self.doc, r).as_dict().ok())
                    .cloned();
                let bytes = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                if let Ok(content) = Content::decode(&bytes) {
                    let resources = form_resources.as_ref().or(resources);
                    self.walk(&content.operations, resources, form_matrix.then(ctm), depth + 1);
                }
            }
            _ => {}
        }
    }

    /// Bounding box of user-space points after `matrix`, in top-down
    /// coordinates.
    fn bounds(&self, matrix: Matrix, points: [(f32, f32); 4]) -> Rect {
        let mut rect: Option<Rect> = None;
        for (x, y) in points {
            let (ux, uy) = matrix.apply(x, y);
            let (tx, ty) = self.page_box.to_top_down(ux, uy);
            let point = Rect {
                x0: tx,
                y0: ty,
                x1: tx,
                y1: ty,
            };
            rect = Some(rect.map_or(point, |r| r.union(point)));
        }
        rect.unwrap_or(Rect {
            x0: 0.0,
            y0: 0.0,
            x1: 0.0,
            y1: 0.0,
        })
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

fn pdf_error(message: String) -> ReceiptpressError {
    ReceiptpressError::PdfError(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{FONT_SIZE, FixturePage, RECEIPT_WIDTH, receipt_pdf};

    fn first_page(bytes: &[u8]) -> (Document, ObjectId) {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        (doc, page_id)
    }

    #[test]
    fn text_lines_are_placed_top_down() {
        let bytes = receipt_pdf(&[FixturePage::new(600.0, &[40.0, 100.0])]);
        let (doc, page_id) = first_page(&bytes);

        let blocks = page_blocks(&doc, page_id).unwrap();
        assert_eq!(blocks.len(), 2);

        let line = blocks[1].lines[0];
        assert!((line.y1 - (100.0 + DESCENT * FONT_SIZE)).abs() < 0.01);
        assert!((line.y0 - (100.0 - ASCENT * FONT_SIZE)).abs() < 0.01);
        assert!((line.x0 - 10.0).abs() < 0.01);
        assert_eq!(blocks[1].bbox, Some(line));
    }

    #[test]
    fn images_become_blocks_without_lines() {
        let bytes = receipt_pdf(&[FixturePage::new(500.0, &[]).with_image(20.0, 80.0)]);
        let (doc, page_id) = first_page(&bytes);

        let blocks = page_blocks(&doc, page_id).unwrap();
        assert_eq!(blocks.len(), 1);
        let bbox = blocks[0].bbox.unwrap();
        assert!(blocks[0].lines.is_empty());
        assert!((bbox.y0 - 20.0).abs() < 0.01);
        assert!((bbox.y1 - 80.0).abs() < 0.01);
        assert!((bbox.x1 - RECEIPT_WIDTH).abs() < 0.01);
    }

    #[test]
    fn blank_page_has_no_blocks() {
        let bytes = receipt_pdf(&[FixturePage::new(300.0, &[])]);
        let (doc, page_id) = first_page(&bytes);
        assert!(page_blocks(&doc, page_id).unwrap().is_empty());
    }

    #[test]
    fn inherited_media_box_is_found() {
        let bytes = receipt_pdf(&[FixturePage::new(333.0, &[10.0])]);
        let (doc, page_id) = first_page(&bytes);

        let page_box = page_box(&doc, page_id).unwrap();
        assert_eq!(page_box.height(), 333.0);
        assert_eq!(page_box.width(), RECEIPT_WIDTH);
    }

    #[test]
    fn matrices_compose_in_pdf_order() {
        // Scale by 2, then move up 10: (1, 1) -> (2, 12).
        let scale = Matrix([2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        let combined = scale.then(Matrix::translate(0.0, 10.0));
        assert_eq!(combined.apply(1.0, 1.0), (2.0, 12.0));
    }
}
