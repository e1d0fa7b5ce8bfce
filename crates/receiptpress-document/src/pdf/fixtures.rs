// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small receipt-shaped PDFs built with lopdf for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Receipt width in points (80mm).
pub const RECEIPT_WIDTH: f32 = 226.0;
pub const FONT_SIZE: f32 = 10.0;

/// One page: its height and what is drawn on it, all in points measured down
/// from the top edge.
pub struct FixturePage {
    pub height: f32,
    /// Baselines of 10pt text lines.
    pub baselines: Vec<f32>,
    /// Top and bottom edge of a full-width image.
    pub image: Option<(f32, f32)>,
    /// `/Rotate` set on the page dictionary.
    pub rotate: Option<i64>,
}

impl FixturePage {
    pub fn new(height: f32, baselines: &[f32]) -> Self {
        Self {
            height,
            baselines: baselines.to_vec(),
            image: None,
            rotate: None,
        }
    }

    pub fn with_image(mut self, top: f32, bottom: f32) -> Self {
        self.image = Some((top, bottom));
        self
    }

    pub fn with_rotation(mut self, degrees: i64) -> Self {
        self.rotate = Some(degrees);
        self
    }
}

/// Build a PDF with the given pages. The first page's MediaBox lives on the
/// `/Pages` node, so pages of the same height inherit it.
pub fn receipt_pdf(pages: &[FixturePage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0],
    ));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let first_height = pages.first().map_or(842.0, |page| page.height);
    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if page.height != first_height {
            page_dict.set("MediaBox", media_box(page.height));
        }
        if let Some(degrees) = page.rotate {
            page_dict.set("Rotate", Object::Integer(degrees));
        }
        kids.push(doc.add_object(page_dict).into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => media_box(first_height),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn media_box(height: f32) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(RECEIPT_WIDTH),
        Object::Real(height),
    ])
}

fn page_operations(page: &FixturePage) -> Vec<Operation> {
    let mut ops = Vec::new();
    for baseline in &page.baselines {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), Object::Real(FONT_SIZE)]));
        ops.push(Operation::new(
            "Td",
            vec![Object::Real(10.0), Object::Real(page.height - baseline)],
        ));
        ops.push(Operation::new("Tj", vec![Object::string_literal("Item 1 x 2.50")]));
        ops.push(Operation::new("ET", vec![]));
    }
    if let Some((top, bottom)) = page.image {
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                Object::Real(RECEIPT_WIDTH),
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(bottom - top),
                Object::Integer(0),
                Object::Real(page.height - bottom),
            ],
        ));
        ops.push(Operation::new("Do", vec!["Im1".into()]));
        ops.push(Operation::new("Q", vec![]));
    }
    ops
}
