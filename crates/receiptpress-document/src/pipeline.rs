// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print pipeline — from a document and a print format to a base64 PDF payload.
//
// The host (document store, template renderer, format settings) sits behind
// the `PrintHost` trait so the pipeline never reaches for ambient state.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use receiptpress_core::error::Result;
use receiptpress_core::{FormatConfig, PrintPayload, ReceiptDocument, RenderContext};
use tracing::{info, instrument, warn};

use crate::engine::RenderEngine;
use crate::merge::prepare_options;
use crate::options::build_page_options;
use crate::pdf::WhitespaceCropper;
use crate::render::PdfRenderer;

/// The system the receipts come from.
pub trait PrintHost {
    /// Look up a print format. `None` when no format has that name.
    fn format(&self, name: &str) -> Result<Option<FormatConfig>>;

    /// Render the document's HTML with the given format.
    fn html(&self, doctype: &str, name: &str, format: &str) -> Result<String>;

    /// Load the structured document, for height estimation.
    fn document(&self, doctype: &str, name: &str) -> Result<Option<ReceiptDocument>>;
}

/// Render `html` to PDF bytes under `format`.
///
/// `doc` feeds the height estimator when the format uses automatic height.
pub async fn render_pdf<E: RenderEngine>(
    renderer: &PdfRenderer<E>,
    ctx: &RenderContext,
    html: &str,
    format: &FormatConfig,
    doc: Option<&ReceiptDocument>,
) -> Result<Vec<u8>> {
    let options = build_page_options(format, doc);
    let (html, options) = prepare_options(html, options, ctx);
    let pdf = renderer.render(&html, &options, ctx.timeout).await?;

    if format.crop_whitespace {
        Ok(WhitespaceCropper::default().crop(&pdf))
    } else {
        Ok(pdf)
    }
}

/// Build the print payload for one document.
///
/// Returns `Ok(None)` when `format_name` does not name a print format.
#[instrument(skip(host, renderer, ctx))]
pub async fn create_pdf<H: PrintHost, E: RenderEngine>(
    host: &H,
    renderer: &PdfRenderer<E>,
    ctx: &RenderContext,
    doctype: &str,
    name: &str,
    format_name: &str,
) -> Result<Option<PrintPayload>> {
    let Some(format) = host.format(format_name)? else {
        info!("print format not found, nothing to print");
        return Ok(None);
    };

    let html = host.html(doctype, name, format_name)?;

    let doc = if format.auto_height {
        match host.document(doctype, name) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(%err, "could not load document, using configured height");
                None
            }
        }
    } else {
        None
    };

    let pdf = render_pdf(renderer, ctx, &html, &format, doc.as_ref()).await?;
    info!(pdf_bytes = pdf.len(), "print payload ready");

    Ok(Some(PrintPayload {
        print_type: format.default_print_type.clone(),
        pdf_base64: STANDARD.encode(&pdf),
    }))
}
