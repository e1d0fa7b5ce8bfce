// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// receiptpress-document — HTML-to-PDF rendering for receipts and other print
// formats.
//
// Provides receipt height estimation, page option building, HTML directive
// merging, the wkhtmltopdf engine driver, PDF page assembly, and whitespace
// cropping, tied together by the print pipeline.

pub mod engine;
pub mod height;
pub mod html;
pub mod merge;
pub mod options;
pub mod pdf;
pub mod pipeline;
pub mod render;

// Re-export the primary entry points so callers can use
// `receiptpress_document::PdfRenderer` etc.
pub use engine::{EngineFailure, EngineVersion, RenderEngine, WkhtmltopdfEngine};
pub use height::estimate_height;
pub use html::read_options_from_html;
pub use merge::prepare_options;
pub use options::{OptionMap, OptionValue, RenderOptions, build_page_options};
pub use pdf::{PdfAssembler, WhitespaceCropper};
pub use pipeline::{PrintHost, create_pdf, render_pdf};
pub use render::PdfRenderer;
