// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print format configuration, receipt height table, and per-request render
// context.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable naming the wkhtmltopdf binary.
pub const WKHTMLTOPDF_ENV: &str = "WKHTMLTOPDF";

/// Page size keyword that switches a format into thermal geometry.
pub const CUSTOM_PAGE_SIZE: &str = "Custom";

/// A persisted print format, as edited by an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Named page size (`"A4"`, `"Letter"`, ...) or `"Custom"` for receipts.
    pub page_size: Option<String>,
    /// Custom page width, e.g. `"80mm"` or a bare number of millimetres.
    pub custom_width: Option<String>,
    /// Custom page height; ignored when `auto_height` can estimate one.
    pub custom_height: Option<String>,
    /// Estimate the page height from the document's content.
    pub auto_height: bool,
    /// Trim trailing blank space off each rendered page.
    pub crop_whitespace: bool,
    /// Print type handed back to the caller alongside the PDF.
    pub default_print_type: Option<String>,
    /// Overrides for the receipt height estimator.
    pub height_table: HeightTable,
}

impl FormatConfig {
    /// Whether this format uses custom (thermal) page geometry.
    pub fn is_custom(&self) -> bool {
        self.page_size.as_deref() == Some(CUSTOM_PAGE_SIZE)
    }
}

/// Section heights used to estimate a receipt's length, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightTable {
    /// Company name, address, receipt number.
    pub header_height: u32,
    /// Customer info block.
    pub customer_height: u32,
    /// Per item line, including UOM.
    pub item_height: u32,
    /// Extra height for an item that prints a discount line.
    pub discount_line_height: u32,
    /// Subtotal, discount, tax and grand total.
    pub totals_height: u32,
    /// Payment section header, only when payments exist.
    pub payment_base_height: u32,
    /// Per payment method.
    pub payment_line_height: u32,
    /// Thank-you message.
    pub footer_height: u32,
    pub buffer_height: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl Default for HeightTable {
    fn default() -> Self {
        Self {
            header_height: 10,
            customer_height: 8,
            item_height: 8,
            discount_line_height: 2,
            totals_height: 20,
            payment_base_height: 10,
            payment_line_height: 5,
            footer_height: 12,
            buffer_height: 5,
            min_height: 60,
            max_height: 500,
        }
    }
}

/// Request-scoped inputs that the pipeline would otherwise look up from its
/// host environment.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Session id forwarded to the engine as an `sid` cookie.
    pub session_id: Option<String>,
    /// Base URL used to make root-relative links absolute.
    pub base_url: Option<String>,
    /// Upper bound on a single engine invocation.
    pub timeout: Duration,
    /// Password applied to the assembled PDF.
    pub password: Option<String>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            session_id: None,
            base_url: None,
            timeout: Duration::from_secs(60),
            password: None,
        }
    }
}

/// Where to find the rendering engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path or bare name of the wkhtmltopdf executable.
    pub wkhtmltopdf: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wkhtmltopdf: PathBuf::from("wkhtmltopdf"),
        }
    }
}

impl EngineConfig {
    /// Defaults, with the binary taken from `$WKHTMLTOPDF` when it is set.
    pub fn from_env() -> Self {
        match std::env::var_os(WKHTMLTOPDF_ENV) {
            Some(path) if !path.is_empty() => Self {
                wkhtmltopdf: PathBuf::from(path),
            },
            _ => Self::default(),
        }
    }
}
