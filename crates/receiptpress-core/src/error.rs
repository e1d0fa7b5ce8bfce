// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for receiptpress.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all receiptpress operations.
#[derive(Debug, Error)]
pub enum ReceiptpressError {
    // -- Rendering engine --
    /// The engine reported a content error and produced no output at all.
    #[error("PDF generation failed because of broken image links")]
    BrokenImageLinks,

    /// Any engine failure that is not a recognised content error. The message
    /// is the engine's own, unmodified.
    #[error("{message}")]
    Engine { message: String, partial_len: usize },

    #[error("rendering engine did not finish within {0:?}")]
    EngineTimeout(Duration),

    #[error("rendering engine unavailable: {0}")]
    EngineUnavailable(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    // -- Host / persistence --
    #[error("host lookup failed: {0}")]
    Host(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReceiptpressError>;
