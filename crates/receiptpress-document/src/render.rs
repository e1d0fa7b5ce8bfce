// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF renderer — drive the engine, recover from content failures, and
// assemble the output.
//
// Content errors (a missing image, a refused remote fetch) are classified by
// the engine's message. When the engine still produced a PDF the pages are
// kept; when it produced nothing the failure is reported as broken image links.

use std::time::Duration;

use receiptpress_core::error::{ReceiptpressError, Result};
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use crate::engine::{EngineFailure, EngineVersion, RenderEngine};
use crate::options::{PASSWORD_OPTION, RenderOptions};
use crate::pdf::PdfAssembler;

/// Engine messages that mark a recoverable content failure.
pub const CONTENT_ERRORS: [&str; 4] = [
    "ContentNotFoundError",
    "ContentOperationNotPermittedError",
    "UnknownContentError",
    "RemoteHostClosedError",
];

/// Flags added to every render.
const SECURITY_FLAGS: [&str; 2] = ["disable-javascript", "disable-local-file-access"];
const SMART_SHRINKING_FLAG: &str = "disable-smart-shrinking";

/// Renders HTML to PDF through a [`RenderEngine`].
///
/// The engine version is queried once per renderer and reused.
pub struct PdfRenderer<E> {
    engine: E,
    version: OnceCell<Option<EngineVersion>>,
}

impl<E: RenderEngine> PdfRenderer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            version: OnceCell::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Render `html` into a standalone PDF. A `password` option encrypts it.
    #[instrument(skip_all, fields(thermal = options.is_thermal(), html_len = html.len()))]
    pub async fn render(
        &self,
        html: &str,
        options: &RenderOptions,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let bytes = self.render_bytes(html, options, timeout).await?;

        let mut assembler = PdfAssembler::new();
        assembler.append_pdf(&bytes)?;
        let password = options
            .map()
            .get_text(PASSWORD_OPTION)
            .filter(|password| !password.is_empty());
        assembler.finish(password)
    }

    /// Render `html` and append its pages to `assembler`. Returns the number of
    /// pages appended. Passwords are left to whoever finishes the assembler.
    #[instrument(skip_all, fields(thermal = options.is_thermal(), html_len = html.len()))]
    pub async fn render_into(
        &self,
        html: &str,
        options: &RenderOptions,
        timeout: Duration,
        assembler: &mut PdfAssembler,
    ) -> Result<usize> {
        let bytes = self.render_bytes(html, options, timeout).await?;
        assembler.append_pdf(&bytes)
    }

    /// The command-line arguments a render with `options` would use.
    pub async fn engine_args(&self, options: &RenderOptions) -> Vec<String> {
        let mut map = options.map().clone();
        for flag in SECURITY_FLAGS {
            map.insert_flag(flag);
        }
        if self
            .engine_version()
            .await
            .is_some_and(EngineVersion::supports_smart_shrinking_toggle)
        {
            map.insert_flag(SMART_SHRINKING_FLAG);
        }
        map.to_engine_args()
    }

    async fn engine_version(&self) -> Option<&EngineVersion> {
        self.version
            .get_or_init(|| async {
                match self.engine.version().await {
                    Ok(version) => Some(version),
                    Err(err) => {
                        warn!(%err, "could not determine engine version");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }

    async fn render_bytes(
        &self,
        html: &str,
        options: &RenderOptions,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let args = self.engine_args(options).await;
        match self.engine.render(html, &args, timeout).await {
            Ok(bytes) => {
                debug!(pdf_bytes = bytes.len(), "engine output received");
                Ok(bytes)
            }
            Err(EngineFailure::Exited { message, output }) => recover(message, output),
            Err(EngineFailure::Fatal(err)) => Err(err),
        }
    }
}

/// Decide what an engine failure means for the render.
fn recover(message: String, output: Vec<u8>) -> Result<Vec<u8>> {
    if !is_content_error(&message) {
        return Err(ReceiptpressError::Engine {
            message,
            partial_len: output.len(),
        });
    }
    if output.is_empty() {
        return Err(ReceiptpressError::BrokenImageLinks);
    }

    warn!(
        partial_bytes = output.len(),
        %message,
        "engine reported a content error, keeping the pages it produced"
    );
    Ok(output)
}

pub fn is_content_error(message: &str) -> bool {
    CONTENT_ERRORS.iter().any(|marker| message.contains(marker))
}
