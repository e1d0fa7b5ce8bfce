// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML-to-PDF engine abstraction and the wkhtmltopdf implementation.
//
// wkhtmltopdf runs as one child process per render: HTML on stdin, PDF on
// stdout. Every invocation is bounded by a timeout because the engine can hang
// on malformed input; the child is killed when the timeout fires.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use receiptpress_core::EngineConfig;
use receiptpress_core::error::{ReceiptpressError, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// How an engine invocation failed.
#[derive(Debug)]
pub enum EngineFailure {
    /// The engine ran to completion but reported an error. `output` holds
    /// whatever PDF bytes it wrote anyway.
    Exited { message: String, output: Vec<u8> },
    /// The engine could not be run or was stopped.
    Fatal(ReceiptpressError),
}

/// An external HTML-to-PDF renderer.
pub trait RenderEngine {
    /// The engine's version, for capability checks.
    fn version(&self) -> impl Future<Output = Result<EngineVersion>> + Send;

    /// Render `html` with the given command-line style arguments.
    fn render(
        &self,
        html: &str,
        args: &[String],
        timeout: Duration,
    ) -> impl Future<Output = std::result::Result<Vec<u8>, EngineFailure>> + Send;
}

/// Dotted engine version, compared component by component. A shorter prefix
/// sorts first, so 0.12.3 < 0.12.3.1.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineVersion(Vec<u32>);

impl EngineVersion {
    pub fn new(components: impl Into<Vec<u32>>) -> Self {
        Self(components.into())
    }

    /// Find the first dotted number in `text`, e.g. the `0.12.6` in
    /// `"wkhtmltopdf 0.12.6 (with patched qt)"`.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text
            .split_whitespace()
            .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))?;

        let mut components = Vec::new();
        for part in token.split('.') {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() {
                break;
            }
            components.push(digits.parse().ok()?);
        }
        (!components.is_empty()).then_some(Self(components))
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// `--disable-smart-shrinking` exists and is needed after 0.12.3.
    pub fn supports_smart_shrinking_toggle(&self) -> bool {
        *self > Self::new([0, 12, 3])
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// wkhtmltopdf driven as a child process.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfEngine {
    binary: PathBuf,
}

impl Default for WkhtmltopdfEngine {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl WkhtmltopdfEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.wkhtmltopdf.clone())
    }

    /// Use `$WKHTMLTOPDF` when set, otherwise `wkhtmltopdf` from `PATH`.
    pub fn from_env() -> Self {
        Self::from_config(&EngineConfig::from_env())
    }

    fn spawn_error(&self, err: std::io::Error) -> ReceiptpressError {
        if err.kind() == std::io::ErrorKind::NotFound {
            ReceiptpressError::EngineUnavailable(format!(
                "{} not found",
                self.binary.display()
            ))
        } else {
            ReceiptpressError::Io(err)
        }
    }
}

impl RenderEngine for WkhtmltopdfEngine {
    async fn version(&self) -> Result<EngineVersion> {
        let child = Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| self.spawn_error(err))?;

        let output = tokio::time::timeout(VERSION_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| ReceiptpressError::EngineTimeout(VERSION_TIMEOUT))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = EngineVersion::parse(&stdout).ok_or_else(|| {
            ReceiptpressError::EngineUnavailable(format!(
                "unrecognised version output: {}",
                stdout.trim()
            ))
        })?;

        debug!(%version, "wkhtmltopdf version");
        Ok(version)
    }

    async fn render(
        &self,
        html: &str,
        args: &[String],
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, EngineFailure> {
        info!(
            binary = %self.binary.display(),
            args = args.len(),
            html_len = html.len(),
            "invoking wkhtmltopdf"
        );

        let mut child = Command::new(&self.binary)
            .args(args)
            .arg("-")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| EngineFailure::Fatal(self.spawn_error(err)))?;

        // Feed stdin from its own task so a large document cannot deadlock
        // against a full stdout pipe.
        if let Some(mut stdin) = child.stdin.take() {
            let input = html.as_bytes().to_vec();
            tokio::spawn(async move {
                if let Err(err) = stdin.write_all(&input).await {
                    warn!(%err, "failed writing HTML to wkhtmltopdf");
                }
            });
        }

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| EngineFailure::Fatal(ReceiptpressError::EngineTimeout(timeout)))?
            .map_err(|err| EngineFailure::Fatal(ReceiptpressError::Io(err)))?;

        if output.status.success() {
            debug!(pdf_bytes = output.stdout.len(), "wkhtmltopdf finished");
            return Ok(output.stdout);
        }

        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |code| code.to_string());
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(EngineFailure::Exited {
            message: format!(
                "wkhtmltopdf reported an error (exit {code}):\n{}",
                stderr.trim()
            ),
            output: output.stdout,
        })
    }
}
