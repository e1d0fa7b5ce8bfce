// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// receiptpress — render receipts and print formats to PDF.
//
// Entry point. Initialises logging on stderr, then dispatches the subcommand.
// stdout is reserved for command output.

mod cli;
mod host;

use std::process::ExitCode;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use clap::Parser;
use receiptpress_core::error::{ReceiptpressError, Result};
use receiptpress_core::{EngineConfig, FormatConfig, ReceiptDocument, RenderContext};
use receiptpress_document::{PdfRenderer, WkhtmltopdfEngine, create_pdf, estimate_height};

use cli::{Cli, Commands, EstimateArgs, RenderArgs};
use host::FileHost;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Render(args) => render(args).await,
        Commands::Estimate(args) => estimate(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "receiptpress failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn render(args: RenderArgs) -> Result<()> {
    let engine_config = match args.wkhtmltopdf {
        Some(wkhtmltopdf) => EngineConfig { wkhtmltopdf },
        None => EngineConfig::from_env(),
    };
    let renderer = PdfRenderer::new(WkhtmltopdfEngine::from_config(&engine_config));
    let ctx = RenderContext {
        session_id: args.session,
        base_url: args.base_url,
        timeout: Duration::from_secs(args.timeout_secs),
        password: args.password,
    };
    let host = FileHost::new(&args.root);

    tracing::info!(
        root = %host.root().display(),
        doctype = %args.doctype,
        name = %args.name,
        format = %args.format,
        "rendering"
    );

    let Some(mut payload) =
        create_pdf(&host, &renderer, &ctx, &args.doctype, &args.name, &args.format).await?
    else {
        tracing::info!(format = %args.format, "no such print format, nothing rendered");
        return Ok(());
    };
    if payload.print_type.is_none() {
        payload.print_type = args.print_type;
    }

    match args.output {
        Some(path) => {
            let pdf = STANDARD
                .decode(&payload.pdf_base64)
                .map_err(|err| ReceiptpressError::PdfError(format!("payload decode: {err}")))?;
            std::fs::write(&path, &pdf)?;
            tracing::info!(path = %path.display(), bytes = pdf.len(), "PDF written");
        }
        None => println!("{}", serde_json::to_string(&payload)?),
    }
    Ok(())
}

fn estimate(args: &EstimateArgs) -> Result<()> {
    let doc: ReceiptDocument = serde_json::from_str(&std::fs::read_to_string(&args.document)?)?;
    let format: FormatConfig = match &args.format {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => FormatConfig::default(),
    };

    let height = estimate_height(Some(&doc), &format.height_table);
    tracing::debug!(
        items = doc.items.len(),
        discounted = doc.discounted_item_count(),
        payments = doc.payments.len(),
        height,
        "estimated"
    );
    println!("{height}mm");
    Ok(())
}
