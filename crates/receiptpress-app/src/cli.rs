// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Renders a document with a print format and emits the print payload
    Render(RenderArgs),
    /// Prints the estimated receipt height for a document
    Estimate(EstimateArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Directory holding formats/ and the per-doctype HTML and JSON files
    #[clap(long)]
    pub root: PathBuf,
    #[clap(long)]
    pub doctype: String,
    #[clap(long)]
    pub name: String,
    /// Print format name, looked up as formats/<format>.json
    #[clap(long)]
    pub format: String,
    /// Print type reported when the format has no default of its own
    #[clap(long)]
    pub print_type: Option<String>,
    /// Session id forwarded to the engine as the `sid` cookie
    #[clap(long)]
    pub session: Option<String>,
    /// Base URL for root-relative links in the HTML
    #[clap(long)]
    pub base_url: Option<String>,
    /// Password protecting the generated PDF
    #[clap(long)]
    pub password: Option<String>,
    #[clap(long, default_value_t = 60)]
    pub timeout_secs: u64,
    /// wkhtmltopdf binary, overriding $WKHTMLTOPDF
    #[clap(long)]
    pub wkhtmltopdf: Option<PathBuf>,
    /// Write the raw PDF here instead of printing the JSON payload
    #[clap(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Document JSON with `items` and `payments`
    #[clap(long)]
    pub document: PathBuf,
    /// Print format JSON whose height table should be used
    #[clap(long)]
    pub format: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_command() {
        let cli = Cli::try_parse_from([
            "receiptpress",
            "render",
            "--root",
            "/srv/receipts",
            "--doctype",
            "POS Invoice",
            "--name",
            "POS-0001",
            "--format",
            "POS Receipt",
            "--print-type",
            "Receipt",
            "--timeout-secs",
            "15",
        ])
        .unwrap();

        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.doctype, "POS Invoice");
        assert_eq!(args.print_type.as_deref(), Some("Receipt"));
        assert_eq!(args.timeout_secs, 15);
        assert!(args.output.is_none());
    }

    #[test]
    fn render_requires_a_format() {
        let result = Cli::try_parse_from([
            "receiptpress",
            "render",
            "--root",
            ".",
            "--doctype",
            "POS Invoice",
            "--name",
            "POS-0001",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_estimate_command() {
        let cli = Cli::try_parse_from(["receiptpress", "estimate", "--document", "sale.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Estimate(EstimateArgs { format: None, .. })));
    }
}
