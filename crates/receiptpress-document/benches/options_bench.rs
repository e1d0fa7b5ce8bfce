// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the option pipeline in receiptpress-document:
// height estimation, page option building, and the HTML directive merge.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use receiptpress_core::{FormatConfig, LineItem, Payment, ReceiptDocument, RenderContext};
use receiptpress_document::{build_page_options, estimate_height, prepare_options};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 40-line sale with every third item discounted and split payment.
fn busy_sale() -> ReceiptDocument {
    ReceiptDocument {
        items: (0..40)
            .map(|i| LineItem {
                item_code: Some(format!("SKU-{i:04}")),
                qty: 1.0,
                discount_percentage: (i % 3 == 0).then_some(10.0),
            })
            .collect(),
        payments: vec![
            Payment {
                mode_of_payment: Some("Cash".into()),
                amount: 20.0,
            },
            Payment {
                mode_of_payment: Some("Card".into()),
                amount: 31.5,
            },
        ],
    }
}

/// Receipt template with both kinds of embedded directive.
fn receipt_html() -> String {
    let mut html = String::from(
        r#"<html><head>
<meta name="pdfkit-page-height" content="400mm">
<meta name="pdfkit-title" content="Receipt">
<style>.print-format { margin-top: 4mm; margin-left: 2mm; }</style>
</head><body><div class="print-format">"#,
    );
    for i in 0..40 {
        html.push_str(&format!(
            r#"<div class="item"><img src="/files/sku-{i}.png"> SKU-{i:04} x1</div>"#
        ));
    }
    html.push_str(r#"<p class="hidden-pdf">screen only</p></div></body></html>"#);
    html
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_estimate_height(c: &mut Criterion) {
    let doc = busy_sale();
    let table = FormatConfig::default().height_table;

    c.bench_function("estimate_height (40 items)", |b| {
        b.iter(|| black_box(estimate_height(Some(black_box(&doc)), &table)));
    });
}

/// Full option pipeline for a thermal receipt: geometry from the estimator,
/// then the merge with HTML directives and URL scrubbing.
fn bench_receipt_options(c: &mut Criterion) {
    let doc = busy_sale();
    let html = receipt_html();
    let format = FormatConfig {
        page_size: Some("Custom".into()),
        auto_height: true,
        ..Default::default()
    };
    let ctx = RenderContext {
        session_id: Some("bench-session".into()),
        base_url: Some("https://pos.example.com".into()),
        ..Default::default()
    };

    c.bench_function("receipt options (40 items)", |b| {
        b.iter(|| {
            let options = build_page_options(black_box(&format), Some(&doc));
            black_box(prepare_options(black_box(&html), options, &ctx));
        });
    });
}

criterion_group!(benches, bench_estimate_height, bench_receipt_options);
criterion_main!(benches);
