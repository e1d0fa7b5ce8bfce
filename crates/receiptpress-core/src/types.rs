// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for receipt rendering.

use serde::{Deserialize, Serialize};

/// The slice of a sales document that drives receipt layout.
///
/// Unknown fields are ignored so a full document export can be deserialised
/// directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptDocument {
    pub items: Vec<LineItem>,
    pub payments: Vec<Payment>,
}

impl ReceiptDocument {
    /// Number of items that print an extra discount line.
    pub fn discounted_item_count(&self) -> usize {
        self.items.iter().filter(|item| item.has_discount()).count()
    }
}

/// A single line on the receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub item_code: Option<String>,
    pub qty: f64,
    pub discount_percentage: Option<f64>,
}

impl LineItem {
    /// A zero percentage counts as no discount.
    pub fn has_discount(&self) -> bool {
        self.discount_percentage.is_some_and(|pct| pct != 0.0)
    }
}

/// A payment method line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    pub mode_of_payment: Option<String>,
    pub amount: f64,
}

/// Result handed back to the caller: the print type to use plus the final PDF,
/// base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintPayload {
    pub print_type: Option<String>,
    pub pdf_base64: String,
}
