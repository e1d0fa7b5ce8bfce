// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Receipt height estimation from document content.

use receiptpress_core::{HeightTable, ReceiptDocument};

/// Estimate the page height, in millimetres, needed to print `doc` as a
/// receipt. A missing document is treated as empty.
///
/// The result is always within `[table.min_height, table.max_height]`.
pub fn estimate_height(doc: Option<&ReceiptDocument>, table: &HeightTable) -> u32 {
    let (items, discounted, payments) = match doc {
        Some(doc) => (
            doc.items.len() as u64,
            doc.discounted_item_count() as u64,
            doc.payments.len() as u64,
        ),
        None => (0, 0, 0),
    };

    let mut height = u64::from(table.header_height) + u64::from(table.customer_height);
    height += items * u64::from(table.item_height);
    height += discounted * u64::from(table.discount_line_height);
    height += u64::from(table.totals_height);

    if payments > 0 {
        height += u64::from(table.payment_base_height);
        height += payments * u64::from(table.payment_line_height);
    }

    height += u64::from(table.footer_height) + u64::from(table.buffer_height);

    // min before max so a misconfigured table (min > max) still honours max.
    height
        .max(u64::from(table.min_height))
        .min(u64::from(table.max_height)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use receiptpress_core::{LineItem, Payment};

    fn document(plain: usize, discounted: usize, payments: usize) -> ReceiptDocument {
        let mut items = vec![LineItem::default(); plain];
        items.extend((0..discounted).map(|_| LineItem {
            discount_percentage: Some(5.0),
            ..Default::default()
        }));
        ReceiptDocument {
            items,
            payments: vec![Payment::default(); payments],
        }
    }

    #[test]
    fn empty_document_hits_minimum() {
        let table = HeightTable::default();
        assert_eq!(estimate_height(Some(&document(0, 0, 0)), &table), 60);
        assert_eq!(estimate_height(None, &table), 60);
    }

    #[test]
    fn five_items_one_payment() {
        // 10 + 8 + 5*8 + 0 + 20 + (10 + 5) + 12 + 5
        let height = estimate_height(Some(&document(5, 0, 1)), &HeightTable::default());
        assert_eq!(height, 110);
    }

    #[test]
    fn discounted_items_add_a_line() {
        let table = HeightTable::default();
        let plain = estimate_height(Some(&document(10, 0, 0)), &table);
        let discounted = estimate_height(Some(&document(7, 3, 0)), &table);
        assert_eq!(discounted, plain + 6);
    }

    #[test]
    fn large_documents_are_clamped() {
        let table = HeightTable::default();
        assert_eq!(estimate_height(Some(&document(400, 50, 20)), &table), 500);
    }

    #[test]
    fn height_never_decreases_with_more_items() {
        let table = HeightTable::default();
        let mut previous = 0;
        for count in 0..80 {
            let height = estimate_height(Some(&document(count, 0, 2)), &table);
            assert!(height >= previous, "{count} items gave {height} < {previous}");
            assert!((table.min_height..=table.max_height).contains(&height));
            previous = height;
        }
    }

    #[test]
    fn custom_table_is_respected() {
        let table = HeightTable {
            item_height: 20,
            min_height: 10,
            ..Default::default()
        };
        // 10 + 8 + 2*20 + 20 + 12 + 5
        assert_eq!(estimate_height(Some(&document(2, 0, 0)), &table), 95);
    }
}
