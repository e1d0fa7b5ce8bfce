// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rendering options — the option map handed to the HTML-to-PDF engine, and the
// builder that derives page geometry from a print format.
//
// Thermal (custom page size) formats produce `RenderOptions::Thermal`. The
// variant, not a key inside the map, carries the "do not touch my geometry"
// contract through the merge step, so nothing has to be stripped before the
// engine sees the map.

use std::collections::BTreeMap;
use std::collections::btree_map;

use receiptpress_core::{FormatConfig, ReceiptDocument};
use tracing::debug;

use crate::height::estimate_height;

/// Option consumed by the PDF assembler rather than the engine.
pub const PASSWORD_OPTION: &str = "password";

/// Keys whose thermal values survive any HTML directive.
pub const THERMAL_KEYS: [&str; 8] = [
    "margin-top",
    "margin-bottom",
    "margin-left",
    "margin-right",
    "page-width",
    "page-height",
    "dpi",
    "zoom",
];

/// Units the engine understands on page dimensions.
const DIMENSION_UNITS: [&str; 4] = ["mm", "cm", "in", "px"];

const DEFAULT_PAGE_SIZE: &str = "A4";
const DEFAULT_CUSTOM_WIDTH: &str = "80mm";
const DEFAULT_CUSTOM_HEIGHT: &str = "297mm";
/// Standard thermal printer resolution.
const THERMAL_DPI: &str = "203";

/// Value of a single engine option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// The option is present with no argument (`--quiet`).
    Flag,
    Text(String),
    /// Name/value pairs, each emitted as its own `--<key> <name> <value>`.
    Pairs(Vec<(String, String)>),
}

impl OptionValue {
    /// Whether the value counts as "specified". Flags and empty strings do not.
    pub fn is_specified(&self) -> bool {
        match self {
            Self::Flag => false,
            Self::Text(text) => !text.is_empty(),
            Self::Pairs(pairs) => !pairs.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Ordered option name → value map.
///
/// Ordering is by key so that the engine command line is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap(BTreeMap<String, OptionValue>);

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(OptionValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether `key` is present with a non-empty value.
    pub fn is_specified(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(OptionValue::is_specified)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn insert_flag(&mut self, key: impl Into<String>) {
        self.0.insert(key.into(), OptionValue::Flag);
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, OptionValue> {
        self.0.iter()
    }

    /// Translate the map into engine command-line arguments.
    ///
    /// Assembler-only options are left out.
    pub fn to_engine_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.0.len() * 2);
        for (key, value) in &self.0 {
            if key == PASSWORD_OPTION {
                continue;
            }
            let flag = format!("--{key}");
            match value {
                OptionValue::Flag => args.push(flag),
                OptionValue::Text(text) if text.is_empty() => args.push(flag),
                OptionValue::Text(text) => {
                    args.push(flag);
                    args.push(text.clone());
                }
                OptionValue::Pairs(pairs) => {
                    for (name, val) in pairs {
                        args.push(flag.clone());
                        args.push(name.clone());
                        args.push(val.clone());
                    }
                }
            }
        }
        args
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<OptionValue>> Extend<(K, V)> for OptionMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a> IntoIterator for &'a OptionMap {
    type Item = (&'a String, &'a OptionValue);
    type IntoIter = btree_map::Iter<'a, String, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Engine options tagged with the page geometry regime they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOptions {
    /// Named page size with ordinary margins.
    Standard(OptionMap),
    /// Receipt geometry: zero margins and a fixed page size that HTML
    /// directives may not change.
    Thermal(OptionMap),
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::Standard(OptionMap::new())
    }
}

impl RenderOptions {
    pub fn is_thermal(&self) -> bool {
        matches!(self, Self::Thermal(_))
    }

    pub fn map(&self) -> &OptionMap {
        match self {
            Self::Standard(map) | Self::Thermal(map) => map,
        }
    }

    pub fn map_mut(&mut self) -> &mut OptionMap {
        match self {
            Self::Standard(map) | Self::Thermal(map) => map,
        }
    }

    pub fn into_map(self) -> OptionMap {
        match self {
            Self::Standard(map) | Self::Thermal(map) => map,
        }
    }
}

/// Append `mm` to a dimension that carries no recognised unit.
pub fn normalize_dimension(value: &str) -> String {
    if DIMENSION_UNITS.iter().any(|unit| value.contains(unit)) {
        value.to_string()
    } else {
        format!("{value}mm")
    }
}

/// Derive page geometry options for `format`.
///
/// Named page sizes yield a single `page-size` option. The custom page size
/// yields a full thermal option set; its height is estimated from `doc` when
/// the format asks for automatic height and a document is available.
pub fn build_page_options(format: &FormatConfig, doc: Option<&ReceiptDocument>) -> RenderOptions {
    if !format.is_custom() {
        let page_size = non_empty(format.page_size.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE);
        return RenderOptions::Standard([("page-size", page_size)].into_iter().collect());
    }

    let width = non_empty(format.custom_width.as_deref()).unwrap_or(DEFAULT_CUSTOM_WIDTH);
    let height = match doc {
        Some(doc) if format.auto_height => {
            let estimated = estimate_height(Some(doc), &format.height_table);
            debug!(estimated_mm = estimated, items = doc.items.len(), "estimated receipt height");
            format!("{estimated}mm")
        }
        _ => non_empty(format.custom_height.as_deref())
            .unwrap_or(DEFAULT_CUSTOM_HEIGHT)
            .to_string(),
    };

    let mut map = OptionMap::new();
    map.insert("page-width", normalize_dimension(width));
    map.insert("page-height", normalize_dimension(&height));
    for side in ["margin-top", "margin-bottom", "margin-left", "margin-right"] {
        map.insert(side, "0mm");
    }
    map.insert("dpi", THERMAL_DPI);
    map.insert("zoom", "1");
    map.insert_flag("no-pdf-compression");

    RenderOptions::Thermal(map)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use receiptpress_core::{LineItem, Payment};

    fn custom_format() -> FormatConfig {
        FormatConfig {
            page_size: Some("Custom".into()),
            ..Default::default()
        }
    }

    #[test]
    fn named_page_size_emits_only_page_size() {
        let format = FormatConfig {
            page_size: Some("Letter".into()),
            auto_height: true,
            ..Default::default()
        };
        let options = build_page_options(&format, Some(&ReceiptDocument::default()));

        assert!(!options.is_thermal());
        assert_eq!(options.map().len(), 1);
        assert_eq!(options.map().get_text("page-size"), Some("Letter"));
    }

    #[test]
    fn missing_page_size_defaults_to_a4() {
        let options = build_page_options(&FormatConfig::default(), None);
        assert_eq!(options.map().get_text("page-size"), Some("A4"));
        assert_eq!(options.map().len(), 1);
    }

    #[test]
    fn custom_page_size_is_thermal_with_defaults() {
        let options = build_page_options(&custom_format(), None);
        let map = options.map();

        assert!(options.is_thermal());
        assert_eq!(map.get_text("page-width"), Some("80mm"));
        assert_eq!(map.get_text("page-height"), Some("297mm"));
        for side in ["margin-top", "margin-bottom", "margin-left", "margin-right"] {
            assert_eq!(map.get_text(side), Some("0mm"));
        }
        assert_eq!(map.get_text("dpi"), Some("203"));
        assert_eq!(map.get_text("zoom"), Some("1"));
        assert_eq!(map.get("no-pdf-compression"), Some(&OptionValue::Flag));
        assert!(!map.contains_key("page-size"));
    }

    #[test]
    fn auto_height_uses_estimate() {
        let format = FormatConfig {
            auto_height: true,
            custom_height: Some("400mm".into()),
            ..custom_format()
        };
        let doc = ReceiptDocument {
            items: vec![LineItem::default(); 5],
            payments: vec![Payment::default()],
        };

        let options = build_page_options(&format, Some(&doc));
        assert_eq!(options.map().get_text("page-height"), Some("110mm"));
    }

    #[test]
    fn auto_height_without_document_uses_configured_height() {
        let format = FormatConfig {
            auto_height: true,
            custom_height: Some("150".into()),
            ..custom_format()
        };
        let options = build_page_options(&format, None);
        assert_eq!(options.map().get_text("page-height"), Some("150mm"));
    }

    #[test]
    fn dimensions_get_units() {
        assert_eq!(normalize_dimension("72"), "72mm");
        assert_eq!(normalize_dimension("80mm"), "80mm");
        assert_eq!(normalize_dimension("3in"), "3in");
        assert_eq!(normalize_dimension("300px"), "300px");

        let format = FormatConfig {
            custom_width: Some("72".into()),
            ..custom_format()
        };
        let options = build_page_options(&format, None);
        assert_eq!(options.map().get_text("page-width"), Some("72mm"));
    }

    #[test]
    fn engine_args_encode_each_value_kind() {
        let mut map: OptionMap = [("page-size", "A4"), ("password", "secret")]
            .into_iter()
            .collect();
        map.insert_flag("quiet");
        map.insert(
            "cookie",
            OptionValue::Pairs(vec![("sid".into(), "abc".into())]),
        );

        assert_eq!(
            map.to_engine_args(),
            vec!["--cookie", "sid", "abc", "--page-size", "A4", "--quiet"]
        );
    }
}
