// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine directives embedded in print HTML.
//
// Templates steer the engine in two ways:
//   * `<meta name="pdfkit-<option>" content="...">` tags, and
//   * page geometry declared on the `.print-format` CSS rule
//     (`margin-top: 10mm;` and friends).
// The reader also applies the PDF visibility classes and makes root-relative
// links absolute so the engine can fetch assets.

use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;
use tracing::debug;

use crate::options::OptionMap;

const META_PREFIX: &str = "pdfkit-";
const PRINT_FORMAT_SELECTOR: &str = ".print-format";

/// CSS declarations on `.print-format` that map onto engine options.
const CSS_DIRECTIVES: [&str; 9] = [
    "margin-top",
    "margin-bottom",
    "margin-left",
    "margin-right",
    "page-size",
    "header-spacing",
    "orientation",
    "page-width",
    "page-height",
];

const HIDDEN_CLASS: &str = "hidden-pdf";
const VISIBLE_CLASS: &str = "visible-pdf";

/// Parse `html`, pull out engine directives and return the rewritten HTML with
/// the directives found.
///
/// When `base_url` is given, `src`/`href` values starting with a single `/`
/// are made absolute against it.
pub fn read_options_from_html(html: &str, base_url: Option<&str>) -> (String, OptionMap) {
    let document = kuchiki::parse_html().one(html);
    let mut options = OptionMap::new();

    toggle_visible_pdf(&document);

    for (key, value) in css_directives(&document) {
        options.insert(key, value);
    }

    // Meta tags come last so an explicit directive beats the stylesheet.
    for (key, value) in meta_directives(&document) {
        if value.is_empty() {
            options.insert_flag(key);
        } else {
            options.insert(key, value);
        }
    }

    if let Some(base) = base_url {
        scrub_urls(&document, base);
    }

    debug!(directives = options.len(), "read HTML directives");
    (document.to_string(), options)
}

/// Drop `.hidden-pdf` elements and unhide `.visible-pdf` ones.
fn toggle_visible_pdf(document: &NodeRef) {
    if let Ok(hidden) = document.select(&format!(".{HIDDEN_CLASS}")) {
        let hidden: Vec<_> = hidden.collect();
        for element in hidden {
            element.as_node().detach();
        }
    }

    if let Ok(visible) = document.select(&format!(".{VISIBLE_CLASS}")) {
        for element in visible {
            let mut attributes = element.attributes.borrow_mut();
            let remaining = attributes
                .get("class")
                .map(|classes| {
                    classes
                        .split_whitespace()
                        .filter(|class| *class != VISIBLE_CLASS)
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            attributes.insert("class", remaining);
        }
    }
}

/// Collect and remove `pdfkit-` meta tags.
fn meta_directives(document: &NodeRef) -> Vec<(String, String)> {
    let Ok(metas) = document.select("meta[name]") else {
        return Vec::new();
    };

    let mut found = Vec::new();
    let metas: Vec<_> = metas.collect();
    for meta in metas {
        let directive = {
            let attributes = meta.attributes.borrow();
            attributes
                .get("name")
                .and_then(|name| name.strip_prefix(META_PREFIX))
                .filter(|key| !key.is_empty())
                .map(|key| {
                    let content = attributes.get("content").unwrap_or_default();
                    (key.to_string(), content.trim().to_string())
                })
        };
        if let Some(directive) = directive {
            found.push(directive);
            meta.as_node().detach();
        }
    }
    found
}

/// Geometry declared on `.print-format` rules in `<style>` elements,
/// including rules nested in `@media` blocks.
///
/// Only millimetre values are recognised; the last declaration wins.
fn css_directives(document: &NodeRef) -> Vec<(String, String)> {
    let Ok(styles) = document.select("style") else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for style in styles {
        let css = style.as_node().text_contents();
        if css.trim().is_empty() {
            continue;
        }
        match StyleSheet::parse(&css, ParserOptions::default()) {
            Ok(sheet) => collect_print_format(&sheet.rules, &mut found),
            Err(err) => debug!(?err, "skipping unparseable stylesheet"),
        }
    }
    found
}

fn collect_print_format(rules: &CssRuleList<'_>, found: &mut Vec<(String, String)>) {
    for rule in &rules.0 {
        match rule {
            CssRule::Media(media) => collect_print_format(&media.rules, found),
            CssRule::Style(style) => {
                let selectors = style
                    .selectors
                    .to_css_string(PrinterOptions::default())
                    .unwrap_or_default();
                if !selectors
                    .split(',')
                    .any(|part| part.trim() == PRINT_FORMAT_SELECTOR)
                {
                    continue;
                }

                let declarations = &style.declarations;
                for property in declarations
                    .declarations
                    .iter()
                    .chain(declarations.important_declarations.iter())
                {
                    let id = property.property_id();
                    let name = id.name();
                    if !CSS_DIRECTIVES.contains(&name) {
                        continue;
                    }
                    let Ok(value) = property.value_to_css_string(PrinterOptions::default()) else {
                        continue;
                    };
                    if let Some(value) = millimetres(value.trim()) {
                        found.push((name.to_string(), value));
                    }
                }
            }
            _ => {}
        }
    }
}

/// A millimetre length as the engine expects it. Zero lengths serialise
/// without a unit.
fn millimetres(value: &str) -> Option<String> {
    if value == "0" {
        return Some("0mm".to_string());
    }
    let number = value.strip_suffix("mm")?;
    number
        .parse::<f64>()
        .is_ok()
        .then(|| value.to_string())
}

/// Make root-relative `src` and `href` values absolute.
fn scrub_urls(document: &NodeRef, base_url: &str) {
    let base = base_url.trim_end_matches('/');
    let Ok(linked) = document.select("[src], [href]") else {
        return;
    };
    for element in linked {
        let mut attributes = element.attributes.borrow_mut();
        for attr in ["src", "href"] {
            let absolute = attributes
                .get(attr)
                .filter(|url| url.starts_with('/') && !url.starts_with("//"))
                .map(|url| format!("{base}{url}"));
            if let Some(absolute) = absolute {
                attributes.insert(attr, absolute);
            }
        }
    }
}
