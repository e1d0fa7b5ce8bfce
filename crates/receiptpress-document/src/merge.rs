// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Final option merge before rendering: fixed engine settings, default margins,
// HTML directives, and the session cookie.
//
// Thermal option sets go through protect-then-restore: HTML directives that
// mention margins or page geometry are dropped, and afterwards the captured
// thermal values are written back over anything that still slipped through.

use receiptpress_core::RenderContext;
use tracing::{debug, instrument};

use crate::html::read_options_from_html;
use crate::options::{OptionMap, OptionValue, PASSWORD_OPTION, RenderOptions, THERMAL_KEYS};

const DEFAULT_MARGIN: &str = "15mm";
const MARGIN_KEYS: [&str; 4] = ["margin-right", "margin-left", "margin-top", "margin-bottom"];
const SESSION_COOKIE: &str = "sid";

/// Merge `options` with the fixed engine settings and the directives found in
/// `html`. Returns the rewritten HTML and the final options.
#[instrument(skip_all, fields(thermal = options.is_thermal(), html_len = html.len()))]
pub fn prepare_options(
    html: &str,
    options: RenderOptions,
    ctx: &RenderContext,
) -> (String, RenderOptions) {
    let thermal = options.is_thermal();
    let captured = if thermal {
        capture_thermal(options.map())
    } else {
        Vec::new()
    };
    let mut map = options.into_map();

    for flag in ["print-media-type", "background", "images", "quiet"] {
        map.insert_flag(flag);
    }
    map.insert("encoding", "UTF-8");

    if !thermal {
        for side in MARGIN_KEYS {
            if !map.is_specified(side) {
                map.insert(side, DEFAULT_MARGIN);
            }
        }
    }

    let (html, directives) = read_options_from_html(html, ctx.base_url.as_deref());
    for (key, value) in &directives {
        if thermal && touches_geometry(key) {
            debug!(key = key.as_str(), "ignoring HTML directive on thermal geometry");
            continue;
        }
        map.insert(key.clone(), value.clone());
    }

    if thermal {
        restore_thermal(&mut map, captured);
    }

    if let Some(sid) = ctx.session_id.as_deref().filter(|sid| !sid.is_empty()) {
        map.insert(
            "cookie",
            OptionValue::Pairs(vec![(SESSION_COOKIE.to_string(), sid.to_string())]),
        );
    }

    if let Some(password) = ctx.password.as_deref().filter(|pw| !pw.is_empty()) {
        map.insert(PASSWORD_OPTION, password);
    }

    let options = if thermal {
        RenderOptions::Thermal(map)
    } else {
        RenderOptions::Standard(map)
    };
    (html, options)
}

/// Whether a directive key refers to margins or page dimensions.
fn touches_geometry(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("margin") || key.contains("page")
}

/// Snapshot the thermal-critical values. Margins fall back to zero.
fn capture_thermal(map: &OptionMap) -> Vec<(&'static str, Option<OptionValue>)> {
    THERMAL_KEYS
        .iter()
        .map(|&key| {
            let value = match map.get(key) {
                Some(value) => Some(value.clone()),
                None if key.starts_with("margin-") => Some(OptionValue::from("0mm")),
                None => None,
            };
            (key, value)
        })
        .collect()
}

fn restore_thermal(map: &mut OptionMap, captured: Vec<(&'static str, Option<OptionValue>)>) {
    for (key, value) in captured {
        match value {
            Some(value) => map.insert(key, value),
            None => {
                map.remove(key);
            }
        }
    }
}
