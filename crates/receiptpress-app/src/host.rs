// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filesystem-backed print host.
//
// Layout under the root directory:
//   formats/<format>.json      print format settings
//   <doctype>/<name>.html      pre-rendered print HTML
//   <doctype>/<name>.json      structured document (items, payments)

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use receiptpress_core::error::{ReceiptpressError, Result};
use receiptpress_core::{FormatConfig, ReceiptDocument};
use receiptpress_document::PrintHost;
use tracing::debug;

const FORMATS_DIR: &str = "formats";

/// Reads formats, HTML and documents from a directory tree.
#[derive(Debug, Clone)]
pub struct FileHost {
    root: PathBuf,
}

impl FileHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, dir: &str, name: &str, extension: &str) -> Result<PathBuf> {
        for part in [dir, name] {
            if part.is_empty() || part.contains(['/', '\\']) || part == ".." || part == "." {
                return Err(ReceiptpressError::Host(format!("invalid name: {part:?}")));
            }
        }
        Ok(self.root.join(dir).join(format!("{name}.{extension}")))
    }
}

/// Read a file, mapping "not found" to `None`.
fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no such file");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

impl PrintHost for FileHost {
    fn format(&self, name: &str) -> Result<Option<FormatConfig>> {
        let path = self.entry_path(FORMATS_DIR, name, "json")?;
        match read_optional(&path)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn html(&self, doctype: &str, name: &str, _format: &str) -> Result<String> {
        let path = self.entry_path(doctype, name, "html")?;
        read_optional(&path)?.ok_or_else(|| {
            ReceiptpressError::Host(format!("no print HTML for {doctype} {name}"))
        })
    }

    fn document(&self, doctype: &str, name: &str) -> Result<Option<ReceiptDocument>> {
        let path = self.entry_path(doctype, name, "json")?;
        match read_optional(&path)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn reads_format_html_and_document() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "formats/POS Receipt.json",
            r#"{"page_size": "Custom", "auto_height": true, "default_print_type": "Receipt"}"#,
        );
        write(dir.path(), "POS Invoice/POS-0001.html", "<p>receipt</p>");
        write(
            dir.path(),
            "POS Invoice/POS-0001.json",
            r#"{"items": [{"item_code": "TEA", "qty": 1}], "payments": []}"#,
        );
        let host = FileHost::new(dir.path());

        let format = host.format("POS Receipt").unwrap().unwrap();
        assert!(format.is_custom() && format.auto_height);
        assert_eq!(
            host.html("POS Invoice", "POS-0001", "POS Receipt").unwrap(),
            "<p>receipt</p>"
        );
        let doc = host.document("POS Invoice", "POS-0001").unwrap().unwrap();
        assert_eq!(doc.items.len(), 1);
    }

    #[test]
    fn missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let host = FileHost::new(dir.path());

        assert!(host.format("Nope").unwrap().is_none());
        assert!(host.document("POS Invoice", "POS-0002").unwrap().is_none());
        assert!(matches!(
            host.html("POS Invoice", "POS-0002", "Nope"),
            Err(ReceiptpressError::Host(_))
        ));
    }

    #[test]
    fn malformed_format_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "formats/Broken.json", "{ not json");
        let host = FileHost::new(dir.path());

        assert!(matches!(
            host.format("Broken"),
            Err(ReceiptpressError::Serialization(_))
        ));
    }

    #[test]
    fn names_cannot_escape_the_root() {
        let host = FileHost::new("/srv/receipts");
        assert!(host.format("../secrets").is_err());
        assert!(host.document("..", "passwd").is_err());
        assert!(host.html("POS Invoice", "", "x").is_err());
    }
}
