// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler — collect the pages of one or more rendered PDFs into a single
// output document using the `lopdf` crate, optionally password-protected.

use std::collections::HashMap;

use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use receiptpress_core::error::{ReceiptpressError, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Accumulates pages from rendered PDFs.
///
/// A single assembler can take the output of several renders, which is how
/// batches of receipts end up in one file.
pub struct PdfAssembler {
    document: Document,
    /// The output document's `/Pages` node.
    pages_id: ObjectId,
    page_count: u32,
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfAssembler {
    /// Start an empty output document.
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", Object::Integer(0));
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = document.add_object(Object::Dictionary(catalog));
        document.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            document,
            pages_id,
            page_count: 0,
        }
    }

    /// Number of pages collected so far.
    pub fn page_count(&self) -> usize {
        self.page_count as usize
    }

    /// Append every page of the PDF in `data`, in order. Returns the number of
    /// pages appended.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn append_pdf(&mut self, data: &[u8]) -> Result<usize> {
        let source = Document::load_mem(data).map_err(|err| {
            ReceiptpressError::PdfError(format!("failed to load rendered PDF: {}", err))
        })?;
        self.append_document(&source)
    }

    /// Append every page of an already-parsed document. A document without
    /// pages is rejected.
    pub fn append_document(&mut self, source: &Document) -> Result<usize> {
        let pages = source.get_pages();
        if pages.is_empty() {
            return Err(ReceiptpressError::InvalidDocument(
                "PDF contains no pages".into(),
            ));
        }
        let mut page_numbers: Vec<u32> = pages.keys().copied().collect();
        page_numbers.sort();

        // Objects shared between pages (fonts, images) are copied once per
        // source document.
        let mut copied = HashMap::new();
        for page_number in &page_numbers {
            let page_id = pages[page_number];
            self.append_page(source, page_id, &mut copied)?;
        }

        debug!(
            appended = page_numbers.len(),
            total = self.page_count,
            "pages appended"
        );
        Ok(page_numbers.len())
    }

    /// Serialise the collected pages, encrypting with `password` when given.
    #[instrument(skip_all, fields(pages = self.page_count, encrypted = password.is_some()))]
    pub fn finish(mut self, password: Option<&str>) -> Result<Vec<u8>> {
        if let Some(password) = password {
            self.encrypt(password)?;
        }

        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            ReceiptpressError::PdfError(format!("failed to serialise assembled PDF: {}", err))
        })?;

        info!(pages = self.page_count, output_bytes = output.len(), "PDF assembled");
        Ok(output)
    }

    /// Apply standard-security encryption with `password` as both the user and
    /// owner password.
    fn encrypt(&mut self, password: &str) -> Result<()> {
        // The key derivation needs a file identifier.
        let file_id = self.file_id();
        self.document.trailer.set(
            "ID",
            Object::Array(vec![
                Object::String(file_id.clone(), StringFormat::Hexadecimal),
                Object::String(file_id, StringFormat::Hexadecimal),
            ]),
        );

        let version = EncryptionVersion::V2 {
            document: &self.document,
            owner_password: password,
            user_password: password,
            key_length: 128,
            permissions: Permissions::all(),
        };
        let state = EncryptionState::try_from(version)
            .map_err(|err| ReceiptpressError::Encryption(err.to_string()))?;
        self.document
            .encrypt(&state)
            .map_err(|err| ReceiptpressError::Encryption(err.to_string()))?;

        debug!("assembled PDF encrypted");
        Ok(())
    }

    /// First 16 bytes of a digest over the collected content streams and a
    /// random nonce. The RC4 keystream depends on this identifier, so two
    /// outputs must never share one.
    fn file_id(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.page_count.to_be_bytes());
        for (&(number, generation), object) in &self.document.objects {
            if let Object::Stream(stream) = object {
                hasher.update(number.to_be_bytes());
                hasher.update(generation.to_be_bytes());
                hasher.update((stream.content.len() as u64).to_be_bytes());
                hasher.update(&stream.content);
            }
        }
        hasher.update(Uuid::new_v4().as_bytes());
        let digest = hasher.finalize();
        let id = digest[..16].to_vec();
        debug!(file_id = %hex::encode(&id), "derived file identifier");
        id
    }

    fn append_page(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<()> {
        let page = source
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|err| {
                ReceiptpressError::PdfError(format!("cannot read page {:?}: {}", page_id, err))
            })?;

        let mut new_page = Dictionary::new();
        for (key, value) in page.iter() {
            if key == b"Parent" {
                continue;
            }
            let value = copy_object(source, &mut self.document, value, copied);
            new_page.set(key.clone(), value);
        }

        // The page leaves its source tree, so pull inherited attributes down.
        for key in INHERITABLE {
            if new_page.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page, key) {
                let value = copy_object(source, &mut self.document, &value, copied);
                new_page.set(key.to_vec(), value);
            }
        }

        new_page.set("Parent", Object::Reference(self.pages_id));
        let new_page_id = self.document.add_object(Object::Dictionary(new_page));
        copied.insert(page_id, new_page_id);

        let pages = self
            .document
            .get_object_mut(self.pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| ReceiptpressError::PdfError(format!("no /Pages node: {}", err)))?;
        pages
            .get_mut(b"Kids")
            .and_then(Object::as_array_mut)
            .map_err(|err| ReceiptpressError::PdfError(format!("no /Kids array: {}", err)))?
            .push(Object::Reference(new_page_id));
        self.page_count += 1;
        pages.set("Count", Object::Integer(i64::from(self.page_count)));

        Ok(())
    }
}

/// Look `key` up on the page's ancestors.
pub(crate) fn inherited_attribute(source: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut node = page;
    // Depth guard against malformed, cyclic page trees.
    for _ in 0..32 {
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = source.get_object(parent_id).and_then(Object::as_dict).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
    }
    None
}

/// Copy `object` into `target`, following references. Each source object is
/// copied at most once; `/Parent` links are dropped and re-established by the
/// caller.
fn copy_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Object {
    match object {
        Object::Reference(ref_id) => {
            if let Some(new_id) = copied.get(ref_id) {
                return Object::Reference(*new_id);
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    // Reserve the id first so cycles resolve to it.
                    let new_id = target.new_object_id();
                    copied.insert(*ref_id, new_id);
                    let cloned = copy_object(source, target, referenced, copied);
                    target.objects.insert(new_id, cloned);
                    Object::Reference(new_id)
                }
                Err(err) => {
                    warn!(?ref_id, %err, "cannot resolve reference, using Null");
                    Object::Null
                }
            }
        }
        Object::Dictionary(dict) => Object::Dictionary(copy_dictionary(source, target, dict, copied)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| copy_object(source, target, item, copied))
                .collect(),
        ),
        Object::Stream(stream) => {
            let dict = copy_dictionary(source, target, &stream.dict, copied);
            // Content is copied as stored, filters included.
            Object::Stream(lopdf::Stream::new(dict, stream.content.clone()))
        }
        other => other.clone(),
    }
}

fn copy_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), copy_object(source, target, value, copied));
    }
    new_dict
}
