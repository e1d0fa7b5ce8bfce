// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page assembly, content geometry, and whitespace cropping.

pub mod assembler;
pub mod crop;
pub mod geometry;

#[cfg(test)]
pub(crate) mod fixtures;

pub use assembler::PdfAssembler;
pub use crop::WhitespaceCropper;
