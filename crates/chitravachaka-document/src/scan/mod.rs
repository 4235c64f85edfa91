// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: enhancement variants, the recognition engine, the
// configuration sweep and candidate selection.

pub mod enhance;
pub mod ocr;
pub mod select;
pub mod sweep;

pub use enhance::ScanEnhancer;
pub use ocr::{RecognitionEngine, TesseractEngine};
pub use select::select_best;
pub use sweep::RecognitionSweep;
