// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// chitravachaka-document: reads printed text from document photographs.
//
// A page is normalised to a grayscale working bitmap, expanded into four
// enhancement variants, and swept through the recognition engine under eight
// layout/engine configurations each. The highest-scoring transcription wins.

pub mod bootstrap;
pub mod image;
pub mod pipeline;
pub mod scan;

// Re-export the primary types so callers can use `chitravachaka_document::DocumentReader` etc.
pub use bootstrap::{EngineSetup, bootstrap};
pub use self::image::normalizer::{ImageInput, ImageNormalizer};
pub use pipeline::{DocumentReader, Extraction};
pub use scan::enhance::{ScanEnhancer, Variant};
pub use scan::ocr::{RecognitionEngine, RecognitionRequest, RecognizedToken, TesseractEngine};
pub use scan::sweep::RecognitionSweep;
