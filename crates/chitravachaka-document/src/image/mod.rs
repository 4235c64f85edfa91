// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: decoding and normalisation to the working bitmap.

pub mod normalizer;

pub use normalizer::{ImageInput, ImageNormalizer};
