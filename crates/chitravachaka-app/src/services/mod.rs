// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: bridges the command line to the backend crates.
//
// `app_services` orchestrates one upload end to end; `data_dir` owns where
// configuration, uploads and audio live on disk.

pub mod app_services;
pub mod data_dir;
