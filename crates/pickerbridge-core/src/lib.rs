// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pickerbridge: value model, configuration and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod value;

pub use config::BridgeConfig;
pub use error::{BridgeError, ErrorClass, Result, classify_error};
pub use value::*;
