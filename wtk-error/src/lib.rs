// WTK - wtk-error
// Module: WTK Error Handling
// SW-REQ-ID: REQ_004
// SW-REQ-ID: REQ_ERROR_001
//
// Copyright (c) 2024 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WTK Error handling library
//!
//! This library provides the error type shared by the WebAssembly Toolkit
//! crates. Errors are small `Copy` values carrying a category, a numeric code
//! and a static summary. Detailed, formatted diagnostics (for example the
//! actual and expected stack of a type mismatch) are delivered separately
//! through the validator's error sink; the error value only classifies the
//! failure.
//!
//! # Error Categories
//!
//! ## Validation Errors (5000-5099)
//! - Stack underflow
//! - Invalid branch depth
//! - Invalid rethrow target
//! - Inconsistent `br_table` targets
//! - SIMD lane index out of range
//!
//! ## Type Errors (6000-6099)
//! - Value type mismatches
//! - Structural reference/function type mismatches
//!
//! ## Module Context Errors (5100-5199)
//! - Invalid local, global, function, table, memory, tag or type index
//! - Non-constant initializer expressions
//!
//! # Usage
//!
//! ```
//! use wtk_error::{codes, Error, ErrorCategory};
//!
//! let error = Error::new(
//!     ErrorCategory::Validation,
//!     codes::INVALID_BRANCH_DEPTH,
//!     "invalid branch depth",
//! );
//! assert!(error.is_validation_error());
//!
//! let mismatch = Error::type_mismatch("type mismatch");
//! assert_eq!(mismatch.code, codes::TYPE_MISMATCH);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)] // Rule 2
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(missing_docs)]

/// Error codes for wtk
pub mod codes;
/// Error and error handling types
pub mod errors;
pub mod helpers;

// Re-export key types
pub use errors::{Error, ErrorCategory};
pub use helpers::*;

/// A specialized `Result` type for WTK operations.
///
/// This type alias uses `wtk_error::Error` as the error type and is usable in
/// `no_std` environments since `Error` never allocates.
pub type Result<T> = core::result::Result<T, Error>;

/// Error conversion trait for converting to specific error categories
pub trait ToErrorCategory {
    /// Convert the error to a specific category
    fn to_category(&self) -> ErrorCategory;
}
