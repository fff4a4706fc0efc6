// WTK - wtk-error
// Module: WTK Error Helpers
// SW-REQ-ID: REQ_004
// SW-REQ-ID: REQ_ERROR_001
//
// Copyright (c) 2024 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error helper functions for common error patterns.
//!
//! These helpers build the errors raised by the validator for the taxonomy
//! entries that do not have a dedicated `Error` factory method.

use crate::{codes, Error, ErrorCategory};

/// Create a `br_table` inconsistent target error
#[must_use]
pub const fn br_table_inconsistent_error(message: &'static str) -> Error {
    Error::new(ErrorCategory::Validation, codes::BR_TABLE_INCONSISTENT, message)
}

/// Create a SIMD lane index out of range error
#[must_use]
pub const fn lane_index_error(message: &'static str) -> Error {
    Error::new(ErrorCategory::Validation, codes::LANE_INDEX_OUT_OF_RANGE, message)
}

/// Create a tail call return signature error
#[must_use]
pub const fn return_signature_error(message: &'static str) -> Error {
    Error::new(ErrorCategory::Validation, codes::RETURN_SIGNATURE_MISMATCH, message)
}

/// Create a `try_table` catch signature error
#[must_use]
pub const fn catch_signature_error(message: &'static str) -> Error {
    Error::new(ErrorCategory::Validation, codes::CATCH_SIGNATURE_MISMATCH, message)
}

/// Create an expected-reference operand error
#[must_use]
pub const fn expected_reference_error(message: &'static str) -> Error {
    Error::new(ErrorCategory::Type, codes::EXPECTED_REFERENCE, message)
}

/// Create a non-constant initializer error
#[must_use]
pub const fn non_constant_error(message: &'static str) -> Error {
    Error::new(ErrorCategory::Validation, codes::NON_CONSTANT_EXPRESSION, message)
}

/// Create a malformed function body error
#[must_use]
pub const fn malformed_body_error(message: &'static str) -> Error {
    Error::new(ErrorCategory::Parse, codes::MALFORMED_BODY, message)
}
