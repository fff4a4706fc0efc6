// WTK - wtk-error
// Module: WTK Error Types
// SW-REQ-ID: REQ_004
// SW-REQ-ID: REQ_ERROR_001
//
// Copyright (c) 2024 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

/// Unified error handling system for WTK
///
/// This module provides the error value returned by every checker and driver
/// operation. It includes the error type, its categories, and constructors
/// for each entry of the validation error taxonomy.
use core::fmt;

use crate::{codes, ToErrorCategory};

/// `Error` categories for WTK operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Core errors (checker misuse, unimplemented paths)
    Core         = 1,
    /// Validation errors (stack shape, control flow, index resolution)
    Validation   = 5,
    /// Type errors
    Type         = 6,
    /// Unknown errors
    Unknown      = 9,
    /// Parse errors
    Parse        = 10,
    /// Not supported operation errors (disabled features)
    NotSupported = 15,
}

/// WTK `Error` type
///
/// Small, `Copy` and allocation free. The `message` is a static summary; the
/// formatted diagnostic for the same failure is delivered through the
/// validator's error sink.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Error {
    /// `Error` category
    pub category: ErrorCategory,
    /// `Error` code
    pub code:     u16,
    /// `Error` message
    pub message:  &'static str,
}

impl Error {
    /// Operation issued while no label is open
    pub const NO_OPEN_LABEL: Self = Self::new(
        ErrorCategory::Core,
        codes::INVALID_STATE,
        "instruction outside of any open label",
    );
    /// Value stack underflow
    pub const STACK_UNDERFLOW: Self = Self::new(
        ErrorCategory::Validation,
        codes::STACK_UNDERFLOW,
        "value stack underflow",
    );

    /// Create a new error.
    #[must_use]
    pub const fn new(category: ErrorCategory, code: u16, message: &'static str) -> Self {
        Self {
            category,
            code,
            message,
        }
    }

    // Factory methods

    /// Create a generic validation error
    #[must_use]
    pub const fn validation_error(message: &'static str) -> Self {
        Self::new(ErrorCategory::Validation, codes::VALIDATION_ERROR, message)
    }

    /// Create a value type mismatch error
    #[must_use]
    pub const fn type_mismatch(message: &'static str) -> Self {
        Self::new(ErrorCategory::Type, codes::TYPE_MISMATCH, message)
    }

    /// Create a structural reference type mismatch error
    #[must_use]
    pub const fn reference_type_mismatch(message: &'static str) -> Self {
        Self::new(ErrorCategory::Type, codes::REFERENCE_TYPE_MISMATCH, message)
    }

    /// Create a values-left-on-stack error
    #[must_use]
    pub const fn stack_not_empty(message: &'static str) -> Self {
        Self::new(ErrorCategory::Validation, codes::STACK_NOT_EMPTY, message)
    }

    /// Create an invalid branch depth error
    #[must_use]
    pub const fn invalid_depth(message: &'static str) -> Self {
        Self::new(ErrorCategory::Validation, codes::INVALID_BRANCH_DEPTH, message)
    }

    /// Create an invalid rethrow target error
    #[must_use]
    pub const fn invalid_rethrow(message: &'static str) -> Self {
        Self::new(ErrorCategory::Validation, codes::INVALID_RETHROW_TARGET, message)
    }

    /// Create a label kind mismatch error
    #[must_use]
    pub const fn label_kind_mismatch(message: &'static str) -> Self {
        Self::new(ErrorCategory::Validation, codes::LABEL_KIND_MISMATCH, message)
    }

    /// Create a module index resolution error
    #[must_use]
    pub const fn invalid_index(code: u16, message: &'static str) -> Self {
        Self::new(ErrorCategory::Validation, code, message)
    }

    /// Create a disabled feature error
    #[must_use]
    pub const fn feature_disabled(message: &'static str) -> Self {
        Self::new(ErrorCategory::NotSupported, codes::FEATURE_DISABLED, message)
    }

    /// Check if this is a validation error
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        self.category == ErrorCategory::Validation
    }

    /// Check if this is a type error
    #[must_use]
    pub fn is_type_error(&self) -> bool {
        self.category == ErrorCategory::Type
    }

    /// Check if this is a core error
    #[must_use]
    pub fn is_core_error(&self) -> bool {
        self.category == ErrorCategory::Core
    }

    /// Check if this error reports a disabled feature
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        self.category == ErrorCategory::NotSupported
    }
}

impl ToErrorCategory for Error {
    fn to_category(&self) -> ErrorCategory {
        self.category
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}][E{:04X}] {}",
            self.category, self.code, self.message
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
