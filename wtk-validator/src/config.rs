// WTK - wtk-validator
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Validation configuration.
//!
//! [`Features`] selects the WebAssembly proposals the validator accepts and
//! [`ValidationConfig`] controls how the function driver reacts to errors.

/// WebAssembly proposals the validator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::struct_excessive_bools)]
pub struct Features {
    /// Multiple block results and block parameters
    pub multi_value:         bool,
    /// `externref`, table instructions, typed `select`; relaxes `br_table`
    /// target checks to arity only
    pub reference_types:     bool,
    /// `try`/`catch`/`delegate`/`rethrow`/`throw` and `try_table`
    pub exceptions:          bool,
    /// `return_call` and friends
    pub tail_call:           bool,
    /// `call_ref`, `br_on_null`, `br_on_non_null`, `ref.as_non_null`
    pub function_references: bool,
    /// 128-bit packed SIMD
    pub simd:                bool,
    /// Shared memories and atomic instructions
    pub threads:             bool,
    /// Integer add, sub and mul in constant expressions
    pub extended_const:      bool,
}

impl Features {
    /// The default feature set: multi-value, reference types and SIMD
    #[must_use]
    pub const fn new() -> Self {
        Self {
            multi_value:         true,
            reference_types:     true,
            exceptions:          false,
            tail_call:           false,
            function_references: false,
            simd:                true,
            threads:             false,
            extended_const:      false,
        }
    }

    /// Every supported proposal enabled
    #[must_use]
    pub const fn all() -> Self {
        Self {
            multi_value:         true,
            reference_types:     true,
            exceptions:          true,
            tail_call:           true,
            function_references: true,
            simd:                true,
            threads:             true,
            extended_const:      true,
        }
    }

    /// The WebAssembly 1.0 instruction set only
    #[must_use]
    pub const fn mvp() -> Self {
        Self {
            multi_value:         false,
            reference_types:     false,
            exceptions:          false,
            tail_call:           false,
            function_references: false,
            simd:                false,
            threads:             false,
            extended_const:      false,
        }
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::new()
    }
}

/// Validation configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Enabled proposals
    pub features:        Features,
    /// Stop at the first failing instruction
    pub fail_fast:       bool,
    /// Stop once this many diagnostics have been reported
    pub max_diagnostics: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            features:        Features::default(),
            fail_fast:       false,
            max_diagnostics: 100,
        }
    }
}

impl ValidationConfig {
    /// Create a new validation configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop at the first error
    #[must_use]
    pub fn strict() -> Self {
        Self {
            fail_fast: true,
            max_diagnostics: 1,
            ..Self::default()
        }
    }

    /// Report every diagnostic of every instruction
    #[must_use]
    pub fn collect_all() -> Self {
        Self {
            fail_fast: false,
            max_diagnostics: usize::MAX,
            ..Self::default()
        }
    }

    /// Replace the enabled feature set
    #[must_use]
    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }
}
