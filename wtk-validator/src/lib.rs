// WTK - wtk-validator
// SW-REQ-ID: REQ_VALIDATION_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Instruction-level validation for the WebAssembly Toolkit (WTK).
//!
//! The heart of this crate is [`TypeChecker`], the abstract interpreter that
//! proves a decoded instruction stream is well-typed. It keeps a single
//! value-type stack sliced by a stack of control labels, switches to a
//! polymorphic stack once code becomes unreachable, and compares indexed
//! reference types structurally through [`compat::check_type`].
//!
//! Decoders either drive the checker directly, one operation per
//! instruction, or hand whole function bodies to [`FunctionValidator`],
//! which resolves indices against a [`ModuleContext`], applies the enabled
//! [`Features`], and prefixes every diagnostic with the instruction offset.
//!
//! # Example
//!
//! ```
//! use wtk_foundation::{FuncTypeRegistry, Opcode, ValueType};
//! use wtk_validator::{Features, TypeChecker};
//!
//! let registry = FuncTypeRegistry::new();
//! let mut checker = TypeChecker::new(&registry, Features::default());
//! checker.begin_function(&[ValueType::I32]).unwrap();
//! checker.on_const(ValueType::I32).unwrap();
//! checker.on_const(ValueType::I32).unwrap();
//! checker.on_binary(Opcode::I32_ADD).unwrap();
//! assert!(checker.end_function().is_ok());
//! ```
//!
//! # Feature Flags
//!
//! - `std`: Enables standard library support (default)
//! - `alloc`: Enables allocation support for `no_std` environments

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

// Prelude module for consistent imports across std and no_std environments
pub mod prelude;

pub mod compat;
pub mod config;
pub mod context;
pub mod driver;
pub mod label;
pub mod type_checker;

pub use config::{Features, ValidationConfig};
pub use context::ModuleContext;
pub use driver::FunctionValidator;
pub use label::{Label, LabelKind};
pub use type_checker::{ErrorSink, TypeChecker};
pub use wtk_error::{Error, ErrorCategory, Result};
