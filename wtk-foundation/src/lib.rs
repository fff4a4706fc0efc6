// WTK - wtk-foundation
// SW-REQ-ID: REQ_MEM_SAFETY_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Core type definitions for the WebAssembly Toolkit (WTK).
//!
//! This crate provides the data model shared by the validator and by the
//! decoders that drive it:
//! - [`types`]: value types, signatures, limits, table and global types
//! - [`registry`]: the module-wide map from type index to function type
//! - [`opcode`]: static opcode descriptors (operand types, result type,
//!   access size, SIMD lane count)
//! - [`instructions`]: decoded instructions with resolved immediates
//!
//! It supports two configurations:
//! - `std`: Full standard library support
//! - `no_std` + `alloc`: No standard library but with allocation
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

pub mod instructions;
pub mod opcode;
pub mod registry;
pub mod types;

pub use instructions::{Instruction, MemArg, TryTableCatch, TryTableCatchKind};
pub use opcode::Opcode;
pub use registry::FuncTypeRegistry;
pub use types::{
    BlockType, DataIdx, ElemIdx, FuncIdx, FuncType, GlobalIdx, GlobalType, LabelIdx, Limits,
    LocalIdx, MemIdx, TableIdx, TableType, TagIdx, TypeIdx, TypeSequence, ValueType,
};
pub use wtk_error::{Error, ErrorCategory, Result};
