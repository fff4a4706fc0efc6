// WTK - wtk-validator
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for wtk-validator
//!
//! Unified imports for std and `no_std` + `alloc` builds, re-exporting the
//! foundation prelude together with the cell types the function driver uses
//! to collect diagnostics.

pub use core::cell::RefCell;

pub use wtk_foundation::prelude::*;
pub use wtk_foundation::{
    BlockType, FuncIdx, FuncType, FuncTypeRegistry, GlobalType, Instruction, LabelIdx, Limits,
    Opcode, TableType, TagIdx, TypeIdx, ValueType,
};
