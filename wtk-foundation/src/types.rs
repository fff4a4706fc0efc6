// WTK - wtk-foundation
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly type definitions
//!
//! This module defines the value types the type checker reasons about,
//! function signatures, block types, and the limits, table and global types
//! the module context hands to memory, table and variable instructions.

use core::fmt::{self, Display};

use crate::prelude::*;

/// Index for a type in the types section.
pub type TypeIdx = u32;
/// Index for a function, referring to both imported and module-defined
/// functions.
pub type FuncIdx = u32;
/// Index for a table.
pub type TableIdx = u32;
/// Index for a memory.
pub type MemIdx = u32;
/// Index for a global variable, referring to both imported and module-defined
/// globals.
pub type GlobalIdx = u32;
/// Index for an element segment.
pub type ElemIdx = u32;
/// Index for a data segment.
pub type DataIdx = u32;
/// Index for a local variable within a function.
pub type LocalIdx = u32;
/// Index for a label in control flow instructions (e.g., branches).
pub type LabelIdx = u32;
/// Index for an exception tag.
pub type TagIdx = u32;

/// An ordered list of value types: the parameters or results of a signature.
pub type TypeSequence = Vec<ValueType>;

/// WebAssembly value types as seen by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueType {
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// 128-bit SIMD vector
    V128,
    /// Untyped function reference, `funcref` when nullable
    FuncRef {
        /// Whether `ref.null` inhabits the type
        nullable: bool,
    },
    /// Untyped external reference, `externref` when nullable
    ExternRef {
        /// Whether `ref.null` inhabits the type
        nullable: bool,
    },
    /// Exception reference (exception handling proposal)
    ExnRef,
    /// Reference to the type definition at `index`, `(ref null? $index)`
    Ref {
        /// Index of the referenced type definition
        index:    TypeIdx,
        /// Whether `ref.null` inhabits the type
        nullable: bool,
    },
    /// Wildcard produced by reads in statically unreachable code
    Any,
}

impl ValueType {
    /// `externref`
    pub const EXTERNREF: Self = Self::ExternRef { nullable: true };
    /// `funcref`
    pub const FUNCREF: Self = Self::FuncRef { nullable: true };

    /// `(ref $index)`
    #[must_use]
    pub const fn reference(index: TypeIdx) -> Self {
        Self::Ref {
            index,
            nullable: false,
        }
    }

    /// `(ref null $index)`
    #[must_use]
    pub const fn nullable_reference(index: TypeIdx) -> Self {
        Self::Ref {
            index,
            nullable: true,
        }
    }

    /// Whether this is any reference type (untyped, exception, or indexed)
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            Self::FuncRef { .. } | Self::ExternRef { .. } | Self::ExnRef | Self::Ref { .. }
        )
    }

    /// Whether this reference type admits null. Non-reference types and the
    /// exception reference report `false`.
    #[must_use]
    pub const fn is_nullable(self) -> bool {
        match self {
            Self::FuncRef { nullable } | Self::ExternRef { nullable } | Self::Ref { nullable, .. } => {
                nullable
            }
            _ => false,
        }
    }

    /// The nullable variant of a reference type; other types are unchanged.
    #[must_use]
    pub const fn as_nullable(self) -> Self {
        self.with_nullability(true)
    }

    /// The non-null variant of a reference type; other types are unchanged.
    #[must_use]
    pub const fn as_non_null(self) -> Self {
        self.with_nullability(false)
    }

    const fn with_nullability(self, nullable: bool) -> Self {
        match self {
            Self::FuncRef { .. } => Self::FuncRef { nullable },
            Self::ExternRef { .. } => Self::ExternRef { nullable },
            Self::Ref { index, .. } => Self::Ref { index, nullable },
            other => other,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::F32 => f.write_str("f32"),
            Self::F64 => f.write_str("f64"),
            Self::V128 => f.write_str("v128"),
            Self::FuncRef { nullable: true } => f.write_str("funcref"),
            Self::FuncRef { nullable: false } => f.write_str("(ref func)"),
            Self::ExternRef { nullable: true } => f.write_str("externref"),
            Self::ExternRef { nullable: false } => f.write_str("(ref extern)"),
            Self::ExnRef => f.write_str("exnref"),
            Self::Ref {
                index,
                nullable: true,
            } => write!(f, "(ref null {index})"),
            Self::Ref {
                index,
                nullable: false,
            } => write!(f, "(ref {index})"),
            Self::Any => f.write_str("any"),
        }
    }
}

/// Render a type sequence as `[i32, f64]`, optionally marking that only the
/// top of a deeper stack is shown.
#[must_use]
pub fn types_to_string(types: &[ValueType], truncated: bool) -> String {
    let mut out = String::from("[");
    if truncated {
        out.push_str("... ");
    }
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        // Writing into a String cannot fail.
        let _ = write!(out, "{ty}");
    }
    out.push(']');
    out
}

/// A function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncType {
    /// Parameter types, first parameter first
    pub params:  TypeSequence,
    /// Result types, first result first
    pub results: TypeSequence,
}

impl FuncType {
    /// Create a new function type
    #[must_use]
    pub fn new(params: &[ValueType], results: &[ValueType]) -> Self {
        Self {
            params:  params.to_vec(),
            results: results.to_vec(),
        }
    }
}

impl Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            types_to_string(&self.params, false),
            types_to_string(&self.results, false)
        )
    }
}

/// Block signature annotation of `block`, `loop`, `if`, `try` and
/// `try_table`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockType {
    /// No parameters, no results
    #[default]
    Empty,
    /// No parameters, a single result
    Value(ValueType),
    /// Parameters and results of the function type at this index
    TypeIndex(TypeIdx),
}

/// Memory or table limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Limits {
    /// Initial size in pages (memories) or elements (tables)
    pub initial:   u64,
    /// Optional maximum size
    pub maximum:   Option<u64>,
    /// Shared memory (threads proposal)
    pub is_shared: bool,
    /// 64-bit addressing (memory64 / table64)
    pub is_64:     bool,
}

impl Limits {
    /// 32-bit limits with the given initial size and no maximum
    #[must_use]
    pub const fn new(initial: u64) -> Self {
        Self {
            initial,
            maximum: None,
            is_shared: false,
            is_64: false,
        }
    }

    /// 64-bit limits with the given initial size and no maximum
    #[must_use]
    pub const fn new_64(initial: u64) -> Self {
        Self {
            initial,
            maximum: None,
            is_shared: false,
            is_64: true,
        }
    }

    /// The type of addresses and sizes for this memory or table
    #[must_use]
    pub const fn index_type(&self) -> ValueType {
        if self.is_64 { ValueType::I64 } else { ValueType::I32 }
    }
}

/// A table declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableType {
    /// Element reference type
    pub element_type: ValueType,
    /// Table limits
    pub limits:       Limits,
}

/// A global declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalType {
    /// Value type of the global
    pub value_type: ValueType,
    /// Whether `global.set` is allowed
    pub mutable:    bool,
}
