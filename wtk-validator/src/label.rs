// WTK - wtk-validator
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Control labels.
//!
//! One [`Label`] exists per open control region. It records the region's
//! signature and the value-stack height at entry; code inside the region
//! never pops below that height.

use crate::prelude::*;

/// Kind of an open control region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// Function body
    Func,
    /// Constant initializer expression
    InitExpr,
    /// `block`
    Block,
    /// `loop`
    Loop,
    /// `if`, before any `else`
    If,
    /// The `else` arm of an `if`
    Else,
    /// `try`, before any `catch`
    Try,
    /// A `catch` or `catch_all` arm of a `try`
    Catch,
    /// `try_table`
    TryTable,
}

impl LabelKind {
    /// Name used in diagnostics about the end of the region
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Func => "function",
            Self::InitExpr => "initializer expression",
            Self::Block => "block",
            Self::Loop => "loop",
            Self::If => "if",
            Self::Else => "if false branch",
            Self::Try => "try",
            Self::Catch => "try catch",
            Self::TryTable => "try table",
        }
    }
}

impl Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// An open control region on the label stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub(crate) kind:        LabelKind,
    pub(crate) params:      Vec<ValueType>,
    pub(crate) results:     Vec<ValueType>,
    pub(crate) limit:       usize,
    pub(crate) unreachable: bool,
}

impl Label {
    pub(crate) fn new(
        kind: LabelKind,
        params: &[ValueType],
        results: &[ValueType],
        limit: usize,
    ) -> Self {
        Self {
            kind,
            params: params.to_vec(),
            results: results.to_vec(),
            limit,
            unreachable: false,
        }
    }

    /// Region kind
    #[must_use]
    pub const fn kind(&self) -> LabelKind {
        self.kind
    }

    /// Values the region consumes on entry
    #[must_use]
    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    /// Values the region leaves on exit
    #[must_use]
    pub fn results(&self) -> &[ValueType] {
        &self.results
    }

    /// Value-stack height when the region was entered
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Whether the rest of the region is statically unreachable
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        self.unreachable
    }

    /// Values a branch to this label carries: a loop is re-entered, so its
    /// branches carry the parameters; every other region is exited.
    #[must_use]
    pub fn br_types(&self) -> &[ValueType] {
        if self.kind == LabelKind::Loop { &self.params } else { &self.results }
    }
}
