// WTK - wtk-foundation
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Decoded WebAssembly instructions.
//!
//! An [`Instruction`] is what a binary or text decoder hands to the function
//! validator: the opcode together with its immediates, with every index still
//! unresolved against the module. Instructions whose typing is fully
//! described by a fixed operand list carry an [`Opcode`] descriptor instead
//! of a dedicated variant.

use crate::{
    opcode::Opcode,
    prelude::*,
    types::{
        BlockType, DataIdx, ElemIdx, FuncIdx, GlobalIdx, LabelIdx, LocalIdx, MemIdx, TableIdx,
        TagIdx, TypeIdx, ValueType,
    },
};

/// Memory immediate of load, store and atomic instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemArg {
    /// Memory index (multi-memory)
    pub memory: MemIdx,
    /// Alignment exponent: the access is aligned to `2^align` bytes
    pub align:  u32,
    /// Static address offset
    pub offset: u64,
}

impl MemArg {
    /// Memory argument for memory 0
    #[must_use]
    pub const fn new(align: u32, offset: u64) -> Self {
        Self {
            memory: 0,
            align,
            offset,
        }
    }
}

/// Kind of a `try_table` catch clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TryTableCatchKind {
    /// `catch $tag $label`: branches with the tag's parameters
    Catch,
    /// `catch_ref $tag $label`: tag parameters followed by an `exnref`
    CatchRef,
    /// `catch_all $label`: branches with no values
    CatchAll,
    /// `catch_all_ref $label`: branches with a single `exnref`
    CatchAllRef,
}

/// A `try_table` catch clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TryTableCatch {
    /// Clause kind
    pub kind:  TryTableCatchKind,
    /// Caught tag, `None` for the `catch_all` kinds
    pub tag:   Option<TagIdx>,
    /// Branch target, relative to the labels enclosing the `try_table`
    pub depth: LabelIdx,
}

impl TryTableCatch {
    /// Whether the clause pushes an `exnref` after the tag parameters
    #[must_use]
    pub const fn is_ref(&self) -> bool {
        matches!(self.kind, TryTableCatchKind::CatchRef | TryTableCatchKind::CatchAllRef)
    }
}

/// A decoded instruction with its immediates
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // Control
    /// `unreachable`
    Unreachable,
    /// `nop`
    Nop,
    /// `block` with its block type
    Block(BlockType),
    /// `loop` with its block type
    Loop(BlockType),
    /// `if` with its block type
    If(BlockType),
    /// `else`
    Else,
    /// `end` of a block or of the body
    End,

    // Exception handling (legacy and try_table)
    /// Legacy `try` with its block type
    Try(BlockType),
    /// Legacy `catch` of a tag
    Catch(TagIdx),
    /// Legacy `catch_all`
    CatchAll,
    /// Legacy `delegate` to a label
    Delegate(LabelIdx),
    /// Legacy `rethrow` of the exception caught at a label
    Rethrow(LabelIdx),
    /// `throw` of a tag
    Throw(TagIdx),
    /// `throw_ref`
    ThrowRef,
    /// `try_table`
    TryTable {
        /// Block type of the region
        block_type: BlockType,
        /// Catch clauses in encoding order
        catches:    Vec<TryTableCatch>,
    },

    // Branches
    /// `br`
    Br(LabelIdx),
    /// `br_if`
    BrIf(LabelIdx),
    /// `br_table`
    BrTable {
        /// Targets selected by the operand
        targets: Vec<LabelIdx>,
        /// Target when the operand is out of range
        default: LabelIdx,
    },
    /// `br_on_null`
    BrOnNull(LabelIdx),
    /// `br_on_non_null`
    BrOnNonNull(LabelIdx),

    // Calls
    /// `return`
    Return,
    /// `call`
    Call(FuncIdx),
    /// `call_indirect`
    CallIndirect {
        /// Table holding the callee
        table:      TableIdx,
        /// Expected callee type
        type_index: TypeIdx,
    },
    /// `call_ref` with the callee type
    CallRef(TypeIdx),
    /// `return_call`
    ReturnCall(FuncIdx),
    /// `return_call_indirect`
    ReturnCallIndirect {
        /// Table holding the callee
        table:      TableIdx,
        /// Expected callee type
        type_index: TypeIdx,
    },
    /// `return_call_ref` with the callee type
    ReturnCallRef(TypeIdx),

    // Parametric
    /// `drop`
    Drop,
    /// `select`, typed when the immediate is present
    Select(Option<ValueType>),

    // Variables
    /// `local.get`
    LocalGet(LocalIdx),
    /// `local.set`
    LocalSet(LocalIdx),
    /// `local.tee`
    LocalTee(LocalIdx),
    /// `global.get`
    GlobalGet(GlobalIdx),
    /// `global.set`
    GlobalSet(GlobalIdx),

    // Tables
    /// `table.get`
    TableGet(TableIdx),
    /// `table.set`
    TableSet(TableIdx),
    /// `table.size`
    TableSize(TableIdx),
    /// `table.grow`
    TableGrow(TableIdx),
    /// `table.fill`
    TableFill(TableIdx),
    /// `table.copy`
    TableCopy {
        /// Destination table
        dst: TableIdx,
        /// Source table
        src: TableIdx,
    },
    /// `table.init`
    TableInit {
        /// Destination table
        table: TableIdx,
        /// Source element segment
        elem:  ElemIdx,
    },
    /// `elem.drop`
    ElemDrop(ElemIdx),

    // Memory
    /// `memory.size`
    MemorySize(MemIdx),
    /// `memory.grow`
    MemoryGrow(MemIdx),
    /// `memory.fill`
    MemoryFill(MemIdx),
    /// `memory.copy`
    MemoryCopy {
        /// Destination memory
        dst: MemIdx,
        /// Source memory
        src: MemIdx,
    },
    /// `memory.init`
    MemoryInit {
        /// Destination memory
        memory: MemIdx,
        /// Source data segment
        data:   DataIdx,
    },
    /// `data.drop`
    DataDrop(DataIdx),

    // Constants
    /// `i32.const`
    I32Const(i32),
    /// `i64.const`
    I64Const(i64),
    /// `f32.const`, bit pattern of the constant
    F32Const(u32),
    /// `f64.const`, bit pattern of the constant
    F64Const(u64),
    /// `v128.const`
    V128Const(u128),

    // Descriptor-typed numeric instructions
    /// Unary numeric operator
    Unary(Opcode),
    /// Binary numeric operator
    Binary(Opcode),
    /// Comparison producing an `i32`
    Compare(Opcode),
    /// Conversion between value types
    Convert(Opcode),
    /// Three-operand operator
    Ternary(Opcode),

    // Memory access
    /// Plain load
    Load {
        /// Load descriptor
        op:     Opcode,
        /// Memory immediate
        memarg: MemArg,
    },
    /// Plain store
    Store {
        /// Store descriptor
        op:     Opcode,
        /// Memory immediate
        memarg: MemArg,
    },

    // Threads
    /// Atomic load
    AtomicLoad {
        /// Load descriptor
        op:     Opcode,
        /// Memory immediate
        memarg: MemArg,
    },
    /// Atomic store
    AtomicStore {
        /// Store descriptor
        op:     Opcode,
        /// Memory immediate
        memarg: MemArg,
    },
    /// Atomic read-modify-write
    AtomicRmw {
        /// Operation descriptor
        op:     Opcode,
        /// Memory immediate
        memarg: MemArg,
    },
    /// Atomic compare-exchange
    AtomicCmpxchg {
        /// Operation descriptor
        op:     Opcode,
        /// Memory immediate
        memarg: MemArg,
    },
    /// `memory.atomic.wait32` or `memory.atomic.wait64`
    AtomicWait {
        /// Operation descriptor
        op:     Opcode,
        /// Memory immediate
        memarg: MemArg,
    },
    /// `memory.atomic.notify`
    AtomicNotify {
        /// Operation descriptor
        op:     Opcode,
        /// Memory immediate
        memarg: MemArg,
    },
    /// `atomic.fence`
    AtomicFence,

    // SIMD
    /// Lane extract or replace
    SimdLaneOp {
        /// Operation descriptor
        op:   Opcode,
        /// Lane immediate
        lane: u8,
    },
    /// `i8x16.shuffle`
    SimdShuffle {
        /// Operation descriptor
        op:    Opcode,
        /// Lane selectors
        lanes: [u8; 16],
    },
    /// Load into a single lane
    SimdLoadLane {
        /// Operation descriptor
        op:     Opcode,
        /// Memory immediate
        memarg: MemArg,
        /// Lane immediate
        lane:   u8,
    },
    /// Store from a single lane
    SimdStoreLane {
        /// Operation descriptor
        op:     Opcode,
        /// Memory immediate
        memarg: MemArg,
        /// Lane immediate
        lane:   u8,
    },

    // References
    /// `ref.null` of a heap type
    RefNull(ValueType),
    /// `ref.is_null`
    RefIsNull,
    /// `ref.func`
    RefFunc(FuncIdx),
    /// `ref.as_non_null`
    RefAsNonNull,
}

impl Instruction {
    /// Text-format mnemonic
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unreachable => "unreachable",
            Self::Nop => "nop",
            Self::Block(_) => "block",
            Self::Loop(_) => "loop",
            Self::If(_) => "if",
            Self::Else => "else",
            Self::End => "end",
            Self::Try(_) => "try",
            Self::Catch(_) => "catch",
            Self::CatchAll => "catch_all",
            Self::Delegate(_) => "delegate",
            Self::Rethrow(_) => "rethrow",
            Self::Throw(_) => "throw",
            Self::ThrowRef => "throw_ref",
            Self::TryTable { .. } => "try_table",
            Self::Br(_) => "br",
            Self::BrIf(_) => "br_if",
            Self::BrTable { .. } => "br_table",
            Self::BrOnNull(_) => "br_on_null",
            Self::BrOnNonNull(_) => "br_on_non_null",
            Self::Return => "return",
            Self::Call(_) => "call",
            Self::CallIndirect { .. } => "call_indirect",
            Self::CallRef(_) => "call_ref",
            Self::ReturnCall(_) => "return_call",
            Self::ReturnCallIndirect { .. } => "return_call_indirect",
            Self::ReturnCallRef(_) => "return_call_ref",
            Self::Drop => "drop",
            Self::Select(_) => "select",
            Self::LocalGet(_) => "local.get",
            Self::LocalSet(_) => "local.set",
            Self::LocalTee(_) => "local.tee",
            Self::GlobalGet(_) => "global.get",
            Self::GlobalSet(_) => "global.set",
            Self::TableGet(_) => "table.get",
            Self::TableSet(_) => "table.set",
            Self::TableSize(_) => "table.size",
            Self::TableGrow(_) => "table.grow",
            Self::TableFill(_) => "table.fill",
            Self::TableCopy { .. } => "table.copy",
            Self::TableInit { .. } => "table.init",
            Self::ElemDrop(_) => "elem.drop",
            Self::MemorySize(_) => "memory.size",
            Self::MemoryGrow(_) => "memory.grow",
            Self::MemoryFill(_) => "memory.fill",
            Self::MemoryCopy { .. } => "memory.copy",
            Self::MemoryInit { .. } => "memory.init",
            Self::DataDrop(_) => "data.drop",
            Self::I32Const(_) => "i32.const",
            Self::I64Const(_) => "i64.const",
            Self::F32Const(_) => "f32.const",
            Self::F64Const(_) => "f64.const",
            Self::V128Const(_) => "v128.const",
            Self::Unary(op)
            | Self::Binary(op)
            | Self::Compare(op)
            | Self::Convert(op)
            | Self::Ternary(op)
            | Self::Load { op, .. }
            | Self::Store { op, .. }
            | Self::AtomicLoad { op, .. }
            | Self::AtomicStore { op, .. }
            | Self::AtomicRmw { op, .. }
            | Self::AtomicCmpxchg { op, .. }
            | Self::AtomicWait { op, .. }
            | Self::AtomicNotify { op, .. }
            | Self::SimdLaneOp { op, .. }
            | Self::SimdShuffle { op, .. }
            | Self::SimdLoadLane { op, .. }
            | Self::SimdStoreLane { op, .. } => op.name(),
            Self::AtomicFence => "atomic.fence",
            Self::RefNull(_) => "ref.null",
            Self::RefIsNull => "ref.is_null",
            Self::RefFunc(_) => "ref.func",
            Self::RefAsNonNull => "ref.as_non_null",
        }
    }

    /// The memory immediate of memory-access instructions
    #[must_use]
    pub const fn memarg(&self) -> Option<&MemArg> {
        match self {
            Self::Load { memarg, .. }
            | Self::Store { memarg, .. }
            | Self::AtomicLoad { memarg, .. }
            | Self::AtomicStore { memarg, .. }
            | Self::AtomicRmw { memarg, .. }
            | Self::AtomicCmpxchg { memarg, .. }
            | Self::AtomicWait { memarg, .. }
            | Self::AtomicNotify { memarg, .. }
            | Self::SimdLoadLane { memarg, .. }
            | Self::SimdStoreLane { memarg, .. } => Some(memarg),
            _ => None,
        }
    }

    /// Whether the instruction opens a new control region
    #[must_use]
    pub const fn is_block_start(&self) -> bool {
        matches!(
            self,
            Self::Block(_) | Self::Loop(_) | Self::If(_) | Self::Try(_) | Self::TryTable { .. }
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(Instruction::Unary(Opcode::I32_CLZ).name(), "i32.clz");
        assert_eq!(Instruction::BrTable { targets: vec![0, 1], default: 2 }.name(), "br_table");
        assert_eq!(Instruction::RefAsNonNull.to_string(), "ref.as_non_null");
    }

    #[test]
    fn test_memarg_accessor() {
        let load = Instruction::Load {
            op:     Opcode::I64_LOAD,
            memarg: MemArg::new(3, 16),
        };
        assert_eq!(load.memarg().map(|m| m.offset), Some(16));
        assert_eq!(Instruction::Nop.memarg(), None);
    }

    #[test]
    fn test_catch_clause_kinds() {
        let clause = TryTableCatch {
            kind:  TryTableCatchKind::CatchAllRef,
            tag:   None,
            depth: 0,
        };
        assert!(clause.is_ref());
        assert!(Instruction::TryTable { block_type: BlockType::Empty, catches: vec![clause] }
            .is_block_start());
        assert!(!Instruction::Else.is_block_start());
    }
}
