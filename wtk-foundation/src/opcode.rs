// WTK - wtk-foundation
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Static opcode descriptors.
//!
//! Every non-control instruction whose typing is fully described by a fixed
//! operand list and an optional result is represented by an [`Opcode`]
//! descriptor. The type checker validates these instructions generically:
//! it pops the operands in reverse order, checks them against the
//! descriptor, and pushes the result. Memory-access descriptors also carry
//! the natural access size, and SIMD descriptors the number of lanes of
//! their shape.

use core::fmt::{self, Display};

use crate::types::ValueType::{self, F32, F64, I32, I64, V128};

/// Maximum number of operands a descriptor can carry
pub const MAX_OPERANDS: usize = 3;

/// Typing descriptor of a single opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    name:        &'static str,
    params:      [Option<ValueType>; MAX_OPERANDS],
    result:      Option<ValueType>,
    memory_size: u32,
    lane_count:  u32,
}

const fn starts_with(name: &str, prefix: &str) -> bool {
    let name = name.as_bytes();
    let prefix = prefix.as_bytes();
    if name.len() < prefix.len() {
        return false;
    }
    let mut i = 0;
    while i < prefix.len() {
        if name[i] != prefix[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Lane count implied by the shape prefix of a SIMD opcode name.
const fn lane_count_of(name: &str) -> u32 {
    if starts_with(name, "i8x16.") {
        16
    } else if starts_with(name, "i16x8.") {
        8
    } else if starts_with(name, "i32x4.") || starts_with(name, "f32x4.") {
        4
    } else if starts_with(name, "i64x2.") || starts_with(name, "f64x2.") {
        2
    } else {
        0
    }
}

impl Opcode {
    const fn make(
        name: &'static str,
        params: [Option<ValueType>; MAX_OPERANDS],
        result: Option<ValueType>,
        memory_size: u32,
    ) -> Self {
        Self {
            name,
            params,
            result,
            memory_size,
            lane_count: lane_count_of(name),
        }
    }

    const fn unary(name: &'static str, param: ValueType, result: ValueType) -> Self {
        Self::make(name, [Some(param), None, None], Some(result), 0)
    }

    const fn binary(name: &'static str, lhs: ValueType, rhs: ValueType, result: ValueType) -> Self {
        Self::make(name, [Some(lhs), Some(rhs), None], Some(result), 0)
    }

    const fn ternary(
        name: &'static str,
        first: ValueType,
        second: ValueType,
        third: ValueType,
        result: ValueType,
    ) -> Self {
        Self::make(name, [Some(first), Some(second), Some(third)], Some(result), 0)
    }

    const fn load(name: &'static str, result: ValueType, memory_size: u32) -> Self {
        Self::make(name, [Some(I32), None, None], Some(result), memory_size)
    }

    const fn store(name: &'static str, value: ValueType, memory_size: u32) -> Self {
        Self::make(name, [Some(I32), Some(value), None], None, memory_size)
    }

    const fn rmw(name: &'static str, value: ValueType, memory_size: u32) -> Self {
        Self::make(name, [Some(I32), Some(value), None], Some(value), memory_size)
    }

    const fn cmpxchg(name: &'static str, value: ValueType, memory_size: u32) -> Self {
        Self::make(name, [Some(I32), Some(value), Some(value)], Some(value), memory_size)
    }

    const fn load_lane(name: &'static str, memory_size: u32) -> Self {
        let mut op = Self::make(name, [Some(I32), Some(V128), None], Some(V128), memory_size);
        op.lane_count = 16 / memory_size;
        op
    }

    const fn store_lane(name: &'static str, memory_size: u32) -> Self {
        let mut op = Self::make(name, [Some(I32), Some(V128), None], None, memory_size);
        op.lane_count = 16 / memory_size;
        op
    }

    /// Text-format mnemonic, e.g. `i32.add`
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Operand type at position `index` (0 is the deepest operand)
    #[must_use]
    pub const fn param(&self, index: usize) -> Option<ValueType> {
        if index < MAX_OPERANDS { self.params[index] } else { None }
    }

    /// Operand types, deepest first
    pub fn params(&self) -> impl Iterator<Item = ValueType> + '_ {
        self.params.iter().filter_map(|param| *param)
    }

    /// Number of operands
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params().count()
    }

    /// Result type, `None` for stores
    #[must_use]
    pub const fn result_type(&self) -> Option<ValueType> {
        self.result
    }

    /// Natural access size in bytes, 0 for non-memory opcodes
    #[must_use]
    pub const fn memory_size(&self) -> u32 {
        self.memory_size
    }

    /// Number of lanes of the SIMD shape, 0 for non-lane opcodes
    #[must_use]
    pub const fn lane_count(&self) -> u32 {
        self.lane_count
    }

    /// Whether this opcode belongs to the threads proposal
    #[must_use]
    pub fn is_atomic(&self) -> bool {
        self.name.contains(".atomic.")
    }

    /// Whether this opcode operates on or produces `v128`
    #[must_use]
    pub fn is_simd(&self) -> bool {
        self.lane_count > 0 || self.params().any(|ty| ty == V128) || self.result == Some(V128)
    }

    /// Whether an alignment immediate of `2^align_log2` bytes is valid.
    /// Atomic accesses must be exactly naturally aligned; other accesses may
    /// be under-aligned but never over-aligned.
    #[must_use]
    pub fn is_valid_alignment(&self, align_log2: u32) -> bool {
        let Some(align) = 1u32.checked_shl(align_log2) else {
            return false;
        };
        if self.is_atomic() { align == self.memory_size } else { align <= self.memory_size }
    }

    /// Look up a descriptor by its text-format mnemonic
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|op| op.name == name).copied()
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

macro_rules! define_opcodes {
    ($($ident:ident => $ctor:ident($name:literal $(, $arg:expr)*);)*) => {
        impl Opcode {
            $(
                #[doc = concat!("`", $name, "`")]
                pub const $ident: Self = Self::$ctor($name $(, $arg)*);
            )*

            /// Every descriptor in the table, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$ident),*];
        }
    };
}

define_opcodes! {
    // i32 arithmetic
    I32_EQZ => unary("i32.eqz", I32, I32);
    I32_CLZ => unary("i32.clz", I32, I32);
    I32_CTZ => unary("i32.ctz", I32, I32);
    I32_POPCNT => unary("i32.popcnt", I32, I32);
    I32_ADD => binary("i32.add", I32, I32, I32);
    I32_SUB => binary("i32.sub", I32, I32, I32);
    I32_MUL => binary("i32.mul", I32, I32, I32);
    I32_DIV_S => binary("i32.div_s", I32, I32, I32);
    I32_DIV_U => binary("i32.div_u", I32, I32, I32);
    I32_REM_S => binary("i32.rem_s", I32, I32, I32);
    I32_REM_U => binary("i32.rem_u", I32, I32, I32);
    I32_AND => binary("i32.and", I32, I32, I32);
    I32_OR => binary("i32.or", I32, I32, I32);
    I32_XOR => binary("i32.xor", I32, I32, I32);
    I32_SHL => binary("i32.shl", I32, I32, I32);
    I32_SHR_S => binary("i32.shr_s", I32, I32, I32);
    I32_SHR_U => binary("i32.shr_u", I32, I32, I32);
    I32_ROTL => binary("i32.rotl", I32, I32, I32);
    I32_ROTR => binary("i32.rotr", I32, I32, I32);
    I32_EQ => binary("i32.eq", I32, I32, I32);
    I32_NE => binary("i32.ne", I32, I32, I32);
    I32_LT_S => binary("i32.lt_s", I32, I32, I32);
    I32_LT_U => binary("i32.lt_u", I32, I32, I32);
    I32_GT_S => binary("i32.gt_s", I32, I32, I32);
    I32_GT_U => binary("i32.gt_u", I32, I32, I32);
    I32_LE_S => binary("i32.le_s", I32, I32, I32);
    I32_LE_U => binary("i32.le_u", I32, I32, I32);
    I32_GE_S => binary("i32.ge_s", I32, I32, I32);
    I32_GE_U => binary("i32.ge_u", I32, I32, I32);

    // i64 arithmetic
    I64_EQZ => unary("i64.eqz", I64, I32);
    I64_CLZ => unary("i64.clz", I64, I64);
    I64_CTZ => unary("i64.ctz", I64, I64);
    I64_POPCNT => unary("i64.popcnt", I64, I64);
    I64_ADD => binary("i64.add", I64, I64, I64);
    I64_SUB => binary("i64.sub", I64, I64, I64);
    I64_MUL => binary("i64.mul", I64, I64, I64);
    I64_DIV_S => binary("i64.div_s", I64, I64, I64);
    I64_DIV_U => binary("i64.div_u", I64, I64, I64);
    I64_REM_S => binary("i64.rem_s", I64, I64, I64);
    I64_REM_U => binary("i64.rem_u", I64, I64, I64);
    I64_AND => binary("i64.and", I64, I64, I64);
    I64_OR => binary("i64.or", I64, I64, I64);
    I64_XOR => binary("i64.xor", I64, I64, I64);
    I64_SHL => binary("i64.shl", I64, I64, I64);
    I64_SHR_S => binary("i64.shr_s", I64, I64, I64);
    I64_SHR_U => binary("i64.shr_u", I64, I64, I64);
    I64_ROTL => binary("i64.rotl", I64, I64, I64);
    I64_ROTR => binary("i64.rotr", I64, I64, I64);
    I64_EQ => binary("i64.eq", I64, I64, I32);
    I64_NE => binary("i64.ne", I64, I64, I32);
    I64_LT_S => binary("i64.lt_s", I64, I64, I32);
    I64_LT_U => binary("i64.lt_u", I64, I64, I32);
    I64_GT_S => binary("i64.gt_s", I64, I64, I32);
    I64_GT_U => binary("i64.gt_u", I64, I64, I32);
    I64_LE_S => binary("i64.le_s", I64, I64, I32);
    I64_LE_U => binary("i64.le_u", I64, I64, I32);
    I64_GE_S => binary("i64.ge_s", I64, I64, I32);
    I64_GE_U => binary("i64.ge_u", I64, I64, I32);

    // f32 arithmetic
    F32_ABS => unary("f32.abs", F32, F32);
    F32_NEG => unary("f32.neg", F32, F32);
    F32_CEIL => unary("f32.ceil", F32, F32);
    F32_FLOOR => unary("f32.floor", F32, F32);
    F32_TRUNC => unary("f32.trunc", F32, F32);
    F32_NEAREST => unary("f32.nearest", F32, F32);
    F32_SQRT => unary("f32.sqrt", F32, F32);
    F32_ADD => binary("f32.add", F32, F32, F32);
    F32_SUB => binary("f32.sub", F32, F32, F32);
    F32_MUL => binary("f32.mul", F32, F32, F32);
    F32_DIV => binary("f32.div", F32, F32, F32);
    F32_MIN => binary("f32.min", F32, F32, F32);
    F32_MAX => binary("f32.max", F32, F32, F32);
    F32_COPYSIGN => binary("f32.copysign", F32, F32, F32);
    F32_EQ => binary("f32.eq", F32, F32, I32);
    F32_NE => binary("f32.ne", F32, F32, I32);
    F32_LT => binary("f32.lt", F32, F32, I32);
    F32_GT => binary("f32.gt", F32, F32, I32);
    F32_LE => binary("f32.le", F32, F32, I32);
    F32_GE => binary("f32.ge", F32, F32, I32);

    // f64 arithmetic
    F64_ABS => unary("f64.abs", F64, F64);
    F64_NEG => unary("f64.neg", F64, F64);
    F64_CEIL => unary("f64.ceil", F64, F64);
    F64_FLOOR => unary("f64.floor", F64, F64);
    F64_TRUNC => unary("f64.trunc", F64, F64);
    F64_NEAREST => unary("f64.nearest", F64, F64);
    F64_SQRT => unary("f64.sqrt", F64, F64);
    F64_ADD => binary("f64.add", F64, F64, F64);
    F64_SUB => binary("f64.sub", F64, F64, F64);
    F64_MUL => binary("f64.mul", F64, F64, F64);
    F64_DIV => binary("f64.div", F64, F64, F64);
    F64_MIN => binary("f64.min", F64, F64, F64);
    F64_MAX => binary("f64.max", F64, F64, F64);
    F64_COPYSIGN => binary("f64.copysign", F64, F64, F64);
    F64_EQ => binary("f64.eq", F64, F64, I32);
    F64_NE => binary("f64.ne", F64, F64, I32);
    F64_LT => binary("f64.lt", F64, F64, I32);
    F64_GT => binary("f64.gt", F64, F64, I32);
    F64_LE => binary("f64.le", F64, F64, I32);
    F64_GE => binary("f64.ge", F64, F64, I32);

    // Conversions
    I32_WRAP_I64 => unary("i32.wrap_i64", I64, I32);
    I32_TRUNC_F32_S => unary("i32.trunc_f32_s", F32, I32);
    I32_TRUNC_F32_U => unary("i32.trunc_f32_u", F32, I32);
    I32_TRUNC_F64_S => unary("i32.trunc_f64_s", F64, I32);
    I32_TRUNC_F64_U => unary("i32.trunc_f64_u", F64, I32);
    I64_EXTEND_I32_S => unary("i64.extend_i32_s", I32, I64);
    I64_EXTEND_I32_U => unary("i64.extend_i32_u", I32, I64);
    I64_TRUNC_F32_S => unary("i64.trunc_f32_s", F32, I64);
    I64_TRUNC_F32_U => unary("i64.trunc_f32_u", F32, I64);
    I64_TRUNC_F64_S => unary("i64.trunc_f64_s", F64, I64);
    I64_TRUNC_F64_U => unary("i64.trunc_f64_u", F64, I64);
    F32_CONVERT_I32_S => unary("f32.convert_i32_s", I32, F32);
    F32_CONVERT_I32_U => unary("f32.convert_i32_u", I32, F32);
    F32_CONVERT_I64_S => unary("f32.convert_i64_s", I64, F32);
    F32_CONVERT_I64_U => unary("f32.convert_i64_u", I64, F32);
    F32_DEMOTE_F64 => unary("f32.demote_f64", F64, F32);
    F64_CONVERT_I32_S => unary("f64.convert_i32_s", I32, F64);
    F64_CONVERT_I32_U => unary("f64.convert_i32_u", I32, F64);
    F64_CONVERT_I64_S => unary("f64.convert_i64_s", I64, F64);
    F64_CONVERT_I64_U => unary("f64.convert_i64_u", I64, F64);
    F64_PROMOTE_F32 => unary("f64.promote_f32", F32, F64);
    I32_REINTERPRET_F32 => unary("i32.reinterpret_f32", F32, I32);
    I64_REINTERPRET_F64 => unary("i64.reinterpret_f64", F64, I64);
    F32_REINTERPRET_I32 => unary("f32.reinterpret_i32", I32, F32);
    F64_REINTERPRET_I64 => unary("f64.reinterpret_i64", I64, F64);

    // Sign extension
    I32_EXTEND8_S => unary("i32.extend8_s", I32, I32);
    I32_EXTEND16_S => unary("i32.extend16_s", I32, I32);
    I64_EXTEND8_S => unary("i64.extend8_s", I64, I64);
    I64_EXTEND16_S => unary("i64.extend16_s", I64, I64);
    I64_EXTEND32_S => unary("i64.extend32_s", I64, I64);

    // Saturating truncation
    I32_TRUNC_SAT_F32_S => unary("i32.trunc_sat_f32_s", F32, I32);
    I32_TRUNC_SAT_F32_U => unary("i32.trunc_sat_f32_u", F32, I32);
    I32_TRUNC_SAT_F64_S => unary("i32.trunc_sat_f64_s", F64, I32);
    I32_TRUNC_SAT_F64_U => unary("i32.trunc_sat_f64_u", F64, I32);
    I64_TRUNC_SAT_F32_S => unary("i64.trunc_sat_f32_s", F32, I64);
    I64_TRUNC_SAT_F32_U => unary("i64.trunc_sat_f32_u", F32, I64);
    I64_TRUNC_SAT_F64_S => unary("i64.trunc_sat_f64_s", F64, I64);
    I64_TRUNC_SAT_F64_U => unary("i64.trunc_sat_f64_u", F64, I64);

    // Loads
    I32_LOAD => load("i32.load", I32, 4);
    I64_LOAD => load("i64.load", I64, 8);
    F32_LOAD => load("f32.load", F32, 4);
    F64_LOAD => load("f64.load", F64, 8);
    I32_LOAD8_S => load("i32.load8_s", I32, 1);
    I32_LOAD8_U => load("i32.load8_u", I32, 1);
    I32_LOAD16_S => load("i32.load16_s", I32, 2);
    I32_LOAD16_U => load("i32.load16_u", I32, 2);
    I64_LOAD8_S => load("i64.load8_s", I64, 1);
    I64_LOAD8_U => load("i64.load8_u", I64, 1);
    I64_LOAD16_S => load("i64.load16_s", I64, 2);
    I64_LOAD16_U => load("i64.load16_u", I64, 2);
    I64_LOAD32_S => load("i64.load32_s", I64, 4);
    I64_LOAD32_U => load("i64.load32_u", I64, 4);
    V128_LOAD => load("v128.load", V128, 16);
    V128_LOAD8_SPLAT => load("v128.load8_splat", V128, 1);
    V128_LOAD16_SPLAT => load("v128.load16_splat", V128, 2);
    V128_LOAD32_SPLAT => load("v128.load32_splat", V128, 4);
    V128_LOAD64_SPLAT => load("v128.load64_splat", V128, 8);
    V128_LOAD32_ZERO => load("v128.load32_zero", V128, 4);
    V128_LOAD64_ZERO => load("v128.load64_zero", V128, 8);

    // Stores
    I32_STORE => store("i32.store", I32, 4);
    I64_STORE => store("i64.store", I64, 8);
    F32_STORE => store("f32.store", F32, 4);
    F64_STORE => store("f64.store", F64, 8);
    I32_STORE8 => store("i32.store8", I32, 1);
    I32_STORE16 => store("i32.store16", I32, 2);
    I64_STORE8 => store("i64.store8", I64, 1);
    I64_STORE16 => store("i64.store16", I64, 2);
    I64_STORE32 => store("i64.store32", I64, 4);
    V128_STORE => store("v128.store", V128, 16);

    // SIMD lanes
    I8X16_EXTRACT_LANE_S => unary("i8x16.extract_lane_s", V128, I32);
    I8X16_EXTRACT_LANE_U => unary("i8x16.extract_lane_u", V128, I32);
    I8X16_REPLACE_LANE => binary("i8x16.replace_lane", V128, I32, V128);
    I16X8_EXTRACT_LANE_S => unary("i16x8.extract_lane_s", V128, I32);
    I16X8_EXTRACT_LANE_U => unary("i16x8.extract_lane_u", V128, I32);
    I16X8_REPLACE_LANE => binary("i16x8.replace_lane", V128, I32, V128);
    I32X4_EXTRACT_LANE => unary("i32x4.extract_lane", V128, I32);
    I32X4_REPLACE_LANE => binary("i32x4.replace_lane", V128, I32, V128);
    I64X2_EXTRACT_LANE => unary("i64x2.extract_lane", V128, I64);
    I64X2_REPLACE_LANE => binary("i64x2.replace_lane", V128, I64, V128);
    F32X4_EXTRACT_LANE => unary("f32x4.extract_lane", V128, F32);
    F32X4_REPLACE_LANE => binary("f32x4.replace_lane", V128, F32, V128);
    F64X2_EXTRACT_LANE => unary("f64x2.extract_lane", V128, F64);
    F64X2_REPLACE_LANE => binary("f64x2.replace_lane", V128, F64, V128);
    I8X16_SHUFFLE => binary("i8x16.shuffle", V128, V128, V128);
    I8X16_SWIZZLE => binary("i8x16.swizzle", V128, V128, V128);

    // SIMD splats
    I8X16_SPLAT => unary("i8x16.splat", I32, V128);
    I16X8_SPLAT => unary("i16x8.splat", I32, V128);
    I32X4_SPLAT => unary("i32x4.splat", I32, V128);
    I64X2_SPLAT => unary("i64x2.splat", I64, V128);
    F32X4_SPLAT => unary("f32x4.splat", F32, V128);
    F64X2_SPLAT => unary("f64x2.splat", F64, V128);

    // SIMD arithmetic
    V128_NOT => unary("v128.not", V128, V128);
    V128_AND => binary("v128.and", V128, V128, V128);
    V128_OR => binary("v128.or", V128, V128, V128);
    V128_XOR => binary("v128.xor", V128, V128, V128);
    V128_BITSELECT => ternary("v128.bitselect", V128, V128, V128, V128);
    V128_ANY_TRUE => unary("v128.any_true", V128, I32);
    I8X16_ABS => unary("i8x16.abs", V128, V128);
    I8X16_NEG => unary("i8x16.neg", V128, V128);
    I8X16_ALL_TRUE => unary("i8x16.all_true", V128, I32);
    I8X16_EQ => binary("i8x16.eq", V128, V128, V128);
    I8X16_ADD => binary("i8x16.add", V128, V128, V128);
    I8X16_SUB => binary("i8x16.sub", V128, V128, V128);
    I16X8_ADD => binary("i16x8.add", V128, V128, V128);
    I16X8_SUB => binary("i16x8.sub", V128, V128, V128);
    I16X8_MUL => binary("i16x8.mul", V128, V128, V128);
    I32X4_EQ => binary("i32x4.eq", V128, V128, V128);
    I32X4_ADD => binary("i32x4.add", V128, V128, V128);
    I32X4_SUB => binary("i32x4.sub", V128, V128, V128);
    I32X4_MUL => binary("i32x4.mul", V128, V128, V128);
    I32X4_SHL => binary("i32x4.shl", V128, I32, V128);
    I64X2_ADD => binary("i64x2.add", V128, V128, V128);
    I64X2_SUB => binary("i64x2.sub", V128, V128, V128);
    F32X4_EQ => binary("f32x4.eq", V128, V128, V128);
    F32X4_NEG => unary("f32x4.neg", V128, V128);
    F32X4_SQRT => unary("f32x4.sqrt", V128, V128);
    F32X4_ADD => binary("f32x4.add", V128, V128, V128);
    F32X4_SUB => binary("f32x4.sub", V128, V128, V128);
    F32X4_MUL => binary("f32x4.mul", V128, V128, V128);
    F32X4_DIV => binary("f32x4.div", V128, V128, V128);
    F64X2_ADD => binary("f64x2.add", V128, V128, V128);
    F64X2_SUB => binary("f64x2.sub", V128, V128, V128);
    F64X2_MUL => binary("f64x2.mul", V128, V128, V128);
    F64X2_DIV => binary("f64x2.div", V128, V128, V128);

    // SIMD lane loads and stores
    V128_LOAD8_LANE => load_lane("v128.load8_lane", 1);
    V128_LOAD16_LANE => load_lane("v128.load16_lane", 2);
    V128_LOAD32_LANE => load_lane("v128.load32_lane", 4);
    V128_LOAD64_LANE => load_lane("v128.load64_lane", 8);
    V128_STORE8_LANE => store_lane("v128.store8_lane", 1);
    V128_STORE16_LANE => store_lane("v128.store16_lane", 2);
    V128_STORE32_LANE => store_lane("v128.store32_lane", 4);
    V128_STORE64_LANE => store_lane("v128.store64_lane", 8);

    // Atomics
    MEMORY_ATOMIC_NOTIFY => rmw("memory.atomic.notify", I32, 4);
    MEMORY_ATOMIC_WAIT32 => cmpxchg_wait("memory.atomic.wait32", I32, 4);
    MEMORY_ATOMIC_WAIT64 => cmpxchg_wait("memory.atomic.wait64", I64, 8);
    I32_ATOMIC_LOAD => load("i32.atomic.load", I32, 4);
    I64_ATOMIC_LOAD => load("i64.atomic.load", I64, 8);
    I32_ATOMIC_LOAD8_U => load("i32.atomic.load8_u", I32, 1);
    I32_ATOMIC_LOAD16_U => load("i32.atomic.load16_u", I32, 2);
    I32_ATOMIC_STORE => store("i32.atomic.store", I32, 4);
    I64_ATOMIC_STORE => store("i64.atomic.store", I64, 8);
    I32_ATOMIC_STORE8 => store("i32.atomic.store8", I32, 1);
    I32_ATOMIC_RMW_ADD => rmw("i32.atomic.rmw.add", I32, 4);
    I64_ATOMIC_RMW_ADD => rmw("i64.atomic.rmw.add", I64, 8);
    I32_ATOMIC_RMW_SUB => rmw("i32.atomic.rmw.sub", I32, 4);
    I64_ATOMIC_RMW_SUB => rmw("i64.atomic.rmw.sub", I64, 8);
    I32_ATOMIC_RMW_XCHG => rmw("i32.atomic.rmw.xchg", I32, 4);
    I64_ATOMIC_RMW_XCHG => rmw("i64.atomic.rmw.xchg", I64, 8);
    I32_ATOMIC_RMW_CMPXCHG => cmpxchg("i32.atomic.rmw.cmpxchg", I32, 4);
    I64_ATOMIC_RMW_CMPXCHG => cmpxchg("i64.atomic.rmw.cmpxchg", I64, 8);
}

impl Opcode {
    /// `memory.atomic.wait{32,64}`: address, expected value, i64 timeout,
    /// producing an i32 status.
    const fn cmpxchg_wait(name: &'static str, expected: ValueType, memory_size: u32) -> Self {
        Self::make(name, [Some(I32), Some(expected), Some(I64)], Some(I32), memory_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_lane_counts_follow_shape() {
        assert_eq!(Opcode::I8X16_EXTRACT_LANE_S.lane_count(), 16);
        assert_eq!(Opcode::I16X8_REPLACE_LANE.lane_count(), 8);
        assert_eq!(Opcode::F32X4_EXTRACT_LANE.lane_count(), 4);
        assert_eq!(Opcode::F64X2_REPLACE_LANE.lane_count(), 2);
        assert_eq!(Opcode::V128_LOAD16_LANE.lane_count(), 8);
        assert_eq!(Opcode::V128_NOT.lane_count(), 0);
        assert_eq!(Opcode::I64_LOAD8_S.lane_count(), 0);
    }

    #[test]
    fn test_operands_and_result() {
        let op = Opcode::I32_STORE;
        assert_eq!(op.arity(), 2);
        assert_eq!(op.param(0), Some(ValueType::I32));
        assert_eq!(op.param(1), Some(ValueType::I32));
        assert_eq!(op.result_type(), None);
        assert_eq!(op.memory_size(), 4);

        let wait = Opcode::MEMORY_ATOMIC_WAIT64;
        let params: Vec<_> = wait.params().collect();
        assert_eq!(params, vec![ValueType::I32, ValueType::I64, ValueType::I64]);
        assert_eq!(wait.result_type(), Some(ValueType::I32));
        assert_eq!(Opcode::I64_EQ.result_type(), Some(ValueType::I32));
    }

    #[test]
    fn test_alignment_rules() {
        assert!(Opcode::I64_LOAD.is_valid_alignment(3));
        assert!(Opcode::I64_LOAD.is_valid_alignment(0));
        assert!(!Opcode::I64_LOAD.is_valid_alignment(4));
        assert!(Opcode::I64_ATOMIC_LOAD.is_valid_alignment(3));
        assert!(!Opcode::I64_ATOMIC_LOAD.is_valid_alignment(2));
        assert!(!Opcode::I32_LOAD.is_valid_alignment(40));
    }

    #[test]
    fn test_names_are_unique_and_resolvable() {
        let mut seen = BTreeSet::new();
        for op in Opcode::ALL {
            assert!(seen.insert(op.name()), "duplicate opcode {}", op.name());
            assert_eq!(Opcode::from_name(op.name()), Some(*op));
        }
        assert_eq!(Opcode::from_name("i32.frobnicate"), None);
    }

    #[test]
    fn test_feature_classification() {
        assert!(Opcode::I32_ATOMIC_RMW_ADD.is_atomic());
        assert!(!Opcode::I32_ADD.is_atomic());
        assert!(Opcode::V128_ANY_TRUE.is_simd());
        assert!(Opcode::I8X16_SPLAT.is_simd());
        assert!(!Opcode::F64_SQRT.is_simd());
        assert_eq!(Opcode::I32_ADD.to_string(), "i32.add");
    }
}
