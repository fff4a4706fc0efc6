// WTK - wtk-error
// Module: WTK Error Codes
// SW-REQ-ID: REQ_004
// SW-REQ-ID: REQ_ERROR_001
//
// Copyright (c) 2024 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error codes for WTK

// Core error codes (1000-1999)
/// Internal checker state error (no open label)
pub const INVALID_STATE: u16 = 1000;

// Stack discipline (5000-5099)
/// Generic validation error
pub const VALIDATION_ERROR: u16 = 5000;
/// Value stack underflow below the current label's limit
pub const STACK_UNDERFLOW: u16 = 5001;
/// Values left over at the end of a label
pub const STACK_NOT_EMPTY: u16 = 5002;
/// Branch depth outside the label stack
pub const INVALID_BRANCH_DEPTH: u16 = 5003;
/// Rethrow target is not a catch label
pub const INVALID_RETHROW_TARGET: u16 = 5004;
/// `br_table` targets disagree on their branch signature
pub const BR_TABLE_INCONSISTENT: u16 = 5005;
/// SIMD lane immediate out of range
pub const LANE_INDEX_OUT_OF_RANGE: u16 = 5006;
/// Label kind does not allow the instruction (e.g. `else` outside `if`)
pub const LABEL_KIND_MISMATCH: u16 = 5007;
/// Tail call result signature differs from the enclosing function
pub const RETURN_SIGNATURE_MISMATCH: u16 = 5008;
/// `try_table` catch clause does not match its target label
pub const CATCH_SIGNATURE_MISMATCH: u16 = 5009;

// Module context errors (5100-5199)
/// Local index out of range
pub const INVALID_LOCAL_INDEX: u16 = 5100;
/// Global index out of range
pub const INVALID_GLOBAL_INDEX: u16 = 5101;
/// Function index out of range
pub const INVALID_FUNCTION_INDEX: u16 = 5102;
/// Table index out of range
pub const INVALID_TABLE_INDEX: u16 = 5103;
/// Memory index out of range
pub const INVALID_MEMORY_INDEX: u16 = 5104;
/// Tag index out of range
pub const INVALID_TAG_INDEX: u16 = 5105;
/// Type index out of range or not a function type
pub const INVALID_TYPE_INDEX: u16 = 5106;
/// Data segment index out of range
pub const INVALID_DATA_SEGMENT_INDEX: u16 = 5107;
/// Element segment index out of range
pub const INVALID_ELEM_SEGMENT_INDEX: u16 = 5108;
/// `global.set` on an immutable global
pub const IMMUTABLE_GLOBAL: u16 = 5109;
/// Instruction not allowed in a constant expression
pub const NON_CONSTANT_EXPRESSION: u16 = 5110;
/// Instruction belongs to a disabled feature
pub const FEATURE_DISABLED: u16 = 5111;
/// Function body is missing its final `end` or continues after it
pub const MALFORMED_BODY: u16 = 5112;
/// Memory access alignment larger than the natural alignment
pub const INVALID_ALIGNMENT: u16 = 5113;

// Type errors (6000-6099)
/// Value type mismatch
pub const TYPE_MISMATCH: u16 = 6001;
/// Structural reference or function type mismatch
pub const REFERENCE_TYPE_MISMATCH: u16 = 6002;
/// Operand is not a reference type
pub const EXPECTED_REFERENCE: u16 = 6003;
