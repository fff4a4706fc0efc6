//! Integration tests for whole-body validation.

#![allow(clippy::unwrap_used)]

use std::{cell::RefCell, rc::Rc};

use wtk_foundation::{
    BlockType, FuncType, Instruction, Limits, TableType, TryTableCatch, TryTableCatchKind,
    ValueType,
};
use wtk_validator::{Features, FunctionValidator, ModuleContext, ValidationConfig};

fn module() -> ModuleContext {
    let mut module = ModuleContext::new();
    let empty = module.add_type(FuncType::default());
    let tag_type = module.add_type(FuncType::new(&[ValueType::I32], &[]));
    module.add_function(empty);
    module.add_tag(tag_type);
    module.add_table(TableType {
        element_type: ValueType::EXTERNREF,
        limits:       Limits::new(1),
    });
    module
}

fn validate(module: &ModuleContext, body: &[Instruction]) -> Vec<String> {
    let messages = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&messages);
    let config = ValidationConfig::default().with_features(Features::all());
    let mut validator = FunctionValidator::new(module, config)
        .with_error_sink(move |message| sink.borrow_mut().push(message.to_string()));
    let result = validator.validate_function(0, &[], body);
    let collected = messages.borrow().clone();
    assert_eq!(result.is_ok(), collected.is_empty(), "{collected:?}");
    collected
}

#[test]
fn try_table_catch_branches_to_enclosing_block() {
    let module = module();
    let messages = validate(
        &module,
        &[
            Instruction::Block(BlockType::Value(ValueType::I32)),
            Instruction::TryTable {
                block_type: BlockType::Empty,
                catches:    vec![TryTableCatch {
                    kind:  TryTableCatchKind::Catch,
                    tag:   Some(0),
                    depth: 0,
                }],
            },
            Instruction::I32Const(1),
            Instruction::Throw(0),
            Instruction::End,
            Instruction::I32Const(0),
            Instruction::End,
            Instruction::Drop,
            Instruction::End,
        ],
    );
    assert!(messages.is_empty());
}

#[test]
fn try_table_catch_ref_needs_exnref_slot() {
    let module = module();
    let messages = validate(
        &module,
        &[
            Instruction::Block(BlockType::Value(ValueType::I32)),
            Instruction::TryTable {
                block_type: BlockType::Empty,
                catches:    vec![TryTableCatch {
                    kind:  TryTableCatchKind::CatchRef,
                    tag:   Some(0),
                    depth: 0,
                }],
            },
            Instruction::End,
            Instruction::I32Const(0),
            Instruction::End,
            Instruction::Drop,
            Instruction::End,
        ],
    );
    assert_eq!(
        messages,
        ["@1: catch signature doesn't match target: expected [i32], got [i32, exnref]"]
    );
}

#[test]
fn legacy_try_catch_and_rethrow() {
    let module = module();
    let messages = validate(
        &module,
        &[
            Instruction::Try(BlockType::Empty),
            Instruction::Nop,
            Instruction::Catch(0),
            Instruction::Drop,
            Instruction::CatchAll,
            Instruction::Rethrow(0),
            Instruction::End,
            Instruction::End,
        ],
    );
    assert!(messages.is_empty());
}

#[test]
fn call_indirect_requires_funcref_table() {
    let module = module();
    let messages = validate(
        &module,
        &[
            Instruction::I32Const(0),
            Instruction::CallIndirect {
                table:      0,
                type_index: 0,
            },
            Instruction::End,
        ],
    );
    assert_eq!(
        messages,
        ["@1: type mismatch: call_indirect must reference table of funcref type"]
    );
}

#[test]
fn unknown_tag_and_label() {
    let module = module();
    let messages = validate(
        &module,
        &[Instruction::Throw(3), Instruction::Br(1), Instruction::End],
    );
    assert_eq!(messages, ["@0: invalid tag index: 3", "@1: invalid depth: 1 (max 0)"]);
}

#[test]
fn diagnostic_limit_is_shared_across_bodies() {
    let module = module();
    let config = ValidationConfig {
        max_diagnostics: 3,
        ..ValidationConfig::default()
    };
    let mut validator = FunctionValidator::new(&module, config);
    let body = [Instruction::Drop, Instruction::Drop, Instruction::End];
    assert!(validator.validate_function(0, &[], &body).is_err());
    assert_eq!(validator.diagnostic_count(), 2);
    assert!(validator.validate_function(0, &[], &body).is_err());
    assert_eq!(validator.diagnostic_count(), 3);
}

#[test]
fn mismatched_if_without_else_reports_once() {
    let module = module();
    let messages = validate(
        &module,
        &[
            Instruction::I32Const(1),
            Instruction::If(BlockType::Empty),
            Instruction::F32Const(0),
            Instruction::End,
            Instruction::End,
        ],
    );
    assert_eq!(
        messages,
        ["@3: type mismatch at end of if true branch, expected [] but got [f32]"]
    );
}

#[test]
fn catch_of_unknown_tag_still_opens_handler() {
    let module = module();
    let messages = validate(
        &module,
        &[
            Instruction::Try(BlockType::Empty),
            Instruction::Catch(7),
            Instruction::Rethrow(0),
            Instruction::End,
            Instruction::End,
        ],
    );
    assert_eq!(messages, ["@1: invalid tag index: 7"]);
}
