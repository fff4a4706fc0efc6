// WTK - wtk-validator
// SW-REQ-ID: REQ_VALIDATION_003
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Function body and initializer validation.
//!
//! [`FunctionValidator`] walks a decoded body in order, resolves every index
//! immediate against a [`ModuleContext`], gates proposal instructions on the
//! enabled [`Features`] and invokes the matching [`TypeChecker`] operation.
//! Each diagnostic reaches the caller's sink prefixed with the position of
//! the instruction that produced it, as in `@3: type mismatch in ...`.

use log::debug;
use wtk_error::helpers::{malformed_body_error, non_constant_error};
use wtk_foundation::MemArg;

use crate::{
    compat,
    config::{Features, ValidationConfig},
    context::{self, ModuleContext, DATA_COUNT_REQUIRED},
    prelude::*,
    type_checker::{ErrorSink, TypeChecker},
};

/// Integer arithmetic allowed in constant expressions with `extended_const`
const EXTENDED_CONST_OPS: [&str; 6] =
    ["i32.add", "i32.sub", "i32.mul", "i64.add", "i64.sub", "i64.mul"];

/// What a body produces
#[derive(Debug, Clone, Copy)]
enum BodyKind<'b> {
    Function(&'b [ValueType]),
    InitExpr(ValueType),
}

impl BodyKind<'_> {
    const fn description(self) -> &'static str {
        match self {
            Self::Function(_) => "function body",
            Self::InitExpr(_) => "initializer expression",
        }
    }
}

/// Validates function bodies and initializer expressions of one module
pub struct FunctionValidator<'m, 's> {
    module:      &'m ModuleContext,
    config:      ValidationConfig,
    sink:        Option<ErrorSink<'s>>,
    diagnostics: usize,
}

impl fmt::Debug for FunctionValidator<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValidator")
            .field("config", &self.config)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl<'m, 's> FunctionValidator<'m, 's> {
    /// Create a validator for bodies of `module`
    #[must_use]
    pub fn new(module: &'m ModuleContext, config: ValidationConfig) -> Self {
        Self {
            module,
            config,
            sink: None,
            diagnostics: 0,
        }
    }

    /// Deliver located diagnostics to `sink`
    #[must_use]
    pub fn with_error_sink(mut self, sink: impl FnMut(&str) + 's) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Diagnostics delivered so far, over every body validated
    #[must_use]
    pub const fn diagnostic_count(&self) -> usize {
        self.diagnostics
    }

    /// Validate the body of function `func_index`. `locals` are the declared
    /// locals; the function's parameters precede them in the local index
    /// space. The body must end with the `end` closing the function.
    pub fn validate_function(
        &mut self,
        func_index: FuncIdx,
        locals: &[ValueType],
        body: &[Instruction],
    ) -> Result<()> {
        let module = self.module;
        let func_type = match module.function_type(func_index) {
            Ok(func_type) => func_type,
            Err(error) => {
                self.emit(&format!("{}: {func_index}", error.message));
                return Err(error);
            },
        };
        debug!("validating function {func_index} with type {func_type}");

        let mut all_locals = func_type.params.clone();
        all_locals.extend_from_slice(locals);
        let result = self.validate_body(BodyKind::Function(&func_type.results), &all_locals, body);
        debug!("function {func_index}: {} diagnostics so far", self.diagnostics);
        result
    }

    /// Validate a constant initializer producing `ty`
    pub fn validate_init_expr(&mut self, ty: ValueType, body: &[Instruction]) -> Result<()> {
        debug!("validating initializer expression of type {ty}");
        self.validate_body(BodyKind::InitExpr(ty), &[], body)
    }

    fn validate_body(
        &mut self,
        kind: BodyKind<'_>,
        locals: &[ValueType],
        body: &[Instruction],
    ) -> Result<()> {
        let module = self.module;
        let features = self.config.features;
        let pending = RefCell::new(Vec::new());
        let mut checker = TypeChecker::new(module.types(), features)
            .with_error_sink(|message| pending.borrow_mut().push(message.to_string()));
        let context = BodyContext {
            module,
            features,
            locals,
            pending: &pending,
            kind,
        };

        let mut result = match kind {
            BodyKind::Function(results) => checker.begin_function(results),
            BodyKind::InitExpr(ty) => checker.begin_init_expr(ty),
        };
        let mut closed = false;

        for (offset, instruction) in body.iter().enumerate() {
            let step = if closed {
                context.report(format!(
                    "unexpected {} after the end of the {}",
                    instruction.name(),
                    kind.description()
                ));
                Err(malformed_body_error("instruction after the final end"))
            } else {
                context.check(&mut checker, instruction)
            };
            if let Err(error) = step {
                if pending.borrow().is_empty() {
                    context.report(error.message.to_string());
                }
            }
            result = result.and(step);
            self.flush(offset, &pending);

            if closed || (step.is_err() && self.should_stop()) {
                return result;
            }
            closed = checker.label_depth() == 0;
        }

        if !closed {
            context.report(format!("{} must end with an end instruction", kind.description()));
            result = result.and(Err(malformed_body_error("missing final end")));
            self.flush(body.len(), &pending);
        }
        result
    }

    fn should_stop(&self) -> bool {
        self.config.fail_fast || self.diagnostics >= self.config.max_diagnostics
    }

    fn flush(&mut self, offset: usize, pending: &RefCell<Vec<String>>) {
        let messages = core::mem::take(&mut *pending.borrow_mut());
        for message in messages {
            if self.diagnostics >= self.config.max_diagnostics {
                break;
            }
            self.emit(&format!("@{offset}: {message}"));
        }
    }

    fn emit(&mut self, message: &str) {
        self.diagnostics += 1;
        if let Some(sink) = self.sink.as_mut() {
            sink(message);
        }
    }
}

/// Per-body state shared by the instruction checks
struct BodyContext<'c> {
    module:   &'c ModuleContext,
    features: Features,
    locals:   &'c [ValueType],
    pending:  &'c RefCell<Vec<String>>,
    kind:     BodyKind<'c>,
}

impl BodyContext<'_> {
    fn report(&self, message: String) {
        debug!("{message}");
        self.pending.borrow_mut().push(message);
    }

    /// Report a failed index lookup as `{message}: {index}`
    fn lookup<T>(&self, result: Result<T>, index: u32) -> Result<T> {
        result.map_err(|error| {
            self.report(format!("{}: {index}", error.message));
            error
        })
    }

    fn require(&self, enabled: bool, name: &str, feature: &str) -> Result<()> {
        if enabled {
            return Ok(());
        }
        self.report(format!("{name} not allowed: {feature} feature is disabled"));
        Err(Error::feature_disabled("instruction requires a disabled feature"))
    }

    fn local(&self, index: u32) -> Result<ValueType> {
        let local = usize::try_from(index).ok().and_then(|i| self.locals.get(i)).copied();
        self.lookup(local.ok_or(context::invalid_local()), index)
    }

    fn data_segment(&self, index: u32) -> Result<()> {
        match self.module.check_data_segment(index) {
            Err(error) if error == DATA_COUNT_REQUIRED => {
                self.report(error.message.to_string());
                Err(error)
            },
            other => self.lookup(other, index),
        }
    }

    /// Resolve a block type. The signature is usable even when the result
    /// is an error, so the region can still be opened.
    fn block_signature(
        &self,
        name: &str,
        block_type: BlockType,
    ) -> (Vec<ValueType>, Vec<ValueType>, Result<()>) {
        let (params, results) = match block_type {
            BlockType::TypeIndex(index) => {
                match self.lookup(self.module.block_signature(block_type), index) {
                    Ok(signature) => signature,
                    Err(error) => return (Vec::new(), Vec::new(), Err(error)),
                }
            },
            other => self.module.block_signature(other).unwrap_or_default(),
        };
        let result = if params.is_empty() && results.len() <= 1 {
            Ok(())
        } else {
            self.require(self.features.multi_value, name, "multi_value")
        };
        (params, results, result)
    }

    fn check_alignment(&self, op: Opcode, memarg: &MemArg) -> Result<()> {
        if op.is_valid_alignment(memarg.align) {
            return Ok(());
        }
        let natural = op.memory_size();
        if op.is_atomic() {
            self.report(format!("alignment must be equal to natural alignment ({natural})"));
        } else {
            self.report(format!(
                "alignment must not be larger than natural alignment ({natural})"
            ));
        }
        Err(Error::new(ErrorCategory::Validation, codes::INVALID_ALIGNMENT, "invalid alignment"))
    }

    /// Memory limits for an access, after checking its alignment
    fn memory_access(&self, op: Opcode, memarg: &MemArg) -> (Result<Limits>, Result<()>) {
        let limits = self.lookup(self.module.memory(memarg.memory), memarg.memory);
        let aligned = if limits.is_ok() { self.check_alignment(op, memarg) } else { Ok(()) };
        (limits, aligned)
    }

    fn require_funcref_table(&self, name: &str, table: &TableType) -> Result<()> {
        if compat::check_type(self.module.types(), table.element_type, ValueType::FUNCREF) {
            return Ok(());
        }
        self.report(format!("type mismatch: {name} must reference table of funcref type"));
        Err(Error::type_mismatch("indirect call through a non-funcref table"))
    }

    fn require_elem_compatible(&self, name: &str, actual: ValueType, expected: ValueType) -> Result<()> {
        if compat::check_type(self.module.types(), actual, expected) {
            return Ok(());
        }
        self.report(format!(
            "type mismatch in {name}, expected element type {expected} but got {actual}"
        ));
        Err(Error::reference_type_mismatch("element types are incompatible"))
    }

    /// Whether `instruction` may appear in a constant expression
    fn check_constant(&self, instruction: &Instruction) -> Result<()> {
        let allowed = match instruction {
            Instruction::I32Const(_)
            | Instruction::I64Const(_)
            | Instruction::F32Const(_)
            | Instruction::F64Const(_)
            | Instruction::V128Const(_)
            | Instruction::RefNull(_)
            | Instruction::RefFunc(_)
            | Instruction::End => true,
            Instruction::GlobalGet(index) => match self.module.global(*index) {
                Ok(global) if global.mutable => {
                    self.report(
                        "invalid initializer: initializer expression cannot reference a mutable global"
                            .to_string(),
                    );
                    return Err(non_constant_error("mutable global in constant expression"));
                },
                // Unknown globals are reported by the instruction itself.
                _ => true,
            },
            Instruction::Binary(op) => {
                self.features.extended_const && EXTENDED_CONST_OPS.contains(&op.name())
            },
            _ => false,
        };
        if allowed {
            return Ok(());
        }
        self.report(format!(
            "invalid initializer: instruction not valid in initializer expression: {}",
            instruction.name()
        ));
        Err(non_constant_error("instruction not valid in a constant expression"))
    }

    fn check(&self, checker: &mut TypeChecker<'_>, instruction: &Instruction) -> Result<()> {
        if let BodyKind::InitExpr(_) = self.kind {
            self.check_constant(instruction)?;
        }
        self.dispatch(checker, instruction)
    }

    #[allow(clippy::too_many_lines)]
    fn dispatch(&self, checker: &mut TypeChecker<'_>, instruction: &Instruction) -> Result<()> {
        let features = self.features;
        let module = self.module;
        let name = instruction.name();

        match instruction {
            // Control
            Instruction::Unreachable => checker.on_unreachable(),
            Instruction::Nop => checker.on_nop(),
            Instruction::Block(block_type) => {
                let (params, results, result) = self.block_signature(name, *block_type);
                result.and(checker.on_block(&params, &results))
            },
            Instruction::Loop(block_type) => {
                let (params, results, result) = self.block_signature(name, *block_type);
                result.and(checker.on_loop(&params, &results))
            },
            Instruction::If(block_type) => {
                let (params, results, result) = self.block_signature(name, *block_type);
                result.and(checker.on_if(&params, &results))
            },
            Instruction::Else => checker.on_else(),
            Instruction::End if checker.label_depth() == 1 => match self.kind {
                BodyKind::Function(_) => checker.end_function(),
                BodyKind::InitExpr(_) => checker.end_init_expr(),
            },
            Instruction::End => checker.on_end(),

            // Exception handling
            Instruction::Try(block_type) => {
                self.require(features.exceptions, name, "exceptions")?;
                let (params, results, result) = self.block_signature(name, *block_type);
                result.and(checker.on_try(&params, &results))
            },
            Instruction::Catch(tag) => {
                self.require(features.exceptions, name, "exceptions")?;
                match self.lookup(module.tag_params(*tag), *tag) {
                    Ok(params) => checker.on_catch(params),
                    Err(error) => {
                        let result: Result<()> = Err(error);
                        result.and(checker.on_catch(&[]))
                    },
                }
            },
            Instruction::CatchAll => {
                self.require(features.exceptions, name, "exceptions")?;
                checker.on_catch(&[])
            },
            Instruction::Delegate(depth) => {
                self.require(features.exceptions, name, "exceptions")?;
                checker.on_delegate(*depth)
            },
            Instruction::Rethrow(depth) => {
                self.require(features.exceptions, name, "exceptions")?;
                checker.on_rethrow(*depth)
            },
            Instruction::Throw(tag) => {
                self.require(features.exceptions, name, "exceptions")?;
                let params = self.lookup(module.tag_params(*tag), *tag)?;
                checker.on_throw(params)
            },
            Instruction::ThrowRef => {
                self.require(features.exceptions, name, "exceptions")?;
                checker.on_throw_ref()
            },
            Instruction::TryTable {
                block_type,
                catches,
            } => {
                self.require(features.exceptions, name, "exceptions")?;
                let (params, results, mut result) = self.block_signature(name, *block_type);
                result = result.and(checker.begin_try_table(&params));
                for catch in catches {
                    let mut sig = match catch.tag {
                        Some(tag) => match self.lookup(module.tag_params(tag), tag) {
                            Ok(params) => params.to_vec(),
                            Err(error) => {
                                result = result.and(Err(error));
                                continue;
                            },
                        },
                        None => Vec::new(),
                    };
                    if catch.is_ref() {
                        sig.push(ValueType::ExnRef);
                    }
                    result = result.and(checker.on_try_table_catch(&sig, catch.depth));
                }
                result.and(checker.finish_try_table(&params, &results))
            },

            // Branches
            Instruction::Br(depth) => checker.on_br(*depth),
            Instruction::BrIf(depth) => checker.on_br_if(*depth),
            Instruction::BrTable { targets, default } => {
                let mut result = checker.begin_br_table();
                for depth in targets.iter().chain(core::iter::once(default)) {
                    result = result.and(checker.on_br_table_target(*depth));
                }
                result.and(checker.end_br_table())
            },
            Instruction::BrOnNull(depth) => {
                self.require(features.function_references, name, "function_references")?;
                checker.on_br_on_null(*depth)
            },
            Instruction::BrOnNonNull(depth) => {
                self.require(features.function_references, name, "function_references")?;
                checker.on_br_on_non_null(*depth)
            },

            // Calls
            Instruction::Return => checker.on_return(),
            Instruction::Call(func) => {
                let func_type = self.lookup(module.function_type(*func), *func)?;
                checker.on_call(&func_type.params, &func_type.results)
            },
            Instruction::CallIndirect { table, type_index } => {
                let table = self.lookup(module.table(*table), *table)?;
                let func_type = self.lookup(module.type_at(*type_index), *type_index)?;
                self.require_funcref_table(name, &table).and(checker.on_call_indirect(
                    &func_type.params,
                    &func_type.results,
                    &table.limits,
                ))
            },
            Instruction::CallRef(type_index) => {
                self.require(features.function_references, name, "function_references")?;
                checker.on_call_ref(*type_index)
            },
            Instruction::ReturnCall(func) => {
                self.require(features.tail_call, name, "tail_call")?;
                let func_type = self.lookup(module.function_type(*func), *func)?;
                checker.on_return_call(&func_type.params, &func_type.results)
            },
            Instruction::ReturnCallIndirect { table, type_index } => {
                self.require(features.tail_call, name, "tail_call")?;
                let table = self.lookup(module.table(*table), *table)?;
                let func_type = self.lookup(module.type_at(*type_index), *type_index)?;
                self.require_funcref_table(name, &table).and(checker.on_return_call_indirect(
                    &func_type.params,
                    &func_type.results,
                    &table.limits,
                ))
            },
            Instruction::ReturnCallRef(type_index) => {
                self.require(features.tail_call, name, "tail_call")?;
                self.require(features.function_references, name, "function_references")?;
                checker.on_return_call_ref(*type_index)
            },

            // Parametric
            Instruction::Drop => checker.on_drop(),
            Instruction::Select(ty) => {
                if ty.is_some() {
                    self.require(features.reference_types, name, "reference_types")?;
                }
                checker.on_select(*ty)
            },

            // Variables
            Instruction::LocalGet(index) => checker.on_local_get(self.local(*index)?),
            Instruction::LocalSet(index) => checker.on_local_set(self.local(*index)?),
            Instruction::LocalTee(index) => checker.on_local_tee(self.local(*index)?),
            Instruction::GlobalGet(index) => {
                let global = self.lookup(module.global(*index), *index)?;
                checker.on_global_get(global.value_type)
            },
            Instruction::GlobalSet(index) => {
                let global = self.lookup(module.global(*index), *index)?;
                let result = if global.mutable {
                    Ok(())
                } else {
                    self.report(format!("can't global.set on immutable global: {index}"));
                    Err(Error::invalid_index(codes::IMMUTABLE_GLOBAL, "immutable global"))
                };
                result.and(checker.on_global_set(global.value_type))
            },

            // Tables
            Instruction::TableGet(index) => {
                self.require(features.reference_types, name, "reference_types")?;
                let table = self.lookup(module.table(*index), *index)?;
                checker.on_table_get(table.element_type, &table.limits)
            },
            Instruction::TableSet(index) => {
                self.require(features.reference_types, name, "reference_types")?;
                let table = self.lookup(module.table(*index), *index)?;
                checker.on_table_set(table.element_type, &table.limits)
            },
            Instruction::TableSize(index) => {
                self.require(features.reference_types, name, "reference_types")?;
                let table = self.lookup(module.table(*index), *index)?;
                checker.on_table_size(&table.limits)
            },
            Instruction::TableGrow(index) => {
                self.require(features.reference_types, name, "reference_types")?;
                let table = self.lookup(module.table(*index), *index)?;
                checker.on_table_grow(table.element_type, &table.limits)
            },
            Instruction::TableFill(index) => {
                self.require(features.reference_types, name, "reference_types")?;
                let table = self.lookup(module.table(*index), *index)?;
                checker.on_table_fill(table.element_type, &table.limits)
            },
            Instruction::TableCopy { dst, src } => {
                let dst_table = self.lookup(module.table(*dst), *dst)?;
                let src_table = self.lookup(module.table(*src), *src)?;
                self.require_elem_compatible(name, src_table.element_type, dst_table.element_type)
                    .and(checker.on_table_copy(&dst_table.limits, &src_table.limits))
            },
            Instruction::TableInit { table, elem } => {
                let table = self.lookup(module.table(*table), *table)?;
                let elem_type = self.lookup(module.elem_type(*elem), *elem)?;
                self.require_elem_compatible(name, elem_type, table.element_type)
                    .and(checker.on_table_init(&table.limits))
            },
            Instruction::ElemDrop(elem) => {
                self.lookup(module.elem_type(*elem), *elem)?;
                checker.on_elem_drop(*elem)
            },

            // Memory
            Instruction::MemorySize(index) => {
                let limits = self.lookup(module.memory(*index), *index)?;
                checker.on_memory_size(&limits)
            },
            Instruction::MemoryGrow(index) => {
                let limits = self.lookup(module.memory(*index), *index)?;
                checker.on_memory_grow(&limits)
            },
            Instruction::MemoryFill(index) => {
                let limits = self.lookup(module.memory(*index), *index)?;
                checker.on_memory_fill(&limits)
            },
            Instruction::MemoryCopy { dst, src } => {
                let dst_limits = self.lookup(module.memory(*dst), *dst)?;
                let src_limits = self.lookup(module.memory(*src), *src)?;
                checker.on_memory_copy(&dst_limits, &src_limits)
            },
            Instruction::MemoryInit { memory, data } => {
                let limits = self.lookup(module.memory(*memory), *memory)?;
                self.data_segment(*data).and(checker.on_memory_init(&limits))
            },
            Instruction::DataDrop(data) => {
                self.data_segment(*data)?;
                checker.on_data_drop(*data)
            },

            // Constants
            Instruction::I32Const(_) => checker.on_const(ValueType::I32),
            Instruction::I64Const(_) => checker.on_const(ValueType::I64),
            Instruction::F32Const(_) => checker.on_const(ValueType::F32),
            Instruction::F64Const(_) => checker.on_const(ValueType::F64),
            Instruction::V128Const(_) => {
                self.require(features.simd, name, "simd")?;
                checker.on_const(ValueType::V128)
            },

            // Descriptor-typed numeric instructions
            Instruction::Unary(op) => {
                self.require_simd_if_vector(*op)?;
                checker.on_unary(*op)
            },
            Instruction::Binary(op) => {
                self.require_simd_if_vector(*op)?;
                checker.on_binary(*op)
            },
            Instruction::Compare(op) => {
                self.require_simd_if_vector(*op)?;
                checker.on_compare(*op)
            },
            Instruction::Convert(op) => {
                self.require_simd_if_vector(*op)?;
                checker.on_convert(*op)
            },
            Instruction::Ternary(op) => {
                self.require_simd_if_vector(*op)?;
                checker.on_ternary(*op)
            },

            // Memory access
            Instruction::Load { op, memarg } => {
                self.require_simd_if_vector(*op)?;
                let (limits, aligned) = self.memory_access(*op, memarg);
                aligned.and(checker.on_load(*op, &limits?))
            },
            Instruction::Store { op, memarg } => {
                self.require_simd_if_vector(*op)?;
                let (limits, aligned) = self.memory_access(*op, memarg);
                aligned.and(checker.on_store(*op, &limits?))
            },

            // Threads
            Instruction::AtomicLoad { op, memarg } => {
                self.require(features.threads, name, "threads")?;
                let (limits, aligned) = self.memory_access(*op, memarg);
                aligned.and(checker.on_atomic_load(*op, &limits?))
            },
            Instruction::AtomicStore { op, memarg } => {
                self.require(features.threads, name, "threads")?;
                let (limits, aligned) = self.memory_access(*op, memarg);
                aligned.and(checker.on_atomic_store(*op, &limits?))
            },
            Instruction::AtomicRmw { op, memarg } => {
                self.require(features.threads, name, "threads")?;
                let (limits, aligned) = self.memory_access(*op, memarg);
                aligned.and(checker.on_atomic_rmw(*op, &limits?))
            },
            Instruction::AtomicCmpxchg { op, memarg } => {
                self.require(features.threads, name, "threads")?;
                let (limits, aligned) = self.memory_access(*op, memarg);
                aligned.and(checker.on_atomic_cmpxchg(*op, &limits?))
            },
            Instruction::AtomicWait { op, memarg } => {
                self.require(features.threads, name, "threads")?;
                let (limits, aligned) = self.memory_access(*op, memarg);
                aligned.and(checker.on_atomic_wait(*op, &limits?))
            },
            Instruction::AtomicNotify { op, memarg } => {
                self.require(features.threads, name, "threads")?;
                let (limits, aligned) = self.memory_access(*op, memarg);
                aligned.and(checker.on_atomic_notify(*op, &limits?))
            },
            Instruction::AtomicFence => {
                self.require(features.threads, name, "threads")?;
                checker.on_atomic_fence()
            },

            // SIMD
            Instruction::SimdLaneOp { op, lane } => {
                self.require(features.simd, name, "simd")?;
                checker.on_simd_lane_op(*op, u64::from(*lane))
            },
            Instruction::SimdShuffle { op, lanes } => {
                self.require(features.simd, name, "simd")?;
                checker.on_simd_shuffle(*op, lanes)
            },
            Instruction::SimdLoadLane { op, memarg, lane } => {
                self.require(features.simd, name, "simd")?;
                let (limits, aligned) = self.memory_access(*op, memarg);
                aligned.and(checker.on_simd_load_lane(*op, &limits?, u64::from(*lane)))
            },
            Instruction::SimdStoreLane { op, memarg, lane } => {
                self.require(features.simd, name, "simd")?;
                let (limits, aligned) = self.memory_access(*op, memarg);
                aligned.and(checker.on_simd_store_lane(*op, &limits?, u64::from(*lane)))
            },

            // References
            Instruction::RefNull(ty) => {
                self.require(features.reference_types, name, "reference_types")?;
                checker.on_ref_null(*ty)
            },
            Instruction::RefIsNull => {
                self.require(features.reference_types, name, "reference_types")?;
                checker.on_ref_is_null()
            },
            Instruction::RefFunc(func) => {
                self.require(features.reference_types, name, "reference_types")?;
                let type_index = self.lookup(module.function_type_index(*func), *func)?;
                checker.on_ref_func(type_index)
            },
            Instruction::RefAsNonNull => {
                self.require(features.function_references, name, "function_references")?;
                checker.on_ref_as_non_null()
            },
        }
    }

    fn require_simd_if_vector(&self, op: Opcode) -> Result<()> {
        if op.is_simd() { self.require(self.features.simd, op.name(), "simd") } else { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    #[cfg(not(feature = "std"))]
    use alloc::rc::Rc;
    #[cfg(feature = "std")]
    use std::rc::Rc;

    use super::*;

    fn module() -> ModuleContext {
        let mut module = ModuleContext::new();
        let unary = module.add_type(FuncType::new(&[ValueType::I32], &[ValueType::I32]));
        module.add_function(unary);
        module.add_memory(Limits::new(1));
        module.add_global(GlobalType {
            value_type: ValueType::I32,
            mutable:    false,
        });
        module
    }

    fn run(
        module: &ModuleContext,
        config: ValidationConfig,
        body: &[Instruction],
    ) -> (Result<()>, Vec<String>) {
        let messages = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&messages);
        let mut validator = FunctionValidator::new(module, config)
            .with_error_sink(move |message| sink.borrow_mut().push(message.to_string()));
        let result = validator.validate_function(0, &[ValueType::I64], body);
        let collected = messages.borrow().clone();
        (result, collected)
    }

    #[test]
    fn test_valid_body() {
        let module = module();
        let (result, messages) = run(
            &module,
            ValidationConfig::default(),
            &[
                Instruction::LocalGet(0),
                Instruction::Call(0),
                Instruction::Load {
                    op:     Opcode::I32_LOAD,
                    memarg: MemArg::new(2, 0),
                },
                Instruction::End,
            ],
        );
        assert_eq!(result, Ok(()));
        assert!(messages.is_empty(), "{messages:?}");
    }

    #[test]
    fn test_diagnostics_carry_offsets() {
        let module = module();
        let (result, messages) = run(
            &module,
            ValidationConfig::default(),
            &[
                Instruction::LocalGet(1),
                Instruction::LocalSet(0),
                Instruction::LocalGet(0),
                Instruction::End,
            ],
        );
        assert!(result.is_err());
        assert_eq!(
            messages,
            ["@1: type mismatch in local.set, expected [i32] but got [i64]"]
        );
    }

    #[test]
    fn test_invalid_indices() {
        let module = module();
        let (_, messages) = run(
            &module,
            ValidationConfig::default(),
            &[
                Instruction::LocalGet(7),
                Instruction::GlobalGet(3),
                Instruction::I32Const(0),
                Instruction::End,
            ],
        );
        assert_eq!(
            messages,
            ["@0: invalid local index: 7", "@1: invalid global index: 3"]
        );
    }

    #[test]
    fn test_immutable_global_set() {
        let module = module();
        let (result, messages) = run(
            &module,
            ValidationConfig::default(),
            &[
                Instruction::I32Const(1),
                Instruction::GlobalSet(0),
                Instruction::LocalGet(0),
                Instruction::End,
            ],
        );
        assert_eq!(result.unwrap_err().code, codes::IMMUTABLE_GLOBAL);
        assert_eq!(messages, ["@1: can't global.set on immutable global: 0"]);
    }

    #[test]
    fn test_fail_fast_stops_at_first_error() {
        let module = module();
        let body = [
            Instruction::F32Const(0),
            Instruction::Drop,
            Instruction::Drop,
            Instruction::Drop,
            Instruction::LocalGet(0),
            Instruction::End,
        ];
        let (_, collected) = run(&module, ValidationConfig::default(), &body);
        assert_eq!(collected.len(), 2);
        let (_, strict) = run(&module, ValidationConfig::strict(), &body);
        assert_eq!(strict, ["@2: type mismatch in drop, expected [any] but got []"]);
    }

    #[test]
    fn test_body_must_end_once() {
        let module = module();
        let (result, messages) = run(&module, ValidationConfig::default(), &[Instruction::LocalGet(0)]);
        assert_eq!(result.unwrap_err().code, codes::MALFORMED_BODY);
        assert_eq!(messages, ["@1: function body must end with an end instruction"]);

        let (_, messages) = run(
            &module,
            ValidationConfig::default(),
            &[Instruction::LocalGet(0), Instruction::End, Instruction::Nop],
        );
        assert_eq!(messages, ["@2: unexpected nop after the end of the function body"]);
    }

    #[test]
    fn test_disabled_features() {
        let module = module();
        let config = ValidationConfig::default().with_features(Features::mvp());
        let (_, messages) = run(
            &module,
            config,
            &[
                Instruction::RefNull(ValueType::FUNCREF),
                Instruction::Block(BlockType::TypeIndex(0)),
            ],
        );
        assert_eq!(
            messages[..2],
            [
                "@0: ref.null not allowed: reference_types feature is disabled",
                "@1: block not allowed: multi_value feature is disabled",
            ]
        );
    }

    #[test]
    fn test_alignment() {
        let module = module();
        let config = ValidationConfig::default().with_features(Features::all());
        let (_, messages) = run(
            &module,
            config,
            &[
                Instruction::I32Const(0),
                Instruction::Load {
                    op:     Opcode::I32_LOAD,
                    memarg: MemArg::new(3, 0),
                },
                Instruction::AtomicLoad {
                    op:     Opcode::I32_ATOMIC_LOAD,
                    memarg: MemArg::new(1, 0),
                },
                Instruction::End,
            ],
        );
        assert_eq!(
            messages,
            [
                "@1: alignment must not be larger than natural alignment (4)",
                "@2: alignment must be equal to natural alignment (4)",
            ]
        );
    }

    #[test]
    fn test_init_expressions() {
        let mut module = module();
        module.add_global(GlobalType {
            value_type: ValueType::I64,
            mutable:    true,
        });
        let messages = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&messages);
        let mut validator = FunctionValidator::new(&module, ValidationConfig::default())
            .with_error_sink(move |message| sink.borrow_mut().push(message.to_string()));

        assert_eq!(
            validator.validate_init_expr(ValueType::I32, &[Instruction::GlobalGet(0), Instruction::End]),
            Ok(())
        );
        assert!(validator
            .validate_init_expr(ValueType::I64, &[Instruction::GlobalGet(1), Instruction::End])
            .is_err());
        assert!(validator
            .validate_init_expr(
                ValueType::I32,
                &[
                    Instruction::I32Const(1),
                    Instruction::I32Const(2),
                    Instruction::Binary(Opcode::I32_ADD),
                    Instruction::End,
                ],
            )
            .is_err());
        let rejected: Vec<String> = messages
            .borrow()
            .iter()
            .filter(|message| message.contains("invalid initializer"))
            .cloned()
            .collect();
        assert_eq!(
            rejected,
            [
                "@0: invalid initializer: initializer expression cannot reference a mutable global",
                "@2: invalid initializer: instruction not valid in initializer expression: i32.add",
            ]
        );

        let mut extended = FunctionValidator::new(
            &module,
            ValidationConfig::default().with_features(Features::all()),
        );
        assert_eq!(
            extended.validate_init_expr(
                ValueType::I32,
                &[
                    Instruction::I32Const(1),
                    Instruction::I32Const(2),
                    Instruction::Binary(Opcode::I32_ADD),
                    Instruction::End,
                ],
            ),
            Ok(())
        );
        assert_eq!(extended.diagnostic_count(), 0);
    }

    #[test]
    fn test_unknown_function() {
        let module = module();
        let messages = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&messages);
        let mut validator = FunctionValidator::new(&module, ValidationConfig::default())
            .with_error_sink(move |message| sink.borrow_mut().push(message.to_string()));
        assert!(validator.validate_function(4, &[], &[Instruction::End]).is_err());
        assert_eq!(messages.borrow().as_slice(), ["invalid function index: 4"]);
        assert_eq!(validator.diagnostic_count(), 1);
    }
}
