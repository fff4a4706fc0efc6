// WTK - wtk-validator
// SW-REQ-ID: REQ_VALIDATION_002
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Instruction-level type checker.
//!
//! [`TypeChecker`] is an abstract interpreter over value types. A driver
//! calls one `on_*` operation per decoded instruction, in order; each
//! operation checks the operands on the abstract value stack, applies the
//! instruction's stack effect and reports diagnostics to an optional error
//! sink.
//!
//! Results accumulate: an operation always performs its full stack effect,
//! and its result is the first error any of its sub-checks produced. The one
//! exception is resolving a branch depth: when the depth names no open label
//! the operation returns immediately, since there is no signature to check
//! against.
//!
//! Once a region becomes unreachable (after `br`, `return`, `unreachable`,
//! `throw` and friends) the stack below the region's entry height is
//! polymorphic: reads yield [`ValueType::Any`] and over-drops succeed.

use log::{debug, trace};
use wtk_error::helpers::{
    br_table_inconsistent_error, catch_signature_error, expected_reference_error,
    lane_index_error, return_signature_error,
};
use wtk_foundation::types::types_to_string;

use crate::{
    compat,
    config::Features,
    label::{Label, LabelKind},
    prelude::*,
};

/// Caller-supplied receiver of formatted diagnostics
pub type ErrorSink<'a> = Box<dyn FnMut(&str) + 'a>;

/// Number of stack entries shown when the expected stack is empty
const MAX_ACTUAL_STACK_TO_PRINT: usize = 4;

/// Number of lanes an `i8x16.shuffle` immediate may select from
const SHUFFLE_LANE_LIMIT: u8 = 32;

/// Type checker for one function body or initializer expression
pub struct TypeChecker<'a> {
    registry:     &'a FuncTypeRegistry,
    features:     Features,
    sink:         Option<ErrorSink<'a>>,
    type_stack:   Vec<ValueType>,
    labels:       Vec<Label>,
    br_table_sig: Option<Vec<ValueType>>,
}

impl fmt::Debug for TypeChecker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeChecker")
            .field("features", &self.features)
            .field("type_stack", &self.type_stack)
            .field("labels", &self.labels)
            .field("br_table_sig", &self.br_table_sig)
            .finish_non_exhaustive()
    }
}

impl<'a> TypeChecker<'a> {
    /// Create a checker over the module's function types
    #[must_use]
    pub fn new(registry: &'a FuncTypeRegistry, features: Features) -> Self {
        Self {
            registry,
            features,
            sink: None,
            type_stack: Vec::new(),
            labels: Vec::new(),
            br_table_sig: None,
        }
    }

    /// Deliver diagnostics to `sink`
    #[must_use]
    pub fn with_error_sink(mut self, sink: impl FnMut(&str) + 'a) -> Self {
        self.set_error_sink(sink);
        self
    }

    /// Replace the diagnostic sink
    pub fn set_error_sink(&mut self, sink: impl FnMut(&str) + 'a) {
        self.sink = Some(Box::new(sink));
    }

    /// Enabled proposals
    #[must_use]
    pub const fn features(&self) -> Features {
        self.features
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Number of open labels
    #[must_use]
    pub fn label_depth(&self) -> usize {
        self.labels.len()
    }

    /// Height of the abstract value stack
    #[must_use]
    pub fn type_stack_size(&self) -> usize {
        self.type_stack.len()
    }

    /// Whether the innermost region is unreachable. With no open label
    /// nothing can execute, so this reports `true`.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        self.labels.last().is_none_or(Label::is_unreachable)
    }

    /// The label `depth` levels out from the innermost one
    #[must_use]
    pub fn label(&self, depth: LabelIdx) -> Option<&Label> {
        let depth = usize::try_from(depth).ok()?;
        let index = self.labels.len().checked_sub(depth + 1)?;
        self.labels.get(index)
    }

    /// Number of `catch` regions between the innermost label and `depth`,
    /// inclusive
    pub fn catch_count(&mut self, depth: LabelIdx) -> Result<u32> {
        let target = self.resolve_label(depth)?;
        let count = self.labels[target..].iter().filter(|label| label.kind == LabelKind::Catch).count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// The type `depth` entries below the top of the innermost region's
    /// stack. Reads below the region's entry height yield `Any` when the
    /// region is unreachable and fail otherwise.
    pub fn peek_type(&self, depth: usize) -> Result<ValueType> {
        let label = self.labels.last().ok_or(Error::NO_OPEN_LABEL)?;
        if depth >= self.type_stack.len().saturating_sub(label.limit) {
            return if label.unreachable { Ok(ValueType::Any) } else { Err(Error::STACK_UNDERFLOW) };
        }
        Ok(self.type_stack[self.type_stack.len() - depth - 1])
    }

    /// Whether a value of type `actual` may be used where `expected` is
    /// required
    pub fn check_type(&self, actual: ValueType, expected: ValueType) -> Result<()> {
        if compat::check_type(self.registry, actual, expected) {
            Ok(())
        } else if actual.is_reference() && expected.is_reference() {
            Err(Error::reference_type_mismatch("reference types are incompatible"))
        } else {
            Err(Error::type_mismatch("type mismatch"))
        }
    }

    /// Element-wise [`TypeChecker::check_type`] over sequences of equal
    /// length
    pub fn check_types(&self, actual: &[ValueType], expected: &[ValueType]) -> Result<()> {
        if compat::check_types(self.registry, actual, expected) {
            Ok(())
        } else {
            Err(Error::type_mismatch("type sequences differ"))
        }
    }

    // ------------------------------------------------------------------
    // Stack primitives
    // ------------------------------------------------------------------

    fn print_error(&mut self, message: &str) {
        debug!("{message}");
        if let Some(sink) = self.sink.as_mut() {
            sink(message);
        }
    }

    fn resolve_label(&mut self, depth: LabelIdx) -> Result<usize> {
        if self.labels.is_empty() {
            self.print_error("no open control block");
            return Err(Error::NO_OPEN_LABEL);
        }
        let max = self.labels.len() - 1;
        match usize::try_from(depth) {
            Ok(depth) if depth <= max => Ok(max - depth),
            _ => {
                self.print_error(&format!("invalid depth: {depth} (max {max})"));
                Err(Error::invalid_depth("branch depth exceeds the label stack"))
            }
        }
    }

    fn top_label(&mut self) -> Result<usize> {
        self.resolve_label(0)
    }

    fn function_label(&mut self) -> Result<usize> {
        if self.labels.is_empty() {
            self.print_error("no open control block");
            return Err(Error::NO_OPEN_LABEL);
        }
        Ok(0)
    }

    fn push_label(&mut self, kind: LabelKind, params: &[ValueType], results: &[ValueType]) {
        trace!(
            "push {kind} label {} -> {} at height {}",
            types_to_string(params, false),
            types_to_string(results, false),
            self.type_stack.len()
        );
        self.labels.push(Label::new(kind, params, results, self.type_stack.len()));
    }

    fn pop_label(&mut self) {
        if let Some(label) = self.labels.pop() {
            trace!("pop {} label", label.kind);
        }
    }

    fn check_label_kind(
        &mut self,
        index: usize,
        allowed: &[LabelKind],
        message: &'static str,
    ) -> Result<()> {
        if allowed.contains(&self.labels[index].kind) {
            Ok(())
        } else {
            self.print_error(message);
            Err(Error::label_kind_mismatch(message))
        }
    }

    fn reset_type_stack_to_label(&mut self, index: usize) {
        let limit = self.labels[index].limit;
        self.type_stack.truncate(limit);
    }

    fn set_unreachable(&mut self) -> Result<()> {
        let top = self.top_label()?;
        trace!("{} label becomes unreachable", self.labels[top].kind);
        self.labels[top].unreachable = true;
        self.reset_type_stack_to_label(top);
        Ok(())
    }

    fn peek_and_check_type(&self, depth: usize, expected: ValueType) -> Result<()> {
        let peeked = self.peek_type(depth);
        let actual = peeked.unwrap_or(ValueType::Any);
        peeked.map(|_| ()).and(self.check_type(actual, expected))
    }

    /// Pop `count` entries. Popping past the innermost region's entry height
    /// truncates the stack to that height and succeeds only when the region
    /// is unreachable.
    pub fn drop_types(&mut self, count: usize) -> Result<()> {
        let top = self.top_label()?;
        let Label {
            limit, unreachable, ..
        } = self.labels[top];
        if count > self.type_stack.len().saturating_sub(limit) {
            self.type_stack.truncate(limit);
            return if unreachable { Ok(()) } else { Err(Error::STACK_UNDERFLOW) };
        }
        self.type_stack.truncate(self.type_stack.len() - count);
        Ok(())
    }

    fn push_type(&mut self, ty: ValueType) {
        self.type_stack.push(ty);
    }

    fn push_types(&mut self, types: &[ValueType]) {
        self.type_stack.extend_from_slice(types);
    }

    fn check_type_stack_end(&mut self, desc: &str) -> Result<()> {
        let top = self.top_label()?;
        if self.type_stack.len() == self.labels[top].limit {
            return Ok(());
        }
        let result = Err(Error::stack_not_empty("values remain at the end of a block"));
        self.print_stack_if_failed(result, desc, &[], true);
        result
    }

    fn check_signature(&mut self, sig: &[ValueType], desc: &str) -> Result<()> {
        let mut result = Ok(());
        for (i, expected) in sig.iter().enumerate() {
            result = result.and(self.peek_and_check_type(sig.len() - i - 1, *expected));
        }
        self.print_stack_if_failed(result, desc, sig, false);
        result
    }

    fn pop_and_check_signature(&mut self, sig: &[ValueType], desc: &str) -> Result<()> {
        let result = self.check_signature(sig, desc);
        result.and(self.drop_types(sig.len()))
    }

    fn pop_and_check_call(
        &mut self,
        params: &[ValueType],
        results: &[ValueType],
        desc: &str,
    ) -> Result<()> {
        let result = self.pop_and_check_signature(params, desc);
        self.push_types(results);
        result
    }

    fn check_return_signature(
        &mut self,
        actual: &[ValueType],
        expected: &[ValueType],
    ) -> Result<()> {
        if self.check_types(actual, expected).is_ok() {
            return Ok(());
        }
        self.print_error(&format!(
            "return signatures have inconsistent types: expected {}, got {}",
            types_to_string(expected, false),
            types_to_string(actual, false)
        ));
        Err(return_signature_error("tail call results differ from the function results"))
    }

    fn print_stack_if_failed(
        &mut self,
        result: Result<()>,
        desc: &str,
        expected: &[ValueType],
        at_end: bool,
    ) {
        if result.is_ok() {
            return;
        }
        let limit = self.labels.last().map_or(0, |label| label.limit);
        let max_depth = self.type_stack.len().saturating_sub(limit);
        let actual_size = if expected.is_empty() {
            MAX_ACTUAL_STACK_TO_PRINT.min(max_depth)
        } else {
            expected.len().min(max_depth)
        };
        let truncated = actual_size != max_depth;
        let start = self.type_stack.len() - actual_size;
        let actual = types_to_string(self.type_stack.get(start..).unwrap_or_default(), truncated);

        let position = if at_end { "at end of" } else { "in" };
        let message = format!(
            "type mismatch {position} {desc}, expected {} but got {actual}",
            types_to_string(expected, false)
        );
        self.print_error(&message);
    }

    fn check_lane(&mut self, op: Opcode, lane: u64) -> Result<()> {
        let lane_count = op.lane_count();
        if lane < u64::from(lane_count) {
            return Ok(());
        }
        self.print_error(&format!("lane index must be less than {lane_count} (got {lane})"));
        Err(lane_index_error("lane index out of range"))
    }

    /// Pop `op`'s operands and push its result. With `limits`, the address
    /// operand takes the memory's index type.
    fn check_opcode(&mut self, op: Opcode, limits: Option<&Limits>) -> Result<()> {
        let mut params: Vec<ValueType> = op.params().collect();
        if let (Some(limits), Some(address)) = (limits, params.first_mut()) {
            if *address == ValueType::I32 {
                *address = limits.index_type();
            }
        }
        let result = self.pop_and_check_signature(&params, op.name());
        if let Some(ty) = op.result_type() {
            self.push_type(ty);
        }
        result
    }

    /// Pop a reference operand, reporting anything that is not a reference.
    /// Returns the popped type (`Any` when the stack is polymorphic).
    fn pop_reference(&mut self, desc: &str) -> (ValueType, Result<()>) {
        let peeked = self.peek_type(0);
        let actual = peeked.unwrap_or(ValueType::Any);
        let mut result = peeked.map(|_| ());
        if result.is_ok() && actual != ValueType::Any && !actual.is_reference() {
            result = Err(expected_reference_error("operand is not a reference"));
        }
        if result.is_err() {
            let got = if peeked.is_ok() { types_to_string(&[actual], false) } else { "[]".to_string() };
            self.print_error(&format!(
                "type mismatch in {desc}, expected a reference but got {got}"
            ));
        }
        result = result.and(self.drop_types(1));
        (actual, result)
    }

    fn end_label(&mut self, index: usize, sig_desc: &str, end_desc: &str) -> Result<()> {
        let results = self.labels[index].results.clone();
        let mut result = self.pop_and_check_signature(&results, sig_desc);
        result = result.and(self.check_type_stack_end(end_desc));
        self.reset_type_stack_to_label(index);
        self.push_types(&results);
        self.pop_label();
        result
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start validating a function body that returns `results`
    pub fn begin_function(&mut self, results: &[ValueType]) -> Result<()> {
        self.type_stack.clear();
        self.labels.clear();
        self.br_table_sig = None;
        self.push_label(LabelKind::Func, &[], results);
        Ok(())
    }

    /// Close the function body: the stack must hold exactly the results
    pub fn end_function(&mut self) -> Result<()> {
        let top = self.top_label()?;
        let result =
            self.check_label_kind(top, &[LabelKind::Func], "function body ends inside an open block");
        result.and(self.end_label(top, "implicit return", "function"))
    }

    /// Start validating a constant initializer producing `ty`
    pub fn begin_init_expr(&mut self, ty: ValueType) -> Result<()> {
        self.type_stack.clear();
        self.labels.clear();
        self.br_table_sig = None;
        self.push_label(LabelKind::InitExpr, &[], &[ty]);
        Ok(())
    }

    /// Close the initializer: the stack must hold exactly its value
    pub fn end_init_expr(&mut self) -> Result<()> {
        let top = self.top_label()?;
        let result = self.check_label_kind(
            top,
            &[LabelKind::InitExpr],
            "initializer expression ends inside an open block",
        );
        result.and(self.end_label(top, "initializer expression", "initializer expression"))
    }

    // ------------------------------------------------------------------
    // Structured control
    // ------------------------------------------------------------------

    /// `block`
    pub fn on_block(&mut self, params: &[ValueType], results: &[ValueType]) -> Result<()> {
        let result = self.pop_and_check_signature(params, "block");
        self.push_label(LabelKind::Block, params, results);
        self.push_types(params);
        result
    }

    /// `loop`
    pub fn on_loop(&mut self, params: &[ValueType], results: &[ValueType]) -> Result<()> {
        let result = self.pop_and_check_signature(params, "loop");
        self.push_label(LabelKind::Loop, params, results);
        self.push_types(params);
        result
    }

    /// `if`: pops the i32 condition, then the block parameters
    pub fn on_if(&mut self, params: &[ValueType], results: &[ValueType]) -> Result<()> {
        let mut result = self.pop_and_check_signature(&[ValueType::I32], "if");
        result = result.and(self.pop_and_check_signature(params, "if"));
        self.push_label(LabelKind::If, params, results);
        self.push_types(params);
        result
    }

    /// `else`: closes the true branch and re-enters with the parameters
    pub fn on_else(&mut self) -> Result<()> {
        let top = self.top_label()?;
        let mut result = self.check_label_kind(top, &[LabelKind::If], "else must follow an if block");
        let results = self.labels[top].results.clone();
        result = result.and(self.pop_and_check_signature(&results, "if true branch"));
        result = result.and(self.check_type_stack_end("if true branch"));
        self.reset_type_stack_to_label(top);
        let params = self.labels[top].params.clone();
        self.push_types(&params);
        let label = &mut self.labels[top];
        label.kind = LabelKind::Else;
        label.unreachable = false;
        result
    }

    /// `end` of any region. An `if` without `else` behaves as if it had an
    /// empty else arm, so its results must match its parameters.
    pub fn on_end(&mut self) -> Result<()> {
        let top = self.top_label()?;
        let mut result = Ok(());
        if self.labels[top].kind == LabelKind::If {
            result = self.on_else();
        }
        let desc = self.labels[top].kind.description();
        result.and(self.end_label(top, desc, desc))
    }

    // ------------------------------------------------------------------
    // Exception handling
    // ------------------------------------------------------------------

    /// `try`
    pub fn on_try(&mut self, params: &[ValueType], results: &[ValueType]) -> Result<()> {
        let result = self.pop_and_check_signature(params, "try");
        self.push_label(LabelKind::Try, params, results);
        self.push_types(params);
        result
    }

    /// `catch` with the caught tag's parameters, or `catch_all` with none
    pub fn on_catch(&mut self, sig: &[ValueType]) -> Result<()> {
        let top = self.top_label()?;
        let mut result = self.check_label_kind(
            top,
            &[LabelKind::Try, LabelKind::Catch],
            "catch must follow a try or catch block",
        );
        let results = self.labels[top].results.clone();
        result = result.and(self.pop_and_check_signature(&results, "try block"));
        result = result.and(self.check_type_stack_end("try block"));
        self.reset_type_stack_to_label(top);
        let label = &mut self.labels[top];
        label.kind = LabelKind::Catch;
        label.unreachable = false;
        self.push_types(sig);
        result
    }

    /// `delegate`: closes a `try` and forwards its exceptions to `depth`,
    /// counted from outside the `try`
    pub fn on_delegate(&mut self, depth: LabelIdx) -> Result<()> {
        self.resolve_label(depth.saturating_add(1))?;
        let top = self.top_label()?;
        let result = self.check_label_kind(top, &[LabelKind::Try], "delegate must follow a try block");
        result.and(self.end_label(top, "try block", "try block"))
    }

    /// `rethrow`: `depth` must name an enclosing `catch` region
    pub fn on_rethrow(&mut self, depth: LabelIdx) -> Result<()> {
        let target = self.resolve_label(depth)?;
        if self.labels[target].kind != LabelKind::Catch {
            let candidates: Vec<String> = self
                .labels
                .iter()
                .rev()
                .enumerate()
                .filter(|(_, label)| label.kind == LabelKind::Catch)
                .map(|(depth, _)| depth.to_string())
                .collect();
            if candidates.is_empty() {
                self.print_error("rethrow not in try catch block");
            } else {
                self.print_error(&format!(
                    "invalid rethrow depth: {depth} (catches: {})",
                    candidates.join(", ")
                ));
            }
            return Err(Error::invalid_rethrow("rethrow target is not a catch block"));
        }
        self.set_unreachable()
    }

    /// `throw` of a tag with parameters `sig`
    pub fn on_throw(&mut self, sig: &[ValueType]) -> Result<()> {
        let result = self.pop_and_check_signature(sig, "throw");
        self.set_unreachable()?;
        result
    }

    /// `throw_ref`
    pub fn on_throw_ref(&mut self) -> Result<()> {
        let result = self.pop_and_check_signature(&[ValueType::ExnRef], "throw_ref");
        self.set_unreachable()?;
        result
    }

    /// `try_table`, first step: pops the block parameters. Catch clauses are
    /// then checked against the enclosing labels with
    /// [`TypeChecker::on_try_table_catch`] before
    /// [`TypeChecker::finish_try_table`] opens the region.
    pub fn begin_try_table(&mut self, params: &[ValueType]) -> Result<()> {
        self.pop_and_check_signature(params, "try_table")
    }

    /// A `try_table` catch clause branching to `depth` with the values `sig`
    pub fn on_try_table_catch(&mut self, sig: &[ValueType], depth: LabelIdx) -> Result<()> {
        let target = self.resolve_label(depth)?;
        let label_sig = self.labels[target].br_types().to_vec();
        if self.check_types(sig, &label_sig).is_ok() {
            return Ok(());
        }
        self.print_error(&format!(
            "catch signature doesn't match target: expected {}, got {}",
            types_to_string(&label_sig, false),
            types_to_string(sig, false)
        ));
        Err(catch_signature_error("catch clause values differ from the target label"))
    }

    /// `try_table`, last step: opens the region
    pub fn finish_try_table(&mut self, params: &[ValueType], results: &[ValueType]) -> Result<()> {
        self.push_label(LabelKind::TryTable, params, results);
        self.push_types(params);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Branches
    // ------------------------------------------------------------------

    /// `br`
    pub fn on_br(&mut self, depth: LabelIdx) -> Result<()> {
        let target = self.resolve_label(depth)?;
        let sig = self.labels[target].br_types().to_vec();
        let result = self.check_signature(&sig, "br");
        self.set_unreachable()?;
        result
    }

    /// `br_if`
    pub fn on_br_if(&mut self, depth: LabelIdx) -> Result<()> {
        let result = self.pop_and_check_signature(&[ValueType::I32], "br_if");
        let target = self.resolve_label(depth)?;
        let sig = self.labels[target].br_types().to_vec();
        let result = result.and(self.pop_and_check_signature(&sig, "br_if"));
        self.push_types(&sig);
        result
    }

    /// `br_table`, first step: pops the i32 selector
    pub fn begin_br_table(&mut self) -> Result<()> {
        self.br_table_sig = None;
        self.pop_and_check_signature(&[ValueType::I32], "br_table")
    }

    /// One `br_table` target, the default included. Every target must agree
    /// with the first: in arity when reference types are enabled, in exact
    /// types otherwise.
    pub fn on_br_table_target(&mut self, depth: LabelIdx) -> Result<()> {
        let target = self.resolve_label(depth)?;
        let label_sig = self.labels[target].br_types().to_vec();
        let mut result = self.check_signature(&label_sig, "br_table");

        match self.br_table_sig.take() {
            None => self.br_table_sig = Some(label_sig),
            Some(first) => {
                let consistent = if self.features.reference_types {
                    first.len() == label_sig.len()
                } else {
                    first == label_sig
                };
                if !consistent {
                    self.print_error(&format!(
                        "br_table labels have inconsistent types: expected {}, got {}",
                        types_to_string(&first, false),
                        types_to_string(&label_sig, false)
                    ));
                    result = result.and(Err(br_table_inconsistent_error(
                        "br_table targets carry different values",
                    )));
                }
                self.br_table_sig = Some(first);
            },
        }
        result
    }

    /// `br_table`, last step
    pub fn end_br_table(&mut self) -> Result<()> {
        self.br_table_sig = None;
        self.set_unreachable()
    }

    /// `br_on_null`: branches when the reference is null, otherwise leaves
    /// it on the stack as non-null
    pub fn on_br_on_null(&mut self, depth: LabelIdx) -> Result<()> {
        let (reference, mut result) = self.pop_reference("br_on_null");
        let target = self.resolve_label(depth)?;
        let sig = self.labels[target].br_types().to_vec();
        result = result.and(self.check_signature(&sig, "br_on_null"));
        self.push_type(reference.as_non_null());
        result
    }

    /// `br_on_non_null`: branches with the non-null reference, which the
    /// target's last branch value must accept; otherwise drops it
    pub fn on_br_on_non_null(&mut self, depth: LabelIdx) -> Result<()> {
        let (reference, mut result) = self.pop_reference("br_on_non_null");
        let target = self.resolve_label(depth)?;
        let sig = self.labels[target].br_types().to_vec();
        if let Some((last, rest)) = sig.split_last() {
            let accepted = self.check_type(reference.as_non_null(), *last);
            if accepted.is_err() {
                self.print_error(&format!(
                    "type mismatch in br_on_non_null, expected [{last}] but got [{}]",
                    reference.as_non_null()
                ));
            }
            result = result.and(accepted);
            result = result.and(self.check_signature(rest, "br_on_non_null"));
        } else {
            self.print_error("br_on_non_null target must accept a reference");
            result = result.and(Err(expected_reference_error("branch target carries no reference")));
        }
        result
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    /// `call`
    pub fn on_call(&mut self, params: &[ValueType], results: &[ValueType]) -> Result<()> {
        self.pop_and_check_call(params, results, "call")
    }

    /// `call_indirect` through a table with `limits`
    pub fn on_call_indirect(
        &mut self,
        params: &[ValueType],
        results: &[ValueType],
        limits: &Limits,
    ) -> Result<()> {
        let result = self.pop_and_check_signature(&[limits.index_type()], "call_indirect");
        result.and(self.pop_and_check_call(params, results, "call_indirect"))
    }

    /// `call_ref` of a `(ref null $type_index)`
    pub fn on_call_ref(&mut self, type_index: TypeIdx) -> Result<()> {
        let func_type = self.resolve_type(type_index)?;
        let result =
            self.pop_and_check_signature(&[ValueType::nullable_reference(type_index)], "call_ref");
        result.and(self.pop_and_check_call(&func_type.params, &func_type.results, "call_ref"))
    }

    /// `return`
    pub fn on_return(&mut self) -> Result<()> {
        let func = self.function_label()?;
        let results = self.labels[func].results.clone();
        let result = self.pop_and_check_signature(&results, "return");
        self.set_unreachable()?;
        result
    }

    /// `return_call`
    pub fn on_return_call(&mut self, params: &[ValueType], results: &[ValueType]) -> Result<()> {
        let result = self.pop_and_check_signature(params, "return_call");
        self.finish_tail_call(result, results)
    }

    /// `return_call_indirect` through a table with `limits`
    pub fn on_return_call_indirect(
        &mut self,
        params: &[ValueType],
        results: &[ValueType],
        limits: &Limits,
    ) -> Result<()> {
        let mut result = self.pop_and_check_signature(&[limits.index_type()], "return_call_indirect");
        result = result.and(self.pop_and_check_signature(params, "return_call_indirect"));
        self.finish_tail_call(result, results)
    }

    /// `return_call_ref` of a `(ref null $type_index)`
    pub fn on_return_call_ref(&mut self, type_index: TypeIdx) -> Result<()> {
        let func_type = self.resolve_type(type_index)?;
        let mut result = self.pop_and_check_signature(
            &[ValueType::nullable_reference(type_index)],
            "return_call_ref",
        );
        result = result.and(self.pop_and_check_signature(&func_type.params, "return_call_ref"));
        self.finish_tail_call(result, &func_type.results)
    }

    fn finish_tail_call(&mut self, result: Result<()>, callee_results: &[ValueType]) -> Result<()> {
        let func = self.function_label()?;
        let expected = self.labels[func].results.clone();
        let result = result.and(self.check_return_signature(callee_results, &expected));
        self.set_unreachable()?;
        result
    }

    fn resolve_type(&mut self, type_index: TypeIdx) -> Result<FuncType> {
        if let Some(func_type) = self.registry.get(type_index) {
            return Ok(func_type.clone());
        }
        self.print_error(&format!("invalid type index: {type_index}"));
        Err(Error::invalid_index(codes::INVALID_TYPE_INDEX, "invalid type index"))
    }

    // ------------------------------------------------------------------
    // Descriptor-typed instructions
    // ------------------------------------------------------------------

    /// Unary numeric instruction
    pub fn on_unary(&mut self, op: Opcode) -> Result<()> {
        self.check_opcode(op, None)
    }

    /// Binary numeric instruction
    pub fn on_binary(&mut self, op: Opcode) -> Result<()> {
        self.check_opcode(op, None)
    }

    /// Comparison
    pub fn on_compare(&mut self, op: Opcode) -> Result<()> {
        self.check_opcode(op, None)
    }

    /// Conversion
    pub fn on_convert(&mut self, op: Opcode) -> Result<()> {
        self.check_opcode(op, None)
    }

    /// Three-operand instruction such as `v128.bitselect`
    pub fn on_ternary(&mut self, op: Opcode) -> Result<()> {
        self.check_opcode(op, None)
    }

    /// Load from a memory with `limits`
    pub fn on_load(&mut self, op: Opcode, limits: &Limits) -> Result<()> {
        self.check_opcode(op, Some(limits))
    }

    /// Store to a memory with `limits`
    pub fn on_store(&mut self, op: Opcode, limits: &Limits) -> Result<()> {
        self.check_opcode(op, Some(limits))
    }

    /// Atomic load
    pub fn on_atomic_load(&mut self, op: Opcode, limits: &Limits) -> Result<()> {
        self.check_opcode(op, Some(limits))
    }

    /// Atomic store
    pub fn on_atomic_store(&mut self, op: Opcode, limits: &Limits) -> Result<()> {
        self.check_opcode(op, Some(limits))
    }

    /// Atomic read-modify-write
    pub fn on_atomic_rmw(&mut self, op: Opcode, limits: &Limits) -> Result<()> {
        self.check_opcode(op, Some(limits))
    }

    /// Atomic compare-exchange
    pub fn on_atomic_cmpxchg(&mut self, op: Opcode, limits: &Limits) -> Result<()> {
        self.check_opcode(op, Some(limits))
    }

    /// `memory.atomic.wait32` / `memory.atomic.wait64`
    pub fn on_atomic_wait(&mut self, op: Opcode, limits: &Limits) -> Result<()> {
        self.check_opcode(op, Some(limits))
    }

    /// `memory.atomic.notify`
    pub fn on_atomic_notify(&mut self, op: Opcode, limits: &Limits) -> Result<()> {
        self.check_opcode(op, Some(limits))
    }

    /// `atomic.fence`
    pub fn on_atomic_fence(&mut self) -> Result<()> {
        Ok(())
    }

    /// Lane extract or replace with the lane immediate `lane`
    pub fn on_simd_lane_op(&mut self, op: Opcode, lane: u64) -> Result<()> {
        let result = self.check_lane(op, lane);
        result.and(self.check_opcode(op, None))
    }

    /// `i8x16.shuffle`: every lane immediate selects from both operands
    pub fn on_simd_shuffle(&mut self, op: Opcode, lanes: &[u8; 16]) -> Result<()> {
        let mut result = Ok(());
        for lane in lanes.iter().copied().filter(|lane| *lane >= SHUFFLE_LANE_LIMIT) {
            self.print_error(&format!(
                "lane index must be less than {SHUFFLE_LANE_LIMIT} (got {lane})"
            ));
            result = result.and(Err(lane_index_error("shuffle lane index out of range")));
        }
        result.and(self.check_opcode(op, None))
    }

    /// `v128.loadN_lane`
    pub fn on_simd_load_lane(&mut self, op: Opcode, limits: &Limits, lane: u64) -> Result<()> {
        let result = self.check_lane(op, lane);
        result.and(self.check_opcode(op, Some(limits)))
    }

    /// `v128.storeN_lane`
    pub fn on_simd_store_lane(&mut self, op: Opcode, limits: &Limits, lane: u64) -> Result<()> {
        let result = self.check_lane(op, lane);
        result.and(self.check_opcode(op, Some(limits)))
    }

    // ------------------------------------------------------------------
    // Bulk memory and tables
    // ------------------------------------------------------------------

    /// `memory.copy`; the length is i64 only when both memories are 64-bit
    pub fn on_memory_copy(&mut self, dst: &Limits, src: &Limits) -> Result<()> {
        let length = if dst.is_64 && src.is_64 { ValueType::I64 } else { ValueType::I32 };
        self.pop_and_check_signature(&[dst.index_type(), src.index_type(), length], "memory.copy")
    }

    /// `memory.fill`
    pub fn on_memory_fill(&mut self, limits: &Limits) -> Result<()> {
        let index = limits.index_type();
        self.pop_and_check_signature(&[index, ValueType::I32, index], "memory.fill")
    }

    /// `memory.init`
    pub fn on_memory_init(&mut self, limits: &Limits) -> Result<()> {
        self.pop_and_check_signature(
            &[limits.index_type(), ValueType::I32, ValueType::I32],
            "memory.init",
        )
    }

    /// `memory.grow`
    pub fn on_memory_grow(&mut self, limits: &Limits) -> Result<()> {
        let index = limits.index_type();
        let result = self.pop_and_check_signature(&[index], "memory.grow");
        self.push_type(index);
        result
    }

    /// `memory.size`
    pub fn on_memory_size(&mut self, limits: &Limits) -> Result<()> {
        self.push_type(limits.index_type());
        Ok(())
    }

    /// `data.drop`
    pub fn on_data_drop(&mut self, _segment: u32) -> Result<()> {
        Ok(())
    }

    /// `table.get`
    pub fn on_table_get(&mut self, elem_type: ValueType, limits: &Limits) -> Result<()> {
        let result = self.pop_and_check_signature(&[limits.index_type()], "table.get");
        self.push_type(elem_type);
        result
    }

    /// `table.set`
    pub fn on_table_set(&mut self, elem_type: ValueType, limits: &Limits) -> Result<()> {
        self.pop_and_check_signature(&[limits.index_type(), elem_type], "table.set")
    }

    /// `table.grow`
    pub fn on_table_grow(&mut self, elem_type: ValueType, limits: &Limits) -> Result<()> {
        let index = limits.index_type();
        let result = self.pop_and_check_signature(&[elem_type, index], "table.grow");
        self.push_type(index);
        result
    }

    /// `table.size`
    pub fn on_table_size(&mut self, limits: &Limits) -> Result<()> {
        self.push_type(limits.index_type());
        Ok(())
    }

    /// `table.fill`
    pub fn on_table_fill(&mut self, elem_type: ValueType, limits: &Limits) -> Result<()> {
        let index = limits.index_type();
        self.pop_and_check_signature(&[index, elem_type, index], "table.fill")
    }

    /// `table.copy`; the length is i64 only when both tables are 64-bit
    pub fn on_table_copy(&mut self, dst: &Limits, src: &Limits) -> Result<()> {
        let length = if dst.is_64 && src.is_64 { ValueType::I64 } else { ValueType::I32 };
        self.pop_and_check_signature(&[dst.index_type(), src.index_type(), length], "table.copy")
    }

    /// `table.init`
    pub fn on_table_init(&mut self, limits: &Limits) -> Result<()> {
        self.pop_and_check_signature(
            &[limits.index_type(), ValueType::I32, ValueType::I32],
            "table.init",
        )
    }

    /// `elem.drop`
    pub fn on_elem_drop(&mut self, _segment: u32) -> Result<()> {
        Ok(())
    }

    // ------------------------------------------------------------------
    // Variables, constants and parametric instructions
    // ------------------------------------------------------------------

    /// `local.get` of a local of type `ty`
    pub fn on_local_get(&mut self, ty: ValueType) -> Result<()> {
        self.push_type(ty);
        Ok(())
    }

    /// `local.set`
    pub fn on_local_set(&mut self, ty: ValueType) -> Result<()> {
        self.pop_and_check_signature(&[ty], "local.set")
    }

    /// `local.tee`
    pub fn on_local_tee(&mut self, ty: ValueType) -> Result<()> {
        let result = self.pop_and_check_signature(&[ty], "local.tee");
        self.push_type(ty);
        result
    }

    /// `global.get`
    pub fn on_global_get(&mut self, ty: ValueType) -> Result<()> {
        self.push_type(ty);
        Ok(())
    }

    /// `global.set`
    pub fn on_global_set(&mut self, ty: ValueType) -> Result<()> {
        self.pop_and_check_signature(&[ty], "global.set")
    }

    /// Any `*.const`
    pub fn on_const(&mut self, ty: ValueType) -> Result<()> {
        self.push_type(ty);
        Ok(())
    }

    /// `drop`
    pub fn on_drop(&mut self) -> Result<()> {
        let result = self.drop_types(1);
        self.print_stack_if_failed(result, "drop", &[ValueType::Any], false);
        result
    }

    /// `select`, untyped when `expected` is `None`. Untyped select only
    /// applies to numeric and vector operands.
    pub fn on_select(&mut self, expected: Option<ValueType>) -> Result<()> {
        let mut result = self.peek_and_check_type(0, ValueType::I32);
        let first = self.peek_type(1);
        let second = self.peek_type(2);
        result = result.and(first.map(|_| ())).and(second.map(|_| ()));
        let first = first.unwrap_or(ValueType::Any);
        let second = second.unwrap_or(ValueType::Any);

        let result_type = match expected {
            None => {
                if first.is_reference() || second.is_reference() {
                    result = result.and(Err(Error::type_mismatch(
                        "untyped select requires numeric or vector operands",
                    )));
                    ValueType::Any
                } else {
                    result = result.and(self.check_type(first, second));
                    first
                }
            },
            Some(expected) => {
                result = result
                    .and(self.check_type(first, expected))
                    .and(self.check_type(second, expected));
                expected
            },
        };
        self.print_stack_if_failed(result, "select", &[result_type, result_type, ValueType::I32], false);
        result = result.and(self.drop_types(3));
        self.push_type(result_type);
        result
    }

    /// `nop`
    pub fn on_nop(&mut self) -> Result<()> {
        Ok(())
    }

    /// `unreachable`
    pub fn on_unreachable(&mut self) -> Result<()> {
        self.set_unreachable()
    }

    // ------------------------------------------------------------------
    // References
    // ------------------------------------------------------------------

    /// `ref.func` of a function whose type is at `type_index`
    pub fn on_ref_func(&mut self, type_index: TypeIdx) -> Result<()> {
        self.push_type(ValueType::reference(type_index));
        Ok(())
    }

    /// `ref.null` of the reference type `ty`
    pub fn on_ref_null(&mut self, ty: ValueType) -> Result<()> {
        self.push_type(ty.as_nullable());
        Ok(())
    }

    /// `ref.is_null`
    pub fn on_ref_is_null(&mut self) -> Result<()> {
        let (_, result) = self.pop_reference("ref.is_null");
        self.push_type(ValueType::I32);
        result
    }

    /// `ref.as_non_null`
    pub fn on_ref_as_non_null(&mut self) -> Result<()> {
        let (reference, result) = self.pop_reference("ref.as_non_null");
        self.push_type(reference.as_non_null());
        result
    }
}

#[cfg(test)]
mod tests {
    #[cfg(not(feature = "std"))]
    use alloc::rc::Rc;
    #[cfg(feature = "std")]
    use std::rc::Rc;

    use super::*;

    fn recording(
        registry: &FuncTypeRegistry,
        features: Features,
    ) -> (TypeChecker<'_>, Rc<RefCell<Vec<String>>>) {
        let messages = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&messages);
        let checker = TypeChecker::new(registry, features)
            .with_error_sink(move |message| sink.borrow_mut().push(message.to_string()));
        (checker, messages)
    }

    #[test]
    fn test_add_leaves_result_on_stack() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[ValueType::I32]).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_binary(Opcode::I32_ADD).unwrap();
        assert_eq!(checker.type_stack_size(), 1);
        assert_eq!(checker.peek_type(0), Ok(ValueType::I32));
        checker.end_function().unwrap();
        assert!(messages.borrow().is_empty());
        assert_eq!(checker.label_depth(), 0);
    }

    #[test]
    fn test_mismatch_still_pushes_result() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[]).unwrap();
        checker.on_local_get(ValueType::I32).unwrap();
        checker.on_local_get(ValueType::F32).unwrap();
        assert!(checker.on_compare(Opcode::I32_EQ).is_err());
        assert_eq!(checker.type_stack_size(), 1);
        assert_eq!(checker.peek_type(0), Ok(ValueType::I32));
        assert_eq!(
            messages.borrow().as_slice(),
            ["type mismatch in i32.eq, expected [i32, i32] but got [i32, f32]"]
        );
    }

    #[test]
    fn test_unreachable_stack_is_polymorphic() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[ValueType::I32]).unwrap();
        checker.on_unreachable().unwrap();
        assert!(checker.is_unreachable());
        assert_eq!(checker.peek_type(3), Ok(ValueType::Any));
        checker.on_binary(Opcode::I64_ADD).unwrap();
        checker.on_convert(Opcode::I32_WRAP_I64).unwrap();
        checker.end_function().unwrap();
        assert!(messages.borrow().is_empty());
    }

    #[test]
    fn test_over_drop_resets_to_limit() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, _messages) = recording(&registry, Features::default());
        checker.begin_function(&[]).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_block(&[], &[]).unwrap();
        checker.on_const(ValueType::F32).unwrap();
        assert_eq!(checker.drop_types(2), Err(Error::STACK_UNDERFLOW));
        assert_eq!(checker.type_stack_size(), 1);

        checker.on_unreachable().unwrap();
        checker.on_const(ValueType::F64).unwrap();
        assert_eq!(checker.drop_types(5), Ok(()));
        assert_eq!(checker.type_stack_size(), 1);
    }

    #[test]
    fn test_drop_reports_any() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[]).unwrap();
        assert!(checker.on_drop().is_err());
        assert_eq!(messages.borrow().as_slice(), ["type mismatch in drop, expected [any] but got []"]);
    }

    #[test]
    fn test_end_with_leftover_values() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[]).unwrap();
        checker.on_block(&[], &[]).unwrap();
        checker.on_const(ValueType::I64).unwrap();
        assert!(checker.on_end().is_err());
        assert_eq!(
            messages.borrow().as_slice(),
            ["type mismatch at end of block, expected [] but got [i64]"]
        );
        // The block is closed regardless.
        assert_eq!(checker.label_depth(), 1);
        checker.end_function().unwrap();
    }

    #[test]
    fn test_if_without_else_requires_matching_params() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[]).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_if(&[], &[ValueType::I32]).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        assert!(checker.on_end().is_err());
        assert_eq!(
            messages.borrow().first().map(String::as_str),
            Some("type mismatch in if false branch, expected [i32] but got []")
        );
    }

    #[test]
    fn test_else_requires_if() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[]).unwrap();
        checker.on_block(&[], &[]).unwrap();
        assert!(checker.on_else().is_err());
        assert_eq!(messages.borrow().as_slice(), ["else must follow an if block"]);
        assert_eq!(checker.label(0).map(Label::kind), Some(LabelKind::Else));
    }

    #[test]
    fn test_invalid_branch_depth() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[]).unwrap();
        checker.on_block(&[], &[]).unwrap();
        assert_eq!(
            checker.on_br(2).map_err(|e| e.code),
            Err(codes::INVALID_BRANCH_DEPTH)
        );
        assert_eq!(messages.borrow().as_slice(), ["invalid depth: 2 (max 1)"]);
        assert!(!checker.is_unreachable());
    }

    #[test]
    fn test_loop_branches_carry_params() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[ValueType::F32]).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_loop(&[ValueType::I32], &[ValueType::F32]).unwrap();
        checker.on_br(0).unwrap();
        checker.on_end().unwrap();
        checker.end_function().unwrap();
        assert!(messages.borrow().is_empty());
    }

    #[test]
    fn test_br_if_keeps_values() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, _messages) = recording(&registry, Features::default());
        checker.begin_function(&[ValueType::I64]).unwrap();
        checker.on_const(ValueType::I64).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_br_if(0).unwrap();
        assert_eq!(checker.peek_type(0), Ok(ValueType::I64));
        checker.end_function().unwrap();
    }

    #[test]
    fn test_br_table_exact_types_without_reference_types() {
        let registry = FuncTypeRegistry::new();
        let features = Features {
            reference_types: false,
            ..Features::default()
        };
        let (mut checker, messages) = recording(&registry, features);
        checker.begin_function(&[]).unwrap();
        checker.on_block(&[], &[ValueType::F32]).unwrap();
        checker.on_block(&[], &[ValueType::I32]).unwrap();
        checker.on_unreachable().unwrap();
        checker.begin_br_table().unwrap();
        checker.on_br_table_target(0).unwrap();
        assert!(checker.on_br_table_target(1).is_err());
        assert_eq!(
            messages.borrow().as_slice(),
            ["br_table labels have inconsistent types: expected [i32], got [f32]"]
        );
        checker.end_br_table().unwrap();
    }

    #[test]
    fn test_br_table_arity_only_with_reference_types() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[]).unwrap();
        checker.on_block(&[], &[ValueType::F32]).unwrap();
        checker.on_block(&[], &[ValueType::I32]).unwrap();
        checker.on_unreachable().unwrap();
        checker.begin_br_table().unwrap();
        checker.on_br_table_target(0).unwrap();
        checker.on_br_table_target(1).unwrap();
        checker.end_br_table().unwrap();
        assert!(messages.borrow().is_empty());
    }

    #[test]
    fn test_select_variants() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[]).unwrap();
        checker.on_const(ValueType::F64).unwrap();
        checker.on_const(ValueType::F64).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_select(None).unwrap();
        assert_eq!(checker.peek_type(0), Ok(ValueType::F64));
        checker.on_drop().unwrap();

        checker.on_ref_null(ValueType::FUNCREF).unwrap();
        checker.on_ref_null(ValueType::FUNCREF).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        assert!(checker.on_select(None).is_err());
        assert_eq!(checker.type_stack_size(), 1);
        checker.on_drop().unwrap();

        messages.borrow_mut().clear();
        checker.on_ref_null(ValueType::FUNCREF).unwrap();
        checker.on_ref_null(ValueType::FUNCREF).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_select(Some(ValueType::FUNCREF)).unwrap();
        assert_eq!(checker.peek_type(0), Ok(ValueType::FUNCREF));
        assert!(messages.borrow().is_empty());
    }

    #[test]
    fn test_try_catch_and_rethrow() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::all());
        checker.begin_function(&[]).unwrap();
        checker.on_try(&[], &[]).unwrap();
        assert!(checker.on_rethrow(0).is_err());
        assert_eq!(messages.borrow().as_slice(), ["rethrow not in try catch block"]);

        checker.on_catch(&[ValueType::I32]).unwrap();
        checker.on_drop().unwrap();
        checker.on_block(&[], &[]).unwrap();
        assert_eq!(checker.catch_count(1), Ok(1));
        assert_eq!(checker.catch_count(0), Ok(0));
        assert!(checker.on_rethrow(0).is_err());
        assert_eq!(
            messages.borrow().last().map(String::as_str),
            Some("invalid rethrow depth: 0 (catches: 1)")
        );
        checker.on_rethrow(1).unwrap();
        checker.on_end().unwrap();
        checker.on_end().unwrap();
        checker.end_function().unwrap();
    }

    #[test]
    fn test_delegate_closes_try() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::all());
        checker.begin_function(&[ValueType::I32]).unwrap();
        checker.on_try(&[], &[ValueType::I32]).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_delegate(0).unwrap();
        assert_eq!(checker.label_depth(), 1);
        checker.end_function().unwrap();

        checker.begin_function(&[]).unwrap();
        checker.on_block(&[], &[]).unwrap();
        assert!(checker.on_delegate(0).is_err());
        assert_eq!(messages.borrow().as_slice(), ["delegate must follow a try block"]);
    }

    #[test]
    fn test_try_table_catch_signatures() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::all());
        checker.begin_function(&[]).unwrap();
        checker.on_block(&[], &[ValueType::I32, ValueType::ExnRef]).unwrap();
        checker.begin_try_table(&[]).unwrap();
        checker.on_try_table_catch(&[ValueType::I32, ValueType::ExnRef], 0).unwrap();
        assert!(checker.on_try_table_catch(&[ValueType::ExnRef], 0).is_err());
        assert_eq!(
            messages.borrow().as_slice(),
            ["catch signature doesn't match target: expected [i32, exnref], got [exnref]"]
        );
        checker.finish_try_table(&[], &[]).unwrap();
        assert_eq!(checker.label(0).map(Label::kind), Some(LabelKind::TryTable));
        checker.on_end().unwrap();
    }

    #[test]
    fn test_tail_call_result_mismatch() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::all());
        checker.begin_function(&[ValueType::I32]).unwrap();
        assert!(checker.on_return_call(&[], &[ValueType::I64]).is_err());
        assert_eq!(
            messages.borrow().as_slice(),
            ["return signatures have inconsistent types: expected [i32], got [i64]"]
        );
        assert!(checker.is_unreachable());
        checker.end_function().unwrap();
    }

    #[test]
    fn test_call_ref_uses_registry() {
        let registry: FuncTypeRegistry =
            [FuncType::new(&[ValueType::I32], &[ValueType::F32])].into_iter().collect();
        let (mut checker, messages) = recording(&registry, Features::all());
        checker.begin_function(&[ValueType::F32]).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_ref_func(0).unwrap();
        checker.on_call_ref(0).unwrap();
        checker.end_function().unwrap();
        assert!(messages.borrow().is_empty());

        checker.begin_function(&[]).unwrap();
        assert!(checker.on_call_ref(7).is_err());
        assert_eq!(messages.borrow().as_slice(), ["invalid type index: 7"]);
    }

    #[test]
    fn test_br_on_null_and_non_null() {
        let registry: FuncTypeRegistry = [FuncType::default()].into_iter().collect();
        let (mut checker, messages) = recording(&registry, Features::all());
        checker.begin_function(&[]).unwrap();
        checker.on_ref_null(ValueType::nullable_reference(0)).unwrap();
        checker.on_br_on_null(0).unwrap();
        assert_eq!(checker.peek_type(0), Ok(ValueType::reference(0)));
        checker.on_drop().unwrap();

        checker.on_block(&[], &[ValueType::reference(0)]).unwrap();
        checker.on_ref_null(ValueType::nullable_reference(0)).unwrap();
        checker.on_br_on_non_null(0).unwrap();
        assert_eq!(checker.type_stack_size(), 0);
        checker.on_unreachable().unwrap();
        checker.on_end().unwrap();
        checker.on_drop().unwrap();
        checker.end_function().unwrap();
        assert!(messages.borrow().is_empty());

        checker.begin_function(&[]).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        assert!(checker.on_br_on_null(0).is_err());
        assert_eq!(
            messages.borrow().as_slice(),
            ["type mismatch in br_on_null, expected a reference but got [i32]"]
        );
    }

    #[test]
    fn test_lane_indices() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_function(&[]).unwrap();
        checker.on_const(ValueType::V128).unwrap();
        assert!(checker.on_simd_lane_op(Opcode::I32X4_EXTRACT_LANE, 4).is_err());
        assert_eq!(messages.borrow().as_slice(), ["lane index must be less than 4 (got 4)"]);
        assert_eq!(checker.peek_type(0), Ok(ValueType::I32));
        checker.on_drop().unwrap();

        messages.borrow_mut().clear();
        checker.on_const(ValueType::V128).unwrap();
        checker.on_const(ValueType::V128).unwrap();
        let mut lanes = [0u8; 16];
        lanes[3] = 31;
        checker.on_simd_shuffle(Opcode::I8X16_SHUFFLE, &lanes).unwrap();
        lanes[5] = 32;
        checker.on_const(ValueType::V128).unwrap();
        assert!(checker.on_simd_shuffle(Opcode::I8X16_SHUFFLE, &lanes).is_err());
        assert_eq!(messages.borrow().as_slice(), ["lane index must be less than 32 (got 32)"]);
    }

    #[test]
    fn test_memory64_address_operands() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        let memory64 = Limits::new_64(1);
        let memory32 = Limits::new(1);
        checker.begin_function(&[]).unwrap();
        checker.on_const(ValueType::I64).unwrap();
        checker.on_load(Opcode::I32_LOAD, &memory64).unwrap();
        checker.on_drop().unwrap();

        checker.on_const(ValueType::I64).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_memory_copy(&memory64, &memory32).unwrap();

        checker.on_memory_size(&memory64).unwrap();
        checker.on_memory_grow(&memory64).unwrap();
        assert_eq!(checker.peek_type(0), Ok(ValueType::I64));
        checker.on_drop().unwrap();
        assert!(messages.borrow().is_empty());
    }

    #[test]
    fn test_table_operations() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        let limits = Limits::new(0);
        checker.begin_function(&[]).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_table_get(ValueType::EXTERNREF, &limits).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_table_grow(ValueType::EXTERNREF, &limits).unwrap();
        checker.on_drop().unwrap();
        checker.on_table_size(&limits).unwrap();
        checker.on_ref_null(ValueType::FUNCREF).unwrap();
        assert!(checker.on_table_set(ValueType::EXTERNREF, &limits).is_err());
        assert_eq!(
            messages.borrow().as_slice(),
            ["type mismatch in table.set, expected [i32, externref] but got [i32, funcref]"]
        );
    }

    #[test]
    fn test_ref_operations() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, _messages) = recording(&registry, Features::all());
        checker.begin_function(&[ValueType::I32]).unwrap();
        checker.on_ref_null(ValueType::ExternRef { nullable: false }).unwrap();
        assert_eq!(checker.peek_type(0), Ok(ValueType::EXTERNREF));
        checker.on_ref_as_non_null().unwrap();
        assert_eq!(checker.peek_type(0), Ok(ValueType::ExternRef { nullable: false }));
        checker.on_ref_is_null().unwrap();
        checker.end_function().unwrap();
    }

    #[test]
    fn test_return_makes_rest_unreachable() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, _messages) = recording(&registry, Features::default());
        checker.begin_function(&[ValueType::I32]).unwrap();
        checker.on_block(&[], &[]).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        checker.on_return().unwrap();
        assert!(checker.is_unreachable());
        checker.on_end().unwrap();
        assert!(!checker.is_unreachable());
        checker.on_unreachable().unwrap();
        checker.end_function().unwrap();
    }

    #[test]
    fn test_init_expr_lifecycle() {
        let registry = FuncTypeRegistry::new();
        let (mut checker, messages) = recording(&registry, Features::default());
        checker.begin_init_expr(ValueType::I64).unwrap();
        checker.on_const(ValueType::I32).unwrap();
        assert!(checker.end_init_expr().is_err());
        assert_eq!(
            messages.borrow().as_slice(),
            ["type mismatch in initializer expression, expected [i64] but got [i32]"]
        );
        assert_eq!(checker.label_depth(), 0);
    }

    #[test]
    fn test_operations_without_open_label() {
        let registry = FuncTypeRegistry::new();
        let mut checker = TypeChecker::new(&registry, Features::default());
        assert!(checker.is_unreachable());
        assert_eq!(checker.peek_type(0), Err(Error::NO_OPEN_LABEL));
        assert_eq!(checker.on_end(), Err(Error::NO_OPEN_LABEL));
        assert_eq!(checker.on_return(), Err(Error::NO_OPEN_LABEL));
    }
}
