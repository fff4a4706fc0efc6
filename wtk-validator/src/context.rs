// WTK - wtk-validator
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Module-level declarations visible to function bodies.
//!
//! A [`ModuleContext`] is filled once from the module's sections and then
//! only read while bodies are validated. Every lookup fails with an
//! index-space specific error whose message names the index space.

use wtk_foundation::{ElemIdx, MemIdx, TableIdx};

use crate::prelude::*;

const INVALID_LOCAL: Error = Error::invalid_index(codes::INVALID_LOCAL_INDEX, "invalid local index");
const INVALID_GLOBAL: Error =
    Error::invalid_index(codes::INVALID_GLOBAL_INDEX, "invalid global index");
const INVALID_FUNCTION: Error =
    Error::invalid_index(codes::INVALID_FUNCTION_INDEX, "invalid function index");
const INVALID_TABLE: Error = Error::invalid_index(codes::INVALID_TABLE_INDEX, "invalid table index");
const INVALID_MEMORY: Error =
    Error::invalid_index(codes::INVALID_MEMORY_INDEX, "invalid memory index");
const INVALID_TAG: Error = Error::invalid_index(codes::INVALID_TAG_INDEX, "invalid tag index");
const INVALID_TYPE: Error = Error::invalid_index(codes::INVALID_TYPE_INDEX, "invalid type index");
const INVALID_DATA_SEGMENT: Error =
    Error::invalid_index(codes::INVALID_DATA_SEGMENT_INDEX, "invalid data segment index");
const INVALID_ELEM_SEGMENT: Error =
    Error::invalid_index(codes::INVALID_ELEM_SEGMENT_INDEX, "invalid elem segment index");

/// Missing data count section while a body refers to data segments
pub const DATA_COUNT_REQUIRED: Error =
    Error::validation_error("data count section required");

fn lookup<T: Copy>(items: &[T], index: u32, error: Error) -> Result<T> {
    usize::try_from(index).ok().and_then(|i| items.get(i)).copied().ok_or(error)
}

/// Declarations of one module, in index-space order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleContext {
    types:      FuncTypeRegistry,
    funcs:      Vec<TypeIdx>,
    tables:     Vec<TableType>,
    memories:   Vec<Limits>,
    globals:    Vec<GlobalType>,
    tags:       Vec<TypeIdx>,
    elem_types: Vec<ValueType>,
    data_count: Option<u32>,
}

impl ModuleContext {
    /// An empty module
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A module whose type section is `types`
    #[must_use]
    pub fn with_types(types: FuncTypeRegistry) -> Self {
        Self {
            types,
            ..Self::default()
        }
    }

    /// Append a function type and return its index
    pub fn add_type(&mut self, func_type: FuncType) -> TypeIdx {
        self.types.push(func_type)
    }

    /// Declare a function (imported or defined) of type `type_index`
    pub fn add_function(&mut self, type_index: TypeIdx) -> FuncIdx {
        push_index(&mut self.funcs, type_index)
    }

    /// Declare a table
    pub fn add_table(&mut self, table: TableType) -> TableIdx {
        push_index(&mut self.tables, table)
    }

    /// Declare a memory
    pub fn add_memory(&mut self, limits: Limits) -> MemIdx {
        push_index(&mut self.memories, limits)
    }

    /// Declare a global
    pub fn add_global(&mut self, global: GlobalType) -> u32 {
        push_index(&mut self.globals, global)
    }

    /// Declare an exception tag whose parameters are those of `type_index`
    pub fn add_tag(&mut self, type_index: TypeIdx) -> TagIdx {
        push_index(&mut self.tags, type_index)
    }

    /// Declare an element segment holding references of `elem_type`
    pub fn add_elem_segment(&mut self, elem_type: ValueType) -> ElemIdx {
        push_index(&mut self.elem_types, elem_type)
    }

    /// Record the data count section
    pub fn set_data_count(&mut self, count: u32) {
        self.data_count = Some(count);
    }

    /// The type section
    #[must_use]
    pub fn types(&self) -> &FuncTypeRegistry {
        &self.types
    }

    /// Function type at `index` in the type section
    pub fn type_at(&self, index: TypeIdx) -> Result<&FuncType> {
        self.types.get(index).ok_or(INVALID_TYPE)
    }

    /// Type index of function `func`
    pub fn function_type_index(&self, func: FuncIdx) -> Result<TypeIdx> {
        lookup(&self.funcs, func, INVALID_FUNCTION)
    }

    /// Signature of function `func`
    pub fn function_type(&self, func: FuncIdx) -> Result<&FuncType> {
        self.type_at(self.function_type_index(func)?)
    }

    /// Table `index`
    pub fn table(&self, index: TableIdx) -> Result<TableType> {
        lookup(&self.tables, index, INVALID_TABLE)
    }

    /// Limits of memory `index`
    pub fn memory(&self, index: MemIdx) -> Result<Limits> {
        lookup(&self.memories, index, INVALID_MEMORY)
    }

    /// Global `index`
    pub fn global(&self, index: u32) -> Result<GlobalType> {
        lookup(&self.globals, index, INVALID_GLOBAL)
    }

    /// Parameters of the values thrown with tag `index`
    pub fn tag_params(&self, index: TagIdx) -> Result<&[ValueType]> {
        let type_index = lookup(&self.tags, index, INVALID_TAG)?;
        Ok(&self.type_at(type_index)?.params)
    }

    /// Element type of element segment `index`
    pub fn elem_type(&self, index: ElemIdx) -> Result<ValueType> {
        lookup(&self.elem_types, index, INVALID_ELEM_SEGMENT)
    }

    /// Whether data segment `index` exists. Bodies may only name data
    /// segments when the module carries a data count section.
    pub fn check_data_segment(&self, index: u32) -> Result<()> {
        match self.data_count {
            None => Err(DATA_COUNT_REQUIRED),
            Some(count) if index < count => Ok(()),
            Some(_) => Err(INVALID_DATA_SEGMENT),
        }
    }

    /// Parameters and results of a block type annotation
    pub fn block_signature(&self, block_type: BlockType) -> Result<(Vec<ValueType>, Vec<ValueType>)> {
        match block_type {
            BlockType::Empty => Ok((Vec::new(), Vec::new())),
            BlockType::Value(ty) => Ok((Vec::new(), vec![ty])),
            BlockType::TypeIndex(index) => {
                let func_type = self.type_at(index)?;
                Ok((func_type.params.clone(), func_type.results.clone()))
            },
        }
    }
}

/// Error for a local index outside the function's locals
#[must_use]
pub const fn invalid_local() -> Error {
    INVALID_LOCAL
}

fn push_index<T>(items: &mut Vec<T>, item: T) -> u32 {
    items.push(item);
    u32::try_from(items.len() - 1).unwrap_or(u32::MAX)
}
