// WTK - wtk-foundation
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Function type registry.
//!
//! The registry maps a type-definition index to the function type declared
//! at that index. It is filled once by the module-level validator while the
//! type section is read, before any function body is checked, and is only
//! read afterwards. Entries may reference each other through `(ref $i)`
//! parameters or results, including cyclically.

use crate::{
    prelude::*,
    types::{FuncType, TypeIdx},
};

/// Map from type index to function type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuncTypeRegistry {
    types: BTreeMap<TypeIdx, FuncType>,
}

impl FuncTypeRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func_type` at `index`, returning the entry it replaced
    pub fn insert(&mut self, index: TypeIdx, func_type: FuncType) -> Option<FuncType> {
        self.types.insert(index, func_type)
    }

    /// Append `func_type` after the highest registered index and return its
    /// index, mirroring the order of a type section.
    pub fn push(&mut self, func_type: FuncType) -> TypeIdx {
        let index = self.types.last_key_value().map_or(0, |(last, _)| last + 1);
        self.types.insert(index, func_type);
        index
    }

    /// Look up the function type at `index`
    #[must_use]
    pub fn get(&self, index: TypeIdx) -> Option<&FuncType> {
        self.types.get(&index)
    }

    /// Whether a function type is registered at `index`
    #[must_use]
    pub fn contains(&self, index: TypeIdx) -> bool {
        self.types.contains_key(&index)
    }

    /// Number of registered function types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over `(index, type)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (TypeIdx, &FuncType)> {
        self.types.iter().map(|(index, ty)| (*index, ty))
    }
}

impl FromIterator<FuncType> for FuncTypeRegistry {
    fn from_iter<I: IntoIterator<Item = FuncType>>(iter: I) -> Self {
        let mut registry = Self::new();
        for func_type in iter {
            registry.push(func_type);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    #[test]
    fn test_push_assigns_sequential_indices() {
        let mut registry = FuncTypeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.push(FuncType::default()), 0);
        assert_eq!(registry.push(FuncType::new(&[ValueType::I32], &[])), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).map(|ty| ty.params.len()), Some(1));
    }

    #[test]
    fn test_insert_with_gaps() {
        let mut registry = FuncTypeRegistry::new();
        registry.insert(5, FuncType::default());
        assert!(registry.contains(5));
        assert!(!registry.contains(0));
        assert_eq!(registry.push(FuncType::default()), 6);
    }

    #[test]
    fn test_cyclic_entries_are_storable() {
        let registry: FuncTypeRegistry = [
            FuncType::new(&[ValueType::reference(1)], &[]),
            FuncType::new(&[ValueType::reference(0)], &[]),
        ]
        .into_iter()
        .collect();
        let indices: Vec<_> = registry.iter().map(|(index, _)| index).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
