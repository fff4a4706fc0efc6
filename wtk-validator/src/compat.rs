// WTK - wtk-validator
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Structural type compatibility.
//!
//! Untyped references, numeric and vector types compare by tag and
//! nullability. Indexed references are resolved through the function type
//! registry and compared parameter by parameter and result by result. Type
//! definitions may reference each other cyclically, so every pair of indices
//! currently under comparison is assumed compatible; a cycle therefore closes
//! successfully instead of recursing forever.

use wtk_foundation::{FuncTypeRegistry, TypeIdx, ValueType};

use crate::prelude::*;

/// Whether a value of type `actual` may be used where `expected` is required.
///
/// `Any` is compatible with everything in both positions.
#[must_use]
pub fn check_type(registry: &FuncTypeRegistry, actual: ValueType, expected: ValueType) -> bool {
    TypeComparer::new(registry).compare(actual, expected)
}

/// Element-wise [`check_type`] over two sequences of equal length
#[must_use]
pub fn check_types(registry: &FuncTypeRegistry, actual: &[ValueType], expected: &[ValueType]) -> bool {
    TypeComparer::new(registry).compare_sequences(actual, expected)
}

struct TypeComparer<'a> {
    registry:    &'a FuncTypeRegistry,
    assumptions: Vec<(TypeIdx, TypeIdx)>,
}

impl<'a> TypeComparer<'a> {
    fn new(registry: &'a FuncTypeRegistry) -> Self {
        Self {
            registry,
            assumptions: Vec::new(),
        }
    }

    fn compare(&mut self, actual: ValueType, expected: ValueType) -> bool {
        use ValueType::{Any, ExnRef, ExternRef, F32, F64, FuncRef, I32, I64, Ref, V128};

        match (actual, expected) {
            (Any, _) | (_, Any) => true,
            (FuncRef { nullable: actual }, FuncRef { nullable: expected })
            | (ExternRef { nullable: actual }, ExternRef { nullable: expected }) => {
                expected || !actual
            }
            (I32, I32) | (I64, I64) | (F32, F32) | (F64, F64) | (V128, V128) | (ExnRef, ExnRef) => {
                true
            }
            (
                Ref {
                    index: actual_index,
                    nullable: actual_nullable,
                },
                Ref {
                    index: expected_index,
                    nullable: expected_nullable,
                },
            ) => {
                if actual_nullable && !expected_nullable {
                    return false;
                }
                self.compare_indices(actual_index, expected_index)
            }
            // A typed function reference is a function reference.
            (Ref { nullable: actual, .. }, FuncRef { nullable: expected }) => expected || !actual,
            _ => false,
        }
    }

    fn compare_indices(&mut self, actual: TypeIdx, expected: TypeIdx) -> bool {
        if actual == expected || self.assumptions.contains(&(actual, expected)) {
            return true;
        }
        let registry = self.registry;
        let (Some(actual_type), Some(expected_type)) = (registry.get(actual), registry.get(expected))
        else {
            return false;
        };

        self.assumptions.push((actual, expected));
        let matches = self.compare_sequences(&actual_type.params, &expected_type.params)
            && self.compare_sequences(&actual_type.results, &expected_type.results);
        self.assumptions.pop();
        matches
    }

    fn compare_sequences(&mut self, actual: &[ValueType], expected: &[ValueType]) -> bool {
        actual.len() == expected.len()
            && actual.iter().zip(expected).all(|(actual, expected)| self.compare(*actual, *expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONCRETE: [ValueType; 6] = [
        ValueType::I32,
        ValueType::I64,
        ValueType::F32,
        ValueType::F64,
        ValueType::V128,
        ValueType::ExnRef,
    ];

    #[test]
    fn test_identical_concrete_types() {
        let registry = FuncTypeRegistry::new();
        for ty in CONCRETE {
            assert!(check_type(&registry, ty, ty));
            assert!(check_type(&registry, ValueType::Any, ty));
            assert!(check_type(&registry, ty, ValueType::Any));
        }
        assert!(!check_type(&registry, ValueType::I32, ValueType::I64));
    }

    #[test]
    fn test_untyped_reference_nullability() {
        let registry = FuncTypeRegistry::new();
        let non_null = ValueType::FuncRef { nullable: false };
        assert!(check_type(&registry, non_null, ValueType::FUNCREF));
        assert!(!check_type(&registry, ValueType::FUNCREF, non_null));
        assert!(!check_type(&registry, ValueType::EXTERNREF, ValueType::FUNCREF));
    }

    #[test]
    fn test_indexed_reference_against_funcref() {
        let registry: FuncTypeRegistry = [FuncType::default()].into_iter().collect();
        assert!(check_type(&registry, ValueType::reference(0), ValueType::FUNCREF));
        assert!(check_type(
            &registry,
            ValueType::reference(0),
            ValueType::FuncRef { nullable: false }
        ));
        assert!(!check_type(
            &registry,
            ValueType::nullable_reference(0),
            ValueType::FuncRef { nullable: false }
        ));
        assert!(!check_type(&registry, ValueType::FUNCREF, ValueType::reference(0)));
        assert!(!check_type(&registry, ValueType::reference(0), ValueType::EXTERNREF));
    }

    #[test]
    fn test_structural_equality_and_nullability() {
        let registry: FuncTypeRegistry = [
            FuncType::new(&[ValueType::I32], &[ValueType::I64]),
            FuncType::new(&[ValueType::I32], &[ValueType::I64]),
            FuncType::new(&[ValueType::F32], &[]),
        ]
        .into_iter()
        .collect();
        assert!(check_type(&registry, ValueType::reference(0), ValueType::reference(1)));
        assert!(check_type(&registry, ValueType::reference(0), ValueType::nullable_reference(1)));
        assert!(!check_type(&registry, ValueType::nullable_reference(0), ValueType::reference(1)));
        assert!(!check_type(&registry, ValueType::reference(0), ValueType::reference(2)));
        assert!(!check_type(&registry, ValueType::reference(0), ValueType::reference(9)));
    }

    #[test]
    fn test_mutually_recursive_types_terminate() {
        // 0: (ref 1) -> [], 1: (ref 0) -> [], 2: (ref 3) -> [], 3: (ref 2) -> []
        let registry: FuncTypeRegistry = [
            FuncType::new(&[ValueType::reference(1)], &[]),
            FuncType::new(&[ValueType::reference(0)], &[]),
            FuncType::new(&[ValueType::reference(3)], &[]),
            FuncType::new(&[ValueType::reference(2)], &[]),
        ]
        .into_iter()
        .collect();
        assert!(check_type(&registry, ValueType::reference(0), ValueType::reference(2)));
        assert!(check_type(&registry, ValueType::reference(1), ValueType::reference(3)));
    }

    #[test]
    fn test_sequences_require_equal_length() {
        let registry = FuncTypeRegistry::new();
        assert!(check_types(&registry, &[ValueType::I32], &[ValueType::I32]));
        assert!(!check_types(&registry, &[ValueType::I32], &[ValueType::I32, ValueType::I32]));
    }
}
