// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::contract::Instance;

pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Key of an entry in the [`SingletonStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum StoreKey {
    /// An instance resolved for a contract.
    Contract(TypeId),

    /// A constructed implementation, shared by every contract bound to it.
    Concrete(TypeId),
}

/// Resolver-lifetime map from contract to resolved instance.
///
/// Entries are added once: inserting a key that is already present keeps the existing value.
#[derive(Debug, Default)]
pub(crate) struct SingletonStore {
    contracts: HashMap<TypeId, Instance>,
    concretes: HashMap<TypeId, AnyArc>,
}

impl SingletonStore {
    pub(crate) fn get(&self, contract: TypeId) -> Option<&Instance> {
        self.contracts.get(&contract)
    }

    pub(crate) fn get_concrete(&self, implementation: TypeId) -> Option<&AnyArc> {
        self.concretes.get(&implementation)
    }

    /// Registers `instance` for `contract` unless an instance is already registered.
    ///
    /// Returns the registered instance and whether this call inserted it.
    pub(crate) fn insert(&mut self, contract: TypeId, instance: Instance) -> (Instance, bool) {
        match self.contracts.get(&contract) {
            Some(existing) => (existing.clone(), false),
            None => {
                self.contracts.insert(contract, instance.clone());
                (instance, true)
            }
        }
    }

    /// Registers a constructed implementation unless one is already registered.
    ///
    /// Returns whether this call inserted it.
    pub(crate) fn insert_concrete(&mut self, implementation: TypeId, value: AnyArc) -> bool {
        if self.concretes.contains_key(&implementation) {
            return false;
        }

        self.concretes.insert(implementation, value);
        true
    }

    pub(crate) fn remove(&mut self, key: StoreKey) {
        match key {
            StoreKey::Contract(id) => {
                self.contracts.remove(&id);
            }
            StoreKey::Concrete(id) => {
                self.concretes.remove(&id);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.contracts.len()
    }
}
