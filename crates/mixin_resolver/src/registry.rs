// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use tracing::{Level, event};

use crate::contract::TypeInfo;
use crate::error::{Error, Result};
use crate::implementation::{ImplementationEntry, Provided};
use crate::naming;

/// Maps contracts to the implementations that satisfy them.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: Vec<ImplementationEntry>,
    bindings: HashMap<TypeId, usize>,
}

impl Registry {
    /// Creates a registry from the catalog and the explicitly bound `(contract, entry)` pairs.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::DuplicateImplementation`] when two entries describe the same type.
    pub(crate) fn new(entries: Vec<ImplementationEntry>, explicit: &[(TypeId, usize)]) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.type_id) {
                return Err(Error::DuplicateImplementation {
                    implementation: entry.name.to_string(),
                });
            }
        }

        let mut registry = Self {
            entries,
            bindings: HashMap::new(),
        };

        for &(contract, index) in explicit {
            registry.bind(contract, index);
        }

        Ok(registry)
    }

    fn bind(&mut self, contract: TypeId, index: usize) {
        let entry = &self.entries[index];
        let Some(provided) = entry.provided(contract) else {
            return;
        };

        if let Some(previous) = self.bindings.insert(contract, index) {
            if previous != index {
                event!(
                    Level::WARN,
                    message = "contract bound again, the latest binding wins",
                    contract = provided.contract.name,
                    previous = %self.entries[previous].name,
                    implementation = %entry.name,
                );
            }
        } else {
            event!(
                Level::DEBUG,
                message = "bound contract",
                contract = provided.contract.name,
                implementation = %entry.name,
            );
        }
    }

    /// Binds every provided but unbound contract to the implementation its name points at.
    ///
    /// Returns how many contracts were bound.
    pub(crate) fn apply_conventions(&mut self) -> usize {
        let mut unbound: Vec<&'static TypeInfo> = Vec::new();
        for entry in &self.entries {
            for provided in &entry.provides {
                let contract = provided.contract;
                if !self.bindings.contains_key(&contract.type_id()) && !unbound.contains(&contract) {
                    unbound.push(contract);
                }
            }
        }

        let mut bound = 0;
        for contract in unbound {
            if let Some(index) = self.locate_by_name(contract) {
                self.bind(contract.type_id(), index);
                bound += 1;
            } else {
                event!(Level::DEBUG, message = "no implementation matches by name", contract = contract.name);
            }
        }

        bound
    }

    fn locate_by_name(&self, contract: &'static TypeInfo) -> Option<usize> {
        for candidate in naming::candidates(contract.name) {
            for (index, entry) in self.entries.iter().enumerate() {
                if entry.name != candidate.as_str() {
                    continue;
                }

                if entry.provides(contract.type_id()) {
                    return Some(index);
                }

                event!(
                    Level::WARN,
                    message = "implementation matches contract by name but does not provide it",
                    contract = contract.name,
                    implementation = %entry.name,
                );
            }
        }

        None
    }

    /// The implementation bound to `contract`, with the way to view it as that contract.
    pub(crate) fn binding(&self, contract: TypeId) -> Option<(&ImplementationEntry, &Provided)> {
        let entry = &self.entries[*self.bindings.get(&contract)?];
        entry.provided(contract).map(|provided| (entry, provided))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
