// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;

use crate::contract::{Contract, Instance, TypeInfo};
use crate::error::Result;

/// The synthesized implementation of a mixin contract.
///
/// A composite answers to every constituent contract that declares operations by forwarding
/// each operation to the object resolved for that constituent. The forwarding impls are
/// generated by [`contract`][crate::contract]; the resolver fills in the backing objects.
///
/// Backing objects are shared: each one is also registered under its own contract and
/// resolving that contract directly yields the same object. When several constituents resolve
/// to the same object, that object fills a single backing and every such constituent maps to
/// it.
pub struct Composite {
    contract: &'static TypeInfo,
    backings: Vec<Instance>,
    slots: Vec<Slot>,
}

/// A constituent contract, the backing it maps to and the backing viewed as that contract.
struct Slot {
    contract: &'static TypeInfo,
    backing: usize,
    view: Instance,
}

impl Composite {
    pub(crate) fn new(contract: &'static TypeInfo, resolved: Vec<(&'static TypeInfo, Instance)>) -> Self {
        let mut backings: Vec<Instance> = Vec::with_capacity(resolved.len());
        let mut slots = Vec::with_capacity(resolved.len());

        for (constituent, view) in resolved {
            let backing = match backings.iter().position(|existing| existing.ptr_eq(&view)) {
                Some(index) => index,
                None => {
                    backings.push(view.clone());
                    backings.len() - 1
                }
            };

            slots.push(Slot {
                contract: constituent,
                backing,
                view,
            });
        }

        Self { contract, backings, slots }
    }

    /// The mixin contract this composite was synthesized for.
    #[must_use]
    pub fn contract(&self) -> &'static TypeInfo {
        self.contract
    }

    /// The constituent contracts that forward to a backing, in slot order.
    pub fn constituents(&self) -> impl Iterator<Item = &'static TypeInfo> + '_ {
        self.slots.iter().map(|slot| slot.contract)
    }

    /// The number of distinct backing objects.
    #[must_use]
    pub fn backing_count(&self) -> usize {
        self.backings.len()
    }

    /// Whether constituents `a` and `b` forward to the same backing object.
    #[must_use]
    pub fn shares_backing(&self, a: &TypeInfo, b: &TypeInfo) -> bool {
        match (self.slot(a.type_id()), self.slot(b.type_id())) {
            (Some(a), Some(b)) => a.backing == b.backing,
            _ => false,
        }
    }

    /// The backing for constituent contract `C`.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not a constituent of this composite. Composites are only ever
    /// exposed through their mixin contract, whose constituents all have a backing.
    #[must_use]
    pub fn backing<C>(&self) -> &C
    where
        C: ?Sized + Contract,
    {
        let Some(backing) = self.slot(TypeId::of::<C>()).and_then(|slot| slot.view.downcast_ref::<C>()) else {
            missing_backing(self.contract.name, C::info().name)
        };

        backing
    }

    fn slot(&self, contract: TypeId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.contract.type_id() == contract)
    }
}

#[expect(clippy::panic, reason = "forwarding to a contract outside the composite is a bug in generated code")]
fn missing_backing(composite: &str, constituent: &str) -> ! {
    panic!("composite for `{composite}` has no backing for `{constituent}`")
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("contract", &self.contract.name)
            .field(
                "slots",
                &self.slots.iter().map(|slot| (slot.contract.name, slot.backing)).collect::<Vec<_>>(),
            )
            .field("backings", &self.backings.len())
            .finish()
    }
}

/// Collects the contracts a mixin needs a backing slot for.
///
/// Walks `extends` depth-first in declaration order, visiting each contract once. Contracts
/// that declare members get a slot; member-less ones (nested mixins, empty aggregates) are
/// only walked through.
///
/// # Errors
///
/// Fails if the mixin or any nested mixin declares members.
pub(crate) fn constituent_slots(mixin: &'static TypeInfo) -> Result<Vec<&'static TypeInfo>> {
    mixin.validate()?;

    let mut visited = HashSet::new();
    let mut slots = Vec::new();
    let mut stack: Vec<&'static TypeInfo> = mixin.extends().collect();
    stack.reverse();

    while let Some(info) = stack.pop() {
        if !visited.insert(info.type_id()) {
            continue;
        }

        info.validate()?;

        if info.has_members() {
            slots.push(info);
        }

        let parents = stack.len();
        stack.extend(info.extends());
        stack[parents..].reverse();
    }

    Ok(slots)
}
