// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::TypeId;

use crate::callback::PendingCallback;
use crate::contract::TypeInfo;
use crate::store::{SingletonStore, StoreKey};

/// State of one outermost resolve call.
///
/// Created when a call enters the resolver at depth zero and dropped when it returns. Nothing
/// in here is shared with other calls, concurrent or not.
#[derive(Debug)]
pub(crate) struct ResolutionContext {
    requested: &'static TypeInfo,
    in_flight: Vec<&'static TypeInfo>,
    pending: Vec<PendingCallback>,
    inserted: Vec<StoreKey>,
}

impl ResolutionContext {
    pub(crate) fn new(requested: &'static TypeInfo) -> Self {
        Self {
            requested,
            in_flight: Vec::new(),
            pending: Vec::new(),
            inserted: Vec::new(),
        }
    }

    /// The contract the caller asked for.
    pub(crate) fn requested(&self) -> &'static TypeInfo {
        self.requested
    }

    /// How many resolutions are currently nested inside each other.
    pub(crate) fn depth(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn is_in_flight(&self, contract: TypeId) -> bool {
        self.in_flight.iter().any(|info| info.type_id() == contract)
    }

    /// The chain of in-flight resolutions that leads back to `contract`, ending with it.
    pub(crate) fn cycle(&self, contract: &'static TypeInfo) -> Vec<&'static str> {
        let start = self
            .in_flight
            .iter()
            .position(|info| info.type_id() == contract.type_id())
            .unwrap_or(0);

        self.in_flight[start..]
            .iter()
            .map(|info| info.name)
            .chain(std::iter::once(contract.name))
            .collect()
    }

    pub(crate) fn enter(&mut self, contract: &'static TypeInfo) {
        self.in_flight.push(contract);
    }

    pub(crate) fn exit(&mut self) {
        self.in_flight.pop();
    }

    /// Remembers a store entry created by this call so it can be discarded on failure.
    pub(crate) fn record(&mut self, key: StoreKey) {
        self.inserted.push(key);
    }

    pub(crate) fn queue(&mut self, callback: PendingCallback) {
        self.pending.push(callback);
    }

    /// Takes the queued callbacks in creation order.
    pub(crate) fn take_callbacks(&mut self) -> Vec<PendingCallback> {
        std::mem::take(&mut self.pending)
    }

    /// Removes every store entry this call created and drops its queued callbacks.
    pub(crate) fn rollback(&mut self, store: &mut SingletonStore) -> usize {
        self.pending.clear();

        let discarded = self.inserted.len();
        for key in self.inserted.drain(..).rev() {
            store.remove(key);
        }

        discarded
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::contract::{Contract, Instance, TypeKind};

    trait Ping: Send + Sync {}
    trait Pong: Send + Sync {}

    struct Ball;

    impl Ping for Ball {}
    impl Pong for Ball {}

    static PING: TypeInfo = TypeInfo {
        id: TypeId::of::<dyn Ping>,
        name: "dyn t::Ping",
        kind: TypeKind::Contract,
        members: &[],
        extends: &[],
        mixin: None,
        redirect: None,
    };

    static PONG: TypeInfo = TypeInfo {
        id: TypeId::of::<dyn Pong>,
        name: "dyn t::Pong",
        kind: TypeKind::Contract,
        members: &[],
        extends: &[],
        mixin: None,
        redirect: None,
    };

    impl Contract for dyn Ping {
        fn info() -> &'static TypeInfo {
            &PING
        }
    }

    #[test]
    fn cycle_starts_at_the_repeated_contract() {
        let mut context = ResolutionContext::new(&PONG);
        context.enter(&PONG);
        context.enter(&PING);

        assert_eq!(context.depth(), 2);
        assert!(context.is_in_flight(TypeId::of::<dyn Ping>()));
        assert_eq!(context.cycle(&PING), ["dyn t::Ping", "dyn t::Ping"]);
        assert_eq!(context.cycle(&PONG), ["dyn t::Pong", "dyn t::Ping", "dyn t::Pong"]);

        context.exit();
        context.exit();
        assert_eq!(context.depth(), 0);
        assert_eq!(context.requested().name, "dyn t::Pong");
    }

    #[test]
    fn rollback_discards_recorded_entries() {
        let mut store = SingletonStore::default();
        let mut context = ResolutionContext::new(&PING);

        let ping: Arc<dyn Ping> = Arc::new(Ball);
        let id = TypeId::of::<dyn Ping>();
        let (_, inserted) = store.insert(id, Instance::new(ping));
        assert!(inserted);
        context.record(StoreKey::Contract(id));

        assert_eq!(context.rollback(&mut store), 1);
        assert_eq!(store.len(), 0);
        assert!(context.take_callbacks().is_empty());
    }
}
