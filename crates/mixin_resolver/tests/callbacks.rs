// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Graph-resolved callbacks.

use std::sync::Arc;

use mixin_resolver::{GraphResolved, Implementation, Mixin, ResolvedGraph, Resolver, contract};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Notification {
    implementation: &'static str,
    requested: &'static str,
    saw_child: bool,
}

type Log = Arc<Mutex<Vec<Notification>>>;

#[contract]
trait Child {
    fn name(&self) -> &'static str;
}

#[contract]
trait Parent {
    fn child(&self) -> Arc<dyn Child>;
}

#[contract]
trait Unnotified {
    fn quiet(&self) -> bool;
}

#[contract]
trait Kit: Mixin + Parent + Unnotified {}

struct ChildCore {
    log: Log,
}

impl Child for ChildCore {
    fn name(&self) -> &'static str {
        "child"
    }
}

impl GraphResolved for ChildCore {
    fn graph_resolved(&self, graph: &ResolvedGraph<'_>) {
        self.log.lock().push(Notification {
            implementation: "child",
            requested: graph.requested().name,
            saw_child: graph.get::<dyn Child>().is_some(),
        });
    }
}

struct ParentCore {
    log: Log,
    child: Arc<dyn Child>,
}

impl Parent for ParentCore {
    fn child(&self) -> Arc<dyn Child> {
        Arc::clone(&self.child)
    }
}

impl GraphResolved for ParentCore {
    fn graph_resolved(&self, graph: &ResolvedGraph<'_>) {
        self.log.lock().push(Notification {
            implementation: "parent",
            requested: graph.requested().name,
            saw_child: graph.get::<dyn Child>().is_some(),
        });
    }
}

#[derive(Default)]
struct UnnotifiedCore;

impl Unnotified for UnnotifiedCore {
    fn quiet(&self) -> bool {
        true
    }
}

fn resolver(log: &Log) -> Resolver {
    let child_log = Arc::clone(log);
    let parent_log = Arc::clone(log);

    Resolver::builder()
        .bind::<dyn Child, _>(
            Implementation::new()
                .constructor(move |()| ChildCore {
                    log: Arc::clone(&child_log),
                })
                .notify_graph_resolved(),
        )
        .bind::<dyn Parent, _>(
            Implementation::new()
                .constructor(move |(child,): (Arc<dyn Child>,)| ParentCore {
                    log: Arc::clone(&parent_log),
                    child,
                })
                .notify_graph_resolved(),
        )
        .bind::<dyn Unnotified, _>(Implementation::<UnnotifiedCore>::new().default_constructor())
        .build()
        .unwrap()
}

#[test]
fn dependencies_are_notified_first() {
    let log = Log::default();
    let resolver = resolver(&log);

    let parent = resolver.resolve::<dyn Parent>().unwrap();
    assert_eq!(parent.child().name(), "child");

    let notifications = log.lock().clone();
    assert_eq!(
        notifications,
        [
            Notification {
                implementation: "child",
                requested: "dyn callbacks::Parent",
                saw_child: true,
            },
            Notification {
                implementation: "parent",
                requested: "dyn callbacks::Parent",
                saw_child: true,
            },
        ]
    );
}

#[test]
fn callbacks_fire_once_per_instance() {
    let log = Log::default();
    let resolver = resolver(&log);

    let _ = resolver.resolve::<dyn Child>().unwrap();
    let _ = resolver.resolve::<dyn Parent>().unwrap();
    let _ = resolver.resolve::<dyn Parent>().unwrap();

    let notifications = log.lock().clone();
    let order: Vec<_> = notifications.iter().map(|n| (n.implementation, n.requested)).collect();
    assert_eq!(order, [("child", "dyn callbacks::Child"), ("parent", "dyn callbacks::Parent")]);
}

#[test]
fn composite_request_notifies_its_backings() {
    let log = Log::default();
    let resolver = resolver(&log);

    let kit = resolver.resolve::<dyn Kit>().unwrap();
    assert!(kit.quiet());

    let notifications = log.lock().clone();
    assert_eq!(notifications.len(), 2);
    assert!(notifications.iter().all(|n| n.requested == "dyn callbacks::Kit"));
}

struct RootWatcher {
    seen: Arc<Mutex<Option<bool>>>,
}

impl Child for RootWatcher {
    fn name(&self) -> &'static str {
        "watcher"
    }
}

impl GraphResolved for RootWatcher {
    fn graph_resolved(&self, graph: &ResolvedGraph<'_>) {
        let root_is_kit = graph.root::<dyn Kit>().is_some() && graph.root::<dyn Child>().is_none();
        *self.seen.lock() = Some(root_is_kit);
    }
}

#[test]
fn root_is_the_object_returned_to_the_caller() {
    let seen = Arc::new(Mutex::new(None));
    let watcher_seen = Arc::clone(&seen);
    let log = Log::default();
    let parent_log = Arc::clone(&log);

    let resolver = Resolver::builder()
        .bind::<dyn Child, _>(
            Implementation::new()
                .constructor(move |()| RootWatcher {
                    seen: Arc::clone(&watcher_seen),
                })
                .notify_graph_resolved(),
        )
        .bind::<dyn Parent, _>(Implementation::new().constructor(move |(child,): (Arc<dyn Child>,)| ParentCore {
            log: Arc::clone(&parent_log),
            child,
        }))
        .bind::<dyn Unnotified, _>(Implementation::<UnnotifiedCore>::new().default_constructor())
        .build()
        .unwrap();

    let _ = resolver.resolve::<dyn Kit>().unwrap();

    assert_eq!(*seen.lock(), Some(true));
    assert!(log.lock().is_empty());
}

#[contract(redirect = Tracker)]
trait TrackerCore {
    fn address(&self) -> usize;
}

#[contract]
trait Tracker: Mixin + TrackerCore + Unnotified {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RootView {
    as_tracker: Option<usize>,
    as_core: Option<usize>,
}

struct TrackerImpl {
    seen: Arc<Mutex<Option<RootView>>>,
}

impl TrackerCore for TrackerImpl {
    fn address(&self) -> usize {
        std::ptr::from_ref(self).addr()
    }
}

impl GraphResolved for TrackerImpl {
    fn graph_resolved(&self, graph: &ResolvedGraph<'_>) {
        *self.seen.lock() = Some(RootView {
            as_tracker: graph.root::<dyn Tracker>().map(|root| address_of(&root)),
            as_core: graph.root::<dyn TrackerCore>().map(|root| address_of(&root)),
        });
    }
}

fn address_of<C: ?Sized>(instance: &Arc<C>) -> usize {
    Arc::as_ptr(instance).cast::<()>().addr()
}

fn tracker_resolver(seen: &Arc<Mutex<Option<RootView>>>) -> Resolver {
    let seen = Arc::clone(seen);

    Resolver::builder()
        .bind::<dyn TrackerCore, _>(
            Implementation::new()
                .constructor(move |()| TrackerImpl { seen: Arc::clone(&seen) })
                .notify_graph_resolved(),
        )
        .bind::<dyn Unnotified, _>(Implementation::<UnnotifiedCore>::new().default_constructor())
        .build()
        .unwrap()
}

#[test]
fn redirected_core_sees_the_enclosing_mixin_as_root() {
    let seen = Arc::new(Mutex::new(None));
    let resolver = tracker_resolver(&seen);

    let tracker = resolver.resolve::<dyn Tracker>().unwrap();
    let composite = address_of(&tracker);

    let view = seen.lock().expect("core was notified");
    assert_eq!(view.as_tracker, Some(composite));
    assert_eq!(view.as_core, Some(composite));
    assert_ne!(tracker.address(), composite);
}

#[test]
fn requesting_the_core_roots_the_graph_at_the_composite() {
    let seen = Arc::new(Mutex::new(None));
    let resolver = tracker_resolver(&seen);

    let core = resolver.resolve::<dyn TrackerCore>().unwrap();
    let tracker = resolver.resolve::<dyn Tracker>().unwrap();
    let composite = address_of(&tracker);

    assert_eq!(address_of(&core), composite);

    let view = seen.lock().expect("core was notified");
    assert_eq!(view.as_core, Some(composite));
    assert_eq!(view.as_tracker, Some(composite));
    assert_ne!(core.address(), composite);
}
