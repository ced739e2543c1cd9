// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resolutions that fail, and what the resolver keeps afterwards.

use std::any::TypeId;
use std::error::Error as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use mixin_resolver::{BoxError, Composite, Contract, Error, Implementation, Instance, Mixin, MixinInfo, Resolver, TypeInfo, TypeKind, contract};

#[contract]
trait Ping {
    fn ping(&self) -> u32;
}

#[contract]
trait Pong {
    fn pong(&self) -> u32;
}

struct PingCore {
    _pong: Arc<dyn Pong>,
}

impl Ping for PingCore {
    fn ping(&self) -> u32 {
        1
    }
}

struct PongCore {
    _ping: Arc<dyn Ping>,
}

impl Pong for PongCore {
    fn pong(&self) -> u32 {
        2
    }
}

#[test]
fn cyclic_dependency_names_the_cycle() {
    let resolver = Resolver::builder()
        .bind::<dyn Ping, _>(Implementation::new().constructor(|(pong,): (Arc<dyn Pong>,)| PingCore { _pong: pong }))
        .bind::<dyn Pong, _>(Implementation::new().constructor(|(ping,): (Arc<dyn Ping>,)| PongCore { _ping: ping }))
        .build()
        .unwrap();

    let Err(error) = resolver.resolve::<dyn Ping>() else {
        panic!("a cycle must not resolve");
    };

    assert_eq!(
        error.to_string(),
        "cyclic dependency: dyn failures::Ping -> dyn failures::Pong -> dyn failures::Ping"
    );
    assert_eq!(resolver.resolved_count(), 0);
}

struct Bare;

impl Ping for Bare {
    fn ping(&self) -> u32 {
        0
    }
}

#[test]
fn implementation_without_constructor() {
    let resolver = Resolver::builder()
        .bind::<dyn Ping, _>(Implementation::<Bare>::new())
        .build()
        .unwrap();

    let Err(error) = resolver.resolve::<dyn Ping>() else {
        panic!("nothing can construct `Bare`");
    };

    assert!(matches!(error, Error::NoConstructor { ref implementation } if implementation == "failures::Bare"));
}

#[contract]
trait Disk {
    fn free(&self) -> u64;
}

#[contract]
trait Volume {
    fn label(&self) -> String;
}

struct DiskCore;

impl Disk for DiskCore {
    fn free(&self) -> u64 {
        0
    }
}

struct VolumeCore;

impl Volume for VolumeCore {
    fn label(&self) -> String {
        "data".to_string()
    }
}

#[test]
fn failed_constructor_discards_its_dependencies() {
    let disks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&disks);

    let resolver = Resolver::builder()
        .bind::<dyn Disk, _>(Implementation::new().constructor(move |()| {
            counter.fetch_add(1, Ordering::SeqCst);
            DiskCore
        }))
        .bind::<dyn Volume, _>(Implementation::<VolumeCore>::new().try_constructor(|(disk,): (Arc<dyn Disk>,)| {
            if disk.free() == 0 {
                Err("disk full")
            } else {
                Ok(VolumeCore)
            }
        }))
        .build()
        .unwrap();

    let Err(error) = resolver.resolve::<dyn Volume>() else {
        panic!("the volume constructor fails");
    };

    assert!(matches!(error, Error::Construction { ref implementation, .. } if implementation == "failures::VolumeCore"));
    assert_eq!(error.source().map(ToString::to_string).as_deref(), Some("disk full"));
    assert!(!resolver.is_resolved(<dyn Disk as Contract>::info()));

    let _ = resolver.resolve::<dyn Volume>();
    assert_eq!(disks.load(Ordering::SeqCst), 2);

    let disk = resolver.resolve::<dyn Disk>().unwrap();
    assert_eq!(disk.free(), 0);
    assert_eq!(disks.load(Ordering::SeqCst), 3);
}

trait Broken: Send + Sync {}

impl Broken for Composite {}

fn never(_: Arc<Composite>) -> Instance {
    unreachable!("a mixin with members is never synthesized")
}

impl Contract for dyn Broken {
    fn info() -> &'static TypeInfo {
        static INFO: TypeInfo = TypeInfo {
            id: TypeId::of::<dyn Broken>,
            name: "dyn failures::Broken",
            kind: TypeKind::Contract,
            members: &["run"],
            extends: &[],
            mixin: Some(MixinInfo { upcast: never }),
            redirect: None,
        };
        &INFO
    }
}

#[contract]
trait Harness: Mixin + Broken {}

#[test]
fn mixin_with_members_is_invalid() {
    let resolver = Resolver::builder().build().unwrap();

    let Err(error) = resolver.resolve::<dyn Broken>() else {
        panic!("a mixin with members must not resolve");
    };

    assert!(matches!(error, Error::InvalidComposite { contract: "dyn failures::Broken", members: ["run"] }));
}

#[test]
fn nested_invalid_mixin_fails_the_outer_one() {
    let resolver = Resolver::builder().build().unwrap();

    let Err(error) = resolver.resolve::<dyn Harness>() else {
        panic!("a mixin extending an invalid mixin must not resolve");
    };

    assert!(error.to_string().contains("is a pure aggregate and cannot have members"));
    assert_eq!(resolver.resolved_count(), 0);
}

#[contract]
trait Outer {}

struct OuterCore;

impl Outer for OuterCore {}

static REENTRANT: OnceLock<Resolver> = OnceLock::new();

#[test]
fn constructor_cannot_resolve_through_its_own_resolver() {
    let resolver = Resolver::builder()
        .bind::<dyn Disk, _>(Implementation::new().constructor(|()| DiskCore))
        .bind::<dyn Outer, _>(Implementation::<OuterCore>::new().try_constructor(|()| -> Result<OuterCore, BoxError> {
            let resolver = REENTRANT.get().ok_or("resolver not installed")?;
            let _disk = resolver.resolve::<dyn Disk>()?;
            Ok(OuterCore)
        }))
        .build()
        .unwrap();

    assert!(REENTRANT.set(resolver).is_ok());
    let resolver = REENTRANT.get().unwrap();

    let Err(error) = resolver.resolve::<dyn Outer>() else {
        panic!("re-entrant resolution must fail");
    };

    let cause = error.source().and_then(|source| source.downcast_ref::<Error>());
    assert!(matches!(cause, Some(Error::ReentrantResolve { contract }) if contract.ends_with("failures::Disk")));

    // The resolver stays usable afterwards.
    assert_eq!(resolver.resolve::<dyn Disk>().unwrap().free(), 0);
}
