use mixin_resolver::{Contract, Upcast, contract};

#[contract]
pub trait Explicit: Send + Sync + 'static {
    fn id(&self) -> u64;
}

#[contract]
pub trait Derived: Explicit {
    fn parent_id(&self) -> u64 {
        self.id()
    }
}

pub struct Both;

impl Explicit for Both {
    fn id(&self) -> u64 {
        1
    }
}

impl Derived for Both {}

fn assert_thread_safe<T: ?Sized + Send + Sync>() {}

fn assert_upcast<C: ?Sized + Upcast<Both>>() {}

fn main() {
    assert_thread_safe::<dyn Explicit>();
    assert_thread_safe::<dyn Derived>();
    assert_upcast::<dyn Explicit>();
    assert_upcast::<dyn Derived>();

    let info = <dyn Derived as Contract>::info();
    assert_eq!(info.members, ["parent_id"]);
    let parents: Vec<_> = info.extends().map(|parent| parent.path()).collect();
    assert_eq!(parents.len(), 1);
    assert!(parents[0].ends_with("::Explicit"));
}
