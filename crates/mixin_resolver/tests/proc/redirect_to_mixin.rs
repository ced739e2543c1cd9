use std::sync::Arc;

use mixin_resolver::{Implementation, Mixin, Resolver, contract};

#[contract]
pub trait Metrics {
    fn count(&self) -> u64;
}

#[contract(redirect = Telemetry)]
pub trait Observability {}

#[contract]
pub trait Telemetry: Mixin + Observability + Metrics {}

#[derive(Default)]
pub struct MetricsCore;

impl Metrics for MetricsCore {
    fn count(&self) -> u64 {
        3
    }
}

fn main() {
    let resolver = Resolver::builder()
        .bind::<dyn Metrics, _>(Implementation::<MetricsCore>::new().default_constructor())
        .build()
        .unwrap();

    let observability = resolver.resolve::<dyn Observability>().unwrap();
    let telemetry = resolver.resolve::<dyn Telemetry>().unwrap();
    assert_eq!(telemetry.count(), 3);

    let telemetry: Arc<dyn Observability> = telemetry;
    assert!(Arc::ptr_eq(&observability, &telemetry));
}
