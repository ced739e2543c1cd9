use mixin_resolver::{Contract, Implementation, Mixin, Resolver, contract};

#[contract]
pub trait Reader {
    fn read(&self) -> u8;
}

#[contract]
pub trait Writer {
    fn write(&self, byte: u8) -> bool;
}

#[contract]
pub trait Channel: Mixin + Reader + Writer {}

#[contract]
pub trait Endpoint: Mixin + Channel {}

#[derive(Default)]
pub struct ReaderCore;

impl Reader for ReaderCore {
    fn read(&self) -> u8 {
        7
    }
}

#[derive(Default)]
pub struct WriterCore;

impl Writer for WriterCore {
    fn write(&self, byte: u8) -> bool {
        byte == 7
    }
}

fn main() {
    assert!(<dyn Endpoint as Contract>::info().is_mixin());
    assert!(<dyn Endpoint as Contract>::info().members.is_empty());

    let resolver = Resolver::builder()
        .bind::<dyn Reader, _>(Implementation::<ReaderCore>::new().default_constructor())
        .bind::<dyn Writer, _>(Implementation::<WriterCore>::new().default_constructor())
        .build()
        .unwrap();

    let endpoint = resolver.resolve::<dyn Endpoint>().unwrap();
    assert!(endpoint.write(endpoint.read()));
}
