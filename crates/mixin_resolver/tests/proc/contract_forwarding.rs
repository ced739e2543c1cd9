use std::sync::Arc;

use mixin_resolver::{Implementation, Mixin, Resolver, contract};

#[contract]
pub trait Formatter {
    fn format<'a>(&self, prefix: &'a str, value: u32) -> String;

    fn width(&self) -> usize {
        8
    }
}

#[contract]
pub trait Sink {
    fn write(&self, line: String, _flush: bool) -> usize;
}

#[contract]
pub trait Console: Mixin + Formatter + Sink {}

#[derive(Default)]
pub struct FormatterCore;

impl Formatter for FormatterCore {
    fn format<'a>(&self, prefix: &'a str, value: u32) -> String {
        format!("{prefix}{value}")
    }
}

#[derive(Default)]
pub struct SinkCore;

impl Sink for SinkCore {
    fn write(&self, line: String, _flush: bool) -> usize {
        line.len()
    }
}

fn main() {
    let resolver = Resolver::builder()
        .bind::<dyn Formatter, _>(Implementation::<FormatterCore>::new().default_constructor())
        .bind::<dyn Sink, _>(Implementation::<SinkCore>::new().default_constructor())
        .build()
        .unwrap();

    let console: Arc<dyn Console> = resolver.resolve::<dyn Console>().unwrap();
    let line = console.format("n=", 42);
    assert_eq!(console.write(line, true), 4);
    assert_eq!(console.width(), 8);
}
