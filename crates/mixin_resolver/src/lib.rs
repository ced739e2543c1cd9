// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resolves capability contracts to process-lifetime singletons and synthesizes mixins.
//!
//! # Summary
//!
//! A contract is an object-safe trait marked with [`#[contract]`][contract]. Implementations
//! are described with [`Implementation`] and handed to a [`ResolverBuilder`], either bound to a
//! contract explicitly or registered so naming conventions can bind them. Resolving a contract
//! builds its implementation once, resolving every constructor parameter first, and keeps the
//! instance for every later request.
//!
//! A contract that extends [`Mixin`] is a pure aggregate of other contracts. When nothing is
//! bound to it, the resolver synthesizes a [`Composite`] that answers to every constituent
//! contract by forwarding each operation to the instance resolved for that constituent.
//!
//! # Capabilities
//!
//! - **Singletons** - every contract resolves to the same instance for the life of the resolver
//! - **Mixins** - aggregates of contracts are satisfied without writing an implementation
//! - **Redirects** - `#[contract(redirect = Target)]` resolves another contract instead
//! - **Naming conventions** - `app::Clock` is bound to a registered `app::ClockCore`
//! - **Graph callbacks** - implementations can ask to hear when their graph has settled
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use mixin_resolver::{Implementation, Mixin, Resolver, contract};
//!
//! #[contract]
//! pub trait Basic {
//!     fn id(&self) -> u32;
//! }
//!
//! #[contract]
//! pub trait Audit {
//!     fn record(&self, line: &str) -> String;
//! }
//!
//! #[contract]
//! pub trait Harness: Mixin + Basic + Audit {}
//!
//! #[derive(Default)]
//! pub struct BasicCore;
//!
//! impl Basic for BasicCore {
//!     fn id(&self) -> u32 {
//!         7
//!     }
//! }
//!
//! pub struct AuditCore {
//!     basic: Arc<dyn Basic>,
//! }
//!
//! impl Audit for AuditCore {
//!     fn record(&self, line: &str) -> String {
//!         format!("[{}] {line}", self.basic.id())
//!     }
//! }
//!
//! let resolver = Resolver::builder()
//!     .bind::<dyn Basic, _>(Implementation::<BasicCore>::new().default_constructor())
//!     .bind::<dyn Audit, _>(Implementation::new().constructor(|(basic,): (Arc<dyn Basic>,)| AuditCore { basic }))
//!     .build()?;
//!
//! let harness = resolver.resolve::<dyn Harness>()?;
//! assert_eq!(harness.record("ready"), "[7] ready");
//! # Ok::<(), mixin_resolver::Error>(())
//! ```

extern crate self as mixin_resolver;

mod callback;
mod composite;
mod context;
mod contract;
mod error;
pub mod global;
mod implementation;
mod naming;
mod options;
mod redirect;
mod registry;
mod resolve_deps;
mod resolver;
mod store;

pub use callback::{GraphResolved, ResolvedGraph};
pub use composite::Composite;
pub use contract::{Contract, Instance, MixinInfo, RedirectInfo, TypeInfo, TypeKind, Upcast};
pub use error::{BoxError, Error, Result};
pub use implementation::Implementation;
#[cfg(feature = "macros")]
pub use mixin_resolver_macros::contract;
pub use options::{ConstructorSelection, ResolverOptions};
pub use resolve_deps::ResolutionDeps;
pub use resolver::{Resolver, ResolverBuilder};

/// Marks a contract as a mixin: a pure aggregate of the contracts it extends.
///
/// A mixin declares no operations of its own. When no implementation is bound to it, the
/// resolver synthesizes a [`Composite`] that forwards every operation to the instance resolved
/// for the constituent contract declaring it.
///
/// ```
/// use mixin_resolver::{Mixin, contract};
///
/// #[contract]
/// pub trait Reader {
///     fn read(&self) -> Vec<u8>;
/// }
///
/// #[contract]
/// pub trait Writer {
///     fn write(&self, bytes: &[u8]);
/// }
///
/// #[contract]
/// pub trait ReadWrite: Mixin + Reader + Writer {}
/// ```
pub trait Mixin {}

impl Mixin for Composite {}
