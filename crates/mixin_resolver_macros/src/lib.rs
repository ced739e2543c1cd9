// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Procedural macros to support the [`mixin_resolver`](https://docs.rs/mixin_resolver) crate. See
//! `mixin_resolver` for more information.
//!
//! # Macros
//!
//! ## `#[contract]`
//!
//! Turns an object-safe trait into a contract the resolver can resolve.
//!
//! ```rust,ignore
//! #[contract]
//! pub trait Clock {
//!     fn now(&self) -> u64;
//! }
//!
//! #[contract]
//! pub trait Harness: Mixin + Clock {}
//!
//! #[contract(redirect = Primary)]
//! pub trait Storage {}
//! ```

use proc_macro::TokenStream;

/// Declares a resolvable contract.
///
/// Applied to an object-safe trait, the attribute:
///
/// - adds `Send + Sync` supertraits when they are missing
/// - implements `mixin_resolver::Contract` for `dyn Trait`, recording the trait's name, its
///   methods and the contracts it extends
/// - implements `mixin_resolver::Upcast<T>` for `dyn Trait` for every `T: Trait`
/// - implements the trait for `mixin_resolver::Composite` by forwarding every method to the
///   composite's backing instance for the trait
///
/// Every supertrait other than `Send`, `Sync`, `Sized` and `Mixin` must itself be a contract.
///
/// # Mixins
///
/// A trait extending `mixin_resolver::Mixin` is a pure aggregate. Declaring any item in it is a
/// compile error.
///
/// # Redirects
///
/// `#[contract(redirect = Target)]` makes resolving this contract resolve `Target` instead.
/// `Target` must be a contract that extends this one, so its instance can be returned as this
/// contract.
///
/// # Restrictions
///
/// Contracts cannot be generic or `unsafe` and may only declare methods. Methods must take
/// `&self` and cannot be `async` or have type parameters.
#[proc_macro_attribute]
#[cfg_attr(test, mutants::skip)]
pub fn contract(attr: TokenStream, item: TokenStream) -> TokenStream {
    mixin_resolver_macros_impl::contract(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
