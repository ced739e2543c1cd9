// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A process-wide default [`Resolver`] for code that cannot carry one around.
//!
//! Prefer owning a [`Resolver`] explicitly. The default instance exists for harness code such as
//! test fixtures that are created by a framework and have nowhere to receive a resolver from.
//!
//! ```
//! use mixin_resolver::{Implementation, Resolver, contract, global};
//!
//! #[contract]
//! pub trait Settings {
//!     fn region(&self) -> &'static str;
//! }
//!
//! #[derive(Default)]
//! pub struct SettingsCore;
//!
//! impl Settings for SettingsCore {
//!     fn region(&self) -> &'static str {
//!         "westus"
//!     }
//! }
//!
//! let resolver = Resolver::builder()
//!     .bind::<dyn Settings, _>(Implementation::<SettingsCore>::new().default_constructor())
//!     .build()?;
//!
//! global::install(resolver).expect("installed once");
//!
//! assert_eq!(global::resolve::<dyn Settings>()?.region(), "westus");
//! # Ok::<(), mixin_resolver::Error>(())
//! ```

use std::sync::{Arc, OnceLock};

use crate::contract::Contract;
use crate::error::{Error, Result};
use crate::resolver::Resolver;

static DEFAULT: OnceLock<Resolver> = OnceLock::new();

/// Installs the default resolver.
///
/// # Errors
///
/// Hands `resolver` back if a default resolver is already installed.
pub fn install(resolver: Resolver) -> std::result::Result<(), Resolver> {
    DEFAULT.set(resolver)
}

/// The default resolver, if one has been installed.
#[must_use]
pub fn resolver() -> Option<&'static Resolver> {
    DEFAULT.get()
}

/// Resolves `C` through the default resolver.
///
/// # Errors
///
/// Returns [`Error::NoDefaultResolver`] if no resolver has been installed, otherwise whatever
/// [`Resolver::resolve`] returns.
pub fn resolve<C>() -> Result<Arc<C>>
where
    C: ?Sized + Contract,
{
    resolver().ok_or(Error::NoDefaultResolver)?.resolve::<C>()
}
