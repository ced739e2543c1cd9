// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Boxed error produced by a fallible constructor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Any error that may arise while building a [`Resolver`][crate::Resolver] or resolving a
/// contract through it.
///
/// Every variant describes a developer or configuration mistake. Nothing is retried: the
/// resolve call that observed the error fails and any state it created is discarded.
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No implementation is bound to the contract and the contract is not a mixin.
    #[error("no implementation located for contract `{contract}`")]
    Unresolvable {
        /// Fully qualified name of the contract.
        contract: &'static str,
    },

    /// A contract carrying the mixin marker declares operations of its own.
    #[error("contract `{contract}` is a mixin: it is a pure aggregate and cannot have members (declares {members:?})")]
    InvalidComposite {
        /// Fully qualified name of the contract.
        contract: &'static str,
        /// The operations the contract declares.
        members: &'static [&'static str],
    },

    /// A redirect annotation names a concrete type instead of a contract.
    #[error("redirect on `{annotated}` targets `{target}`, which is not a contract")]
    InvalidRedirectTarget {
        /// The type carrying the redirect annotation.
        annotated: &'static str,
        /// The concrete type the annotation names.
        target: &'static str,
    },

    /// Following redirect annotations revisited a type.
    #[error("cyclic redirect: {}", .chain.join(" -> "))]
    CyclicRedirect {
        /// Every type on the chain in the order it was followed, ending with the revisited one.
        chain: Vec<&'static str>,
    },

    /// The instance resolved for a redirect target could not be viewed as the annotated contract.
    #[error("instance resolved for `{target}` cannot be used as `{annotated}`")]
    IncompatibleRedirect {
        /// The type carrying the redirect annotation.
        annotated: &'static str,
        /// The redirect target.
        target: &'static str,
    },

    /// Constructing a contract's implementation transitively requires the contract itself.
    #[error("cyclic dependency: {}", .chain.join(" -> "))]
    CyclicDependency {
        /// The in-flight resolutions in order, ending with the contract requested again.
        chain: Vec<&'static str>,
    },

    /// The implementation has no constructor registered.
    #[error("cannot construct `{implementation}`: no constructor is registered")]
    NoConstructor {
        /// Name of the implementation.
        implementation: String,
    },

    /// Strict constructor selection found several richest constructors.
    #[error("cannot construct `{implementation}`: {count} constructors take {arity} parameters")]
    AmbiguousConstructor {
        /// Name of the implementation.
        implementation: String,
        /// How many constructors share the highest arity.
        count: usize,
        /// The highest arity.
        arity: usize,
    },

    /// A fallible constructor returned an error.
    #[error("constructor of `{implementation}` failed")]
    Construction {
        /// Name of the implementation.
        implementation: String,
        /// The constructor's error.
        #[source]
        cause: BoxError,
    },

    /// An instance did not have the type its metadata promised.
    #[error("instance registered for `{name}` has an unexpected type")]
    TypeMismatch {
        /// Name of the type the instance was expected to have.
        name: String,
    },

    /// The same implementation type was registered twice.
    #[error("implementation `{implementation}` is registered more than once")]
    DuplicateImplementation {
        /// Name of the implementation.
        implementation: String,
    },

    /// A constructor or graph callback called back into the resolver that is running it.
    #[error("`{contract}` was requested from inside a resolution running on the same resolver")]
    ReentrantResolve {
        /// Fully qualified name of the contract requested re-entrantly.
        contract: &'static str,
    },

    /// [`global::resolve`][crate::global::resolve] was called before a resolver was installed.
    #[error("no default resolver has been installed")]
    NoDefaultResolver,
}

/// A specialized `Result` for resolver operations.
pub type Result<T> = std::result::Result<T, Error>;
