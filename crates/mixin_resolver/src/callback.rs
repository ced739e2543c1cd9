// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::sync::Arc;

use crate::contract::{Contract, Instance, TypeInfo};
use crate::store::SingletonStore;

/// Implemented by implementations that want to be told when the object graph they were
/// created for has settled.
///
/// Register interest with
/// [`Implementation::notify_graph_resolved`][crate::Implementation::notify_graph_resolved].
/// The hook fires once per created instance, after the outermost resolve call has built
/// everything, in creation order: dependencies are notified before the objects constructed
/// from them.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, OnceLock};
///
/// use mixin_resolver::{GraphResolved, Implementation, ResolvedGraph, Resolver, contract};
///
/// #[contract]
/// pub trait Session {
///     fn user(&self) -> String;
/// }
///
/// #[derive(Default)]
/// pub struct SessionCore {
///     requested: OnceLock<&'static str>,
/// }
///
/// impl Session for SessionCore {
///     fn user(&self) -> String {
///         "anonymous".to_string()
///     }
/// }
///
/// impl GraphResolved for SessionCore {
///     fn graph_resolved(&self, graph: &ResolvedGraph<'_>) {
///         let _ = self.requested.set(graph.requested().name);
///     }
/// }
///
/// let resolver = Resolver::builder()
///     .bind::<dyn Session, _>(Implementation::<SessionCore>::new().default_constructor().notify_graph_resolved())
///     .build()
///     .unwrap();
///
/// let session = resolver.resolve::<dyn Session>().unwrap();
/// assert_eq!(session.user(), "anonymous");
/// ```
pub trait GraphResolved: Send + Sync + 'static {
    /// Called once the graph for the original request has been fully resolved.
    fn graph_resolved(&self, graph: &ResolvedGraph<'_>);
}

/// The settled object graph handed to [`GraphResolved::graph_resolved`].
pub struct ResolvedGraph<'a> {
    requested: &'static TypeInfo,
    root: &'a Instance,
    store: &'a SingletonStore,
}

impl<'a> ResolvedGraph<'a> {
    pub(crate) fn new(requested: &'static TypeInfo, root: &'a Instance, store: &'a SingletonStore) -> Self {
        Self { requested, root, store }
    }

    /// The contract originally requested by the caller.
    #[must_use]
    pub fn requested(&self) -> &'static TypeInfo {
        self.requested
    }

    /// The object returned to the caller, viewed as `C`.
    ///
    /// This may be a synthesized composite when the request was redirected to a mixin. The
    /// view is found either on the returned handle itself or on the singleton registered for
    /// `C`, as long as that singleton is the same object.
    #[must_use]
    pub fn root<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Contract,
    {
        self.root.downcast::<C>().or_else(|| {
            self.store
                .get(C::info().type_id())
                .filter(|registered| registered.ptr_eq(self.root))
                .and_then(Instance::downcast::<C>)
        })
    }

    /// Any singleton already resolved for contract `C`.
    #[must_use]
    pub fn get<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Contract,
    {
        self.store.get(C::info().type_id()).and_then(Instance::downcast::<C>)
    }
}

impl fmt::Debug for ResolvedGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedGraph")
            .field("requested", &self.requested.name)
            .field("root", self.root)
            .finish_non_exhaustive()
    }
}

/// A created instance waiting for its graph-resolved callback.
pub(crate) struct PendingCallback {
    pub(crate) implementation: String,
    pub(crate) target: Arc<dyn GraphResolved>,
}

impl fmt::Debug for PendingCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCallback")
            .field("implementation", &self.implementation)
            .finish_non_exhaustive()
    }
}
