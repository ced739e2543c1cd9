// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{Level, event};

use crate::callback::{PendingCallback, ResolvedGraph};
use crate::composite::{Composite, constituent_slots};
use crate::context::ResolutionContext;
use crate::contract::{Contract, Instance, MixinInfo, TypeInfo, Upcast};
use crate::error::{Error, Result};
use crate::implementation::{BuildFailure, Implementation, ImplementationEntry, Provided};
use crate::options::ResolverOptions;
use crate::redirect::RedirectChain;
use crate::registry::Registry;
use crate::store::{AnyArc, SingletonStore, StoreKey};

/// Collects implementations and bindings for a [`Resolver`].
///
/// Created by [`Resolver::builder`].
pub struct ResolverBuilder {
    options: ResolverOptions,
    entries: Vec<ImplementationEntry>,
    explicit: Vec<(TypeId, usize)>,
}

impl ResolverBuilder {
    /// Replaces the options the resolver is built with.
    #[must_use]
    pub fn options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers `implementation` and binds contract `C` to it, together with every other
    /// contract the implementation [`provides`][Implementation::provides].
    ///
    /// Binding a contract that is already bound replaces the earlier binding.
    #[must_use]
    pub fn bind<C, T>(mut self, implementation: Implementation<T>) -> Self
    where
        C: ?Sized + Upcast<T>,
        T: Send + Sync + 'static,
    {
        let entry = implementation.provides::<C>().into_entry();
        let index = self.entries.len();
        let primary = C::info().type_id();

        self.explicit.extend(
            entry
                .provides
                .iter()
                .map(|provided| provided.contract.type_id())
                .filter(|&contract| contract != primary)
                .map(|contract| (contract, index)),
        );
        self.explicit.push((primary, index));
        self.entries.push(entry);
        self
    }

    /// Adds `implementation` to the catalog without binding it.
    ///
    /// Its provided contracts are bound by the naming conventions when
    /// [`ResolverOptions::conventions`] is enabled.
    #[must_use]
    pub fn register<T>(mut self, implementation: Implementation<T>) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.entries.push(implementation.into_entry());
        self
    }

    /// Builds the resolver, applying the naming conventions if enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateImplementation`] if the same implementation type was registered
    /// twice.
    pub fn build(self) -> Result<Resolver> {
        let mut registry = Registry::new(self.entries, &self.explicit)?;

        let by_convention = if self.options.uses_conventions() {
            registry.apply_conventions()
        } else {
            0
        };

        event!(
            Level::DEBUG,
            message = "resolver built",
            implementations = registry.len(),
            by_convention,
        );

        Ok(Resolver {
            registry,
            options: self.options,
            store: ReentrantMutex::new(RefCell::new(SingletonStore::default())),
        })
    }
}

impl fmt::Debug for ResolverBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverBuilder")
            .field("options", &self.options)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

/// Resolves contracts to process-lifetime singletons.
///
/// A resolver owns a catalog of implementations and a singleton store. Resolving a contract
/// returns the instance already in the store or builds it: redirect annotations are followed,
/// the bound implementation is constructed with its richest constructor after resolving every
/// parameter, and mixin contracts without a binding are synthesized as a [`Composite`] over
/// their constituents. Every instance is registered under its contract and returned unchanged by
/// later calls.
///
/// # Thread safety
///
/// The store is guarded by one lock held for the whole of an outermost resolve call, so
/// concurrent first requests construct each contract at most once. Unrelated concurrent
/// requests are serialized.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use mixin_resolver::{Implementation, Mixin, Resolver, contract};
///
/// #[contract]
/// pub trait Greeter {
///     fn greet(&self) -> String;
/// }
///
/// #[contract]
/// pub trait Counter {
///     fn count(&self) -> usize;
/// }
///
/// #[contract]
/// pub trait Toolkit: Mixin + Greeter + Counter {}
///
/// #[derive(Default)]
/// pub struct GreeterCore;
///
/// impl Greeter for GreeterCore {
///     fn greet(&self) -> String {
///         "hello".to_string()
///     }
/// }
///
/// #[derive(Default)]
/// pub struct CounterCore;
///
/// impl Counter for CounterCore {
///     fn count(&self) -> usize {
///         3
///     }
/// }
///
/// let resolver = Resolver::builder()
///     .bind::<dyn Greeter, _>(Implementation::<GreeterCore>::new().default_constructor())
///     .bind::<dyn Counter, _>(Implementation::<CounterCore>::new().default_constructor())
///     .build()?;
///
/// let toolkit = resolver.resolve::<dyn Toolkit>()?;
/// assert_eq!(toolkit.greet(), "hello");
/// assert_eq!(toolkit.count(), 3);
///
/// let greeter = resolver.resolve::<dyn Greeter>()?;
/// assert!(Arc::ptr_eq(&greeter, &resolver.resolve::<dyn Greeter>()?));
/// # Ok::<(), mixin_resolver::Error>(())
/// ```
pub struct Resolver {
    registry: Registry,
    options: ResolverOptions,
    store: ReentrantMutex<RefCell<SingletonStore>>,
}

impl Resolver {
    /// Starts configuring a resolver.
    #[must_use]
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder {
            options: ResolverOptions::default(),
            entries: Vec::new(),
            explicit: Vec::new(),
        }
    }

    /// The options this resolver was built with.
    #[must_use]
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolves contract `C`.
    ///
    /// # Errors
    ///
    /// Fails when the contract or anything it transitively depends on cannot be resolved. No
    /// state created by the failed call is kept.
    pub fn resolve<C>(&self) -> Result<Arc<C>>
    where
        C: ?Sized + Contract,
    {
        self.resolve_dyn(C::info())?.expect_contract::<C>()
    }

    /// Resolves the contract described by `contract`.
    ///
    /// # Errors
    ///
    /// Fails when the contract or anything it transitively depends on cannot be resolved, or
    /// with [`Error::ReentrantResolve`] when called from a constructor or callback that this
    /// resolver is currently running.
    pub fn resolve_dyn(&self, contract: &'static TypeInfo) -> Result<Instance> {
        let guard = self.store.lock();
        let Ok(mut store) = guard.try_borrow_mut() else {
            return Err(Error::ReentrantResolve { contract: contract.name });
        };

        let mut context = ResolutionContext::new(contract);

        match self.resolve_in(&mut context, &mut store, contract) {
            Ok(instance) => {
                let callbacks = context.take_callbacks();
                if !callbacks.is_empty() {
                    let graph = ResolvedGraph::new(context.requested(), &instance, &store);
                    for callback in callbacks {
                        event!(
                            Level::TRACE,
                            message = "graph resolved callback",
                            implementation = %callback.implementation,
                        );
                        callback.target.graph_resolved(&graph);
                    }
                }

                Ok(instance)
            }
            Err(error) => {
                let discarded = context.rollback(&mut store);
                event!(
                    Level::DEBUG,
                    message = "resolution failed",
                    contract = contract.name,
                    discarded,
                    error = %error,
                );
                Err(error)
            }
        }
    }

    /// Returns the instance already resolved for `C` without resolving anything.
    ///
    /// Returns `None` while a resolution is running on the current thread.
    #[must_use]
    pub fn try_get<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Contract,
    {
        let guard = self.store.lock();
        let store = guard.try_borrow().ok()?;
        store.get(C::info().type_id()).and_then(Instance::downcast::<C>)
    }

    /// Whether an instance is registered for `contract`.
    #[must_use]
    pub fn is_resolved(&self, contract: &TypeInfo) -> bool {
        let guard = self.store.lock();
        guard.try_borrow().is_ok_and(|store| store.get(contract.type_id()).is_some())
    }

    /// The number of contracts with a registered instance, redirect aliases included.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        let guard = self.store.lock();
        guard.try_borrow().map_or(0, |store| store.len())
    }

    fn resolve_in(&self, context: &mut ResolutionContext, store: &mut SingletonStore, contract: &'static TypeInfo) -> Result<Instance> {
        let id = contract.type_id();

        if let Some(existing) = store.get(id) {
            event!(Level::TRACE, message = "store hit", contract = contract.name);
            return Ok(existing.clone());
        }

        contract.validate()?;

        if context.is_in_flight(id) {
            return Err(Error::CyclicDependency {
                chain: context.cycle(contract),
            });
        }

        context.enter(contract);
        let located = self.locate(context, store, contract);
        context.exit();

        let (instance, inserted) = store.insert(id, located?);
        if inserted {
            context.record(StoreKey::Contract(id));
            event!(
                Level::DEBUG,
                message = "resolved contract",
                contract = contract.name,
                depth = context.depth(),
            );
        }

        Ok(instance)
    }

    fn locate(&self, context: &mut ResolutionContext, store: &mut SingletonStore, contract: &'static TypeInfo) -> Result<Instance> {
        if contract.redirect.is_some() {
            return self.follow_redirect(context, store, contract);
        }

        if let Some((entry, provided)) = self.registry.binding(contract.type_id()) {
            return self.construct(context, store, entry, provided);
        }

        if let Some(mixin) = contract.mixin {
            return self.synthesize(context, store, contract, mixin);
        }

        Err(Error::Unresolvable { contract: contract.name })
    }

    fn follow_redirect(&self, context: &mut ResolutionContext, store: &mut SingletonStore, contract: &'static TypeInfo) -> Result<Instance> {
        let chain = RedirectChain::follow(contract)?;

        event!(
            Level::DEBUG,
            message = "following redirect",
            contract = contract.name,
            target = chain.terminal().name,
        );

        let terminal = self.resolve_in(context, store, chain.terminal())?;

        chain.alias(terminal, |link, alias| register_alias(context, store, link, alias))
    }

    fn construct(
        &self,
        context: &mut ResolutionContext,
        store: &mut SingletonStore,
        entry: &ImplementationEntry,
        provided: &Provided,
    ) -> Result<Instance> {
        let concrete = match store.get_concrete(entry.type_id) {
            Some(existing) => {
                event!(Level::TRACE, message = "implementation already constructed", implementation = %entry.name);
                Arc::clone(existing)
            }
            None => self.instantiate(context, store, entry)?,
        };

        (provided.upcast)(&concrete).ok_or_else(|| Error::TypeMismatch {
            name: provided.contract.name.to_string(),
        })
    }

    fn instantiate(&self, context: &mut ResolutionContext, store: &mut SingletonStore, entry: &ImplementationEntry) -> Result<AnyArc> {
        let constructor = entry.select_constructor(self.options.selection())?;

        let parameters = constructor.parameters();
        let mut instances = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            instances.push(self.resolve_in(context, store, parameter)?);
        }

        let value = constructor.build(instances).map_err(|failure| match failure {
            BuildFailure::Resolution(error) => error,
            BuildFailure::Constructor(cause) => Error::Construction {
                implementation: entry.name.to_string(),
                cause,
            },
        })?;

        if store.insert_concrete(entry.type_id, Arc::clone(&value)) {
            context.record(StoreKey::Concrete(entry.type_id));
        }

        if let Some(target) = entry.graph_resolved.and_then(|hook| hook(&value)) {
            context.queue(PendingCallback {
                implementation: entry.name.to_string(),
                target,
            });
        }

        event!(Level::DEBUG, message = "constructed implementation", implementation = %entry.name);

        Ok(value)
    }

    fn synthesize(
        &self,
        context: &mut ResolutionContext,
        store: &mut SingletonStore,
        contract: &'static TypeInfo,
        mixin: MixinInfo,
    ) -> Result<Instance> {
        let (composite, redirected) = self.compose(context, store, contract)?;
        let instance = (mixin.upcast)(Arc::new(composite));

        // Constituents redirecting to this mixin resolve to the composite itself.
        for chain in redirected {
            chain.alias(instance.clone(), |link, alias| register_alias(context, store, link, alias))?;
        }

        Ok(instance)
    }

    /// Resolves a backing for every constituent of `contract` and builds the composite.
    ///
    /// A constituent whose redirect chain ends at `contract` is constructed from its binding
    /// rather than redirected; its chain is returned so the caller can alias it to the
    /// finished composite.
    fn compose(
        &self,
        context: &mut ResolutionContext,
        store: &mut SingletonStore,
        contract: &'static TypeInfo,
    ) -> Result<(Composite, Vec<RedirectChain>)> {
        let slots = constituent_slots(contract)?;

        let mut backings = Vec::with_capacity(slots.len());
        let mut redirected = Vec::new();

        for slot in slots {
            let instance = match redirect_into(slot, contract)? {
                Some(chain) => {
                    context.enter(slot);
                    let instance = self.construct_bound(context, store, slot);
                    context.exit();
                    redirected.push(chain);
                    instance?
                }
                None => self.resolve_in(context, store, slot)?,
            };

            backings.push((slot, instance));
        }

        let composite = Composite::new(contract, backings);

        event!(
            Level::DEBUG,
            message = "synthesized composite",
            contract = contract.name,
            constituents = composite.constituents().count(),
            backings = composite.backing_count(),
        );

        Ok((composite, redirected))
    }

    fn construct_bound(&self, context: &mut ResolutionContext, store: &mut SingletonStore, contract: &'static TypeInfo) -> Result<Instance> {
        match self.registry.binding(contract.type_id()) {
            Some((entry, provided)) => self.construct(context, store, entry, provided),
            None => Err(Error::Unresolvable { contract: contract.name }),
        }
    }
}

/// The redirect chain of `constituent` when it leads back to the mixin being composed.
fn redirect_into(constituent: &'static TypeInfo, mixin: &'static TypeInfo) -> Result<Option<RedirectChain>> {
    if constituent.redirect.is_none() {
        return Ok(None);
    }

    let chain = RedirectChain::follow(constituent)?;
    Ok((chain.terminal().type_id() == mixin.type_id()).then_some(chain))
}

fn register_alias(context: &mut ResolutionContext, store: &mut SingletonStore, link: &'static TypeInfo, alias: Instance) -> Instance {
    let id = link.type_id();
    let (registered, inserted) = store.insert(id, alias);
    if inserted {
        context.record(StoreKey::Contract(id));
    }
    registered
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("options", &self.options)
            .field("implementations", &self.registry.len())
            .field("resolved", &self.resolved_count())
            .finish()
    }
}
