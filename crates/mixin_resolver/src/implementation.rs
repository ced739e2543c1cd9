// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{Level, event};

use crate::callback::GraphResolved;
use crate::contract::{Instance, TypeInfo, Upcast};
use crate::error::{BoxError, Error, Result};
use crate::options::ConstructorSelection;
use crate::resolve_deps::ResolutionDeps;
use crate::store::AnyArc;

/// A concrete type the resolver can construct, with its constructors and the contracts it
/// provides.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use mixin_resolver::{Implementation, Resolver, contract};
///
/// #[contract]
/// pub trait Clock {
///     fn now(&self) -> u64;
/// }
///
/// #[contract]
/// pub trait Scheduler {
///     fn next_run(&self) -> u64;
/// }
///
/// struct FixedClock;
///
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 {
///         100
///     }
/// }
///
/// struct SchedulerCore {
///     clock: Arc<dyn Clock>,
/// }
///
/// impl Scheduler for SchedulerCore {
///     fn next_run(&self) -> u64 {
///         self.clock.now() + 5
///     }
/// }
///
/// let resolver = Resolver::builder()
///     .bind::<dyn Clock, _>(Implementation::new().constructor(|()| FixedClock))
///     .bind::<dyn Scheduler, _>(
///         Implementation::new().constructor(|(clock,): (Arc<dyn Clock>,)| SchedulerCore { clock }),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(resolver.resolve::<dyn Scheduler>().unwrap().next_run(), 105);
/// ```
pub struct Implementation<T> {
    name: Cow<'static, str>,
    constructors: Vec<ErasedConstructor>,
    provides: Vec<Provided>,
    graph_resolved: Option<fn(&AnyArc) -> Option<Arc<dyn GraphResolved>>>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Implementation<T>
where
    T: Send + Sync + 'static,
{
    /// Starts describing `T`. Its name defaults to [`std::any::type_name`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: Cow::Borrowed(type_name::<T>()),
            constructors: Vec::new(),
            provides: Vec::new(),
            graph_resolved: None,
            _type: PhantomData,
        }
    }

    /// Overrides the name the naming conventions match against.
    #[must_use]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds an infallible constructor whose parameters are resolved as `D`.
    #[must_use]
    pub fn constructor<D, F>(mut self, constructor: F) -> Self
    where
        D: ResolutionDeps,
        F: Fn(D) -> T + Send + Sync + 'static,
    {
        self.constructors.push(ErasedConstructor {
            parameters: D::parameters,
            build: Box::new(move |instances: Vec<Instance>| -> std::result::Result<AnyArc, BuildFailure> {
                let deps = D::from_instances(instances).map_err(BuildFailure::Resolution)?;
                Ok(Arc::new(constructor(deps)) as AnyArc)
            }),
        });
        self
    }

    /// Adds a fallible constructor whose parameters are resolved as `D`.
    ///
    /// An error it returns fails the resolve call with [`Error::Construction`].
    #[must_use]
    pub fn try_constructor<D, F, E>(mut self, constructor: F) -> Self
    where
        D: ResolutionDeps,
        F: Fn(D) -> std::result::Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.constructors.push(ErasedConstructor {
            parameters: D::parameters,
            build: Box::new(move |instances: Vec<Instance>| -> std::result::Result<AnyArc, BuildFailure> {
                let deps = D::from_instances(instances).map_err(BuildFailure::Resolution)?;
                let value = constructor(deps).map_err(|e| BuildFailure::Constructor(e.into()))?;
                Ok(Arc::new(value) as AnyArc)
            }),
        });
        self
    }

    /// Adds a parameterless constructor that uses [`Default`].
    #[must_use]
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(|()| T::default())
    }

    /// Declares that `T` implements contract `C`.
    ///
    /// The resolver only binds `T` to contracts it provides, so a naming-convention match
    /// against a type that does not provide the contract is rejected.
    #[must_use]
    pub fn provides<C>(mut self) -> Self
    where
        C: ?Sized + Upcast<T>,
    {
        let contract = C::info();

        if !self.provides.iter().any(|p| p.contract.type_id() == contract.type_id()) {
            self.provides.push(Provided {
                contract,
                upcast: upcast_to::<T, C>,
            });
        }

        self
    }

    /// Requests a [`GraphResolved`] callback for every instance of `T` the resolver creates.
    #[must_use]
    pub fn notify_graph_resolved(mut self) -> Self
    where
        T: GraphResolved,
    {
        self.graph_resolved = Some(as_graph_resolved::<T>);
        self
    }

    /// The name the naming conventions match against.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_entry(self) -> ImplementationEntry {
        ImplementationEntry {
            name: self.name,
            type_id: TypeId::of::<T>(),
            constructors: self.constructors,
            provides: self.provides,
            graph_resolved: self.graph_resolved,
        }
    }
}

impl<T> Default for Implementation<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Implementation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("name", &self.name)
            .field("constructors", &self.constructors.len())
            .field("provides", &self.provides.iter().map(|p| p.contract.name).collect::<Vec<_>>())
            .field("graph_resolved", &self.graph_resolved.is_some())
            .finish()
    }
}

fn upcast_to<T, C>(value: &AnyArc) -> Option<Instance>
where
    T: Send + Sync + 'static,
    C: ?Sized + Upcast<T>,
{
    Arc::clone(value).downcast::<T>().ok().map(|concrete| Instance::new::<C>(C::upcast(concrete)))
}

fn as_graph_resolved<T>(value: &AnyArc) -> Option<Arc<dyn GraphResolved>>
where
    T: GraphResolved,
{
    Arc::clone(value).downcast::<T>().ok().map(|concrete| concrete as Arc<dyn GraphResolved>)
}

/// Why a constructor did not produce a value.
#[derive(Debug)]
pub(crate) enum BuildFailure {
    Resolution(Error),
    Constructor(BoxError),
}

type BuildFn = Box<dyn Fn(Vec<Instance>) -> std::result::Result<AnyArc, BuildFailure> + Send + Sync>;

pub(crate) struct ErasedConstructor {
    parameters: fn() -> Vec<&'static TypeInfo>,
    build: BuildFn,
}

impl ErasedConstructor {
    pub(crate) fn parameters(&self) -> Vec<&'static TypeInfo> {
        (self.parameters)()
    }

    pub(crate) fn build(&self, instances: Vec<Instance>) -> std::result::Result<AnyArc, BuildFailure> {
        (self.build)(instances)
    }
}

pub(crate) struct Provided {
    pub(crate) contract: &'static TypeInfo,
    pub(crate) upcast: fn(&AnyArc) -> Option<Instance>,
}

/// An [`Implementation`] with its type erased, as stored in the registry.
pub(crate) struct ImplementationEntry {
    pub(crate) name: Cow<'static, str>,
    pub(crate) type_id: TypeId,
    pub(crate) constructors: Vec<ErasedConstructor>,
    pub(crate) provides: Vec<Provided>,
    pub(crate) graph_resolved: Option<fn(&AnyArc) -> Option<Arc<dyn GraphResolved>>>,
}

impl ImplementationEntry {
    pub(crate) fn provided(&self, contract: TypeId) -> Option<&Provided> {
        self.provides.iter().find(|p| p.contract.type_id() == contract)
    }

    pub(crate) fn provides(&self, contract: TypeId) -> bool {
        self.provided(contract).is_some()
    }

    /// Picks the constructor with the most parameters.
    pub(crate) fn select_constructor(&self, selection: ConstructorSelection) -> Result<&ErasedConstructor> {
        let mut best: Option<(&ErasedConstructor, usize)> = None;
        let mut ties = 0;

        for constructor in &self.constructors {
            let arity = constructor.parameters().len();

            match best {
                Some((_, best_arity)) if arity < best_arity => {}
                Some((_, best_arity)) if arity == best_arity => ties += 1,
                _ => {
                    best = Some((constructor, arity));
                    ties = 1;
                }
            }
        }

        let Some((constructor, arity)) = best else {
            return Err(Error::NoConstructor {
                implementation: self.name.to_string(),
            });
        };

        if ties > 1 {
            if selection == ConstructorSelection::Strict {
                return Err(Error::AmbiguousConstructor {
                    implementation: self.name.to_string(),
                    count: ties,
                    arity,
                });
            }

            event!(
                Level::WARN,
                message = "several constructors share the highest arity, using the first registered",
                implementation = %self.name,
                count = ties,
                arity,
            );
        }

        Ok(constructor)
    }
}

impl fmt::Debug for ImplementationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplementationEntry")
            .field("name", &self.name)
            .field("constructors", &self.constructors.len())
            .field("provides", &self.provides.iter().map(|p| p.contract.name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
