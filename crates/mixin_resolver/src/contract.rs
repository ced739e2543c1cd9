// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::composite::Composite;
use crate::error::{Error, Result};

/// Prefix that marks a [`TypeInfo`] name as a contract name.
pub(crate) const CONTRACT_MARKER: &str = "dyn ";

/// A capability contract: an object-safe trait, identified by its trait object type.
///
/// Implemented for `dyn Trait` by the [`contract`][crate::contract] attribute. Implement it by
/// hand only when the metadata cannot be generated, e.g. for contracts defined through
/// hand-written [`TypeInfo`] values in tests.
pub trait Contract: Send + Sync + 'static {
    /// Static metadata describing the contract.
    fn info() -> &'static TypeInfo;
}

/// Coerces an implementation into a contract it implements.
///
/// `#[contract]` implements `Upcast<T>` for `dyn Trait` for every `T: Trait`, which lets
/// generic registration code turn an `Arc<T>` into an `Arc<dyn Trait>` without knowing
/// the trait.
pub trait Upcast<T>: Contract {
    /// Views the implementation as the contract.
    fn upcast(implementation: Arc<T>) -> Arc<Self>;
}

/// Whether a [`TypeInfo`] describes a contract or a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// An abstract capability contract (a trait object type).
    Contract,

    /// A concrete implementation type.
    Concrete,
}

/// Present on contracts tagged with the [`Mixin`][crate::Mixin] marker.
#[derive(Clone, Copy)]
pub struct MixinInfo {
    /// Views a synthesized [`Composite`] as the mixin contract.
    pub upcast: fn(Arc<Composite>) -> Instance,
}

impl fmt::Debug for MixinInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinInfo").finish_non_exhaustive()
    }
}

/// A redirect annotation: resolving the annotated type resolves `target` instead.
#[derive(Clone, Copy)]
pub struct RedirectInfo {
    /// The contract to resolve instead.
    pub target: fn() -> &'static TypeInfo,

    /// Views the target's instance as the annotated contract.
    ///
    /// Returns `None` if the instance is not an instance of the target.
    pub upcast: fn(&Instance) -> Option<Instance>,
}

impl fmt::Debug for RedirectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectInfo")
            .field("target", &(self.target)().name)
            .finish_non_exhaustive()
    }
}

/// Static metadata about a resolvable type.
///
/// Values are normally generated by the [`contract`][crate::contract] attribute and live in
/// a `static`, which is why every field is public and every link to another type is a
/// function pointer.
pub struct TypeInfo {
    /// Returns the identity of the described type.
    pub id: fn() -> TypeId,

    /// Fully qualified name. Contract names start with `dyn `.
    pub name: &'static str,

    /// Whether this is a contract or a concrete type.
    pub kind: TypeKind,

    /// Names of the operations the type declares itself, excluding inherited ones.
    pub members: &'static [&'static str],

    /// The contracts this contract directly extends.
    pub extends: &'static [fn() -> &'static TypeInfo],

    /// Set when the contract carries the mixin marker.
    pub mixin: Option<MixinInfo>,

    /// Set when the type carries a redirect annotation.
    pub redirect: Option<RedirectInfo>,
}

impl TypeInfo {
    /// The identity of the described type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        (self.id)()
    }

    /// The name without the `dyn ` contract marker.
    #[must_use]
    pub fn path(&self) -> &'static str {
        self.name.strip_prefix(CONTRACT_MARKER).unwrap_or(self.name)
    }

    /// Whether the type is a contract.
    #[must_use]
    pub fn is_contract(&self) -> bool {
        self.kind == TypeKind::Contract
    }

    /// Whether the contract carries the mixin marker.
    #[must_use]
    pub fn is_mixin(&self) -> bool {
        self.mixin.is_some()
    }

    /// Whether the type declares operations of its own.
    #[must_use]
    pub fn has_members(&self) -> bool {
        !self.members.is_empty()
    }

    /// The contracts this contract directly extends, in declaration order.
    pub fn extends(&self) -> impl Iterator<Item = &'static TypeInfo> + '_ {
        self.extends.iter().map(|info| info())
    }

    /// Checks the contract-integrity invariant: a mixin must be a pure aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidComposite`] if the type is a mixin that declares members.
    pub fn validate(&self) -> Result<()> {
        if self.is_mixin() && self.has_members() {
            return Err(Error::InvalidComposite {
                contract: self.name,
                members: self.members,
            });
        }

        Ok(())
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("members", &self.members)
            .field("mixin", &self.is_mixin())
            .field("redirect", &self.redirect)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A type-erased, cheaply cloneable handle to a resolved `Arc<C>` for some contract `C`.
#[derive(Clone)]
pub struct Instance {
    contract: &'static str,
    address: usize,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// Wraps a resolved contract instance.
    #[must_use]
    pub fn new<C>(value: Arc<C>) -> Self
    where
        C: ?Sized + Contract,
    {
        Self {
            contract: C::info().name,
            address: Arc::as_ptr(&value).cast::<()>().addr(),
            value: Arc::new(value),
        }
    }

    /// Name of the contract this instance was created for.
    #[must_use]
    pub fn contract(&self) -> &'static str {
        self.contract
    }

    /// Returns the instance as `Arc<C>`, or `None` if it was created for another contract.
    #[must_use]
    pub fn downcast<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Contract,
    {
        self.downcast_ref::<C>().map(Arc::clone)
    }

    /// Borrows the instance as `Arc<C>`, or `None` if it was created for another contract.
    #[must_use]
    pub fn downcast_ref<C>(&self) -> Option<&Arc<C>>
    where
        C: ?Sized + Contract,
    {
        self.value.downcast_ref::<Arc<C>>()
    }

    /// Whether both handles point at the same underlying object, regardless of contract.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.address == other.address
    }

    pub(crate) fn expect_contract<C>(&self) -> Result<Arc<C>>
    where
        C: ?Sized + Contract,
    {
        self.downcast::<C>().ok_or_else(|| Error::TypeMismatch {
            name: C::info().name.to_string(),
        })
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("contract", &self.contract)
            .field("address", &format_args!("{:#x}", self.address))
            .finish()
    }
}
