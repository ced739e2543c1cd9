// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use crate::contract::{Contract, Instance, TypeInfo};
use crate::error::{Error, Result};

/// The parameter list of a constructor: a tuple of `Arc<dyn C>` where every `C` is a
/// [`Contract`].
///
/// Implemented for tuples of up to twelve contracts, including `()` for constructors without
/// dependencies.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use mixin_resolver::{ResolutionDeps, contract};
///
/// #[contract]
/// pub trait Clock {
///     fn now(&self) -> u64;
/// }
///
/// #[contract]
/// pub trait Journal {
///     fn len(&self) -> usize;
/// }
///
/// let parameters = <(Arc<dyn Clock>, Arc<dyn Journal>) as ResolutionDeps>::parameters();
/// assert_eq!(parameters.len(), 2);
/// ```
pub trait ResolutionDeps: Sized + 'static {
    /// The contracts to resolve, in parameter order.
    fn parameters() -> Vec<&'static TypeInfo>;

    /// Builds the parameter tuple from instances resolved for [`parameters`][Self::parameters].
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the instances do not match the parameters.
    fn from_instances(instances: Vec<Instance>) -> Result<Self>;
}

impl ResolutionDeps for () {
    fn parameters() -> Vec<&'static TypeInfo> {
        Vec::new()
    }

    fn from_instances(instances: Vec<Instance>) -> Result<Self> {
        if instances.is_empty() {
            Ok(())
        } else {
            Err(Error::TypeMismatch { name: "()".to_string() })
        }
    }
}

macro_rules! impl_resolution_deps {
    ($($name:ident),+) => {
        impl<$($name),+> ResolutionDeps for ($(Arc<$name>,)+)
        where
            $($name: ?Sized + Contract,)+
        {
            fn parameters() -> Vec<&'static TypeInfo> {
                vec![$(<$name as Contract>::info()),+]
            }

            fn from_instances(instances: Vec<Instance>) -> Result<Self> {
                let mut instances = instances.into_iter();

                let deps = ($(
                    instances
                        .next()
                        .ok_or_else(|| Error::TypeMismatch { name: <$name as Contract>::info().name.to_string() })?
                        .expect_contract::<$name>()?,
                )+);

                match instances.next() {
                    None => Ok(deps),
                    Some(extra) => Err(Error::TypeMismatch { name: extra.contract().to_string() }),
                }
            }
        }
    };
}

impl_resolution_deps!(C1);
impl_resolution_deps!(C1, C2);
impl_resolution_deps!(C1, C2, C3);
impl_resolution_deps!(C1, C2, C3, C4);
impl_resolution_deps!(C1, C2, C3, C4, C5);
impl_resolution_deps!(C1, C2, C3, C4, C5, C6);
impl_resolution_deps!(C1, C2, C3, C4, C5, C6, C7);
impl_resolution_deps!(C1, C2, C3, C4, C5, C6, C7, C8);
impl_resolution_deps!(C1, C2, C3, C4, C5, C6, C7, C8, C9);
impl_resolution_deps!(C1, C2, C3, C4, C5, C6, C7, C8, C9, C10);
impl_resolution_deps!(C1, C2, C3, C4, C5, C6, C7, C8, C9, C10, C11);
impl_resolution_deps!(C1, C2, C3, C4, C5, C6, C7, C8, C9, C10, C11, C12);
