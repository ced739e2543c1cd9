// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// How the resolver picks a constructor when an implementation registers several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConstructorSelection {
    /// Use the constructor with the most parameters. When several share the highest arity,
    /// the one registered first wins and a warning is logged.
    #[default]
    Richest,

    /// Use the constructor with the most parameters and fail with
    /// [`Error::AmbiguousConstructor`][crate::Error::AmbiguousConstructor] when several share
    /// the highest arity.
    Strict,
}

/// Options that control how a [`Resolver`][crate::Resolver] binds and constructs
/// implementations.
///
/// # Examples
///
/// ```
/// use mixin_resolver::{ConstructorSelection, ResolverOptions};
///
/// let options = ResolverOptions::new()
///     .conventions(false)
///     .constructor_selection(ConstructorSelection::Strict);
///
/// assert!(!options.uses_conventions());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverOptions {
    conventions: bool,
    constructor_selection: ConstructorSelection,
}

impl ResolverOptions {
    /// Creates the default options: naming conventions enabled, richest constructor wins.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            conventions: true,
            constructor_selection: ConstructorSelection::Richest,
        }
    }

    /// Whether [`build`][crate::ResolverBuilder::build] binds contracts to registered
    /// implementations by naming convention.
    #[must_use]
    pub const fn conventions(mut self, enabled: bool) -> Self {
        self.conventions = enabled;
        self
    }

    /// Sets how constructors are selected.
    #[must_use]
    pub const fn constructor_selection(mut self, selection: ConstructorSelection) -> Self {
        self.constructor_selection = selection;
        self
    }

    /// Whether naming conventions are applied.
    #[must_use]
    pub const fn uses_conventions(&self) -> bool {
        self.conventions
    }

    /// The constructor selection policy.
    #[must_use]
    pub const fn selection(&self) -> ConstructorSelection {
        self.constructor_selection
    }
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ResolverOptions::default();

        assert!(options.uses_conventions());
        assert_eq!(options.selection(), ConstructorSelection::Richest);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_partial() {
        let options: ResolverOptions = serde_json::from_str(r#"{ "constructor_selection": "strict" }"#).unwrap();

        assert!(options.uses_conventions());
        assert_eq!(options.selection(), ConstructorSelection::Strict);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serialize_round_trip() {
        let options = ResolverOptions::new().conventions(false);
        let json = serde_json::to_string(&options).unwrap();

        assert_eq!(json, r#"{"conventions":false,"constructor_selection":"richest"}"#);
    }
}
