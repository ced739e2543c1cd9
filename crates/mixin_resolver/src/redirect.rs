// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashSet;

use crate::contract::{Instance, TypeInfo};
use crate::error::{Error, Result};

/// A followed chain of redirect annotations.
#[derive(Debug)]
pub(crate) struct RedirectChain {
    links: Vec<&'static TypeInfo>,
    terminal: &'static TypeInfo,
}

impl RedirectChain {
    /// Follows redirect annotations from `start` until a type without one is reached.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidRedirectTarget`] when an annotation names a concrete type and
    /// with [`Error::CyclicRedirect`] when a type is reached a second time.
    pub(crate) fn follow(start: &'static TypeInfo) -> Result<Self> {
        let mut visited = HashSet::from([start.type_id()]);
        let mut names = vec![start.name];
        let mut links = Vec::new();
        let mut current = start;

        while let Some(redirect) = current.redirect {
            let target = (redirect.target)();

            if !target.is_contract() {
                return Err(Error::InvalidRedirectTarget {
                    annotated: current.name,
                    target: target.name,
                });
            }

            names.push(target.name);
            if !visited.insert(target.type_id()) {
                return Err(Error::CyclicRedirect { chain: names });
            }

            links.push(current);
            current = target;
        }

        Ok(Self { links, terminal: current })
    }

    /// The contract at the end of the chain, the one actually resolved.
    pub(crate) fn terminal(&self) -> &'static TypeInfo {
        self.terminal
    }

    /// Views the terminal instance as every annotated type on the chain, walking back from the
    /// terminal. `register` is called for each link; the view of the starting type is returned.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::IncompatibleRedirect`] when an annotation's upcast rejects the instance
    /// resolved for its target.
    pub(crate) fn alias(&self, terminal: Instance, mut register: impl FnMut(&'static TypeInfo, Instance) -> Instance) -> Result<Instance> {
        let mut instance = terminal;
        let mut target = self.terminal;

        for link in self.links.iter().rev() {
            let Some(redirect) = link.redirect else {
                continue;
            };

            let alias = (redirect.upcast)(&instance).ok_or(Error::IncompatibleRedirect {
                annotated: link.name,
                target: target.name,
            })?;

            instance = register(link, alias);
            target = link;
        }

        Ok(instance)
    }
}
