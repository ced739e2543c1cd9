// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Naming conventions that map a contract to the implementation expected to provide it.

use crate::contract::CONTRACT_MARKER;

const PATH_SEPARATOR: &str = "::";
const CORE_SUFFIX: &str = "Core";

/// Implementation names to try for a contract, most specific first.
///
/// The `dyn ` contract marker is stripped, then the namespaces are walked from the
/// contract's own module outward to the crate root. At every level the contract's own name
/// is tried, then the name with a `Core` suffix, then, for names that already end in `Core`,
/// the name without it.
///
/// `dyn app::contracts::Clock` yields `app::contracts::Clock`, `app::contracts::ClockCore`,
/// `app::Clock`, `app::ClockCore`, `Clock` and `ClockCore`.
///
/// A type cannot share its path with the trait it implements, so the bare `Name` candidate
/// only matches an implementation whose reported name was changed with
/// [`Implementation::named`][crate::Implementation::named]. Unrenamed types match through
/// `NameCore` or a `Core`-stripped name in an outer namespace.
pub(crate) fn candidates(contract: &str) -> Vec<String> {
    let path = contract.strip_prefix(CONTRACT_MARKER).unwrap_or(contract).trim();

    let (namespace, name) = match path.rsplit_once(PATH_SEPARATOR) {
        Some((namespace, name)) => (Some(namespace), name),
        None => (None, path),
    };

    let mut names = vec![name.to_string(), format!("{name}{CORE_SUFFIX}")];
    if let Some(stripped) = name.strip_suffix(CORE_SUFFIX).filter(|s| !s.is_empty()) {
        names.push(stripped.to_string());
    }

    let mut candidates = Vec::new();
    let mut level = namespace;

    loop {
        for name in &names {
            let candidate = level.map_or_else(|| name.clone(), |ns| format!("{ns}{PATH_SEPARATOR}{name}"));
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        match level {
            Some(ns) => level = ns.rsplit_once(PATH_SEPARATOR).map(|(outer, _)| outer),
            None => break,
        }
    }

    candidates
}
