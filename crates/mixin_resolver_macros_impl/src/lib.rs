// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Implementation of the `#[contract]` attribute for the
//! [`mixin_resolver`](https://docs.rs/mixin_resolver) crate. See `mixin_resolver` for more
//! information.

mod contract;
mod utils;

pub use contract::contract;
