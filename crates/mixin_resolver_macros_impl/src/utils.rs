// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Early return with a spanned `syn::Error`.
///
/// - `bail!(span, "message")`
/// - `bail!(span, "format string {}", value)`
macro_rules! bail {
    ($span:expr, $msg:literal) => {
        return Err(syn::Error::new($span, format!($msg)))
    };

    ($span:expr, $fmt:literal, $($arg:tt)*) => {
        return Err(syn::Error::new($span, format!($fmt, $($arg)*)))
    };
}

pub(crate) use bail;

/// Assert that two token streams are semantically identical by parsing them
/// into `syn::File`, pretty-printing with `prettyplease` and comparing the
/// resulting strings.
#[cfg(test)]
macro_rules! assert_token_streams_equal {
    ($actual:expr, $expected:expr $(,)?) => {{
        let expected_ts: proc_macro2::TokenStream = $expected;
        let actual_ts: proc_macro2::TokenStream = $actual;

        let ast_actual: syn::File = syn::parse2(actual_ts).expect("actual tokenstream is not valid Rust");
        let ast_expected: syn::File = syn::parse2(expected_ts).expect("expected tokenstream is not valid Rust");

        let actual_string = prettyplease::unparse(&ast_actual);
        let expected_string = prettyplease::unparse(&ast_expected);

        pretty_assertions::assert_eq!(actual_string, expected_string);
    }};
}

#[cfg(test)]
pub(crate) use assert_token_streams_equal;
