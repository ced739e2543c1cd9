// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{FnArg, GenericParam, Ident, ItemTrait, Pat, PatIdent, Path, Signature, TraitBound, TraitBoundModifier, TraitItem, TraitItemFn, TypeParamBound, parse_quote, parse2};

use crate::utils::bail;


const MIXIN_MARKER: &str = "Mixin";

/// Arguments of `#[contract(...)]`.
#[derive(Default)]
struct ContractArgs {
    redirect: Option<Path>,
}

impl ContractArgs {
    fn parse(attr: TokenStream) -> syn::Result<Self> {
        let mut args = Self::default();

        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("redirect") {
                if args.redirect.is_some() {
                    return Err(meta.error("`redirect` may only be given once"));
                }
                args.redirect = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported contract argument, expected `redirect = Target`"))
            }
        });

        parser.parse2(attr)?;
        Ok(args)
    }
}

/// Turns an object-safe trait into a resolvable contract.
///
/// Emits the trait with `Send + Sync` supertraits, its `Contract` metadata, an `Upcast` impl for
/// every implementor and the forwarding impl that lets a `Composite` answer to the trait.
pub fn contract(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let args = ContractArgs::parse(attr)?;
    let mut item: ItemTrait = parse2(item)?;

    validate_trait(&item)?;

    let is_mixin = item.supertraits.iter().any(|bound| bound_named(bound, MIXIN_MARKER));
    if is_mixin {
        if let Some(member) = item.items.first() {
            let name = &item.ident;
            bail!(member.span(), "`{name}` is a mixin: it is a pure aggregate and cannot have members");
        }
    }

    let methods = item
        .items
        .iter()
        .map(|member| match member {
            TraitItem::Fn(method) => validate_method(method).map(|()| method.clone()),
            other => bail!(other.span(), "contracts may only declare methods"),
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let extends: Vec<Path> = item.supertraits.iter().filter_map(contract_supertrait).cloned().collect();

    add_thread_safety(&mut item);

    let metadata = metadata(&item, &methods, &extends, is_mixin, args.redirect.as_ref());
    let upcast = upcast(&item.ident);
    let forwarding = forwarding(&item.ident, &methods);

    Ok(quote! {
        #item

        #metadata

        #upcast

        #forwarding
    })
}

fn validate_trait(item: &ItemTrait) -> syn::Result<()> {
    if !item.generics.params.is_empty() || item.generics.where_clause.is_some() {
        bail!(item.generics.span(), "contracts cannot be generic");
    }

    if let Some(unsafety) = &item.unsafety {
        bail!(unsafety.span(), "contracts cannot be unsafe traits");
    }

    if let Some(auto) = &item.auto_token {
        bail!(auto.span(), "contracts cannot be auto traits");
    }

    Ok(())
}

fn validate_method(method: &TraitItemFn) -> syn::Result<()> {
    let sig = &method.sig;

    if let Some(asyncness) = &sig.asyncness {
        bail!(asyncness.span(), "contract methods cannot be async");
    }

    if sig.generics.params.iter().any(|param| !matches!(param, GenericParam::Lifetime(_))) {
        bail!(sig.generics.span(), "contract methods cannot have type or const parameters");
    }

    if let Some(where_clause) = &sig.generics.where_clause {
        bail!(where_clause.span(), "contract methods cannot have where clauses");
    }

    if let Some(variadic) = &sig.variadic {
        bail!(variadic.span(), "contract methods cannot be variadic");
    }

    match sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() && receiver.colon_token.is_none() => Ok(()),
        Some(receiver) => bail!(receiver.span(), "contract methods must take `&self`"),
        None => bail!(sig.ident.span(), "contract methods must take `&self`"),
    }
}

fn bound_named(bound: &TypeParamBound, name: &str) -> bool {
    match bound {
        TypeParamBound::Trait(TraitBound { path, .. }) => path.segments.last().is_some_and(|segment| segment.ident == name),
        _ => false,
    }
}

/// A supertrait that is itself a contract, as opposed to a marker.
fn contract_supertrait(bound: &TypeParamBound) -> Option<&Path> {
    let TypeParamBound::Trait(TraitBound { path, modifier, .. }) = bound else {
        return None;
    };

    if matches!(modifier, TraitBoundModifier::Maybe(_)) {
        return None;
    }

    let last = path.segments.last()?;
    if ["Send", "Sync", "Sized", MIXIN_MARKER].iter().any(|&marker| last.ident == marker) {
        return None;
    }

    Some(path)
}

fn add_thread_safety(item: &mut ItemTrait) {
    let has_send = item.supertraits.iter().any(|bound| bound_named(bound, "Send"));
    let has_sync = item.supertraits.iter().any(|bound| bound_named(bound, "Sync"));

    if !has_send {
        item.supertraits.push(parse_quote!(::core::marker::Send));
    }

    if !has_sync {
        item.supertraits.push(parse_quote!(::core::marker::Sync));
    }

    if !item.supertraits.is_empty() && item.colon_token.is_none() {
        item.colon_token = Some(Default::default());
    }
}

fn metadata(item: &ItemTrait, methods: &[TraitItemFn], extends: &[Path], is_mixin: bool, redirect: Option<&Path>) -> TokenStream {
    let name = &item.ident;
    let name_str = name.to_string();
    let members = methods.iter().map(|method| method.sig.ident.to_string());

    let mixin = if is_mixin {
        quote! {
            ::core::option::Option::Some(::mixin_resolver::MixinInfo { upcast: mixin_upcast })
        }
    } else {
        quote! { ::core::option::Option::None }
    };

    let mixin_upcast = is_mixin.then(|| {
        quote! {
            fn mixin_upcast(composite: ::std::sync::Arc<::mixin_resolver::Composite>) -> ::mixin_resolver::Instance {
                ::mixin_resolver::Instance::new::<dyn #name>(composite)
            }
        }
    });

    let (redirect, redirect_upcast) = match redirect {
        Some(target) => (
            quote! {
                ::core::option::Option::Some(::mixin_resolver::RedirectInfo {
                    target: <dyn #target as ::mixin_resolver::Contract>::info,
                    upcast: redirect_upcast,
                })
            },
            Some(quote! {
                fn redirect_upcast(instance: &::mixin_resolver::Instance) -> ::core::option::Option<::mixin_resolver::Instance> {
                    instance
                        .downcast::<dyn #target>()
                        .map(|target| ::mixin_resolver::Instance::new::<dyn #name>(target))
                }
            }),
        ),
        None => (quote! { ::core::option::Option::None }, None),
    };

    quote! {
        impl ::mixin_resolver::Contract for dyn #name {
            fn info() -> &'static ::mixin_resolver::TypeInfo {
                #mixin_upcast

                #redirect_upcast

                static INFO: ::mixin_resolver::TypeInfo = ::mixin_resolver::TypeInfo {
                    id: ::core::any::TypeId::of::<dyn #name>,
                    name: ::core::concat!("dyn ", ::core::module_path!(), "::", #name_str),
                    kind: ::mixin_resolver::TypeKind::Contract,
                    members: &[#(#members),*],
                    extends: &[#(<dyn #extends as ::mixin_resolver::Contract>::info),*],
                    mixin: #mixin,
                    redirect: #redirect,
                };

                &INFO
            }
        }
    }
}

fn upcast(name: &Ident) -> TokenStream {
    quote! {
        impl<T: #name + 'static> ::mixin_resolver::Upcast<T> for dyn #name {
            fn upcast(implementation: ::std::sync::Arc<T>) -> ::std::sync::Arc<Self> {
                implementation
            }
        }
    }
}

fn forwarding(name: &Ident, methods: &[TraitItemFn]) -> TokenStream {
    let methods = methods.iter().map(|method| {
        let (sig, arguments) = forwarding_signature(&method.sig);
        let ident = &sig.ident;

        quote! {
            #sig {
                <dyn #name as #name>::#ident(self.backing::<dyn #name>() #(, #arguments)*)
            }
        }
    });

    quote! {
        impl #name for ::mixin_resolver::Composite {
            #(#methods)*
        }
    }
}

/// Copies a method signature, naming every argument so it can be passed along.
fn forwarding_signature(sig: &Signature) -> (Signature, Vec<Ident>) {
    let mut sig = sig.clone();
    let mut arguments = Vec::new();

    let inputs = sig
        .inputs
        .into_iter()
        .map(|input| match input {
            FnArg::Receiver(receiver) => FnArg::Receiver(receiver),
            FnArg::Typed(mut typed) => {
                let ident = format_ident!("arg{}", arguments.len());
                typed.attrs.clear();
                typed.pat = Box::new(Pat::Ident(PatIdent {
                    attrs: Vec::new(),
                    by_ref: None,
                    mutability: None,
                    ident: ident.clone(),
                    subpat: None,
                }));
                arguments.push(ident);
                FnArg::Typed(typed)
            }
        })
        .collect::<Punctuated<FnArg, syn::Token![,]>>();

    sig.inputs = inputs;
    (sig, arguments)
}
