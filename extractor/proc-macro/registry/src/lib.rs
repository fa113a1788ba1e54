/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

extern crate proc_macro;

use once_cell::sync::Lazy;
use proc_macro::TokenStream;
use quote::ToTokens;
use quote::{format_ident, quote};
use regex::Regex;
use syn::{Attribute, DeriveInput, parse_macro_input};

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"name\s*=\s*"([^"]+)""#).unwrap());

static PLATFORM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"platform\s*=\s*"([^"]+)""#).unwrap());

/// Strategy attributes
///
/// # Usage
///
/// Derive `Registered` on a strategy type and describe it with `#[strategy(...)]`:
///
/// ```rust,ignore
/// #[derive(Registered)]
/// #[strategy(name = "vimeo_oembed", platform = "vimeo")]
/// pub struct VimeoOembed {}
/// ```
///
/// Supported keys:
/// - `name = "..."`: report key of the strategy (required, unique)
/// - `platform = "..."`: platform tag the strategy is bound to (optional).
///   Without it the strategy is generic and applies to every url.
///
/// The macro implements `StrategyRegistry` for the type and emits a
/// `__STRATEGY_REGISTRY_<TYPE>()` function returning the registry item
/// that `strategies::registry_items` collects.
#[derive(Debug)]
struct StrategyAttributes {
    name: String,
    platform: Option<String>,
}

impl StrategyAttributes {
    fn from_attrs(attrs: &[Attribute]) -> Result<Self, syn::Error> {
        // Parsed from the attribute's token text, e.g. (name = "x", platform = "y").
        let mut name = None;
        let mut platform = None;

        for attr in attrs {
            if attr.path().is_ident("strategy") {
                let mut ts = proc_macro2::TokenStream::new();
                attr.to_tokens(&mut ts);
                let s = ts.to_string();
                if name.is_none()
                    && let Some(cap) = NAME_RE.captures(&s)
                {
                    name = Some(cap.get(1).unwrap().as_str().to_string());
                }
                if platform.is_none()
                    && let Some(cap) = PLATFORM_RE.captures(&s)
                {
                    platform = Some(cap.get(1).unwrap().as_str().to_lowercase());
                }
            }
        }

        let name = match name {
            Some(name) => name,
            None => {
                return Err(match attrs.first() {
                    Some(first) => {
                        syn::Error::new_spanned(first, "Missing required attribute 'name'")
                    }
                    None => syn::Error::new(
                        proc_macro2::Span::call_site(),
                        "Missing #[strategy(name = \"...\")] attribute",
                    ),
                });
            }
        };

        Ok(StrategyAttributes { name, platform })
    }
}

#[proc_macro_derive(Registered, attributes(strategy))]
pub fn derive_registered(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = &input.ident;

    let attrs = match StrategyAttributes::from_attrs(&input.attrs) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    let strategy_name = attrs.name;

    let registry_item_name =
        format_ident!("__STRATEGY_REGISTRY_{}", ident.to_string().to_uppercase());

    let applies_impl = generate_applies_impl(attrs.platform.as_deref());
    let family = match attrs.platform {
        Some(_) => quote! { crate::models::Family::Platform },
        None => quote! { crate::models::Family::Generic },
    };

    let expanded = quote! {
        impl crate::traits::StrategyRegistry for #ident {
            fn name() -> &'static str {
                #strategy_name
            }

            fn family() -> crate::models::Family {
                #family
            }

            fn applies(platform: &crate::models::PlatformMatch) -> bool {
                #applies_impl
            }

            fn new() -> Box<dyn crate::traits::Strategy> {
                Box::new(Self {})
            }
        }

        #[allow(non_snake_case)]
        pub fn #registry_item_name() -> crate::factory::RegistryItem {
            crate::factory::RegistryItem {
                name: <#ident as crate::traits::StrategyRegistry>::name(),
                family: <#ident as crate::traits::StrategyRegistry>::family(),
                applies: <#ident as crate::traits::StrategyRegistry>::applies,
                creator: <#ident as crate::traits::StrategyRegistry>::new,
            }
        }
    };

    expanded.into()
}

/// Applicability check for the generated impl
fn generate_applies_impl(platform: Option<&str>) -> proc_macro2::TokenStream {
    match platform {
        // bound strategies need both the platform and an extracted id
        Some(tag) => quote! {
            platform.supports(#tag)
        },
        None => quote! {
            let _ = platform;
            true
        },
    }
}
