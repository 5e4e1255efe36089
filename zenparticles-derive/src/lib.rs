//! Derive macros for the ZenParticles engine.
//!
//! This crate provides a single derive macro:
//!
//! - [`ShapeTag`] - Turns a unit enum into a stable, labelled shape tag
//!
//! # Usage
//!
//! The macro is re-exported from the main `zenparticles` crate. You don't
//! need to add this crate directly:
//!
//! ```ignore
//! use zenparticles::ShapeTag;
//!
//! #[derive(ShapeTag, Clone, Copy, PartialEq, Debug)]
//! enum Shape {
//!     Heart,
//!     #[tag(fallback)]
//!     Fireworks,
//!     #[tag(label = "Buddha (AI)")]
//!     AiPrimary,
//! }
//! ```
//!
//! # The ShapeTag Macro
//!
//! `#[derive(ShapeTag)]` gives every variant a sequential `u32` id (in
//! declaration order) and a human readable label, and generates:
//!
//! - `From<EnumName> for u32` and `From<u32> for EnumName`
//! - `EnumName::ALL`, `EnumName::count()`, `EnumName::label()`
//! - `Display` (writes the label) and `FromStr` (accepts labels or variant
//!   names, ignoring case, spaces and punctuation)

use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Variant};

struct TagVariant {
    ident: Ident,
    label: String,
    fallback: bool,
}

fn read_variant(variant: &Variant) -> syn::Result<TagVariant> {
    let mut label = variant.ident.to_string();
    let mut fallback = false;

    for attr in &variant.attrs {
        if !attr.path().is_ident("tag") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("label") {
                let lit: LitStr = meta.value()?.parse()?;
                label = lit.value();
                Ok(())
            } else if meta.path.is_ident("fallback") {
                fallback = true;
                Ok(())
            } else {
                Err(meta.error("expected `label = \"...\"` or `fallback`"))
            }
        })?;
    }

    Ok(TagVariant {
        ident: variant.ident.clone(),
        label,
        fallback,
    })
}

/// Derive macro for shape tag enums.
///
/// Variants are assigned sequential IDs starting from 0. Unknown IDs
/// convert to the variant marked `#[tag(fallback)]`, or to the first
/// variant when none is marked.
///
/// # Attributes
///
/// - `#[tag(label = "...")]` - display label (defaults to the variant name)
/// - `#[tag(fallback)]` - variant used for out-of-range IDs (at most one)
///
/// # Panics
///
/// The macro panics at compile time if:
/// - Applied to a struct instead of an enum
/// - Any variant has fields (tuple or struct variants)
/// - Enum has zero variants
/// - More than one variant is marked `fallback`
#[proc_macro_derive(ShapeTag, attributes(tag))]
pub fn derive_shape_tag(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => panic!("ShapeTag derive only supports enums"),
    };

    for variant in variants.iter() {
        if !matches!(variant.fields, Fields::Unit) {
            panic!(
                "ShapeTag enum variants must be unit variants (no fields). \
                 Found fields on variant '{}'",
                variant.ident
            );
        }
    }

    let tags = match variants.iter().map(read_variant).collect::<syn::Result<Vec<_>>>() {
        Ok(tags) => tags,
        Err(err) => return err.to_compile_error().into(),
    };

    if tags.is_empty() {
        panic!("ShapeTag enum must have at least one variant");
    }

    let fallbacks: Vec<&TagVariant> = tags.iter().filter(|t| t.fallback).collect();
    if fallbacks.len() > 1 {
        panic!("ShapeTag allows at most one #[tag(fallback)] variant on '{}'", name);
    }
    let fallback = &fallbacks.first().copied().unwrap_or(&tags[0]).ident;

    let idents: Vec<&Ident> = tags.iter().map(|t| &t.ident).collect();
    let ids: Vec<u32> = (0..tags.len() as u32).collect();
    let labels: Vec<&str> = tags.iter().map(|t| t.label.as_str()).collect();
    let names: Vec<String> = tags.iter().map(|t| t.ident.to_string()).collect();
    let count = tags.len() as u32;
    let count_usize = tags.len();

    let expanded = quote! {
        impl From<#name> for u32 {
            fn from(value: #name) -> u32 {
                match value {
                    #(#name::#idents => #ids),*
                }
            }
        }

        impl From<u32> for #name {
            fn from(value: u32) -> #name {
                match value {
                    #(#ids => #name::#idents,)*
                    _ => #name::#fallback,
                }
            }
        }

        impl #name {
            /// Every variant, in id order.
            pub const ALL: [#name; #count_usize] = [#(#name::#idents),*];

            /// Returns the number of variants in this tag enum.
            pub const fn count() -> u32 {
                #count
            }

            /// Human readable label of this variant.
            pub const fn label(&self) -> &'static str {
                match self {
                    #(#name::#idents => #labels),*
                }
            }
        }

        impl ::core::fmt::Display for #name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl ::core::str::FromStr for #name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                fn fold(s: &str) -> ::std::string::String {
                    s.chars()
                        .filter(|c| c.is_ascii_alphanumeric())
                        .map(|c| c.to_ascii_lowercase())
                        .collect()
                }

                let needle = fold(s);
                #(
                    if needle == fold(#labels) || needle == fold(#names) {
                        return Ok(#name::#idents);
                    }
                )*
                Err(::std::format!("unknown {} '{}'", stringify!(#name), s))
            }
        }
    };

    TokenStream::from(expanded)
}
