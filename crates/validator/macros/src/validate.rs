use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, DeriveInput, Expr, Lit, LitStr, Meta, Token, parse_macro_input, parse_quote};

use crate::support::{diag, utils};

/// Key `#[validate("...")]` is stored under.
const VALIDATE_KEY: &str = "validate";
const SERDE_KEY: &str = "serde";

pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(input) {
        Ok(ts) => ts,
        Err(e) => diag::to_compile_error(e),
    }
}

fn expand(mut input: DeriveInput) -> syn::Result<TokenStream> {
    let fields = utils::require_named_fields(&input)?;

    let mut infos = Vec::with_capacity(fields.named.len());
    let mut arms = Vec::with_capacity(fields.named.len());
    for (index, field) in fields.named.iter().enumerate() {
        let Some(ident) = &field.ident else {
            continue;
        };
        let name = ident.unraw().to_string();

        let tags = field_tags(&field.attrs)?;
        let keys = tags.iter().map(|(key, _)| key);
        let values = tags.iter().map(|(_, value)| value);

        infos.push(quote! {
            ::nebula_structval::value::FieldInfo::new(#name, &[#((#keys, #values)),*])
        });
        arms.push(quote! {
            #index => ::std::option::Option::Some(&self.#ident),
        });
    }

    let struct_name = &input.ident;
    let record_name = struct_name.to_string();

    let params: Vec<_> = input.generics.type_params().map(|param| param.ident.clone()).collect();
    let where_clause = input.generics.make_where_clause();
    for param in params {
        where_clause
            .predicates
            .push(parse_quote!(#param: ::nebula_structval::value::Reflect));
    }
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::nebula_structval::value::Reflect for #struct_name #ty_generics #where_clause {
            fn reflect(&self) -> ::nebula_structval::value::ValueRef<'_> {
                ::nebula_structval::value::ValueRef::Record(self)
            }

            fn type_name(&self) -> &'static str {
                #record_name
            }
        }

        impl #impl_generics ::nebula_structval::value::Record for #struct_name #ty_generics #where_clause {
            fn record_name(&self) -> &'static str {
                #record_name
            }

            fn fields(&self) -> &'static [::nebula_structval::value::FieldInfo] {
                const FIELDS: &[::nebula_structval::value::FieldInfo] = &[#(#infos),*];
                FIELDS
            }

            fn field(&self, index: usize) -> ::std::option::Option<&dyn ::nebula_structval::value::Reflect> {
                match index {
                    #(#arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    };

    Ok(expanded.into())
}

/// Collects `(key, value)` tag pairs from a field's attributes.
fn field_tags(attrs: &[Attribute]) -> syn::Result<Vec<(String, String)>> {
    let mut tags: Vec<(String, String)> = Vec::new();
    let mut push = |key: String, value: String, span: Span| {
        if tags.iter().any(|(existing, _)| *existing == key) {
            return Err(syn::Error::new(span, format!("duplicate tag key `{key}`")));
        }
        tags.push((key, value));
        Ok(())
    };

    for attr in attrs {
        if attr.path().is_ident("validate") {
            let rules: LitStr = attr.parse_args()?;
            push(VALIDATE_KEY.to_owned(), rules.value(), rules.span())?;
        } else if attr.path().is_ident("tag") {
            for meta in attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)? {
                let Meta::NameValue(pair) = &meta else {
                    return Err(diag::error_spanned(&meta, "expected `key = \"value\"`"));
                };
                let Some(key) = pair.path.get_ident() else {
                    return Err(diag::error_spanned(&pair.path, "tag keys must be plain identifiers"));
                };
                let value = string_literal(&pair.value)
                    .ok_or_else(|| diag::error_spanned(&pair.value, "tag values must be string literals"))?;
                push(key.to_string(), value, meta.span())?;
            }
        } else if attr.path().is_ident("serde") {
            // Only `rename` is read; anything serde itself accepts is tolerated.
            let Ok(metas) = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated) else {
                continue;
            };
            for meta in metas {
                if let Meta::NameValue(pair) = &meta
                    && pair.path.is_ident("rename")
                    && let Some(value) = string_literal(&pair.value)
                {
                    push(SERDE_KEY.to_owned(), value, meta.span())?;
                }
            }
        }
    }

    Ok(tags)
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}
