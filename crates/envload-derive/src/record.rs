use darling::util::Ignored;
use darling::{FromDeriveInput, FromField};
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, DeriveInput, Expr, ExprLit, Generics, Ident, Lit, Meta, Type, Visibility};

/// Container input. Only structs with named fields can be records.
#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named))]
struct RecordOpts {
    ident: Ident,
    generics: Generics,
    data: darling::ast::Data<Ignored, FieldOpts>,
}

/// Field input; `env` attributes are forwarded and parsed by hand because
/// they come in both `#[env = "..."]` and `#[env(flatten)]` forms.
#[derive(Debug, FromField)]
#[darling(forward_attrs(env))]
struct FieldOpts {
    ident: Option<Ident>,
    vis: Visibility,
    ty: Type,
    attrs: Vec<Attribute>,
}

/// What the `env` attributes on one field asked for.
#[derive(Debug, Default, PartialEq, Eq)]
struct FieldAttrs {
    tag: Option<String>,
    flatten: bool,
}

/// A pointer-like layer around a leaf type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wrapper {
    Option,
    Box,
}

pub fn generate_impl(input: &DeriveInput) -> TokenStream2 {
    match RecordOpts::from_derive_input(input).and_then(generate_from_opts) {
        Ok(tokens) => tokens,
        Err(e) => e.write_errors(),
    }
}

fn generate_from_opts(opts: RecordOpts) -> darling::Result<TokenStream2> {
    let struct_name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();
    let fields = opts
        .data
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum"))?
        .fields;

    let mut errors = darling::Error::accumulator();
    let mut steps = Vec::new();
    for field in &fields {
        if matches!(field.vis, Visibility::Inherited) {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };
        if let Some(attrs) = errors.handle(parse_field_attrs(&field.attrs)) {
            steps.push(generate_step(ident, &field.ty, &attrs));
        }
    }
    errors.finish()?;

    Ok(quote! {
        impl #impl_generics ::envload::Record for #struct_name #ty_generics #where_clause {
            fn populate(&mut self, loader: &::envload::Loader) -> ::envload::Result<()> {
                #(#steps)*
                ::core::result::Result::Ok(())
            }
        }
    })
}

fn generate_step(ident: &Ident, ty: &Type, attrs: &FieldAttrs) -> TokenStream2 {
    if attrs.flatten {
        return quote! {
            ::envload::Loader::load_embedded(loader, &mut self.#ident)?;
        };
    }

    let name = field_name(ident);
    let tag = match &attrs.tag {
        Some(text) => quote! { ::core::option::Option::Some(#text) },
        None => quote! { ::core::option::Option::None },
    };
    let (leaf, wrappers) = unwrap_type(ty);
    let convert = wrappers.iter().rev().fold(quote! { convert }, |inner, wrapper| match wrapper {
        Wrapper::Option => quote! { ::envload::convert::optional(#inner) },
        Wrapper::Box => quote! { ::envload::convert::boxed(#inner) },
    });

    quote! {
        {
            #[allow(unused_imports)]
            use ::envload::convert::dispatch::{
                ViaBinary as _, ViaJson as _, ViaPrimitive as _, ViaSetter as _, ViaText as _,
            };
            const FIELD: ::envload::Field = ::envload::Field::new(#name, #tag);
            let convert = (&&&&&::envload::convert::dispatch::Kind::<#leaf>::new()).converter();
            ::envload::Loader::load_field(loader, &FIELD, &mut self.#ident, #convert)?;
        }
    }
}

/// Declared field name as written, without a raw identifier prefix.
fn field_name(ident: &Ident) -> String {
    let name = ident.to_string();
    match name.strip_prefix("r#") {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

fn parse_field_attrs(attrs: &[Attribute]) -> darling::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    let mut errors = darling::Error::accumulator();

    for attr in attrs {
        match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(text),
                    ..
                }) => {
                    if parsed.tag.is_some() {
                        errors.push(darling::Error::duplicate_field("env").with_span(attr));
                    } else {
                        parsed.tag = Some(text.value());
                    }
                }
                other => {
                    errors.push(darling::Error::unexpected_expr_type(other).with_span(other));
                }
            },
            Meta::List(list) => {
                let result = list.parse_nested_meta(|meta| {
                    if meta.path.is_ident("flatten") {
                        parsed.flatten = true;
                        Ok(())
                    } else {
                        Err(meta.error("unsupported env option; expected `flatten`"))
                    }
                });
                if let Err(e) = result {
                    errors.push(e.into());
                }
            }
            Meta::Path(path) => {
                errors.push(
                    darling::Error::custom("expected `#[env = \"...\"]` or `#[env(flatten)]`")
                        .with_span(path),
                );
            }
        }
    }

    if parsed.flatten && parsed.tag.is_some() {
        errors.push(darling::Error::custom(
            "an embedded `#[env(flatten)]` field cannot also carry an `env` tag",
        ));
    }

    errors.finish_with(parsed)
}

/// Strip `Option<..>` and `Box<..>` layers, outermost first.
fn unwrap_type(ty: &Type) -> (Type, Vec<Wrapper>) {
    let mut wrappers = Vec::new();
    let mut current = ty;
    while let Some((wrapper, inner)) = single_wrapper(current) {
        wrappers.push(wrapper);
        current = inner;
    }
    (current.clone(), wrappers)
}

fn single_wrapper(ty: &Type) -> Option<(Wrapper, &Type)> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last()?;
    let wrapper = match segment.ident.to_string().as_str() {
        "Option" => Wrapper::Option,
        "Box" => Wrapper::Box,
        _ => return None,
    };
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first() {
        Some(syn::GenericArgument::Type(inner)) => Some((wrapper, inner)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn attrs_of(field: syn::Field) -> darling::Result<FieldAttrs> {
        parse_field_attrs(&field.attrs)
    }

    #[test]
    fn tag_text_is_kept_verbatim() {
        let field: syn::Field = parse_quote! {
            #[env = "PORT,optional"]
            pub port: u16
        };
        let attrs = attrs_of(field).unwrap();
        assert_eq!(attrs.tag.as_deref(), Some("PORT,optional"));
        assert!(!attrs.flatten);
    }

    #[test]
    fn flatten_is_recognized() {
        let field: syn::Field = parse_quote! {
            #[env(flatten)]
            pub db: Database
        };
        assert_eq!(
            attrs_of(field).unwrap(),
            FieldAttrs {
                tag: None,
                flatten: true
            }
        );
    }

    #[test]
    fn rejects_unknown_list_option() {
        let field: syn::Field = parse_quote! {
            #[env(rename)]
            pub db: Database
        };
        assert!(attrs_of(field).is_err());
    }

    #[test]
    fn rejects_flatten_with_tag() {
        let field: syn::Field = parse_quote! {
            #[env(flatten)]
            #[env = "DB"]
            pub db: Database
        };
        assert!(attrs_of(field).is_err());
    }

    #[test]
    fn rejects_duplicate_and_non_string_tags() {
        let twice: syn::Field = parse_quote! {
            #[env = "A"]
            #[env = "B"]
            pub a: u8
        };
        assert!(attrs_of(twice).is_err());

        let number: syn::Field = parse_quote! {
            #[env = 5]
            pub a: u8
        };
        assert!(attrs_of(number).is_err());
    }

    #[test]
    fn unwraps_option_and_box_layers() {
        let ty: Type = parse_quote!(Option<Box<std::time::Duration>>);
        let (leaf, wrappers) = unwrap_type(&ty);
        let expected: Type = parse_quote!(std::time::Duration);
        assert_eq!(leaf, expected);
        assert_eq!(wrappers, vec![Wrapper::Option, Wrapper::Box]);
    }

    #[test]
    fn leaves_other_generics_alone() {
        let ty: Type = parse_quote!(Vec<Option<u8>>);
        let (leaf, wrappers) = unwrap_type(&ty);
        assert_eq!(leaf, ty);
        assert!(wrappers.is_empty());
    }

    #[test]
    fn raw_identifiers_lose_prefix() {
        let ident: Ident = parse_quote!(r#type);
        assert_eq!(field_name(&ident), "type");
    }

    #[test]
    fn private_fields_generate_no_step() {
        let input: DeriveInput = parse_quote! {
            struct Config {
                hidden: String,
                pub shown: String,
            }
        };
        let tokens = generate_impl(&input).to_string();
        assert!(tokens.contains("\"shown\""));
        assert!(!tokens.contains("\"hidden\""));
    }

    #[test]
    fn rejects_tuple_structs() {
        let input: DeriveInput = parse_quote! {
            struct Pair(pub u8, pub u8);
        };
        let tokens = generate_impl(&input).to_string();
        assert!(tokens.contains("compile_error"));
    }
}
