use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct CfgDisplayAttrs {
    skip: bool,
    debug_fmt: bool,
}

fn parse_cfg_display_attrs(field: &Field) -> CfgDisplayAttrs {
    let mut attrs = CfgDisplayAttrs::default();

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("cfg_display")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else if meta.path.is_ident("debug_fmt") {
                attrs.debug_fmt = true;
            } else {
                return Err(meta.error("invalid cfg_display meta; expected skip or debug_fmt"));
            }

            Ok(())
        })
        .expect("failed to parse cfg_display field attribute");
    }

    attrs
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => {
            path.path.segments.last().is_some_and(|segment| segment.ident == "Option")
        }
        _ => false,
    }
}

pub fn config_display(input: TokenStream) -> TokenStream {
    let input: DeriveInput = syn::parse(input).expect("unable to parse input");

    let struct_ident = &input.ident;
    let Data::Struct(struct_data) = &input.data else {
        panic!("ConfigDisplay can only be derived for structs; {struct_ident} is not a struct");
    };

    let line_statements: Vec<_> = struct_data
        .fields
        .iter()
        .filter_map(|field| {
            let attrs = parse_cfg_display_attrs(field);
            (!attrs.skip).then_some((field, attrs))
        })
        .map(|(field, attrs)| {
            let Some(field_ident) = &field.ident else {
                panic!("ConfigDisplay derive macro only supports structs with named fields");
            };

            let fmt_string = if attrs.debug_fmt {
                format!("  {field_ident}: {{:?}}")
            } else {
                format!("  {field_ident}: {{}}")
            };

            if is_option(&field.ty) {
                let none_str = format!("  {field_ident}: <None>");
                quote! {
                    match &self.#field_ident {
                        ::std::option::Option::Some(value) => ::std::write!(f, #fmt_string, value)?,
                        ::std::option::Option::None => f.write_str(#none_str)?,
                    }
                }
            } else {
                quote! {
                    ::std::write!(f, #fmt_string, self.#field_ident)?;
                }
            }
        })
        .collect();

    assert!(
        !line_statements.is_empty(),
        "ConfigDisplay derive macro requires at least one displayed field on {struct_ident}"
    );

    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();
    let expanded = quote! {
        impl #impl_generics ::std::fmt::Display for #struct_ident #type_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #(
                    ::std::writeln!(f)?;
                    #line_statements
                )*
                ::std::result::Result::Ok(())
            }
        }
    };

    expanded.into()
}
