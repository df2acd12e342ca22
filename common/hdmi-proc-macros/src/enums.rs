use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DataEnum, DeriveInput, Expr, ExprLit, Fields, Ident, Lit, Meta, Variant};

fn parse_enum(input: TokenStream, macro_name: &str) -> (Ident, DataEnum) {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");

    let name = ast.ident;
    let Data::Enum(data) = ast.data else {
        panic!("{macro_name} derive macro can only be applied to enums; {name} is not an enum");
    };

    for variant in &data.variants {
        assert!(
            matches!(variant.fields, Fields::Unit),
            "{macro_name} only supports enums with fieldless variants; {name}::{} has fields",
            variant.ident
        );
    }

    (name, data)
}

// Display string for a variant: #[enum_name = "..."] if present, otherwise the identifier
fn variant_str(variant: &Variant) -> String {
    variant
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident("enum_name"))
        .find_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Some(s.value()),
                _ => panic!("enum_name attribute value must be a string literal"),
            },
            _ => panic!("enum_name attribute must have the form #[enum_name = \"...\"]"),
        })
        .unwrap_or_else(|| variant.ident.to_string())
}

pub fn enum_display(input: TokenStream) -> TokenStream {
    let (name, data) = parse_enum(input, "EnumDisplay");

    let match_arms = data.variants.iter().map(|variant| {
        let variant_ident = &variant.ident;
        let variant_str = variant_str(variant);
        quote! {
            Self::#variant_ident => #variant_str
        }
    });

    let expanded = quote! {
        impl #name {
            #[must_use]
            pub fn to_str(&self) -> &'static str {
                match self {
                    #(#match_arms,)*
                }
            }
        }

        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.to_str())
            }
        }
    };

    expanded.into()
}

pub fn enum_from_str(input: TokenStream) -> TokenStream {
    let (name, data) = parse_enum(input, "EnumFromStr");

    let match_arms = data.variants.iter().map(|variant| {
        let variant_ident = &variant.ident;
        let ident_lower = variant_ident.to_string().to_ascii_lowercase();
        let display_lower = variant_str(variant).to_ascii_lowercase();

        if ident_lower == display_lower {
            quote! {
                #ident_lower => ::std::result::Result::Ok(Self::#variant_ident)
            }
        } else {
            quote! {
                #ident_lower | #display_lower => ::std::result::Result::Ok(Self::#variant_ident)
            }
        }
    });

    let err_fmt_string = format!("invalid {name} string: '{{}}'");
    let expanded = quote! {
        impl ::std::str::FromStr for #name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    #(#match_arms,)*
                    _ => ::std::result::Result::Err(::std::format!(#err_fmt_string, s))
                }
            }
        }
    };

    expanded.into()
}

pub fn enum_all(input: TokenStream) -> TokenStream {
    let (name, data) = parse_enum(input, "EnumAll");

    let variants = data.variants.iter().map(|variant| {
        let variant_ident = &variant.ident;
        quote! { Self::#variant_ident }
    });

    let num_variants = data.variants.len();
    let expanded = quote! {
        impl #name {
            pub const ALL: [Self; #num_variants] = [#(#variants,)*];
        }
    };

    expanded.into()
}

pub fn custom_value_enum(input: TokenStream) -> TokenStream {
    let input: DeriveInput = syn::parse(input).expect("unable to parse input");

    let name = &input.ident;

    let expanded = quote! {
        impl ::clap::ValueEnum for #name {
            fn value_variants<'a>() -> &'a [Self] {
                &Self::ALL
            }

            fn to_possible_value(&self) -> ::std::option::Option<::clap::builder::PossibleValue> {
                ::std::option::Option::Some(::clap::builder::PossibleValue::new(self.to_str()))
            }
        }
    };

    expanded.into()
}
