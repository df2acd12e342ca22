mod config;
mod enums;

use proc_macro::TokenStream;

/// Implement `Display` and a `to_str()` method for a fieldless enum.
///
/// Variants print as their identifier unless annotated with `#[enum_name = "..."]`.
#[proc_macro_derive(EnumDisplay, attributes(enum_name))]
pub fn enum_display(input: TokenStream) -> TokenStream {
    enums::enum_display(input)
}

/// Implement case-insensitive `FromStr` for a fieldless enum.
///
/// Both the variant identifier and the `#[enum_name = "..."]` string (if present) are accepted.
#[proc_macro_derive(EnumFromStr, attributes(enum_name))]
pub fn enum_from_str(input: TokenStream) -> TokenStream {
    enums::enum_from_str(input)
}

/// Generate an `ALL` constant containing every variant of a fieldless enum in declaration order.
#[proc_macro_derive(EnumAll)]
pub fn enum_all(input: TokenStream) -> TokenStream {
    enums::enum_all(input)
}

/// Implement `clap::ValueEnum` using the `ALL` constant from `EnumAll` and the strings from
/// `EnumDisplay`.
#[proc_macro_derive(CustomValueEnum)]
pub fn custom_value_enum(input: TokenStream) -> TokenStream {
    enums::custom_value_enum(input)
}

/// Implement a multi-line `Display` for a config struct, one `name: value` line per field.
///
/// Field attributes: `#[cfg_display(skip)]`, `#[cfg_display(debug_fmt)]`.
#[proc_macro_derive(ConfigDisplay, attributes(cfg_display))]
pub fn config_display(input: TokenStream) -> TokenStream {
    config::config_display(input)
}
