use syn::{parse_macro_input, DeriveInput};

mod any_data;
mod named_type;

#[proc_macro_derive(NamedType)]
pub fn named_type(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = parse_macro_input!(input as DeriveInput);

	named_type::expand_named_type(input).into()
}

#[proc_macro_derive(AnyData)]
pub fn any_data(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = parse_macro_input!(input as DeriveInput);

	any_data::expand_any_data(input).into()
}
