use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

pub fn expand_named_type(input: DeriveInput) -> TokenStream {
	let name = input.ident;

	quote! {
		impl corvid::value::NamedType for #name {
			const TYPENAME: corvid::value::Typename = stringify!(#name);
		}
	}
}
