use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

pub fn expand_any_data(input: DeriveInput) -> TokenStream {
	let name = input.ident;

	if !input.generics.params.is_empty() {
		panic!("this derive macro only works on non-generic types");
	}

	// Delegates to the type's own `PartialEq`, `Debug`, and `Hash` impls; the
	// remaining capabilities keep their trait defaults.
	quote! {
		impl corvid::value::AnyData for #name {
			fn compare(&self, other: &Self) -> bool {
				self == other
			}

			fn to_text(&self) -> corvid::value::ty::Text {
				format!("{self:?}")
			}

			fn hash(&self) -> u64 {
				corvid::value::hash_of(self)
			}
		}
	}
}
