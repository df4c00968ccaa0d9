use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};


/// Derive macro to implement `MechanismOutput` for a density mechanism,
/// the struct must have `current` and `conductance` fields of type `f64`
/// and `MechanismOutput` must be in scope
#[proc_macro_derive(MechanismBase)]
pub fn derive_mechanism_output(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let input = parse_macro_input!(input as DeriveInput);

    // Get the name of the struct we are deriving the trait for
    let name = input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics MechanismOutput for #name #ty_generics #where_clause {
            fn get_current(&self) -> f64 {
                self.current
            }

            fn get_conductance(&self) -> f64 {
                self.conductance
            }
        }
    };

    TokenStream::from(expanded)
}
