use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

pub fn derive_component(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let ast = parse_macro_input!(input as DeriveInput);

    // Get the type we are annotating, carrying its generics through to the impl.
    let name = &ast.ident;
    let (impl_generics, type_generics, where_clause) = ast.generics.split_for_impl();

    // `::rusty_archetypes` resolves inside the crate through `extern crate self as
    // rusty_archetypes;` in lib.rs, and to the dependency everywhere else.
    TokenStream::from(quote! {
        impl #impl_generics ::rusty_archetypes::ecs::Component for #name #type_generics #where_clause {
        }
    })
}
