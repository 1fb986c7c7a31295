extern crate proc_macro;

mod destination;

use proc_macro::TokenStream;

/// Proc-macro to derive `Destination` trait for user-defined type.
///
/// This macro requires that type is a `struct` with named fields.
/// All fields must implement `FromValue`.
///
/// Field is matched with record field of the same name,
/// `#[avro(rename = "name")]` overrides the name.
///
/// `FromValue` is derived as well, so the struct may be a field
/// of another destination. That impl requires `Default`.
#[proc_macro_derive(Destination, attributes(avro))]
pub fn derive_destination(input: TokenStream) -> TokenStream {
    match destination::derive(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
