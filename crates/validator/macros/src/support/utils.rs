use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields};

/// Return named fields if the input is a struct that has them; otherwise error.
pub fn require_named_fields(input: &DeriveInput) -> syn::Result<&syn::FieldsNamed> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "This derive can only be used on structs",
        ));
    };
    match &data.fields {
        Fields::Named(named) => Ok(named),
        Fields::Unnamed(_) => Err(syn::Error::new(
            data.fields.span(),
            "This derive requires a struct with named fields (e.g. `struct X { ... }`)",
        )),
        Fields::Unit => Err(syn::Error::new(
            data.fields.span(),
            "This derive requires a non-unit struct with fields",
        )),
    }
}
