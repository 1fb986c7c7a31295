use proc_easy::EasyAttributes;
use proc_macro2::TokenStream;
use syn::{ext::IdentExt, spanned::Spanned};

proc_easy::easy_token!(rename);

proc_easy::easy_argument_value! {
    struct Rename {
        token: rename,
        name: syn::LitStr,
    }
}

proc_easy::easy_attributes! {
    @(avro)
    struct FieldAttributes {
        rename: Option<Rename>,
    }
}

pub fn derive(input: proc_macro::TokenStream) -> syn::Result<TokenStream> {
    let input = syn::parse::<syn::DeriveInput>(input)?;
    let ident = &input.ident;

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Destination can be derived only for structs with named fields",
                ))
            }
        },
        syn::Data::Enum(data) => {
            return Err(syn::Error::new_spanned(
                data.enum_token,
                "Destination cannot be derived for enums",
            ))
        }
        syn::Data::Union(data) => {
            return Err(syn::Error::new_spanned(
                data.union_token,
                "Destination cannot be derived for unions",
            ))
        }
    };

    let mut names = Vec::with_capacity(fields.len());
    let mut members = Vec::with_capacity(fields.len());
    let mut types = Vec::with_capacity(fields.len());

    for field in fields {
        let member = field.ident.as_ref().unwrap();
        let FieldAttributes { rename } = EasyAttributes::parse(&field.attrs, field.span())?;

        let name = match rename {
            Some(rename) => rename.name,
            None => syn::LitStr::new(&member.unraw().to_string(), member.span()),
        };

        if let Some(dup) = names.iter().find(|n: &&syn::LitStr| n.value() == name.value()) {
            let mut err = syn::Error::new_spanned(&name, "Duplicate destination field name");
            err.combine(syn::Error::new_spanned(dup, "First declared here"));
            return Err(err);
        }

        names.push(name);
        members.push(member);
        types.push(&field.ty);
    }

    let indices: Vec<usize> = (0..names.len()).collect();

    let mut generics = input.generics.clone();
    if !types.is_empty() {
        let predicates = types.iter().map(|ty| -> syn::WherePredicate {
            syn::parse_quote_spanned! { ty.span() => #ty: ::avro_prepare::FromValue }
        });

        let where_clause = generics.make_where_clause();
        where_clause.predicates.extend(predicates);
    }

    let (impl_generics, type_generics, where_clause) = generics.split_for_impl();

    let mut from_value_generics = generics.clone();
    if !input.generics.params.is_empty() {
        from_value_generics
            .make_where_clause()
            .predicates
            .push(syn::parse_quote! { Self: ::avro_prepare::private::Default });
    }
    let from_value_where_clause = &from_value_generics.where_clause;

    Ok(quote::quote! {
        impl #impl_generics ::avro_prepare::Destination for #ident #type_generics #where_clause {
            const FIELDS: &'static [&'static ::avro_prepare::private::str] = &[#(#names,)*];

            #[allow(unreachable_code)]
            fn set_field(
                &mut self,
                index: ::avro_prepare::private::usize,
                value: ::avro_prepare::Value,
            ) -> ::avro_prepare::private::Result<(), ::avro_prepare::DecodeError> {
                match index {
                    #(
                        #indices => {
                            self.#members = <#types as ::avro_prepare::FromValue>::from_value(value)?;
                        }
                    )*
                    _ => {
                        return ::avro_prepare::private::Result::Err(
                            ::avro_prepare::DecodeError::FieldIndex(index),
                        )
                    }
                }
                ::avro_prepare::private::Result::Ok(())
            }

            #[allow(unreachable_code)]
            fn decode_field(
                &mut self,
                index: ::avro_prepare::private::usize,
                step: &::avro_prepare::FieldStep,
                cursor: &mut ::avro_prepare::Cursor<'_>,
            ) -> ::avro_prepare::private::Result<(), ::avro_prepare::DecodeError> {
                match index {
                    #(
                        #indices => {
                            self.#members = <#types as ::avro_prepare::FromValue>::read(step.schema(), cursor)?;
                        }
                    )*
                    _ => {
                        return ::avro_prepare::private::Result::Err(
                            ::avro_prepare::DecodeError::FieldIndex(index),
                        )
                    }
                }
                ::avro_prepare::private::Result::Ok(())
            }
        }

        impl #impl_generics ::avro_prepare::FromValue for #ident #type_generics #from_value_where_clause {
            #[inline]
            fn from_value(
                value: ::avro_prepare::Value,
            ) -> ::avro_prepare::private::Result<Self, ::avro_prepare::DecodeError> {
                ::avro_prepare::record_from_value(value)
            }

            #[inline]
            fn read(
                schema: &::avro_prepare::Schema,
                cursor: &mut ::avro_prepare::Cursor<'_>,
            ) -> ::avro_prepare::private::Result<Self, ::avro_prepare::DecodeError> {
                ::avro_prepare::decode_nested(schema, cursor)
            }
        }
    })
}
