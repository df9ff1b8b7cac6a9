//! `#[derive(Bind)]` for reqbind.
//!
//! Emits the static type description plus the `Reflect` and `Field`
//! implementations the binder, validator and generators read. Paths in the
//! expansion are absolute (`::reqbind::...`).

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, LitStr, Result as SynResult, Type};

const LOCATIONS: [&str; 4] = ["path", "query", "header", "body"];

#[derive(Default)]
struct FieldAttrs {
    location: Option<LitStr>,
    name: Option<LitStr>,
    default: Option<LitStr>,
    mime: Option<LitStr>,
    desc: Option<LitStr>,
    json: Option<LitStr>,
    flatten: bool,
    skip: bool,
}

impl FieldAttrs {
    fn parse(attrs: &[syn::Attribute]) -> SynResult<Self> {
        let mut out = FieldAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("bind")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("in") {
                    let lit: LitStr = meta.value()?.parse()?;
                    if !LOCATIONS.contains(&lit.value().as_str()) {
                        return Err(syn::Error::new(
                            lit.span(),
                            format!("unknown parameter location `{}`, expected one of {:?}", lit.value(), LOCATIONS),
                        ));
                    }
                    out.location = Some(lit);
                } else if meta.path.is_ident("name") {
                    out.name = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("default") {
                    out.default = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("mime") {
                    out.mime = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("desc") {
                    out.desc = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("json") {
                    out.json = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("flatten") {
                    out.flatten = true;
                } else if meta.path.is_ident("skip") {
                    out.skip = true;
                } else {
                    return Err(meta.error("unknown bind attribute"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }

    fn is_json_body(&self) -> bool {
        let body = self.location.as_ref().is_some_and(|l| l.value() == "body");
        let multipart = self.mime.as_ref().is_some_and(|m| m.value() == "multipart");
        body && !multipart
    }
}

fn struct_generated(attrs: &[syn::Attribute]) -> SynResult<bool> {
    let mut generated = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("bind")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("generated") {
                generated = true;
                Ok(())
            } else {
                Err(meta.error("unknown bind attribute, expected `generated`"))
            }
        })?;
    }
    Ok(generated)
}

fn opt(lit: &Option<LitStr>) -> TokenStream2 {
    match lit {
        Some(lit) => quote! { ::core::option::Option::Some(#lit) },
        None => quote! { ::core::option::Option::None },
    }
}

struct BindField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    attrs: FieldAttrs,
}

#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(input: DeriveInput) -> SynResult<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&input.generics, "Bind cannot be derived for generic types"));
    }
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            Fields::Unit => return expand_fields(name, &input.attrs, Vec::new()),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(name, "Bind requires named fields"));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Bind can only be derived for structs")),
    };

    let mut fields = Vec::with_capacity(named.len());
    for field in named {
        let attrs = FieldAttrs::parse(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        // named fields always carry an ident
        let Some(ident) = field.ident.as_ref() else { continue };
        fields.push(BindField { ident, ty: &field.ty, attrs });
    }
    expand_fields(name, &input.attrs, fields)
}

fn expand_fields(name: &Ident, struct_attrs: &[syn::Attribute], fields: Vec<BindField<'_>>) -> SynResult<TokenStream2> {
    let generated = struct_generated(struct_attrs)?;
    let type_name = name.unraw().to_string();
    let count = fields.len();

    let infos = fields.iter().map(|f| {
        let ident = f.ident.unraw().to_string();
        let ty = f.ty;
        let location = opt(&f.attrs.location);
        let param = opt(&f.attrs.name);
        let default = opt(&f.attrs.default);
        let mime = opt(&f.attrs.mime);
        let desc = opt(&f.attrs.desc);
        let json = opt(&f.attrs.json);
        let flatten = f.attrs.flatten;
        quote! {
            ::reqbind::reflect::FieldInfo {
                ident: #ident,
                tags: ::reqbind::reflect::Tags {
                    location: #location,
                    name: #param,
                    default: #default,
                    mime: #mime,
                    desc: #desc,
                    json: #json,
                },
                flatten: #flatten,
                shape: <#ty as ::reqbind::Field>::shape,
            }
        }
    });

    let indices: Vec<usize> = (0..count).collect();
    let idents: Vec<&Ident> = fields.iter().map(|f| f.ident).collect();

    let json_arms = fields.iter().enumerate().filter(|(_, f)| f.attrs.is_json_body()).map(|(i, f)| {
        let ident = f.ident;
        quote! { #i => ::core::option::Option::Some(::reqbind::binding::decode_json(&mut self.#ident, body)), }
    });

    let bind_override = if generated {
        quote! {
            fn bind_override(
                &mut self,
                req: &dyn ::reqbind::RequestParts,
                config: &::reqbind::BindConfig,
            ) -> ::core::option::Option<::core::result::Result<(), ::reqbind::BindError>> {
                ::core::option::Option::Some(<Self as ::reqbind::BindParameters>::bind_parameters(self, req, config))
            }
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        const _: () = {
            static FIELDS: [::reqbind::reflect::FieldInfo; #count] = [#(#infos),*];
            static INFO: ::reqbind::reflect::TypeInfo = ::reqbind::reflect::TypeInfo {
                module_path: ::core::module_path!(),
                name: #type_name,
                fields: &FIELDS,
                generated: #generated,
            };

            impl ::reqbind::Reflect for #name {
                fn type_info() -> &'static ::reqbind::reflect::TypeInfo {
                    &INFO
                }

                fn info(&self) -> &'static ::reqbind::reflect::TypeInfo {
                    &INFO
                }

                fn field(&self, index: usize) -> ::core::option::Option<&dyn ::reqbind::Field> {
                    match index {
                        #(#indices => ::core::option::Option::Some(&self.#idents),)*
                        _ => ::core::option::Option::None,
                    }
                }

                fn field_mut(&mut self, index: usize) -> ::core::option::Option<&mut dyn ::reqbind::Field> {
                    match index {
                        #(#indices => ::core::option::Option::Some(&mut self.#idents),)*
                        _ => ::core::option::Option::None,
                    }
                }

                #[allow(unused_variables)]
                fn decode_json(
                    &mut self,
                    index: usize,
                    body: &[u8],
                ) -> ::core::option::Option<::core::result::Result<(), ::reqbind::BindError>> {
                    match index {
                        #(#json_arms)*
                        _ => ::core::option::Option::None,
                    }
                }

                #bind_override
            }

            impl ::reqbind::Field for #name {
                fn shape() -> ::reqbind::reflect::Shape {
                    ::reqbind::reflect::Shape::Struct(<Self as ::reqbind::Reflect>::type_info)
                }

                fn is_empty_value(&self) -> bool {
                    true #(&& ::reqbind::Field::is_empty_value(&self.#idents))*
                }

                fn as_reflect(&self) -> ::core::option::Option<&dyn ::reqbind::Reflect> {
                    ::core::option::Option::Some(self)
                }

                fn as_reflect_mut(&mut self) -> ::core::option::Option<&mut dyn ::reqbind::Reflect> {
                    ::core::option::Option::Some(self)
                }

                fn ensure_reflect(&mut self) -> ::core::option::Option<&mut dyn ::reqbind::Reflect> {
                    ::core::option::Option::Some(self)
                }
            }
        };
    })
}
