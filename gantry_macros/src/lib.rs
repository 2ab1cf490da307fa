//! Attribute macros that attach route metadata to handler functions.
//!
//! `#[get("/path")]` and `#[post("/path")]` rewrite a plain handler function
//! into a `RouteDef` constructor of the same name. The declared parameter
//! list becomes the route's signature descriptor: a plain `T` parameter is a
//! required named argument, `Option<T>` is optional, a parameter named
//! `request` receives the raw request snapshot, and a trailing `CallArgs`
//! parameter collects all remaining arguments.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, FnArg, ItemFn, LitStr, Pat, Type};

fn is_option(ty: &Type) -> bool {
    if let Type::Path(p) = ty {
        if let Some(seg) = p.path.segments.last() {
            return seg.ident == "Option";
        }
    }
    false
}

fn is_call_args(ty: &Type) -> bool {
    if let Type::Path(p) = ty {
        if let Some(seg) = p.path.segments.last() {
            return seg.ident == "CallArgs";
        }
    }
    false
}

enum ParamKind {
    Request,
    CatchAll,
    Optional,
    Required,
}

struct ParamSpec {
    ident: syn::Ident,
    ty: Type,
    kind: ParamKind,
}

fn expand_route(method: &str, attr: TokenStream, item: TokenStream) -> TokenStream {
    let path = parse_macro_input!(attr as LitStr);
    let input = parse_macro_input!(item as ItemFn);

    let fn_vis = &input.vis;
    let fn_name = &input.sig.ident;
    let fn_name_str = fn_name.to_string();
    let output = &input.sig.output;
    let block = &input.block;

    if input.sig.asyncness.is_some() {
        return syn::Error::new_spanned(&input.sig, "route handlers are plain functions; the runtime suspends at I/O boundaries")
            .to_compile_error()
            .into();
    }

    let mut params = Vec::new();
    for arg in &input.sig.inputs {
        let pat_ty = match arg {
            FnArg::Typed(p) => p,
            FnArg::Receiver(r) => {
                return syn::Error::new_spanned(r, "route handlers cannot take self")
                    .to_compile_error()
                    .into();
            }
        };
        let ident = match pat_ty.pat.as_ref() {
            Pat::Ident(i) => i.ident.clone(),
            other => {
                return syn::Error::new_spanned(other, "route handler parameters must be named")
                    .to_compile_error()
                    .into();
            }
        };
        let ty = (*pat_ty.ty).clone();
        let kind = if ident == "request" {
            ParamKind::Request
        } else if is_call_args(&ty) {
            ParamKind::CatchAll
        } else if is_option(&ty) {
            ParamKind::Optional
        } else {
            ParamKind::Required
        };
        params.push(ParamSpec { ident, ty, kind });
    }

    // A catch-all drains whatever the binder left over, so nothing may follow it.
    if let Some(pos) = params
        .iter()
        .position(|p| matches!(p.kind, ParamKind::CatchAll))
    {
        if pos + 1 != params.len() {
            return syn::Error::new_spanned(
                &params[pos].ident,
                "the CallArgs catch-all must be the last parameter",
            )
            .to_compile_error()
            .into();
        }
    }

    let mut extract = Vec::new();
    let mut call_idents = Vec::new();
    let mut sig_params = Vec::new();
    let mut sig_required = Vec::new();
    let mut accepts_extra = false;

    for p in &params {
        let ident = &p.ident;
        let ty = &p.ty;
        let name_lit = ident.to_string();
        call_idents.push(ident.clone());
        match p.kind {
            ParamKind::Request => {
                sig_params.push(name_lit);
                extract.push(quote! {
                    let #ident = match __ctx.take_request() {
                        Some(r) => r,
                        None => {
                            return Err(::gantry::HandlerError::BadRequest(
                                "request context unavailable".to_string(),
                            ))
                        }
                    };
                });
            }
            ParamKind::CatchAll => {
                accepts_extra = true;
                extract.push(quote! {
                    let #ident: ::gantry::CallArgs = __ctx.take_rest();
                });
            }
            ParamKind::Optional => {
                sig_params.push(name_lit.clone());
                extract.push(quote! {
                    let #ident: #ty = __ctx.take_opt(#name_lit)?;
                });
            }
            ParamKind::Required => {
                sig_params.push(name_lit.clone());
                sig_required.push(name_lit.clone());
                extract.push(quote! {
                    let #ident: #ty = __ctx.take(#name_lit)?;
                });
            }
        }
    }

    let method_ident = format_ident!("{}", method);
    let impl_ident = format_ident!("__gantry_impl_{}", fn_name);
    let inner_inputs = input.sig.inputs.iter();
    let rebind = (!params.is_empty()).then(|| quote! { let mut __ctx = __ctx; });

    let expanded = quote! {
        #fn_vis fn #fn_name() -> ::gantry::RouteDef {
            fn #impl_ident(#(#inner_inputs),*) #output #block

            fn __gantry_adapter(__ctx: ::gantry::HandlerContext) -> ::gantry::HandlerResult {
                #rebind
                #(#extract)*
                #impl_ident(#(#call_idents),*)
            }

            ::gantry::RouteDef::new(#fn_name_str, ::std::sync::Arc::new(__gantry_adapter))
                .with_method(::gantry::Method::#method_ident)
                .with_path(#path)
                .with_signature(::gantry::SignatureSpec {
                    params: vec![#(#sig_params),*],
                    required: vec![#(#sig_required),*],
                    accepts_extra: #accepts_extra,
                })
        }
    };

    expanded.into()
}

/// Bind a handler function to `GET` on the given path.
#[proc_macro_attribute]
pub fn get(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand_route("GET", attr, item)
}

/// Bind a handler function to `POST` on the given path.
#[proc_macro_attribute]
pub fn post(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand_route("POST", attr, item)
}
