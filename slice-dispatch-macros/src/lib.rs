//! Procedural macros for slice-dispatch

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionOpts {
    ident: syn::Ident,
    vis: syn::Visibility,
    data: darling::ast::Data<ActionVariant, ()>,

    /// Generate the `<Enum>Creators` extension trait
    #[darling(default)]
    creators: bool,
}

/// Variant-level attributes
#[derive(FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<syn::Field>,

    /// Explicit action name, e.g. `"todos/todoAdded"`
    #[darling(default)]
    rename: Option<String>,

    /// Explicit creator method name
    #[darling(default)]
    creator: Option<String>,

    /// Leave this variant out of the creators trait
    #[darling(default)]
    skip_creator: bool,
}

/// Convert PascalCase to snake_case
fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Derive macro for the Action trait
///
/// Generates `name()` returning the variant name, or the `rename` given on
/// the variant.
///
/// With `#[action(creators)]` it also generates a `<Enum>Creators` trait
/// implemented for every dispatcher of the enum, with one snake_case method
/// per variant that builds the action and dispatches it.
///
/// # Example
///
/// ```ignore
/// #[derive(Action, Clone, Debug, Serialize)]
/// #[action(creators)]
/// enum TodoAction {
///     #[action(rename = "todos/todoAdded")]
///     TodoAdded { id: String, text: String },
///     TodoDeleted(String),
///     #[action(creator = "clear")]
///     AllCleared,
/// }
///
/// let dispatch: BoundDispatch<TodoState, TodoAction> = /* ... */;
/// dispatch.todo_added("1".into(), "buy milk".into())?;
/// dispatch.todo_deleted("1".into())?;
/// dispatch.clear()?;
///
/// assert_eq!(TodoAction::AllCleared.name(), "AllCleared");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Action can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let name_arms = variants.iter().map(|v| {
        let variant_name = &v.ident;
        let action_name = v.rename.clone().unwrap_or_else(|| variant_name.to_string());

        match &v.fields.style {
            darling::ast::Style::Unit => quote! {
                #name::#variant_name => #action_name
            },
            darling::ast::Style::Tuple => quote! {
                #name::#variant_name(..) => #action_name
            },
            darling::ast::Style::Struct => quote! {
                #name::#variant_name { .. } => #action_name
            },
        }
    });

    let mut expanded = quote! {
        impl ::slice_dispatch::Action for #name {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }
        }
    };

    if opts.creators {
        expanded.extend(creators_trait(&opts.vis, name, variants));
    }

    TokenStream::from(expanded)
}

fn creators_trait(
    vis: &syn::Visibility,
    name: &syn::Ident,
    variants: &[ActionVariant],
) -> TokenStream2 {
    let trait_name = format_ident!("{}Creators", name);

    let methods = variants.iter().filter(|v| !v.skip_creator).map(|v| {
        let variant_name = &v.ident;
        let method_name = match &v.creator {
            Some(creator) => format_ident!("{}", creator),
            None => format_ident!("{}", to_snake_case(&variant_name.to_string())),
        };
        let doc = format!("Build and dispatch [`{}::{}`]", name, variant_name);

        let (params, construct): (Vec<TokenStream2>, TokenStream2) = match &v.fields.style {
            darling::ast::Style::Unit => (Vec::new(), quote! { #name::#variant_name }),
            darling::ast::Style::Tuple => {
                let args: Vec<_> = (0..v.fields.len())
                    .map(|i| format_ident!("arg{}", i))
                    .collect();
                let params = v
                    .fields
                    .iter()
                    .zip(&args)
                    .map(|(field, arg)| {
                        let ty = &field.ty;
                        quote! { #arg: #ty }
                    })
                    .collect();
                (params, quote! { #name::#variant_name(#(#args),*) })
            }
            darling::ast::Style::Struct => {
                let idents: Vec<_> = v
                    .fields
                    .iter()
                    .filter_map(|field| field.ident.as_ref())
                    .collect();
                let params = v
                    .fields
                    .iter()
                    .filter_map(|field| {
                        let ident = field.ident.as_ref()?;
                        let ty = &field.ty;
                        Some(quote! { #ident: #ty })
                    })
                    .collect();
                (params, quote! { #name::#variant_name { #(#idents),* } })
            }
        };

        quote! {
            #[doc = #doc]
            fn #method_name(&self, #(#params),*) -> ::slice_dispatch::Result<#name> {
                self.dispatch_action(#construct)
            }
        }
    });

    let trait_doc = format!(
        "One dispatching creator per [`{}`] variant.\n\n\
         Implemented for every `DispatchAction<{}>`.",
        name, name
    );

    quote! {
        #[doc = #trait_doc]
        #[allow(clippy::too_many_arguments)]
        #vis trait #trait_name: ::slice_dispatch::DispatchAction<#name> {
            #(#methods)*
        }

        impl<D> #trait_name for D where D: ::slice_dispatch::DispatchAction<#name> + ?Sized {}
    }
}
