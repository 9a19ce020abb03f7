//! Field declarations: synthesis from descriptors and edits of `fields()` lists.

use log::debug;
use proc_macro2::Span;
use quote::{ToTokens, quote};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Expr, ExprLit, ExprMacro, Ident, ImplItemFn, Lit, LitStr, Stmt, Token, parse_quote,
};

use crate::builder::BuilderCall;
use crate::context::{Context, FIELD_NAMESPACE, MethodPath};
use crate::descriptor::{FieldBatch, FieldDescriptor, FieldType};
use crate::errors::{Result, SchemastError, UnsupportedFeature};
use crate::naming::to_snake_case;

const FIELDS_METHOD: &str = "fields";
const EXPECTED_LIST: &str = "expected Vec::new() or vec![..]";

/// Convert a descriptor into the `field::<type>("name")...` expression that declares it.
pub fn field(desc: &FieldDescriptor) -> Result<Expr> {
    field_expr(desc, &Ident::new(FIELD_NAMESPACE, Span::call_site()))
}

/// Like [`field`], with an explicit constructor namespace.
pub fn field_expr(desc: &FieldDescriptor, namespace: &Ident) -> Result<Expr> {
    match desc.field_type {
        t if t.is_numeric() => from_simple_type(desc, namespace),
        FieldType::String | FieldType::Bool => from_simple_type(desc, namespace),
        FieldType::Enum => from_enum_type(desc, namespace),
        other => Err(SchemastError::UnsupportedType {
            type_name: other.const_name(),
        }),
    }
}

/// Recover the declared name of a field chain such as
/// `field::string("name").optional().comment("..")`.
///
/// Method calls are unwrapped down to the constructor call, whose first
/// argument must be a string literal.
pub fn extract_field_name(expr: &Expr, namespace: &Ident) -> Result<String> {
    match expr {
        Expr::MethodCall(call) => extract_field_name(&call.receiver, namespace),
        Expr::Call(call) => {
            let Expr::Path(func) = &*call.func else {
                return Err(SchemastError::not_a_field_chain("constructor is not a path"));
            };
            let segments = &func.path.segments;
            if func.qself.is_some() || segments.len() != 2 || segments[0].ident != *namespace {
                return Err(SchemastError::not_a_field_chain(format!(
                    "`{}` is not in the `{namespace}` namespace",
                    func.to_token_stream()
                )));
            }
            let Some(first) = call.args.first() else {
                return Err(SchemastError::not_a_field_chain("constructor has no name argument"));
            };
            match first {
                Expr::Lit(ExprLit { lit: Lit::Str(name), .. }) => Ok(name.value()),
                _ => Err(SchemastError::not_a_field_chain("field name is not a string literal")),
            }
        }
        other => Err(SchemastError::not_a_field_chain(format!(
            "unexpected expression `{}`",
            other.to_token_stream()
        ))),
    }
}

impl Context {
    /// Append a field to the list returned by the `fields` method of `type_name`.
    pub fn append_field(&mut self, type_name: &str, desc: &FieldDescriptor) -> Result<()> {
        let path = self.fields_method(type_name)?;
        let new_field = field_expr(desc, &self.namespace)?;
        self.append_expr(type_name, path, new_field)?;
        debug!("appended field {:?} to {type_name}", desc.name);
        Ok(())
    }

    /// Append several fields to one type. Every descriptor is synthesized
    /// before the list is touched, so either all fields land or none do.
    pub fn append_fields<'a, I>(&mut self, type_name: &str, descs: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a FieldDescriptor>,
    {
        let path = self.fields_method(type_name)?;
        let new_fields = descs
            .into_iter()
            .map(|desc| field_expr(desc, &self.namespace))
            .collect::<Result<Vec<_>>>()?;
        let count = new_fields.len();
        for new_field in new_fields {
            self.append_expr(type_name, path, new_field)?;
        }
        debug!("appended {count} fields to {type_name}");
        Ok(())
    }

    /// Append every field of a batch to its type.
    pub fn apply_batch(&mut self, batch: &FieldBatch) -> Result<()> {
        self.append_fields(&batch.type_name, &batch.fields)
    }

    /// Remove the field named `field_name` from the `fields` list of `type_name`.
    ///
    /// Removing the last element restores the `Vec::new()` placeholder.
    pub fn remove_field(&mut self, type_name: &str, field_name: &str) -> Result<()> {
        let path = self.fields_method(type_name)?;
        let namespace = self.namespace.clone();
        let returned = self.fields_return_mut(type_name, path)?;
        let mut elems = match &*returned {
            Expr::Macro(list) if is_vec_macro(list) => list_elements(type_name, list)?,
            other => {
                return Err(unexpected_shape(type_name, other, "nothing to remove from"));
            }
        };

        let mut found = None;
        for (i, elem) in elems.iter().enumerate() {
            if extract_field_name(elem, &namespace)? == field_name {
                found = Some(i);
                break;
            }
        }
        let Some(idx) = found else {
            return Err(SchemastError::FieldNotFound {
                field: field_name.to_string(),
                type_name: type_name.to_string(),
            });
        };

        elems.remove(idx);
        let original = returned.span();
        *returned = if elems.is_empty() {
            parse_quote!(Vec::new())
        } else {
            parse_quote!(vec![#(#elems),*])
        };
        self.record_edit(type_name, path, original);
        debug!("removed field {field_name:?} from {type_name}");
        Ok(())
    }

    /// Names of the fields declared by `type_name`, in declaration order.
    pub fn field_names(&self, type_name: &str) -> Result<Vec<String>> {
        let path = self.fields_method(type_name)?;
        let func = self.method(path).ok_or_else(|| method_not_found(type_name))?;
        let returned = return_value(type_name, func)?;
        match returned {
            Expr::Call(_) if is_empty_sentinel(returned) => Ok(Vec::new()),
            Expr::Macro(list) if is_vec_macro(list) => list_elements(type_name, list)?
                .iter()
                .map(|elem| extract_field_name(elem, &self.namespace))
                .collect(),
            other => Err(unexpected_shape(type_name, other, EXPECTED_LIST)),
        }
    }

    /// Resolve `fields` for `type_name` and check that its body is a single return.
    fn fields_method(&self, type_name: &str) -> Result<MethodPath> {
        let path = self.locate_method(type_name, FIELDS_METHOD)?;
        let func = self.method(path).ok_or_else(|| method_not_found(type_name))?;
        return_value(type_name, func)?;
        Ok(path)
    }

    fn fields_return_mut(&mut self, type_name: &str, path: MethodPath) -> Result<&mut Expr> {
        let func = self.method_mut(path).ok_or_else(|| method_not_found(type_name))?;
        return_value_mut(type_name, func)
    }

    fn append_expr(&mut self, type_name: &str, path: MethodPath, new_field: Expr) -> Result<()> {
        let returned = self.fields_return_mut(type_name, path)?;
        let replacement: Expr = match &*returned {
            call @ Expr::Call(_) if is_empty_sentinel(call) => parse_quote!(vec![#new_field]),
            Expr::Macro(list) if is_vec_macro(list) => {
                let mut elems = list_elements(type_name, list)?;
                elems.push(new_field);
                parse_quote!(vec![#(#elems),*])
            }
            other => return Err(unexpected_shape(type_name, other, EXPECTED_LIST)),
        };
        let original = returned.span();
        *returned = replacement;
        self.record_edit(type_name, path, original);
        Ok(())
    }
}

fn new_field_call(desc: &FieldDescriptor, namespace: &Ident) -> BuilderCall {
    let ctor = field_constructor(desc.field_type);
    let name = LitStr::new(&desc.name, Span::call_site());
    BuilderCall::new(parse_quote!(#namespace::#ctor(#name)))
}

fn from_enum_type(desc: &FieldDescriptor, namespace: &Ident) -> Result<Expr> {
    let call = from_simple_type(desc, namespace)?;
    let mut builder = BuilderCall::new(call);
    if desc.has_plain_enum_values() {
        builder.method("values", desc.enums.iter().map(|pair| str_lit(&pair.name)));
    } else {
        let args = desc
            .enums
            .iter()
            .flat_map(|pair| [str_lit(&pair.name), str_lit(&pair.value)]);
        builder.method("named_values", args);
    }
    Ok(builder.into_expr())
}

fn from_simple_type(desc: &FieldDescriptor, namespace: &Ident) -> Result<Expr> {
    let mut builder = new_field_call(desc, namespace);
    if desc.nillable {
        builder.method("nillable", []);
    }
    if desc.optional {
        builder.method("optional", []);
    }
    if desc.unique {
        builder.method("unique", []);
    }
    if desc.sensitive {
        builder.method("sensitive", []);
    }
    if desc.immutable {
        builder.method("immutable", []);
    }
    if !desc.comment.is_empty() {
        builder.method("comment", [str_lit(&desc.comment)]);
    }
    if !desc.struct_tag.is_empty() {
        builder.method("struct_tag", [str_lit(&desc.struct_tag)]);
    }
    if !desc.storage_key.is_empty() {
        builder.method("storage_key", [str_lit(&desc.storage_key)]);
    }
    if !desc.schema_type.is_empty() {
        let pairs = desc.schema_type.iter().map(|(dialect, ty)| quote!((#dialect, #ty)));
        let dialects: Expr = parse_quote!([#(#pairs),*]);
        builder.method("schema_type", [dialects]);
    }

    let unsupported = unsupported_features(desc);
    if !unsupported.is_empty() {
        return Err(SchemastError::UnsupportedFeature { features: unsupported });
    }
    Ok(builder.into_expr())
}

/// Every descriptor feature that cannot be written as a declaration.
fn unsupported_features(desc: &FieldDescriptor) -> Vec<UnsupportedFeature> {
    let mut features = Vec::new();
    if !desc.annotations.is_empty() {
        features.push(UnsupportedFeature::Annotations);
    }
    if !desc.validators.is_empty() {
        features.push(UnsupportedFeature::Validators);
    }
    if desc.default.is_some() {
        features.push(UnsupportedFeature::Default);
    }
    if desc.update_default.is_some() {
        features.push(UnsupportedFeature::UpdateDefault);
    }
    features
}

/// `TypeInt64` -> `int64`; keywords become raw identifiers (`r#enum`).
fn field_constructor(field_type: FieldType) -> Ident {
    let name = to_snake_case(field_type.const_name().trim_start_matches("Type"));
    syn::parse_str::<Ident>(&name).unwrap_or_else(|_| Ident::new_raw(&name, Span::call_site()))
}

fn str_lit(value: &str) -> Expr {
    Expr::Lit(ExprLit {
        attrs: Vec::new(),
        lit: Lit::Str(LitStr::new(value, Span::call_site())),
    })
}

pub(crate) fn return_value<'a>(type_name: &str, func: &'a ImplItemFn) -> Result<&'a Expr> {
    if func.block.stmts.len() != 1 {
        return Err(malformed(type_name, "body must have a single statement"));
    }
    match &func.block.stmts[0] {
        Stmt::Expr(Expr::Return(ret), _) => ret
            .expr
            .as_deref()
            .ok_or_else(|| malformed(type_name, "return statement has no value")),
        Stmt::Expr(expr, None) => Ok(expr),
        _ => Err(malformed(type_name, "body must contain a return statement")),
    }
}

fn return_value_mut<'a>(type_name: &str, func: &'a mut ImplItemFn) -> Result<&'a mut Expr> {
    if func.block.stmts.len() != 1 {
        return Err(malformed(type_name, "body must have a single statement"));
    }
    match &mut func.block.stmts[0] {
        Stmt::Expr(Expr::Return(ret), _) => ret
            .expr
            .as_deref_mut()
            .ok_or_else(|| malformed(type_name, "return statement has no value")),
        Stmt::Expr(expr, None) => Ok(expr),
        _ => Err(malformed(type_name, "body must contain a return statement")),
    }
}

/// `Vec::new()`, the placeholder of a type without fields.
pub(crate) fn is_empty_sentinel(expr: &Expr) -> bool {
    let Expr::Call(call) = expr else { return false };
    let Expr::Path(func) = &*call.func else { return false };
    let segments: Vec<_> = func.path.segments.iter().map(|s| &s.ident).collect();
    call.args.is_empty()
        && func.qself.is_none()
        && segments.len() == 2
        && segments[0] == "Vec"
        && segments[1] == "new"
}

pub(crate) fn is_vec_macro(list: &ExprMacro) -> bool {
    list.mac.path.is_ident("vec")
}

fn list_elements(type_name: &str, list: &ExprMacro) -> Result<Vec<Expr>> {
    list.mac
        .parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated)
        .map(|elems| elems.into_iter().collect())
        .map_err(|err| SchemastError::UnexpectedReturnShape {
            type_name: type_name.to_string(),
            found: format!("vec![..] whose elements do not parse: {err}"),
        })
}

fn unexpected_shape(type_name: &str, found: &Expr, note: &str) -> SchemastError {
    SchemastError::UnexpectedReturnShape {
        type_name: type_name.to_string(),
        found: format!("`{}` ({note})", found.to_token_stream()),
    }
}

fn malformed(type_name: &str, reason: &'static str) -> SchemastError {
    SchemastError::MalformedMethodBody {
        type_name: type_name.to_string(),
        method: FIELDS_METHOD.to_string(),
        reason,
    }
}

fn method_not_found(type_name: &str) -> SchemastError {
    SchemastError::MethodNotFound {
        type_name: type_name.to_string(),
        method: FIELDS_METHOD.to_string(),
    }
}
