//! End-to-end declaration edits against in-memory schema packages.

use quote::ToTokens;
use schemast::{
    Context, FieldDescriptor, FieldType, SchemastError, UnsupportedFeature, extract_field_name,
};
use syn::{Expr, ImplItem, Item, Stmt};

const USER: &str = r#"
use ent::schema::field;
use ent::{Edge, Field, Schema};

pub struct User;

impl Schema for User {
    fn fields() -> Vec<Field> {
        vec![
            field::string("name").optional(),
            field::int("age").comment("in years"),
        ]
    }

    fn edges() -> Vec<Edge> {
        Vec::new()
    }
}
"#;

const GROUP: &str = r#"
use ent::{Edge, Field, Schema};

pub struct Group;

impl Schema for Group {
    fn fields() -> Vec<Field> {
        return Vec::new();
    }

    fn edges() -> Vec<Edge> {
        Vec::new()
    }
}
"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn context() -> Context {
    init_logging();
    Context::from_sources([("user.rs", USER), ("group.rs", GROUP)]).unwrap()
}

/// The expression returned by `<type_name>::fields()`.
fn fields_value(ctx: &Context, unit: &str) -> Expr {
    let file = ctx.file(unit).unwrap();
    for item in &file.syntax().items {
        let Item::Impl(item_impl) = item else { continue };
        for member in &item_impl.items {
            let ImplItem::Fn(func) = member else { continue };
            if func.sig.ident != "fields" {
                continue;
            }
            return match &func.block.stmts[0] {
                Stmt::Expr(Expr::Return(ret), _) => *ret.expr.clone().unwrap(),
                Stmt::Expr(expr, None) => expr.clone(),
                other => panic!("unexpected statement {}", other.to_token_stream()),
            };
        }
    }
    panic!("no fields() in {unit}");
}

fn render(expr: &Expr) -> String {
    expr.to_token_stream().to_string()
}

/// Rendered elements of a `vec![..]` list.
fn elements(expr: &Expr) -> Vec<String> {
    let Expr::Macro(list) = expr else {
        panic!("expected vec![..], got {}", render(expr));
    };
    list.mac
        .parse_body_with(syn::punctuated::Punctuated::<Expr, syn::Token![,]>::parse_terminated)
        .unwrap()
        .iter()
        .map(render)
        .collect()
}

#[test]
fn append_to_existing_list_keeps_order() {
    let mut ctx = context();
    ctx.append_field("User", &FieldDescriptor::bool("active")).unwrap();
    ctx.append_field("User", &FieldDescriptor::string("email").unique()).unwrap();

    assert_eq!(ctx.field_names("User").unwrap(), vec!["name", "age", "active", "email"]);

    let expected: Expr = syn::parse_quote! {
        vec![
            field::string("name").optional(),
            field::int("age").comment("in years"),
            field::bool("active"),
            field::string("email").unique()
        ]
    };
    assert_eq!(render(&fields_value(&ctx, "user.rs")), render(&expected));
}

#[test]
fn append_to_empty_sentinel_creates_list() {
    let mut ctx = context();
    let desc = FieldDescriptor::string("title");
    ctx.append_field("Group", &desc).unwrap();

    let Expr::Macro(list) = fields_value(&ctx, "group.rs") else {
        panic!("expected vec![..]");
    };
    assert!(list.mac.path.is_ident("vec"));
    let elems = list
        .mac
        .parse_body_with(syn::punctuated::Punctuated::<Expr, syn::Token![,]>::parse_terminated)
        .unwrap();
    assert_eq!(elems.len(), 1);
    assert_eq!(extract_field_name(&elems[0], ctx.namespace()).unwrap(), desc.name);
}

#[test]
fn append_then_remove_restores_list() {
    let mut ctx = context();
    let before = elements(&fields_value(&ctx, "user.rs"));

    ctx.append_field("User", &FieldDescriptor::enumeration("status", ["on", "off"]))
        .unwrap();
    assert_eq!(ctx.field_names("User").unwrap().len(), 3);
    ctx.remove_field("User", "status").unwrap();

    assert_eq!(elements(&fields_value(&ctx, "user.rs")), before);
}

#[test]
fn append_then_remove_on_sentinel_restores_sentinel() {
    let mut ctx = context();
    ctx.append_field("Group", &FieldDescriptor::int("size")).unwrap();
    ctx.remove_field("Group", "size").unwrap();

    assert_eq!(render(&fields_value(&ctx, "group.rs")), render(&syn::parse_quote!(Vec::new())));
    assert!(ctx.field_names("Group").unwrap().is_empty());
}

#[test]
fn remove_middle_field_keeps_siblings() {
    let mut ctx = context();
    ctx.append_field("User", &FieldDescriptor::bool("admin")).unwrap();
    ctx.remove_field("User", "age").unwrap();
    assert_eq!(ctx.field_names("User").unwrap(), vec!["name", "admin"]);
}

#[test]
fn remove_missing_field_leaves_list_unchanged() {
    let mut ctx = context();
    let before = render(&fields_value(&ctx, "user.rs"));

    let err = ctx.remove_field("User", "nickname").unwrap_err();
    assert!(matches!(
        &err,
        SchemastError::FieldNotFound { field, type_name }
            if field == "nickname" && type_name == "User"
    ));
    assert_eq!(render(&fields_value(&ctx, "user.rs")), before);
    assert!(ctx.render().is_empty());
}

#[test]
fn remove_from_sentinel_fails() {
    let mut ctx = context();
    assert!(matches!(
        ctx.remove_field("Group", "title"),
        Err(SchemastError::UnexpectedReturnShape { .. })
    ));
}

#[test]
fn remove_matches_after_modifiers() {
    let mut ctx = context();
    let desc = FieldDescriptor::named_enumeration("level", [("Low", "low")])
        .nillable()
        .immutable()
        .storage_key("lvl")
        .schema_type("postgres", "text");
    ctx.append_field("User", &desc).unwrap();
    ctx.remove_field("User", "level").unwrap();
    assert_eq!(ctx.field_names("User").unwrap(), vec!["name", "age"]);
}

#[test]
fn failed_synthesis_does_not_touch_list() {
    let mut ctx = context();
    let before = render(&fields_value(&ctx, "user.rs"));

    let mut desc = FieldDescriptor::string("slug");
    desc.annotations.push("entgql".into());
    desc.default = Some("\"\"".into());
    let err = ctx.append_field("User", &desc).unwrap_err();

    let SchemastError::UnsupportedFeature { features } = &err else {
        panic!("expected unsupported feature, got {err}");
    };
    assert_eq!(features, &[UnsupportedFeature::Annotations, UnsupportedFeature::Default]);
    assert_eq!(
        err.to_string(),
        "unsupported features: Descriptor.Annotations, Descriptor.Default"
    );
    assert_eq!(render(&fields_value(&ctx, "user.rs")), before);

    let err = ctx
        .append_field("User", &FieldDescriptor::new("created_at", FieldType::Time))
        .unwrap_err();
    assert!(matches!(err, SchemastError::UnsupportedType { type_name: "TypeTime" }));
    assert_eq!(render(&fields_value(&ctx, "user.rs")), before);
}

#[test]
fn batch_append_is_all_or_nothing() {
    let mut ctx = context();
    let mut bad = FieldDescriptor::int("score");
    bad.validators.push("positive".into());
    let batch = [FieldDescriptor::string("nickname"), bad];

    assert!(ctx.append_fields("User", &batch).is_err());
    assert_eq!(ctx.field_names("User").unwrap(), vec!["name", "age"]);

    let good = [FieldDescriptor::string("nickname"), FieldDescriptor::int("score")];
    ctx.append_fields("Group", &good).unwrap();
    assert_eq!(ctx.field_names("Group").unwrap(), vec!["nickname", "score"]);
}

#[test]
fn malformed_bodies_are_rejected() {
    let source = r#"
        pub struct Multi;
        impl Schema for Multi {
            fn fields() -> Vec<Field> {
                let fields = Vec::new();
                fields
            }
        }

        pub struct Bare;
        impl Schema for Bare {
            fn fields() -> Vec<Field> {
                vec![field::string("a")];
            }
        }

        pub struct Empty;
        impl Schema for Empty {
            fn fields() -> Vec<Field> {
                return;
            }
        }
    "#;
    let mut ctx = Context::from_sources([("bad.rs", source)]).unwrap();

    for type_name in ["Multi", "Bare", "Empty"] {
        assert!(
            matches!(
                ctx.append_field(type_name, &FieldDescriptor::string("x")),
                Err(SchemastError::MalformedMethodBody { .. })
            ),
            "{type_name} was accepted"
        );
        assert!(matches!(
            ctx.remove_field(type_name, "a"),
            Err(SchemastError::MalformedMethodBody { .. })
        ));
    }
}

#[test]
fn unexpected_return_shape() {
    let source = r#"
        pub struct Odd;
        impl Schema for Odd {
            fn fields() -> Vec<Field> {
                base_fields()
            }
        }
    "#;
    let mut ctx = Context::from_sources([("odd.rs", source)]).unwrap();
    assert!(matches!(
        ctx.append_field("Odd", &FieldDescriptor::string("x")),
        Err(SchemastError::UnexpectedReturnShape { .. })
    ));
}

#[test]
fn foreign_list_element_is_not_a_field_chain() {
    let source = r#"
        pub struct Mixed;
        impl Schema for Mixed {
            fn fields() -> Vec<Field> {
                vec![mixin::timestamps(), field::string("name")]
            }
        }
    "#;
    let mut ctx = Context::from_sources([("mixed.rs", source)]).unwrap();
    assert!(matches!(
        ctx.remove_field("Mixed", "name"),
        Err(SchemastError::NotAFieldChain { .. })
    ));
    assert!(ctx.append_field("Mixed", &FieldDescriptor::bool("ok")).is_ok());
}

#[test]
fn unknown_type_and_method() {
    let mut ctx = Context::from_sources([("misc.rs", "pub struct Loose;")]).unwrap();
    assert!(matches!(
        ctx.append_field("Ghost", &FieldDescriptor::string("x")),
        Err(SchemastError::TypeNotFound { .. })
    ));
    assert!(matches!(
        ctx.remove_field("Loose", "x"),
        Err(SchemastError::MethodNotFound { .. })
    ));
}

#[test]
fn scaffolded_type_accepts_fields() {
    let mut ctx = context();
    ctx.add_type("Pet").unwrap();

    assert_eq!(render(&fields_value(&ctx, "pet.rs")), render(&syn::parse_quote!(Vec::new())));

    ctx.append_field("Pet", &FieldDescriptor::string("name")).unwrap();
    assert_eq!(ctx.field_names("Pet").unwrap(), vec!["name"]);

    let rendered = ctx.render();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].0, "pet.rs");
    assert!(rendered[0].1.contains("pub struct Pet;"));
    assert!(rendered[0].1.contains(r#"field::string("name")"#));
}

#[test]
fn custom_namespace_round_trip() {
    let source = r#"
        pub struct Row;
        impl Schema for Row {
            fn fields() -> Vec<Field> {
                vec![col::string("id")]
            }
        }
    "#;
    let mut ctx = Context::from_sources([("row.rs", source)])
        .unwrap()
        .with_namespace("col")
        .unwrap();
    ctx.append_field("Row", &FieldDescriptor::int("n").optional()).unwrap();
    assert_eq!(ctx.field_names("Row").unwrap(), vec!["id", "n"]);
    ctx.remove_field("Row", "id").unwrap();
    assert_eq!(ctx.field_names("Row").unwrap(), vec!["n"]);
}
