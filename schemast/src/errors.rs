use std::fmt;

use thiserror::Error;

/// Error type returned by declaration synthesis and editing.
#[derive(Debug, Error)]
pub enum SchemastError {
    /// The descriptor's type cannot be expressed as a declaration.
    #[error("unsupported type {type_name}")]
    UnsupportedType { type_name: &'static str },

    /// One or more descriptor features cannot be expressed as a declaration.
    #[error("unsupported features: {}", join_features(.features))]
    UnsupportedFeature { features: Vec<UnsupportedFeature> },

    /// The schema type is not declared in the package.
    #[error("type {type_name:?} not found")]
    TypeNotFound { type_name: String },

    /// The schema type declares no method with the requested name.
    #[error("method {method}() not found on type {type_name:?}")]
    MethodNotFound { type_name: String, method: String },

    /// The method body is not a single return statement.
    #[error("{method}() body of {type_name:?} must be a single return statement: {reason}")]
    MalformedMethodBody {
        type_name: String,
        method: String,
        reason: &'static str,
    },

    /// The returned value is neither `Vec::new()` nor a `vec![..]` literal.
    #[error("unexpected return value in {type_name:?}: {found}")]
    UnexpectedReturnShape { type_name: String, found: String },

    /// A list element is not a `field::<ctor>("name")` chain.
    #[error("expected field declaration of form field::<type>(\"name\"): {reason}")]
    NotAFieldChain { reason: String },

    /// No declaration with the requested name exists.
    #[error("could not find field {field:?} in type {type_name:?}")]
    FieldNotFound { field: String, type_name: String },

    /// A scaffolded type or source unit name is already taken.
    #[error("name {name:?} is already registered")]
    NameCollision { name: String },

    /// Generated source failed to parse.
    #[error(transparent)]
    ParseFailure(#[from] syn::Error),
}

impl SchemastError {
    pub(crate) fn not_a_field_chain(reason: impl Into<String>) -> Self {
        SchemastError::NotAFieldChain { reason: reason.into() }
    }
}

/// Descriptor features rejected during synthesis, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnsupportedFeature {
    Annotations,
    Validators,
    Default,
    UpdateDefault,
}

impl UnsupportedFeature {
    pub fn as_str(self) -> &'static str {
        match self {
            UnsupportedFeature::Annotations => "Descriptor.Annotations",
            UnsupportedFeature::Validators => "Descriptor.Validators",
            UnsupportedFeature::Default => "Descriptor.Default",
            UnsupportedFeature::UpdateDefault => "Descriptor.UpdateDefault",
        }
    }
}

impl fmt::Display for UnsupportedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn join_features(features: &[UnsupportedFeature]) -> String {
    features.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
}

pub type Result<T> = std::result::Result<T, SchemastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_feature_message_lists_all() {
        let err = SchemastError::UnsupportedFeature {
            features: vec![UnsupportedFeature::Validators, UnsupportedFeature::UpdateDefault],
        };
        assert_eq!(
            err.to_string(),
            "unsupported features: Descriptor.Validators, Descriptor.UpdateDefault"
        );
    }

    #[test]
    fn test_field_not_found_message() {
        let err = SchemastError::FieldNotFound {
            field: "age".into(),
            type_name: "User".into(),
        };
        assert_eq!(err.to_string(), r#"could not find field "age" in type "User""#);
    }
}
