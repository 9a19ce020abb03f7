//! Field descriptors: the structured input from which declarations are synthesized.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field type categories known to the schema runtime.
///
/// Only numeric types, `String`, `Bool` and `Enum` can be turned back into
/// declarations; the rest exist so callers can describe every field they see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Bool,
    Time,
    Json,
    Uuid,
    Bytes,
    Enum,
    String,
    Other,
    Int8,
    Int16,
    Int32,
    Int,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint,
    Uint64,
    Float32,
    Float64,
}

impl FieldType {
    /// Canonical constant name of the type (e.g. `TypeInt64`).
    pub fn const_name(self) -> &'static str {
        match self {
            FieldType::Bool => "TypeBool",
            FieldType::Time => "TypeTime",
            FieldType::Json => "TypeJSON",
            FieldType::Uuid => "TypeUUID",
            FieldType::Bytes => "TypeBytes",
            FieldType::Enum => "TypeEnum",
            FieldType::String => "TypeString",
            FieldType::Other => "TypeOther",
            FieldType::Int8 => "TypeInt8",
            FieldType::Int16 => "TypeInt16",
            FieldType::Int32 => "TypeInt32",
            FieldType::Int => "TypeInt",
            FieldType::Int64 => "TypeInt64",
            FieldType::Uint8 => "TypeUint8",
            FieldType::Uint16 => "TypeUint16",
            FieldType::Uint32 => "TypeUint32",
            FieldType::Uint => "TypeUint",
            FieldType::Uint64 => "TypeUint64",
            FieldType::Float32 => "TypeFloat32",
            FieldType::Float64 => "TypeFloat64",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldType::Int8
                | FieldType::Int16
                | FieldType::Int32
                | FieldType::Int
                | FieldType::Int64
                | FieldType::Uint8
                | FieldType::Uint16
                | FieldType::Uint32
                | FieldType::Uint
                | FieldType::Uint64
                | FieldType::Float32
                | FieldType::Float64
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.const_name())
    }
}

/// One enum member: the name used in code and the value stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumPair {
    pub name: String,
    pub value: String,
}

impl EnumPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Complete description of a single schema field.
///
/// Empty strings, empty collections and `None` all mean "not set".
/// `annotations`, `validators`, `default` and `update_default` cannot be
/// expressed as declarations; setting any of them makes synthesis fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nillable: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub immutable: bool,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub struct_tag: String,
    #[serde(default)]
    pub storage_key: String,
    /// Storage dialect name mapped to a dialect specific column type.
    #[serde(default)]
    pub schema_type: BTreeMap<String, String>,
    #[serde(default)]
    pub enums: Vec<EnumPair>,

    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub validators: Vec<String>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub update_default: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nillable: false,
            optional: false,
            unique: false,
            sensitive: false,
            immutable: false,
            comment: String::new(),
            struct_tag: String::new(),
            storage_key: String::new(),
            schema_type: BTreeMap::new(),
            enums: Vec::new(),
            annotations: Vec::new(),
            validators: Vec::new(),
            default: None,
            update_default: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    /// Enum field whose members use the same name and value.
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let enums = values
            .into_iter()
            .map(|v| {
                let v = v.into();
                EnumPair::new(v.clone(), v)
            })
            .collect();
        Self {
            enums,
            ..Self::new(name, FieldType::Enum)
        }
    }

    /// Enum field with explicit `(name, value)` members.
    pub fn named_enumeration<I, N, V>(name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let enums = pairs.into_iter().map(|(n, v)| EnumPair::new(n, v)).collect();
        Self {
            enums,
            ..Self::new(name, FieldType::Enum)
        }
    }

    pub fn nillable(mut self) -> Self {
        self.nillable = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn struct_tag(mut self, tag: impl Into<String>) -> Self {
        self.struct_tag = tag.into();
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Override the column type for one storage dialect.
    pub fn schema_type(mut self, dialect: impl Into<String>, ty: impl Into<String>) -> Self {
        self.schema_type.insert(dialect.into(), ty.into());
        self
    }

    /// True when every enum member has identical name and value.
    pub fn has_plain_enum_values(&self) -> bool {
        self.enums.iter().all(|pair| pair.name == pair.value)
    }
}

/// Fields to append to one type, as read from TOML:
///
/// ```toml
/// type = "User"
///
/// [[field]]
/// name = "age"
/// type = "int"
/// optional = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBatch {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldDescriptor>,
}

impl FieldBatch {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
