//! The client-side schema model.
//!
//! A [`Schema`] is the owned, immutable representation of a GraphQL
//! service's type system as reported by introspection. It is built once
//! per fetch, shared as `Arc<Schema>` by the cache and every reader, and
//! never mutated. The shape intentionally stays close to the
//! introspection data: named types with a kind, fields in declaration
//! order, wrapped type references.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::FetchError;
use crate::introspection::response::IntrospectionField;
use crate::introspection::response::IntrospectionInputValue;
use crate::introspection::response::IntrospectionSchema;
use crate::introspection::response::IntrospectionTypeDef;
use crate::introspection::response::IntrospectionTypeKind;
use crate::introspection::response::IntrospectionTypeRef;
use crate::introspection::response::NamedTypeRef;

/// An immutable GraphQL type system.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    query_type: Option<String>,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: IndexMap<String, TypeDefinition>,
}

impl Schema {
    /// Builds a schema from explicit parts. Mostly useful to embedders
    /// and tests; fetched schemas go through [`Schema::from_introspection`].
    pub fn new(
        query_type: Option<&str>,
        mutation_type: Option<&str>,
        subscription_type: Option<&str>,
        types: Vec<TypeDefinition>,
    ) -> Self {
        Schema {
            query_type: query_type.map(str::to_owned),
            mutation_type: mutation_type.map(str::to_owned),
            subscription_type: subscription_type.map(str::to_owned),
            types: types
                .into_iter()
                .map(|def| (def.name().to_owned(), def))
                .collect(),
        }
    }

    /// Converts a raw introspection result into a schema.
    ///
    /// Structural problems (a list wrapper without an inner type, a named
    /// reference without a name) are reported as
    /// [`FetchError::MalformedResponse`].
    pub(crate) fn from_introspection(raw: IntrospectionSchema) -> Result<Self, FetchError> {
        let mut types = IndexMap::with_capacity(raw.types.len());
        for type_def in raw.types {
            if let Some(converted) = TypeDefinition::from_introspection(type_def)? {
                types.insert(converted.name().to_owned(), converted);
            }
        }
        Ok(Schema {
            query_type: raw.query_type.map(|t| t.name),
            mutation_type: raw.mutation_type.map(|t| t.name),
            subscription_type: raw.subscription_type.map(|t| t.name),
            types,
        })
    }

    /// The name of the root type for query operations.
    pub fn query_type(&self) -> Option<&str> {
        self.query_type.as_deref()
    }

    /// The name of the root type for mutation operations.
    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    /// The name of the root type for subscription operations.
    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_deref()
    }

    /// Looks up a named type.
    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// All named types, in the order the service declared them.
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A named type definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeDefinition {
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
    Scalar(ScalarType),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Object(t) => &t.name,
            TypeDefinition::Interface(t) => &t.name,
            TypeDefinition::Union(t) => &t.name,
            TypeDefinition::Enum(t) => &t.name,
            TypeDefinition::InputObject(t) => &t.name,
            TypeDefinition::Scalar(t) => &t.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            TypeDefinition::Object(t) => t.description.as_deref(),
            TypeDefinition::Interface(t) => t.description.as_deref(),
            TypeDefinition::Union(t) => t.description.as_deref(),
            TypeDefinition::Enum(t) => t.description.as_deref(),
            TypeDefinition::InputObject(t) => t.description.as_deref(),
            TypeDefinition::Scalar(t) => t.description.as_deref(),
        }
    }

    /// Output fields, for object and interface types.
    pub fn fields(&self) -> Option<&[FieldDefinition]> {
        match self {
            TypeDefinition::Object(t) => Some(&t.fields),
            TypeDefinition::Interface(t) => Some(&t.fields),
            _ => None,
        }
    }

    /// Input fields, for input object types.
    pub fn input_fields(&self) -> Option<&[InputValueDefinition]> {
        match self {
            TypeDefinition::InputObject(t) => Some(&t.input_fields),
            _ => None,
        }
    }

    /// Finds a declared output field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields()
            .and_then(|fields| fields.iter().find(|field| field.name == name))
    }

    /// Converts one introspected type. Wrapping kinds are structurally
    /// invalid at the top level; kinds this crate does not know about are
    /// dropped so the rest of the schema stays usable (lookups of such a
    /// type then behave like lookups of a missing type).
    fn from_introspection(raw: IntrospectionTypeDef) -> Result<Option<Self>, FetchError> {
        let name = raw.name;
        let description = raw.description;
        let definition = match raw.kind {
            IntrospectionTypeKind::Object => TypeDefinition::Object(ObjectType {
                name,
                description,
                fields: convert_fields(raw.fields)?,
                interfaces: named_refs(raw.interfaces),
            }),
            IntrospectionTypeKind::Interface => TypeDefinition::Interface(InterfaceType {
                name,
                description,
                fields: convert_fields(raw.fields)?,
                possible_types: named_refs(raw.possible_types),
            }),
            IntrospectionTypeKind::Union => TypeDefinition::Union(UnionType {
                name,
                description,
                possible_types: named_refs(raw.possible_types),
            }),
            IntrospectionTypeKind::Enum => TypeDefinition::Enum(EnumType {
                name,
                description,
                values: raw
                    .enum_values
                    .unwrap_or_default()
                    .into_iter()
                    .map(|value| EnumValueDefinition {
                        name: value.name,
                        description: value.description,
                        deprecation_reason: value.deprecation_reason,
                    })
                    .collect(),
            }),
            IntrospectionTypeKind::InputObject => TypeDefinition::InputObject(InputObjectType {
                name,
                description,
                input_fields: convert_input_values(raw.input_fields.unwrap_or_default())?,
            }),
            IntrospectionTypeKind::Scalar => {
                TypeDefinition::Scalar(ScalarType { name, description })
            }
            IntrospectionTypeKind::List | IntrospectionTypeKind::NonNull => {
                return Err(FetchError::MalformedResponse {
                    reason: format!("type '{name}' declared with a wrapping kind"),
                });
            }
            IntrospectionTypeKind::Unknown => return Ok(None),
        };
        Ok(Some(definition))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub possible_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub input_fields: Vec<InputValueDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

/// An output field on an object or interface type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub args: Vec<InputValueDefinition>,
    pub of_type: TypeRef,
    pub deprecation_reason: Option<String>,
}

/// An argument or input object field.
///
/// `default_value` keeps the literal source text reported by the service
/// (`"10"`, `"\"en\""`, `"[1, 2]"`), it is never parsed here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub of_type: TypeRef,
    pub default_value: Option<String>,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

/// A possibly wrapped reference to a named type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeRef {
    Named {
        kind: Option<NamedKind>,
        name: String,
    },
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(kind: NamedKind, name: &str) -> Self {
        TypeRef::Named {
            kind: Some(kind),
            name: name.to_owned(),
        }
    }

    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(inner))
    }

    fn from_introspection(raw: IntrospectionTypeRef) -> Result<Self, FetchError> {
        match raw.kind {
            IntrospectionTypeKind::List => {
                let inner = raw.of_type.ok_or_else(|| FetchError::MalformedResponse {
                    reason: "LIST wrapper without an ofType".to_string(),
                })?;
                Ok(TypeRef::List(Box::new(Self::from_introspection(*inner)?)))
            }
            IntrospectionTypeKind::NonNull => {
                let inner = raw.of_type.ok_or_else(|| FetchError::MalformedResponse {
                    reason: "NON_NULL wrapper without an ofType".to_string(),
                })?;
                Ok(TypeRef::NonNull(Box::new(Self::from_introspection(
                    *inner,
                )?)))
            }
            kind => {
                let name = raw.name.ok_or_else(|| FetchError::MalformedResponse {
                    reason: "named type reference without a name".to_string(),
                })?;
                Ok(TypeRef::Named {
                    kind: NamedKind::from_wire(kind),
                    name,
                })
            }
        }
    }
}

/// The kind of a named (non-wrapping) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NamedKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl NamedKind {
    fn from_wire(kind: IntrospectionTypeKind) -> Option<Self> {
        match kind {
            IntrospectionTypeKind::Scalar => Some(NamedKind::Scalar),
            IntrospectionTypeKind::Object => Some(NamedKind::Object),
            IntrospectionTypeKind::Interface => Some(NamedKind::Interface),
            IntrospectionTypeKind::Union => Some(NamedKind::Union),
            IntrospectionTypeKind::Enum => Some(NamedKind::Enum),
            IntrospectionTypeKind::InputObject => Some(NamedKind::InputObject),
            _ => None,
        }
    }
}

fn convert_fields(
    raw: Option<Vec<IntrospectionField>>,
) -> Result<Vec<FieldDefinition>, FetchError> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|field| {
            Ok(FieldDefinition {
                name: field.name,
                description: field.description,
                args: convert_input_values(field.args)?,
                of_type: TypeRef::from_introspection(field.of_type)?,
                deprecation_reason: field.deprecation_reason,
            })
        })
        .collect()
}

fn convert_input_values(
    raw: Vec<IntrospectionInputValue>,
) -> Result<Vec<InputValueDefinition>, FetchError> {
    raw.into_iter()
        .map(|value| {
            Ok(InputValueDefinition {
                name: value.name,
                description: value.description,
                of_type: TypeRef::from_introspection(value.of_type)?,
                default_value: value.default_value,
                deprecation_reason: value.deprecation_reason,
            })
        })
        .collect()
}

fn named_refs(raw: Option<Vec<NamedTypeRef>>) -> Vec<String> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|named| named.name)
        .collect()
}
