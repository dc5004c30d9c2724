//! Wire-format types for the standard introspection response.
//!
//! These mirror the JSON produced by a GraphQL service answering the
//! introspection query and exist only long enough to be converted into a
//! [`crate::schema::Schema`]. Unknown fields are ignored so services that
//! expose extensions keep deserializing.

use serde::Deserialize;

/// Top-level envelope of a GraphQL response to the introspection query.
#[derive(Debug, Deserialize)]
pub(crate) struct IntrospectionResponse {
    pub(crate) data: Option<IntrospectionData>,
    #[serde(default)]
    pub(crate) errors: Vec<GraphqlError>,
}

/// A GraphQL-level error entry. Only the message is of interest here.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlError {
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IntrospectionData {
    #[serde(rename = "__schema")]
    pub(crate) schema: Option<IntrospectionSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntrospectionSchema {
    pub(crate) query_type: Option<NamedTypeRef>,
    pub(crate) mutation_type: Option<NamedTypeRef>,
    pub(crate) subscription_type: Option<NamedTypeRef>,
    #[serde(default)]
    pub(crate) types: Vec<IntrospectionTypeDef>,
}

/// A reference to a named type, as found in `queryType`, `interfaces` and
/// `possibleTypes` lists.
#[derive(Debug, Deserialize)]
pub(crate) struct NamedTypeRef {
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntrospectionTypeDef {
    pub(crate) kind: IntrospectionTypeKind,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) fields: Option<Vec<IntrospectionField>>,
    pub(crate) input_fields: Option<Vec<IntrospectionInputValue>>,
    pub(crate) interfaces: Option<Vec<NamedTypeRef>>,
    pub(crate) enum_values: Option<Vec<IntrospectionEnumValue>>,
    pub(crate) possible_types: Option<Vec<NamedTypeRef>>,
}

/// Introspection `__TypeKind`, including the two wrapping kinds.
///
/// Kinds added by future drafts of the GraphQL specification fold into
/// `Unknown` instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum IntrospectionTypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntrospectionField {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) args: Vec<IntrospectionInputValue>,
    #[serde(rename = "type")]
    pub(crate) of_type: IntrospectionTypeRef,
    pub(crate) deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntrospectionInputValue {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    #[serde(rename = "type")]
    pub(crate) of_type: IntrospectionTypeRef,
    pub(crate) default_value: Option<String>,
    pub(crate) deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntrospectionEnumValue {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) deprecation_reason: Option<String>,
}

/// A possibly wrapped type reference: the `kind`/`name`/`ofType` nesting
/// produced by the `TypeRef` fragment of the introspection query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntrospectionTypeRef {
    pub(crate) kind: IntrospectionTypeKind,
    pub(crate) name: Option<String>,
    pub(crate) of_type: Option<Box<IntrospectionTypeRef>>,
}
