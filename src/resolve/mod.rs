//! Pure type resolution: from a schema and a navigation path to
//! display-ready field metadata.
//!
//! Nothing here performs I/O or holds state; every function is a plain
//! computation over [`Schema`] values, cheap enough to rerun on each
//! navigation change instead of caching results.

use serde::Serialize;

use crate::navigation::NavigationStack;
use crate::schema::FieldDefinition;
use crate::schema::InputValueDefinition;
use crate::schema::Schema;
use crate::schema::TypeDefinition;
use crate::schema::TypeRef;

/// Display-ready metadata for one field, argument, or input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetaInfo {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    /// The bare named type, e.g. `Post` for a field typed `[Post!]!`.
    pub field_type: Option<String>,
    /// The wrapped type as GraphQL displays it, e.g. `[Post!]!`.
    pub display_type: String,
    /// Literal source text of the default value, when one is declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// The navigable classification of a named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Object,
    Input,
    Interface,
    Union,
    Scalar,
    Enum,
}

/// [`FieldMetaInfo`] extended with navigability flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDetailBasicInfo {
    #[serde(flatten)]
    pub meta: FieldMetaInfo,
    /// True when the type has no sub-fields to drill into.
    pub is_leaf_type: bool,
    /// `None` when the type is missing from the current schema.
    pub field_kind: Option<FieldKind>,
}

/// Everything the detail pane needs for the current navigation focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCompleteDetails {
    pub info: FieldDetailBasicInfo,
    pub argument_lists: Vec<FieldMetaInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalar_info: Option<FieldMetaInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_fields: Option<Vec<FieldMetaInfo>>,
    pub output_fields: Vec<FieldMetaInfo>,
}

/// A root operation group (Query / Mutation / Subscription) with its
/// entry-point fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSection {
    pub name: String,
    pub description: String,
    pub fields: Vec<FieldMetaInfo>,
}

/// A wrapped type reduced to its bare name and display string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrappedType<'a> {
    pub name: &'a str,
    pub display: String,
}

/// Strips List/NonNull wrappers, producing both the bare named type and
/// the exact GraphQL display syntax (`[String!]!` and the like).
pub fn unwrap_type(of_type: &TypeRef) -> UnwrappedType<'_> {
    UnwrappedType {
        name: bare_name(of_type),
        display: display_type(of_type),
    }
}

fn bare_name(of_type: &TypeRef) -> &str {
    match of_type {
        TypeRef::Named { name, .. } => name,
        TypeRef::List(inner) | TypeRef::NonNull(inner) => bare_name(inner),
    }
}

fn display_type(of_type: &TypeRef) -> String {
    match of_type {
        TypeRef::Named { name, .. } => name.clone(),
        TypeRef::List(inner) => format!("[{}]", display_type(inner)),
        TypeRef::NonNull(inner) => format!("{}!", display_type(inner)),
    }
}

/// Maps a type definition to its navigable classification.
pub fn classify(definition: &TypeDefinition) -> FieldKind {
    match definition {
        TypeDefinition::Object(_) => FieldKind::Object,
        TypeDefinition::Interface(_) => FieldKind::Interface,
        TypeDefinition::Union(_) => FieldKind::Union,
        TypeDefinition::Enum(_) => FieldKind::Enum,
        TypeDefinition::InputObject(_) => FieldKind::Input,
        TypeDefinition::Scalar(_) => FieldKind::Scalar,
    }
}

/// Classification by name; `None` when the schema has no such type.
pub fn kind_of(schema: &Schema, name: &str) -> Option<FieldKind> {
    schema.get_type(name).map(classify)
}

/// Leaves (scalars and enums) have no child fields to navigate into.
pub fn is_leaf(kind: Option<FieldKind>) -> bool {
    matches!(kind, Some(FieldKind::Scalar | FieldKind::Enum))
}

/// One metadata record per declared output field, in declaration order.
pub fn output_fields_of(definition: &TypeDefinition) -> Vec<FieldMetaInfo> {
    definition
        .fields()
        .map(|fields| fields.iter().map(field_meta).collect())
        .unwrap_or_default()
}

/// One metadata record per argument of a field, in declaration order.
pub fn arguments_of(field: &FieldDefinition) -> Vec<FieldMetaInfo> {
    field.args.iter().map(input_value_meta).collect()
}

/// One metadata record per input field of an input object type.
pub fn input_fields_of(definition: &TypeDefinition) -> Vec<FieldMetaInfo> {
    definition
        .input_fields()
        .map(|fields| fields.iter().map(input_value_meta).collect())
        .unwrap_or_default()
}

fn field_meta(field: &FieldDefinition) -> FieldMetaInfo {
    let unwrapped = unwrap_type(&field.of_type);
    FieldMetaInfo {
        name: field.name.clone(),
        description: field.description.clone(),
        deprecation_reason: field.deprecation_reason.clone(),
        field_type: Some(unwrapped.name.to_owned()),
        display_type: unwrapped.display,
        default_value: None,
    }
}

fn input_value_meta(value: &InputValueDefinition) -> FieldMetaInfo {
    let unwrapped = unwrap_type(&value.of_type);
    FieldMetaInfo {
        name: value.name.clone(),
        description: value.description.clone(),
        deprecation_reason: value.deprecation_reason.clone(),
        field_type: Some(unwrapped.name.to_owned()),
        display_type: unwrapped.display,
        default_value: value.default_value.clone(),
    }
}

/// Resolves the complete detail view for the navigation stack's focus.
///
/// A focus whose type has disappeared from the schema (it was refetched
/// and the type removed) degrades to a details object with
/// `field_kind: None` and empty lists; callers render that as an
/// unknown-type state instead of crashing.
pub fn resolve_complete_details(schema: &Schema, stack: &NavigationStack) -> FieldCompleteDetails {
    let Some(current) = stack.last() else {
        return unknown_details(FieldMetaInfo {
            name: String::new(),
            description: None,
            deprecation_reason: None,
            field_type: None,
            display_type: String::new(),
            default_value: None,
        });
    };

    // When the focus denotes a field (rather than a bare type), its
    // declaration lives on the parent frame's type.
    let parent_field = stack
        .parent()
        .and_then(|parent| schema.get_type(&parent.type_name))
        .and_then(|parent_type| parent_type.get_field(&current.name));

    let Some(definition) = schema.get_type(&current.type_name) else {
        return unknown_details(FieldMetaInfo {
            name: current.name.clone(),
            description: parent_field.and_then(|field| field.description.clone()),
            deprecation_reason: parent_field.and_then(|field| field.deprecation_reason.clone()),
            field_type: Some(current.type_name.clone()),
            display_type: current.display_type.clone(),
            default_value: None,
        });
    };

    let kind = classify(definition);
    let info = FieldDetailBasicInfo {
        meta: FieldMetaInfo {
            name: current.name.clone(),
            description: parent_field
                .and_then(|field| field.description.clone())
                .or_else(|| definition.description().map(str::to_owned)),
            deprecation_reason: parent_field.and_then(|field| field.deprecation_reason.clone()),
            field_type: Some(current.type_name.clone()),
            display_type: current.display_type.clone(),
            default_value: None,
        },
        is_leaf_type: is_leaf(Some(kind)),
        field_kind: Some(kind),
    };
    match kind {
        FieldKind::Scalar => FieldCompleteDetails {
            info,
            argument_lists: Vec::new(),
            scalar_info: Some(FieldMetaInfo {
                name: definition.name().to_owned(),
                description: definition.description().map(str::to_owned),
                deprecation_reason: None,
                field_type: Some(definition.name().to_owned()),
                display_type: definition.name().to_owned(),
                default_value: None,
            }),
            input_fields: None,
            output_fields: Vec::new(),
        },
        FieldKind::Object | FieldKind::Interface => FieldCompleteDetails {
            info,
            // A field's arguments only make sense when the focus denotes
            // a field; a bare type at the root has none.
            argument_lists: parent_field.map(arguments_of).unwrap_or_default(),
            scalar_info: None,
            input_fields: None,
            output_fields: output_fields_of(definition),
        },
        FieldKind::Input => FieldCompleteDetails {
            info,
            argument_lists: Vec::new(),
            scalar_info: None,
            input_fields: Some(input_fields_of(definition)),
            output_fields: Vec::new(),
        },
        FieldKind::Union | FieldKind::Enum => FieldCompleteDetails {
            info,
            argument_lists: Vec::new(),
            scalar_info: None,
            input_fields: None,
            output_fields: Vec::new(),
        },
    }
}

fn unknown_details(meta: FieldMetaInfo) -> FieldCompleteDetails {
    FieldCompleteDetails {
        info: FieldDetailBasicInfo {
            meta,
            is_leaf_type: false,
            field_kind: None,
        },
        argument_lists: Vec::new(),
        scalar_info: None,
        input_fields: None,
        output_fields: Vec::new(),
    }
}

/// The root documentation view: one section per declared root operation
/// type, listing its entry-point fields.
pub fn operations_overview(schema: &Schema) -> Vec<OperationSection> {
    let sections = [
        ("Query", schema.query_type(), "GraphQL query operations"),
        (
            "Mutation",
            schema.mutation_type(),
            "GraphQL mutation operations",
        ),
        (
            "Subscription",
            schema.subscription_type(),
            "GraphQL subscription operations",
        ),
    ];

    sections
        .into_iter()
        .filter_map(|(name, type_name, description)| {
            let definition = schema.get_type(type_name?)?;
            Some(OperationSection {
                name: name.to_owned(),
                description: description.to_owned(),
                fields: output_fields_of(definition),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::EnumType;
    use crate::schema::EnumValueDefinition;
    use crate::schema::InputObjectType;
    use crate::schema::NamedKind;
    use crate::schema::ObjectType;
    use crate::schema::ScalarType;
    use crate::schema::UnionType;

    fn string_ref() -> TypeRef {
        TypeRef::named(NamedKind::Scalar, "String")
    }

    fn blog_schema() -> Schema {
        Schema::new(
            Some("Query"),
            Some("Mutation"),
            None,
            vec![
                TypeDefinition::Object(ObjectType {
                    name: "Query".to_string(),
                    description: Some("The root query type".to_string()),
                    fields: vec![
                        FieldDefinition {
                            name: "posts".to_string(),
                            description: Some("All published posts".to_string()),
                            args: vec![InputValueDefinition {
                                name: "first".to_string(),
                                description: Some("Page size".to_string()),
                                of_type: TypeRef::named(NamedKind::Scalar, "Int"),
                                default_value: Some("10".to_string()),
                                deprecation_reason: None,
                            }],
                            of_type: TypeRef::non_null(TypeRef::list(TypeRef::non_null(
                                TypeRef::named(NamedKind::Object, "Post"),
                            ))),
                            deprecation_reason: None,
                        },
                        FieldDefinition {
                            name: "search".to_string(),
                            description: None,
                            args: vec![InputValueDefinition {
                                name: "term".to_string(),
                                description: None,
                                of_type: TypeRef::non_null(string_ref()),
                                default_value: None,
                                deprecation_reason: None,
                            }],
                            of_type: TypeRef::named(NamedKind::Union, "SearchResult"),
                            deprecation_reason: None,
                        },
                    ],
                    interfaces: Vec::new(),
                }),
                TypeDefinition::Object(ObjectType {
                    name: "Mutation".to_string(),
                    description: None,
                    fields: vec![FieldDefinition {
                        name: "createPost".to_string(),
                        description: None,
                        args: vec![InputValueDefinition {
                            name: "input".to_string(),
                            description: None,
                            of_type: TypeRef::non_null(TypeRef::named(
                                NamedKind::InputObject,
                                "PostInput",
                            )),
                            default_value: None,
                            deprecation_reason: None,
                        }],
                        of_type: TypeRef::named(NamedKind::Object, "Post"),
                        deprecation_reason: None,
                    }],
                    interfaces: Vec::new(),
                }),
                TypeDefinition::Object(ObjectType {
                    name: "Post".to_string(),
                    description: None,
                    fields: vec![
                        FieldDefinition {
                            name: "id".to_string(),
                            description: None,
                            args: Vec::new(),
                            of_type: TypeRef::non_null(TypeRef::named(NamedKind::Scalar, "ID")),
                            deprecation_reason: None,
                        },
                        FieldDefinition {
                            name: "title".to_string(),
                            description: None,
                            args: Vec::new(),
                            of_type: string_ref(),
                            deprecation_reason: Some("Use headline instead".to_string()),
                        },
                    ],
                    interfaces: Vec::new(),
                }),
                TypeDefinition::InputObject(InputObjectType {
                    name: "PostInput".to_string(),
                    description: None,
                    input_fields: vec![InputValueDefinition {
                        name: "title".to_string(),
                        description: None,
                        of_type: TypeRef::non_null(string_ref()),
                        default_value: None,
                        deprecation_reason: None,
                    }],
                }),
                TypeDefinition::Union(UnionType {
                    name: "SearchResult".to_string(),
                    description: None,
                    possible_types: vec!["Post".to_string()],
                }),
                TypeDefinition::Enum(EnumType {
                    name: "Visibility".to_string(),
                    description: None,
                    values: vec![EnumValueDefinition {
                        name: "PUBLIC".to_string(),
                        description: None,
                        deprecation_reason: None,
                    }],
                }),
                TypeDefinition::Scalar(ScalarType {
                    name: "String".to_string(),
                    description: Some("Built-in String".to_string()),
                }),
            ],
        )
    }

    fn stack_of(entries: &[(&str, &str, &str)]) -> NavigationStack {
        let schema = blog_schema();
        let mut stack = NavigationStack::root_for(&schema);
        for (name, type_name, display_type) in entries.iter().skip(1) {
            stack = stack.push_child(
                &schema,
                &FieldMetaInfo {
                    name: (*name).to_owned(),
                    description: None,
                    deprecation_reason: None,
                    field_type: Some((*type_name).to_owned()),
                    display_type: (*display_type).to_owned(),
                    default_value: None,
                },
            );
        }
        stack
    }

    #[test]
    fn unwrap_reconstructs_graphql_display_syntax() {
        let wrapped = TypeRef::non_null(TypeRef::list(TypeRef::non_null(string_ref())));
        let unwrapped = unwrap_type(&wrapped);
        assert_eq!(unwrapped.name, "String");
        assert_eq!(unwrapped.display, "[String!]!");

        assert_eq!(unwrap_type(&string_ref()).display, "String");
        assert_eq!(
            unwrap_type(&TypeRef::list(TypeRef::list(string_ref()))).display,
            "[[String]]"
        );
        assert_eq!(
            unwrap_type(&TypeRef::non_null(TypeRef::list(string_ref()))).display,
            "[String]!"
        );
    }

    #[test]
    fn scalars_and_enums_are_the_only_leaves() {
        let schema = blog_schema();
        assert!(is_leaf(kind_of(&schema, "String")));
        assert!(is_leaf(kind_of(&schema, "Visibility")));

        assert!(!is_leaf(kind_of(&schema, "Post")));
        assert!(!is_leaf(kind_of(&schema, "PostInput")));
        assert!(!is_leaf(kind_of(&schema, "SearchResult")));
        // missing type: not a leaf, not navigable either
        assert!(!is_leaf(kind_of(&schema, "Ghost")));
    }

    #[test]
    fn output_fields_keep_declaration_order() {
        let schema = blog_schema();
        let post = schema.get_type("Post").expect("Post exists");

        let fields = output_fields_of(post);
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title"]);
        assert_eq!(fields[0].display_type, "ID!");
        assert_eq!(
            fields[1].deprecation_reason.as_deref(),
            Some("Use headline instead")
        );
    }

    #[test]
    fn arguments_carry_default_values_as_source_text() {
        let schema = blog_schema();
        let posts = schema
            .get_type("Query")
            .and_then(|t| t.get_field("posts"))
            .expect("posts field exists");

        let args = arguments_of(posts);
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].name, "first");
        assert_eq!(args[0].default_value.as_deref(), Some("10"));
        assert_eq!(args[0].display_type, "Int");
    }

    #[test]
    fn details_for_an_object_field_include_arguments_and_fields() {
        let schema = blog_schema();
        let stack = stack_of(&[("Query", "Query", "Query"), ("posts", "Post", "[Post!]!")]);

        let details = resolve_complete_details(&schema, &stack);

        assert_eq!(details.info.field_kind, Some(FieldKind::Object));
        assert!(!details.info.is_leaf_type);
        assert_eq!(
            details.info.meta.description.as_deref(),
            Some("All published posts")
        );
        assert_eq!(details.info.meta.display_type, "[Post!]!");
        assert_eq!(details.argument_lists.len(), 1);
        assert_eq!(details.argument_lists[0].name, "first");
        assert_eq!(details.output_fields.len(), 2);
        assert!(details.scalar_info.is_none());
        assert!(details.input_fields.is_none());
    }

    #[test]
    fn details_for_the_root_type_have_no_argument_list() {
        let schema = blog_schema();
        let stack = NavigationStack::root_for(&schema);

        let details = resolve_complete_details(&schema, &stack);

        assert_eq!(details.info.field_kind, Some(FieldKind::Object));
        assert_eq!(
            details.info.meta.description.as_deref(),
            Some("The root query type")
        );
        assert!(details.argument_lists.is_empty());
        let names: Vec<&str> = details
            .output_fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["posts", "search"]);
    }

    #[test]
    fn details_for_an_input_type_list_its_input_fields() {
        let schema = blog_schema();
        // breadcrumb path as built when drilling into a mutation argument
        let stack = NavigationStack::root_for(&schema).push_child(
            &schema,
            &FieldMetaInfo {
                name: "input".to_string(),
                description: None,
                deprecation_reason: None,
                field_type: Some("PostInput".to_string()),
                display_type: "PostInput!".to_string(),
                default_value: None,
            },
        );

        let details = resolve_complete_details(&schema, &stack);

        assert_eq!(details.info.field_kind, Some(FieldKind::Input));
        let input_fields = details.input_fields.expect("input fields are present");
        assert_eq!(input_fields.len(), 1);
        assert_eq!(input_fields[0].name, "title");
        assert_eq!(input_fields[0].display_type, "String!");
        assert!(details.output_fields.is_empty());
    }

    #[test]
    fn details_for_a_union_carry_info_only() {
        let schema = blog_schema();
        let stack = stack_of(&[
            ("Query", "Query", "Query"),
            ("search", "SearchResult", "SearchResult"),
        ]);

        let details = resolve_complete_details(&schema, &stack);

        assert_eq!(details.info.field_kind, Some(FieldKind::Union));
        assert!(!details.info.is_leaf_type);
        assert!(details.output_fields.is_empty());
        assert!(details.input_fields.is_none());
        assert!(details.scalar_info.is_none());
        // the field declares an argument, but a union focus lists none
        assert!(details.argument_lists.is_empty());
    }

    #[test]
    fn unknown_types_degrade_instead_of_panicking() {
        let schema = blog_schema();
        // a stack captured before a refetch removed the type
        let stale = NavigationStack::root_for(&schema).push_child(
            &schema,
            &FieldMetaInfo {
                name: "legacy".to_string(),
                description: None,
                deprecation_reason: None,
                field_type: Some("Post".to_string()),
                display_type: "Post".to_string(),
                default_value: None,
            },
        );
        let shrunk = Schema::new(Some("Query"), None, None, Vec::new());

        let details = resolve_complete_details(&shrunk, &stale);

        assert_eq!(details.info.field_kind, None);
        assert!(!details.info.is_leaf_type);
        assert!(details.argument_lists.is_empty());
        assert!(details.output_fields.is_empty());
        assert!(details.input_fields.is_none());
        assert!(details.scalar_info.is_none());
    }

    #[test]
    fn overview_lists_declared_root_operations_only() {
        let schema = blog_schema();
        let sections = operations_overview(&schema);

        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Query", "Mutation"]);
        assert_eq!(sections[0].fields.len(), 2);
        assert_eq!(sections[1].fields[0].name, "createPost");
    }
}
