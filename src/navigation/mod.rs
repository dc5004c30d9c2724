//! The breadcrumb navigation stack.
//!
//! A [`NavigationStack`] records the drill-down path from a schema root
//! to the field or type currently being inspected. Stacks are plain
//! values: every operation returns a new stack and leaves the input
//! untouched, which keeps equality checks and undo extensions trivial.

use serde::Serialize;

use crate::resolve;
use crate::resolve::FieldMetaInfo;
use crate::schema::Schema;

/// Root type name used when a schema declares no query type.
const FALLBACK_ROOT_TYPE: &str = "Query";

/// One frame of the navigation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationItem {
    /// The field (or root type) name shown in the breadcrumb.
    pub name: String,
    /// The bare named type this frame points at.
    pub type_name: String,
    /// The wrapped type as displayed, e.g. `[Post!]!`.
    pub display_type: String,
}

/// An ordered drill-down path; index 0 is the schema root, the last
/// entry is the current focus.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct NavigationStack {
    items: Vec<NavigationItem>,
}

impl NavigationStack {
    /// A single-entry stack rooted at the schema's query type.
    pub fn root_for(schema: &Schema) -> Self {
        let root = schema.query_type().unwrap_or(FALLBACK_ROOT_TYPE);
        NavigationStack {
            items: vec![NavigationItem {
                name: root.to_owned(),
                type_name: root.to_owned(),
                display_type: root.to_owned(),
            }],
        }
    }

    pub fn items(&self) -> &[NavigationItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The current focus.
    pub fn last(&self) -> Option<&NavigationItem> {
        self.items.last()
    }

    /// The frame whose type contains the current focus, when the focus
    /// denotes a field rather than a root type.
    pub fn parent(&self) -> Option<&NavigationItem> {
        self.items.len().checked_sub(2).map(|i| &self.items[i])
    }

    /// Drills into a child field.
    ///
    /// Returns the extended stack, or this stack unchanged when the field
    /// has no named type or points at a leaf (scalar or enum) — leaves
    /// have nothing further to navigate into.
    pub fn push_child(&self, schema: &Schema, field: &FieldMetaInfo) -> Self {
        let Some(type_name) = field.field_type.as_deref() else {
            return self.clone();
        };
        if resolve::is_leaf(resolve::kind_of(schema, type_name)) {
            return self.clone();
        }

        let mut items = self.items.clone();
        items.push(NavigationItem {
            name: field.name.clone(),
            type_name: type_name.to_owned(),
            display_type: field.display_type.clone(),
        });
        NavigationStack { items }
    }

    /// Truncates back to an ancestor, keeping entries `0..=index`.
    ///
    /// An out-of-range index clamps to the last entry so breadcrumb
    /// clicks always succeed.
    pub fn truncate_to(&self, index: usize) -> Self {
        if self.items.is_empty() {
            return self.clone();
        }
        let end = index.min(self.items.len() - 1);
        NavigationStack {
            items: self.items[..=end].to_vec(),
        }
    }
}
