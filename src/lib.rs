//! A client-side engine for GraphQL schema exploration.
//!
//! The crate obtains a service's type schema via the standard
//! introspection query, caches it per endpoint and header set, keeps it
//! fresh with bounded retries and an auto-refresh timer, and resolves an
//! undo-able navigation path through the schema into display-ready
//! field metadata.
//!
//! The pieces compose leaf-first:
//!
//! * [`introspection::IntrospectionClient`] performs one fetch with a
//!   timeout and a cancellation token.
//! * [`cache::SchemaCache`] maps `(endpoint, headers)` to a fetched
//!   [`schema::Schema`] under a TTL.
//! * [`fetch::SchemaFetchCoordinator`] orchestrates the two, publishing
//!   a reactive [`fetch::SchemaState`] to subscribers.
//! * [`resolve`] and [`navigation`] turn a schema plus a breadcrumb
//!   stack into the detail view a UI renders, without any I/O.
//!
//! The embedding application owns endpoint configuration, persistence
//! and rendering; this crate deliberately stops at typed values on both
//! sides of that boundary.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod introspection;
pub mod navigation;
pub mod resolve;
pub mod schema;

pub use cache::SchemaCache;
pub use error::FetchError;
pub use fetch::CoordinatorConfig;
pub use fetch::FetchTarget;
pub use fetch::LoadOptions;
pub use fetch::SchemaFetchCoordinator;
pub use fetch::SchemaState;
pub use introspection::ConnectivityStatus;
pub use introspection::IntrospectionClient;
pub use navigation::NavigationItem;
pub use navigation::NavigationStack;
pub use resolve::operations_overview;
pub use resolve::resolve_complete_details;
pub use resolve::FieldCompleteDetails;
pub use resolve::FieldDetailBasicInfo;
pub use resolve::FieldKind;
pub use resolve::FieldMetaInfo;
pub use resolve::OperationSection;
pub use schema::Schema;
