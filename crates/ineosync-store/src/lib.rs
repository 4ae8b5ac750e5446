//! Ineosync Store - Query building and execution against the document store

pub mod basex;
pub mod executor;
pub mod query;
pub mod store;

pub use basex::BasexStore;
pub use executor::{parse_response, QueryExecutor, QueryResult};
pub use query::{build_query, query_envelope, synthesize_query, FieldSpec, ID_PLACEHOLDER};
pub use store::{DocumentStore, StoreError, StoreResult};
