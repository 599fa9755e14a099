//! Request sites with observable loading, error and data state.
//!
//! # Overview
//! An `ApiBuilder` binds a `Transport` and a base URL to four factories,
//! `use_get`, `use_post`, `use_put` and `use_delete`. Each factory call
//! creates a request site: a loading cell, an error cell and a data cell,
//! registered in keyed `StateRegistry`s, plus the operation that performs
//! the exchange and writes its outcome back into those cells.
//!
//! # Design
//! - The builder never touches the network. It composes plain-data
//!   `HttpRequest`s and a `Transport` executes them; `UreqTransport` is the
//!   stock one (feature `ureq`).
//! - URL composition is plain concatenation, see `request`.
//! - Registries are copy-on-write: snapshots never change, cell handles are
//!   always current.
//! - Operations resolve to `Result`, and the same error is recorded in the
//!   site's error cell.
//! - `CardStore` is the application-facing adapter for the cards backend.

pub mod builder;
pub mod error;
pub mod http;
pub mod request;
pub mod state;
pub mod store;
pub mod transport;
pub mod types;

pub use async_trait::async_trait;
pub use builder::{
    verb, ApiBuilder, ApiBuilderConfig, ApiDelete, ApiGet, ApiPost, ApiPut, ApiRegistries, ApiRequest, Outcome,
    Resource,
};
pub use error::{ApiError, BuilderError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::{
    build_query_string, ComposableOptions, DeleteParameters, GetParameters, PostParameters, PutParameters,
    QueryPair, QueryParameters, RequestParameters, RequestUrlBuilder,
};
pub use state::{generate_key, StateCell, StateRegistry};
pub use store::CardStore;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use transport::Transport;
pub use types::{Card, DataState, ErrorState, LoadingState, Payload};
