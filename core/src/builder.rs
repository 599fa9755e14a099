//! The API builder: request sites bound to a transport and state registries.
//!
//! # Design
//! An `ApiBuilder` binds one transport, one base URL and three registries
//! (loading, error, data). Each `use_*` call creates a request site: a
//! loading/error/data cell triplet plus the verb's operation. The verb is a
//! type parameter on `ApiRequest`, so a GET site only exposes `get`.
//!
//! Every operation follows the same protocol. The error cell is cleared and
//! loading is raised and synced into the loading registry. The exchange then
//! runs. Its payload lands in the data cell, or its error in the error cell,
//! and finally loading is lowered and the loading and error cells are synced
//! again. Failures are never raised past the site: the operation resolves to
//! the same `Result` that was recorded.
//!
//! Syncing installs the site's own cell handles in the registries, so sites
//! created with the same key share one cell no matter when they were made.
//!
//! Nothing serializes overlapping calls on one site. Whichever exchange
//! finishes last wins the cells.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ApiError, BuilderError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::{
    ComposableOptions, DeleteParameters, GetParameters, PostParameters, PutParameters,
    RequestParameters, RequestUrlBuilder,
};
use crate::state::{generate_key, StateCell, StateRegistry};
use crate::transport::Transport;
use crate::types::{DataState, ErrorState, LoadingState, Payload};

/// What every operation resolves to. `Ok(None)` means the server answered
/// with an empty body.
pub type Outcome<T> = Result<Option<Payload<T>>, ApiError>;

/// Record types an `ApiBuilder` can send and receive.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Resource for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// The loading and error registries, shareable across builders.
#[derive(Debug, Clone, Default)]
pub struct ApiRegistries {
    pub loading: Arc<StateRegistry<LoadingState>>,
    pub error: Arc<StateRegistry<ErrorState>>,
}

impl ApiRegistries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registries shared by every builder that was not given its own.
    /// Created on first use and kept for the life of the process.
    pub fn process_default() -> Self {
        static DEFAULT: OnceLock<ApiRegistries> = OnceLock::new();
        DEFAULT.get_or_init(ApiRegistries::new).clone()
    }
}

/// Configuration for an `ApiBuilder`. Obtain one from `ApiBuilder::builder`.
pub struct ApiBuilderConfig<T> {
    transport: Option<Arc<dyn Transport>>,
    base_url: String,
    base_headers: Vec<(String, String)>,
    registries: Option<ApiRegistries>,
    data_registry: Option<Arc<StateRegistry<DataState<T>>>>,
}

impl<T: Resource> ApiBuilderConfig<T> {
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Header sent with every request from this builder.
    pub fn base_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.base_headers.push((name.into(), value.into()));
        self
    }

    pub fn registries(mut self, registries: ApiRegistries) -> Self {
        self.registries = Some(registries);
        self
    }

    pub fn data_registry(mut self, registry: Arc<StateRegistry<DataState<T>>>) -> Self {
        self.data_registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<ApiBuilder<T>, BuilderError> {
        let transport = self.transport.ok_or(BuilderError::MissingTransport)?;

        Ok(ApiBuilder {
            shared: Arc::new(Shared {
                transport,
                urls: RequestUrlBuilder::new(self.base_url),
                base_headers: self.base_headers,
                registries: self.registries.unwrap_or_else(ApiRegistries::process_default),
                data: self.data_registry.unwrap_or_default(),
            }),
        })
    }
}

struct Shared<T> {
    transport: Arc<dyn Transport>,
    urls: RequestUrlBuilder,
    base_headers: Vec<(String, String)>,
    registries: ApiRegistries,
    data: Arc<StateRegistry<DataState<T>>>,
}

/// Factory for request sites sharing one transport and base URL.
pub struct ApiBuilder<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ApiBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for ApiBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiBuilder")
            .field("base_url", &self.shared.urls.base_url())
            .field("base_headers", &self.shared.base_headers)
            .finish()
    }
}

impl<T: Resource> ApiBuilder<T> {
    pub fn builder() -> ApiBuilderConfig<T> {
        ApiBuilderConfig {
            transport: None,
            base_url: String::new(),
            base_headers: Vec::new(),
            registries: None,
            data_registry: None,
        }
    }

    pub fn use_get(&self, options: ComposableOptions, seed: Option<Payload<T>>) -> ApiGet<T> {
        self.site(options, seed)
    }

    pub fn use_post(&self, options: ComposableOptions, seed: Option<Payload<T>>) -> ApiPost<T> {
        self.site(options, seed)
    }

    pub fn use_put(&self, options: ComposableOptions, seed: Option<Payload<T>>) -> ApiPut<T> {
        self.site(options, seed)
    }

    pub fn use_delete(&self, options: ComposableOptions, seed: Option<Payload<T>>) -> ApiDelete<T> {
        self.site(options, seed)
    }

    pub fn base_url(&self) -> &str {
        self.shared.urls.base_url()
    }

    pub fn loading_registry(&self) -> &Arc<StateRegistry<LoadingState>> {
        &self.shared.registries.loading
    }

    pub fn error_registry(&self) -> &Arc<StateRegistry<ErrorState>> {
        &self.shared.registries.error
    }

    pub fn data_registry(&self) -> &Arc<StateRegistry<DataState<T>>> {
        &self.shared.data
    }

    /// Allocate the cell triplet for a new site. A key that already exists
    /// in its registry is reused as-is, in which case `seed` is ignored.
    fn site<V>(&self, options: ComposableOptions, seed: Option<Payload<T>>) -> ApiRequest<T, V> {
        let shared = &self.shared;
        let loading = shared.registries.loading.add(
            options.loading_key.unwrap_or_else(generate_key),
            LoadingState::default(),
        );
        let error = shared
            .registries
            .error
            .add(options.error_key.unwrap_or_else(generate_key), ErrorState::default());
        let data = shared.data.add(
            options.data_key.unwrap_or_else(generate_key),
            DataState { data: seed },
        );

        debug!(
            loading_key = loading.key(),
            error_key = error.key(),
            data_key = data.key(),
            "request site created"
        );

        ApiRequest {
            loading,
            error,
            data,
            url: options.url,
            shared: Arc::clone(shared),
            _verb: PhantomData,
        }
    }
}

/// Verb markers for `ApiRequest`.
pub mod verb {
    #[derive(Debug, Clone, Copy)]
    pub struct Get;
    #[derive(Debug, Clone, Copy)]
    pub struct Post;
    #[derive(Debug, Clone, Copy)]
    pub struct Put;
    #[derive(Debug, Clone, Copy)]
    pub struct Delete;
}

pub type ApiGet<T> = ApiRequest<T, verb::Get>;
pub type ApiPost<T> = ApiRequest<T, verb::Post>;
pub type ApiPut<T> = ApiRequest<T, verb::Put>;
pub type ApiDelete<T> = ApiRequest<T, verb::Delete>;

/// A request site: the state cells observing one operation, and the
/// operation itself.
pub struct ApiRequest<T, V> {
    pub loading: StateCell<LoadingState>,
    pub error: StateCell<ErrorState>,
    pub data: StateCell<DataState<T>>,
    url: Option<String>,
    shared: Arc<Shared<T>>,
    _verb: PhantomData<fn() -> V>,
}

impl<T, V> Clone for ApiRequest<T, V> {
    fn clone(&self) -> Self {
        Self {
            loading: self.loading.clone(),
            error: self.error.clone(),
            data: self.data.clone(),
            url: self.url.clone(),
            shared: Arc::clone(&self.shared),
            _verb: PhantomData,
        }
    }
}

impl<T: fmt::Debug, V> fmt::Debug for ApiRequest<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("url", &self.url)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .field("data", &self.data)
            .finish()
    }
}

impl<T: Resource> ApiRequest<T, verb::Get> {
    pub async fn get(&self, params: GetParameters) -> Outcome<T> {
        self.execute(HttpMethod::Get, &params, None::<&T>).await
    }
}

impl<T: Resource> ApiRequest<T, verb::Post> {
    pub async fn post(&self, params: PostParameters<T>) -> Outcome<T> {
        self.execute(HttpMethod::Post, &params.request, Some(&params.body))
            .await
    }
}

impl<T: Resource> ApiRequest<T, verb::Put> {
    pub async fn put(&self, params: PutParameters<T>) -> Outcome<T> {
        let request = params.request.with_key(&params.key);
        self.execute(HttpMethod::Put, &request, Some(&params.body))
            .await
    }
}

impl<T: Resource> ApiRequest<T, verb::Delete> {
    pub async fn delete(&self, params: DeleteParameters) -> Outcome<T> {
        let request = params.request.with_key(&params.key);
        self.execute(HttpMethod::Delete, &request, None::<&T>).await
    }
}

impl<T: Resource, V> ApiRequest<T, V> {
    /// The URL this site would target for `request`.
    pub fn url_for(&self, request: &RequestParameters) -> String {
        self.shared.urls.build_url(self.url.as_deref(), Some(request))
    }

    pub fn is_loading(&self) -> bool {
        self.loading.with(|s| s.is_loading)
    }

    pub fn last_error(&self) -> Option<ApiError> {
        self.error.with(|s| s.error.clone())
    }

    async fn execute<B>(&self, method: HttpMethod, request: &RequestParameters, body: Option<&B>) -> Outcome<T>
    where
        B: Serialize + Sync,
    {
        let registries = &self.shared.registries;

        self.error.set(ErrorState::default());
        self.loading.set(LoadingState { is_loading: true });
        registries.loading.upsert_cell(self.loading.clone());

        let url = self.url_for(request);
        debug!(%method, %url, "sending request");

        let result = self.exchange(method, url.clone(), body).await;
        match &result {
            Ok(payload) => {
                debug!(%method, %url, "request succeeded");
                self.data.set(DataState { data: payload.clone() });
                self.shared.data.upsert_cell(self.data.clone());
            }
            Err(err) => {
                warn!(%method, %url, error = %err, "request failed");
                self.error.set(ErrorState { error: Some(err.clone()) });
            }
        }

        self.loading.set(LoadingState { is_loading: false });
        registries.loading.upsert_cell(self.loading.clone());
        registries.error.upsert_cell(self.error.clone());

        result
    }

    async fn exchange<B>(&self, method: HttpMethod, url: String, body: Option<&B>) -> Outcome<T>
    where
        B: Serialize + Sync,
    {
        let mut headers = self.shared.base_headers.clone();
        let body = match body {
            Some(body) => {
                let json = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(json)
            }
            None => None,
        };

        let response = self
            .shared
            .transport
            .send(HttpRequest {
                method,
                path: url,
                headers,
                body,
            })
            .await?;
        parse_response(response)
    }
}

/// Decode a response: non-2xx becomes an error, an empty body becomes
/// `None`.
fn parse_response<T: DeserializeOwned>(response: HttpResponse) -> Outcome<T> {
    check_status(&response)?;
    if response.body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&response.body)
        .map(Some)
        .map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
