//! Store adapters: one builder per backend, re-exported under domain names.

use crate::builder::{ApiBuilder, ApiDelete, ApiGet, ApiPost, ApiPut};
use crate::error::BuilderError;
use crate::request::ComposableOptions;
use crate::transport::Transport;
use crate::types::{Card, Payload};

/// Card operations against the cards backend.
///
/// The builder's base URL is empty; the transport's origin supplies the
/// host, and each site supplies its own path (usually `"cards"`).
#[derive(Debug, Clone)]
pub struct CardStore {
    api: ApiBuilder<Card>,
}

impl CardStore {
    pub fn new(transport: impl Transport + 'static) -> Result<Self, BuilderError> {
        let api = ApiBuilder::builder().transport(transport).base_url("").build()?;
        Ok(Self { api })
    }

    pub fn with_builder(api: ApiBuilder<Card>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiBuilder<Card> {
        &self.api
    }

    pub fn use_fetch_cards(&self, options: ComposableOptions, seed: Option<Payload<Card>>) -> ApiGet<Card> {
        self.api.use_get(options, seed)
    }

    pub fn use_create_card(&self, options: ComposableOptions, seed: Option<Payload<Card>>) -> ApiPost<Card> {
        self.api.use_post(options, seed)
    }

    pub fn use_put_card(&self, options: ComposableOptions, seed: Option<Payload<Card>>) -> ApiPut<Card> {
        self.api.use_put(options, seed)
    }

    pub fn use_delete_card(&self, options: ComposableOptions, seed: Option<Payload<Card>>) -> ApiDelete<Card> {
        self.api.use_delete(options, seed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::ApiRegistries;
    use crate::error::ApiError;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::request::RequestParameters;

    struct EchoPath;

    #[async_trait::async_trait]
    impl Transport for EchoPath {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let body = serde_json::json!({ "id": request.path, "setup": "s", "punchline": "p" });
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: body.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn store_over_custom_builder_uses_its_base_and_registries() {
        let registries = ApiRegistries::new();
        let api = ApiBuilder::<Card>::builder()
            .transport(EchoPath)
            .base_url("/joke")
            .registries(registries.clone())
            .build()
            .unwrap();
        let store = CardStore::with_builder(api);

        let fetch = store.use_fetch_cards(ComposableOptions::new().url("cards").loading_key("cards"), None);
        let card = fetch.get(RequestParameters::new().url("3")).await.unwrap().unwrap();

        assert_eq!(card.as_one().and_then(|c| c.id.as_deref()), Some("/joke/cards/3"));
        assert_eq!(store.api().base_url(), "/joke");
        assert!(Arc::ptr_eq(store.api().loading_registry(), &registries.loading));
        assert!(registries.loading.get("cards").is_some());
    }
}
