use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub setup: String,
    pub punchline: String,
}

#[derive(Deserialize)]
pub struct CreateCard {
    pub setup: String,
    pub punchline: String,
}

#[derive(Deserialize)]
pub struct UpdateCard {
    pub setup: Option<String>,
    pub punchline: Option<String>,
}

/// Cards keyed by numeric id, plus the next id to hand out.
#[derive(Default)]
pub struct Cards {
    next_id: u64,
    items: BTreeMap<u64, Card>,
}

pub type Db = Arc<RwLock<Cards>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Cards::default()));
    Router::new()
        .route("/cards", get(list_cards).post(create_card))
        .route("/cards/{id}", get(get_card).put(update_card).delete(delete_card))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

/// Lists cards in id order. `setup` and `punchline` query parameters filter
/// by exact match; other parameters are ignored.
async fn list_cards(
    State(db): State<Db>,
    Query(filters): Query<HashMap<String, String>>,
) -> Json<Vec<Card>> {
    let cards = db.read().await;
    let matching = cards
        .items
        .values()
        .filter(|card| matches_filters(card, &filters))
        .cloned()
        .collect();
    Json(matching)
}

fn matches_filters(card: &Card, filters: &HashMap<String, String>) -> bool {
    filters.iter().all(|(field, wanted)| match field.as_str() {
        "setup" => &card.setup == wanted,
        "punchline" => &card.punchline == wanted,
        _ => true,
    })
}

async fn create_card(
    State(db): State<Db>,
    Json(input): Json<CreateCard>,
) -> (StatusCode, Json<Card>) {
    let mut cards = db.write().await;
    cards.next_id += 1;
    let id = cards.next_id;
    let card = Card {
        id: id.to_string(),
        setup: input.setup,
        punchline: input.punchline,
    };
    cards.items.insert(id, card.clone());
    (StatusCode::CREATED, Json(card))
}

async fn get_card(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Card>, StatusCode> {
    let cards = db.read().await;
    cards.items.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_card(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateCard>,
) -> Result<Json<Card>, StatusCode> {
    let mut cards = db.write().await;
    let card = cards.items.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(setup) = input.setup {
        card.setup = setup;
    }
    if let Some(punchline) = input.punchline {
        card.punchline = punchline;
    }
    Ok(Json(card.clone()))
}

/// Deletes a card and echoes it back, as the hosted cards API does.
async fn delete_card(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Card>, StatusCode> {
    let mut cards = db.write().await;
    cards.items.remove(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Card {
        Card {
            id: "1".to_string(),
            setup: "Why did the crab never share?".to_string(),
            punchline: "Because he's shellfish.".to_string(),
        }
    }

    #[test]
    fn card_serializes_to_json() {
        let json = serde_json::to_value(card()).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["setup"], "Why did the crab never share?");
    }

    #[test]
    fn create_card_rejects_missing_punchline() {
        let result: Result<CreateCard, _> = serde_json::from_str(r#"{"setup":"Knock knock"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_card_ignores_client_supplied_id() {
        let input: CreateCard =
            serde_json::from_str(r#"{"id":"99","setup":"s","punchline":"p"}"#).unwrap();
        assert_eq!(input.setup, "s");
    }

    #[test]
    fn update_card_all_fields_optional() {
        let input: UpdateCard = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.setup.is_none());
        assert!(input.punchline.is_none());
    }

    #[test]
    fn filters_match_exactly_and_ignore_unknown_fields() {
        let mut filters = HashMap::new();
        filters.insert("page".to_string(), "2".to_string());
        assert!(matches_filters(&card(), &filters));

        filters.insert("setup".to_string(), "Why".to_string());
        assert!(!matches_filters(&card(), &filters));

        filters.insert("setup".to_string(), "Why did the crab never share?".to_string());
        assert!(matches_filters(&card(), &filters));
    }
}
