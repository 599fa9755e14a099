//! State payloads and domain DTOs.
//!
//! # Design
//! The three payload types are what the loading, error and data registries
//! hold. `Payload` mirrors the fact that an endpoint may answer with one
//! record or a list of them; it is untagged so either JSON shape decodes
//! without a wrapper.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Whether a request site currently has an exchange in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingState {
    pub is_loading: bool,
}

/// The error recorded by a request site's last exchange, if it failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
    pub error: Option<ApiError>,
}

/// The payload received by a request site's last successful exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct DataState<T> {
    pub data: Option<Payload<T>>,
}

impl<T> Default for DataState<T> {
    fn default() -> Self {
        Self { data: None }
    }
}

/// A response body: either a list of records or a single record.
///
/// `Many` is tried first when decoding, so a JSON array always lands there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Payload<T> {
    pub fn as_one(&self) -> Option<&T> {
        match self {
            Payload::One(item) => Some(item),
            Payload::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&[T]> {
        match self {
            Payload::Many(items) => Some(items),
            Payload::One(_) => None,
        }
    }

    /// Flatten into a list; a single record becomes a list of one.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Payload::Many(items) => items,
            Payload::One(item) => vec![item],
        }
    }
}

impl<T> From<T> for Payload<T> {
    fn from(item: T) -> Self {
        Payload::One(item)
    }
}

/// A joke card as served by the cards API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    /// Assigned by the server; absent when creating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub setup: String,
    pub punchline: String,
}

impl Card {
    pub fn new(setup: impl Into<String>, punchline: impl Into<String>) -> Self {
        Self {
            id: None,
            setup: setup.into(),
            punchline: punchline.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_body_decodes_as_many() {
        let payload: Payload<u32> = serde_json::from_str("[1,2,3]").unwrap();
        assert_eq!(payload, Payload::Many(vec![1, 2, 3]));
    }

    #[test]
    fn object_body_decodes_as_one() {
        let payload: Payload<Card> =
            serde_json::from_str(r#"{"id":"4","setup":"s","punchline":"p"}"#).unwrap();
        let card = payload.as_one().unwrap();
        assert_eq!(card.id.as_deref(), Some("4"));
    }

    #[test]
    fn new_card_serializes_without_id() {
        let json = serde_json::to_value(Card::new("Why?", "Because.")).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["setup"], "Why?");
    }

    #[test]
    fn into_vec_wraps_single_record() {
        assert_eq!(Payload::One(7).into_vec(), vec![7]);
    }
}
