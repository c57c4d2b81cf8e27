//! Wire DTOs for the itinerary API.
//!
//! Points travel in reference form: the destination and the selected offers
//! are carried by identifier, and the catalogs are fetched from their own
//! endpoints. Conversions to and from the domain types are lossless.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Destination, DestinationId, EventKind, Offer, OfferGroup, OfferId, Picture, Point, PointDraft,
    PointId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointPayload {
    pub id: PointId,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub destination: DestinationId,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub base_price: u32,
    pub is_favorite: bool,
    #[serde(default)]
    pub offers: Vec<OfferId>,
}

impl From<PointPayload> for Point {
    fn from(payload: PointPayload) -> Self {
        Point {
            id: payload.id,
            kind: payload.kind,
            destination: payload.destination,
            date_from: payload.date_from,
            date_to: payload.date_to,
            base_price: payload.base_price,
            is_favorite: payload.is_favorite,
            offers: payload.offers,
        }
    }
}

impl From<Point> for PointPayload {
    fn from(point: Point) -> Self {
        PointPayload {
            id: point.id,
            kind: point.kind,
            destination: point.destination,
            date_from: point.date_from,
            date_to: point.date_to,
            base_price: point.base_price,
            is_favorite: point.is_favorite,
            offers: point.offers,
        }
    }
}

/// Body of a create or update request. Creation carries no id; the server
/// assigns one and echoes the confirmed record back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePointRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PointId>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub destination: DestinationId,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub base_price: u32,
    pub is_favorite: bool,
    #[serde(default)]
    pub offers: Vec<OfferId>,
}

impl SavePointRequest {
    /// Request creating a brand-new point from a completed draft. The draft
    /// must already carry a destination; callers validate before submitting.
    pub fn create(kind: EventKind, destination: DestinationId, draft: &PointDraft) -> Self {
        Self {
            id: None,
            kind,
            destination,
            date_from: draft.date_from,
            date_to: draft.date_to,
            base_price: draft.base_price,
            is_favorite: draft.is_favorite,
            offers: draft.offers.clone(),
        }
    }

    pub fn update(point: &Point) -> Self {
        Self {
            id: Some(point.id.clone()),
            kind: point.kind,
            destination: point.destination.clone(),
            date_from: point.date_from,
            date_to: point.date_to,
            base_price: point.base_price,
            is_favorite: point.is_favorite,
            offers: point.offers.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PicturePayload {
    pub src: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationPayload {
    pub id: DestinationId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub pictures: Vec<PicturePayload>,
}

impl From<DestinationPayload> for Destination {
    fn from(payload: DestinationPayload) -> Self {
        Destination {
            id: payload.id,
            name: payload.name,
            description: payload.description,
            pictures: payload
                .pictures
                .into_iter()
                .map(|p| Picture {
                    src: p.src,
                    description: p.description,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferPayload {
    pub id: OfferId,
    pub title: String,
    pub price: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferGroupPayload {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub offers: Vec<OfferPayload>,
}

impl From<OfferGroupPayload> for OfferGroup {
    fn from(payload: OfferGroupPayload) -> Self {
        OfferGroup {
            kind: payload.kind,
            offers: payload
                .offers
                .into_iter()
                .map(|o| Offer {
                    id: o.id,
                    title: o.title,
                    price: o.price,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
