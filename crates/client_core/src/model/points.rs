//! Authoritative point set plus the destination and offer catalogs.
//!
//! Mutations go to the remote source first; local state changes only after
//! remote confirmation, and observers are notified only for confirmed
//! changes. A failed mutation leaves local state untouched and emits
//! nothing, so the initiating session can restore its own rendering.

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{info, warn};

use shared::domain::{
    Destination, DestinationId, EventKind, Offer, OfferGroup, OfferId, Point, PointDraft, PointId,
    UpdateKind,
};

use crate::api::RemoteApi;
use crate::observer::{Observer, Observers};

#[derive(Debug, Clone)]
pub struct PointsEvent {
    pub kind: UpdateKind,
    /// The confirmed record for single-record changes; `None` for initial
    /// load and deletions.
    pub payload: Option<Point>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no point with id {0}")]
    MissingRecord(PointId),
}

#[derive(Default)]
struct PointsState {
    points: Vec<Point>,
    destinations: Vec<Destination>,
    offer_groups: Vec<OfferGroup>,
    loaded: bool,
}

pub struct PointsStore {
    api: Arc<dyn RemoteApi>,
    state: RwLock<PointsState>,
    observers: Observers<PointsEvent>,
}

impl PointsStore {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            state: RwLock::new(PointsState::default()),
            observers: Observers::new(),
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn Observer<PointsEvent>>) {
        self.observers.add(observer);
    }

    pub fn remove_observer(&self, observer: &Arc<dyn Observer<PointsEvent>>) {
        self.observers.remove(observer);
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }

    /// Snapshot of all points, unfiltered and unsorted.
    pub fn points(&self) -> Vec<Point> {
        self.state.read().points.clone()
    }

    pub fn destination(&self, id: &DestinationId) -> Option<Destination> {
        self.state
            .read()
            .destinations
            .iter()
            .find(|destination| destination.id == *id)
            .cloned()
    }

    pub fn destinations(&self) -> Vec<Destination> {
        self.state.read().destinations.clone()
    }

    /// Offers available for one event kind; empty when the catalog is
    /// missing or has no entry for the kind.
    pub fn offers_for(&self, kind: EventKind) -> Vec<Offer> {
        self.state
            .read()
            .offer_groups
            .iter()
            .find(|group| group.kind == kind)
            .map(|group| group.offers.clone())
            .unwrap_or_default()
    }

    /// Resolve a point's selected offer ids against the catalog, preserving
    /// selection order. Unresolvable ids are dropped.
    pub fn resolve_offers(&self, kind: EventKind, selected: &[OfferId]) -> Vec<Offer> {
        let available = self.offers_for(kind);
        selected
            .iter()
            .filter_map(|id| available.iter().find(|offer| offer.id == *id).cloned())
            .collect()
    }

    /// Fetch points and both catalogs. The fetches run concurrently; a
    /// failed catalog degrades to an empty one, a failed points fetch leaves
    /// the store unloaded and surfaces the error without notifying anyone.
    pub async fn load(&self) -> Result<()> {
        let (points, destinations, offers) = tokio::join!(
            self.api.fetch_points(),
            self.api.fetch_destinations(),
            self.api.fetch_offers(),
        );

        let destinations = destinations.unwrap_or_else(|err| {
            warn!(error = %err, "destination catalog unavailable, continuing without it");
            Vec::new()
        });
        let offer_groups = offers.unwrap_or_else(|err| {
            warn!(error = %err, "offer catalog unavailable, continuing without it");
            Vec::new()
        });
        let points = points.context("failed to load points")?;

        let count = points.len();
        {
            let mut state = self.state.write();
            state.points = points;
            state.destinations = destinations;
            state.offer_groups = offer_groups;
            state.loaded = true;
        }
        info!(count, "points loaded");
        self.observers.notify_all(&PointsEvent {
            kind: UpdateKind::Init,
            payload: None,
        });
        Ok(())
    }

    pub async fn add_point(&self, update: UpdateKind, draft: PointDraft) -> Result<Point> {
        let created = self.api.create_point(draft).await?;
        self.state.write().points.push(created.clone());
        info!(point_id = %created.id, "point created");
        self.observers.notify_all(&PointsEvent {
            kind: update,
            payload: Some(created.clone()),
        });
        Ok(created)
    }

    pub async fn update_point(&self, update: UpdateKind, point: Point) -> Result<Point> {
        if !self.contains(&point.id) {
            return Err(StoreError::MissingRecord(point.id).into());
        }
        let confirmed = self.api.update_point(point).await?;
        {
            let mut state = self.state.write();
            match state.points.iter().position(|p| p.id == confirmed.id) {
                Some(index) => state.points[index] = confirmed.clone(),
                None => return Err(StoreError::MissingRecord(confirmed.id).into()),
            }
        }
        self.observers.notify_all(&PointsEvent {
            kind: update,
            payload: Some(confirmed.clone()),
        });
        Ok(confirmed)
    }

    pub async fn delete_point(&self, update: UpdateKind, id: &PointId) -> Result<()> {
        if !self.contains(id) {
            return Err(StoreError::MissingRecord(id.clone()).into());
        }
        self.api.delete_point(id.clone()).await?;
        self.state.write().points.retain(|point| point.id != *id);
        info!(point_id = %id, "point deleted");
        self.observers.notify_all(&PointsEvent {
            kind: update,
            payload: None,
        });
        Ok(())
    }

    fn contains(&self, id: &PointId) -> bool {
        self.state.read().points.iter().any(|point| point.id == *id)
    }
}

#[cfg(test)]
#[path = "tests/points_tests.rs"]
mod tests;
