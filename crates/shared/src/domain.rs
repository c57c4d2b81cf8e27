use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(PointId);
id_newtype!(DestinationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OfferId(pub u64);

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of trip event. Offers are cataloged per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Taxi,
    Bus,
    Train,
    Ship,
    Drive,
    Flight,
    CheckIn,
    Sightseeing,
    Restaurant,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Taxi,
        EventKind::Bus,
        EventKind::Train,
        EventKind::Ship,
        EventKind::Drive,
        EventKind::Flight,
        EventKind::CheckIn,
        EventKind::Sightseeing,
        EventKind::Restaurant,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Taxi => "Taxi",
            EventKind::Bus => "Bus",
            EventKind::Train => "Train",
            EventKind::Ship => "Ship",
            EventKind::Drive => "Drive",
            EventKind::Flight => "Flight",
            EventKind::CheckIn => "Check-in",
            EventKind::Sightseeing => "Sightseeing",
            EventKind::Restaurant => "Restaurant",
        }
    }
}

/// A single scheduled trip event. Immutable from the presentation core's
/// perspective: every mutation replaces the whole record through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub kind: EventKind,
    pub destination: DestinationId,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub base_price: u32,
    pub is_favorite: bool,
    pub offers: Vec<OfferId>,
}

impl Point {
    pub fn duration(&self) -> Duration {
        self.date_to - self.date_from
    }

    pub fn to_draft(&self) -> PointDraft {
        PointDraft {
            kind: self.kind,
            destination: Some(self.destination.clone()),
            date_from: self.date_from,
            date_to: self.date_to,
            base_price: self.base_price,
            is_favorite: self.is_favorite,
            offers: self.offers.clone(),
        }
    }

    pub fn with_favorite(&self, is_favorite: bool) -> Point {
        Point {
            is_favorite,
            ..self.clone()
        }
    }
}

/// Editable copy of a point carried by edit sessions and add/update intents.
/// Has no id of its own; the server assigns ids on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointDraft {
    pub kind: EventKind,
    pub destination: Option<DestinationId>,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub base_price: u32,
    pub is_favorite: bool,
    pub offers: Vec<OfferId>,
}

impl PointDraft {
    /// Blank draft for the new-point form.
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::Flight,
            destination: None,
            date_from: now,
            date_to: now,
            base_price: 0,
            is_favorite: false,
            offers: Vec::new(),
        }
    }

    pub fn into_point(self, id: PointId) -> Result<Point, IncompleteDraft> {
        let destination = self.destination.ok_or(IncompleteDraft::MissingDestination)?;
        Ok(Point {
            id,
            kind: self.kind,
            destination,
            date_from: self.date_from,
            date_to: self.date_to,
            base_price: self.base_price,
            is_favorite: self.is_favorite,
            offers: self.offers,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IncompleteDraft {
    #[error("draft has no destination")]
    MissingDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub src: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: DestinationId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub pictures: Vec<Picture>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub title: String,
    pub price: u32,
}

/// The offers available for one event kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferGroup {
    pub kind: EventKind,
    pub offers: Vec<Offer>,
}

/// Classification of a model notification, controlling reflow granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Initial load completed.
    Init,
    /// Single record changed; no list-level reflow.
    Patch,
    /// List composition may change; sort selection is preserved.
    Minor,
    /// List composition changed; sort selection resets to the default.
    Major,
}

/// Kind of mutation a row session requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    AddPoint,
    UpdatePoint,
    DeletePoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    #[default]
    Everything,
    Future,
    Past,
}

impl FilterKind {
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Everything => "Everything",
            FilterKind::Future => "Future",
            FilterKind::Past => "Past",
        }
    }

    /// Message shown when the visible list under this filter is empty.
    pub fn empty_message(&self) -> &'static str {
        match self {
            FilterKind::Everything => "Click New Event to create your first point",
            FilterKind::Future => "There are no future events now",
            FilterKind::Past => "There are no past events now",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKind {
    #[default]
    Day,
    Time,
    Price,
}

impl SortKind {
    pub fn label(&self) -> &'static str {
        match self {
            SortKind::Day => "Day",
            SortKind::Time => "Time",
            SortKind::Price => "Price",
        }
    }
}
