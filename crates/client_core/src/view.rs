//! View-mount primitive.
//!
//! The core renders by describing nodes ([`ViewSpec`]) and asking the host
//! to mount, replace or unmount them. Mounting is always paired with prior
//! teardown by the core. The escape hooks are the cancellation-key listener
//! handle: attached exactly while an edit session is open, detached the
//! moment it closes.

use shared::domain::{FilterKind, Offer, Point, PointDraft, PointId, SortKind};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(Uuid);

impl ViewId {
    /// Hosts allocate one per mounted node.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountPosition {
    /// Before the container's existing content.
    AfterBegin,
    /// After the container's existing content.
    BeforeEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountPoint {
    /// The table container itself.
    Root,
    /// Inside a previously mounted node.
    Within(ViewId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatLine {
    pub label: String,
    pub value: String,
}

/// Everything the core can ask a host to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSpec {
    Loading,
    NoPoints {
        filter: FilterKind,
    },
    SortBar {
        selected: SortKind,
    },
    PointList,
    PointRow {
        point: Point,
        /// Resolved destination name; `None` when the catalog is missing it.
        destination: Option<String>,
        /// Selected offers resolved against the catalog, in selection order.
        offers: Vec<Offer>,
    },
    PointEditor {
        /// `None` for the new-point form.
        point_id: Option<PointId>,
        draft: PointDraft,
        destination: Option<String>,
        /// Offers available for the draft's event kind.
        available_offers: Vec<Offer>,
        /// Submit affordance disabled while an intent is outstanding.
        pending: bool,
        /// Error affordance after a refused mutation.
        rejected: bool,
    },
    Statistics {
        lines: Vec<StatLine>,
    },
}

pub trait ViewHost: Send + Sync {
    fn mount(&self, target: MountPoint, spec: ViewSpec, position: MountPosition) -> ViewId;
    fn unmount(&self, id: ViewId);
    /// Re-render a mounted node in place, keeping its position.
    fn replace(&self, id: ViewId, spec: ViewSpec);
    fn attach_escape(&self, id: ViewId);
    fn detach_escape(&self, id: ViewId);
}
