//! Per-point edit session.
//!
//! A row is either a compact VIEW line or an inline EDIT form; the escape
//! listener exists only while the form is open. A session represents at
//! most one outstanding mutation intent at a time.

use tracing::warn;

use shared::domain::{Point, PointDraft, PointId, UserAction};

use crate::model::PointsStore;
use crate::view::{MountPoint, MountPosition, ViewHost, ViewId, ViewSpec};

/// Catalog and host access handed to session methods by the presenter.
pub(crate) struct RowContext<'a> {
    pub host: &'a dyn ViewHost,
    pub store: &'a PointsStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    View,
    Edit,
}

pub(crate) struct RowSession {
    point: Point,
    mode: Mode,
    view: ViewId,
    draft: Option<PointDraft>,
    /// The one mutation this session may have in flight.
    pending: Option<UserAction>,
    rejected: bool,
}

impl RowSession {
    pub fn mount(point: Point, list: ViewId, ctx: &RowContext<'_>) -> Self {
        let spec = row_spec(&point, ctx);
        let view = ctx
            .host
            .mount(MountPoint::Within(list), spec, MountPosition::BeforeEnd);
        Self {
            point,
            mode: Mode::View,
            view,
            draft: None,
            pending: None,
            rejected: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn point(&self) -> &Point {
        &self.point
    }

    /// VIEW → EDIT. Attaches the escape listener.
    pub fn open(&mut self, ctx: &RowContext<'_>) {
        if self.mode == Mode::Edit {
            return;
        }
        self.mode = Mode::Edit;
        self.draft = Some(self.point.to_draft());
        self.rejected = false;
        ctx.host.replace(self.view, self.editor_spec(ctx));
        ctx.host.attach_escape(self.view);
    }

    /// EDIT → VIEW, discarding the draft. Detaches the escape listener.
    /// A no-op for a session already in VIEW mode.
    pub fn reset(&mut self, ctx: &RowContext<'_>) {
        if self.mode == Mode::View {
            return;
        }
        ctx.host.detach_escape(self.view);
        self.mode = Mode::View;
        self.draft = None;
        self.pending = None;
        self.rejected = false;
        ctx.host.replace(self.view, row_spec(&self.point, ctx));
    }

    /// Re-render in place with a replacement record. Keeps the current mode
    /// and the list position; an open form is re-seeded from the new record.
    pub fn rerender(&mut self, point: Point, ctx: &RowContext<'_>) {
        self.point = point;
        match self.mode {
            Mode::View => ctx.host.replace(self.view, row_spec(&self.point, ctx)),
            Mode::Edit => {
                self.draft = Some(self.point.to_draft());
                ctx.host.replace(self.view, self.editor_spec(ctx));
            }
        }
    }

    pub fn destroy(&mut self, ctx: &RowContext<'_>) {
        if self.mode == Mode::Edit {
            ctx.host.detach_escape(self.view);
        }
        ctx.host.unmount(self.view);
    }

    /// Claim the session's single outstanding-intent slot. Refuses while a
    /// previous intent is unresolved; the open form re-renders with its
    /// submit affordance disabled.
    pub fn begin_intent(&mut self, action: UserAction, ctx: &RowContext<'_>) -> bool {
        if let Some(outstanding) = self.pending {
            warn!(
                point_id = %self.point.id,
                refused = ?action,
                outstanding = ?outstanding,
                "intent refused: another is outstanding"
            );
            return false;
        }
        self.pending = Some(action);
        self.rejected = false;
        if self.mode == Mode::Edit {
            ctx.host.replace(self.view, self.editor_spec(ctx));
        }
        true
    }

    pub fn end_intent(&mut self) {
        self.pending = None;
    }

    /// Restore the pre-submit rendering after a refused mutation and show
    /// the error affordance.
    pub fn mark_failed(&mut self, ctx: &RowContext<'_>) {
        self.pending = None;
        self.rejected = true;
        if self.mode == Mode::Edit {
            ctx.host.replace(self.view, self.editor_spec(ctx));
        }
    }

    fn editor_spec(&self, ctx: &RowContext<'_>) -> ViewSpec {
        let draft = self
            .draft
            .clone()
            .unwrap_or_else(|| self.point.to_draft());
        editor_spec(
            Some(self.point.id.clone()),
            draft,
            self.pending.is_some(),
            self.rejected,
            ctx,
        )
    }
}

pub(crate) fn row_spec(point: &Point, ctx: &RowContext<'_>) -> ViewSpec {
    ViewSpec::PointRow {
        destination: ctx
            .store
            .destination(&point.destination)
            .map(|destination| destination.name),
        offers: ctx.store.resolve_offers(point.kind, &point.offers),
        point: point.clone(),
    }
}

pub(crate) fn editor_spec(
    point_id: Option<PointId>,
    draft: PointDraft,
    pending: bool,
    rejected: bool,
    ctx: &RowContext<'_>,
) -> ViewSpec {
    let destination = draft
        .destination
        .as_ref()
        .and_then(|id| ctx.store.destination(id))
        .map(|destination| destination.name);
    let available_offers = ctx.store.offers_for(draft.kind);
    ViewSpec::PointEditor {
        point_id,
        draft,
        destination,
        available_offers,
        pending,
        rejected,
    }
}
