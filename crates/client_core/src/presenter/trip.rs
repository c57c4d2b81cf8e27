//! The table presenter: derives the visible list, owns the row sessions and
//! reconciles every re-render.
//!
//! Reflow granularity follows the update kind of the incoming notification:
//! PATCH re-renders one row in place, MINOR rebuilds the list keeping the
//! sort selection, MAJOR rebuilds and resets the sort to the default.
//! Mutation intents are forwarded to the points store; local state never
//! changes ahead of remote confirmation.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use shared::domain::{FilterKind, Point, PointDraft, PointId, SortKind, UpdateKind, UserAction};

use crate::model::{FilterEvent, FilterStore, PointsEvent, PointsStore};
use crate::observer::Observer;
use crate::policy;
use crate::presenter::row::{Mode, RowContext, RowSession};
use crate::presenter::row_new::{NewRowSession, NewSessionClose};
use crate::view::{MountPoint, MountPosition, ViewHost, ViewId, ViewSpec};

struct Inner {
    active: bool,
    loading: bool,
    sort: SortKind,
    filter_kind: FilterKind,
    loading_view: Option<ViewId>,
    list_view: Option<ViewId>,
    sort_view: Option<ViewId>,
    no_points_view: Option<ViewId>,
    rows: HashMap<PointId, RowSession>,
    new_row: Option<NewRowSession>,
}

impl Inner {
    fn new() -> Self {
        Self {
            active: false,
            loading: true,
            sort: SortKind::default(),
            filter_kind: FilterKind::default(),
            loading_view: None,
            list_view: None,
            sort_view: None,
            no_points_view: None,
            rows: HashMap::new(),
            new_row: None,
        }
    }
}

pub struct TripPresenter {
    points: Arc<PointsStore>,
    filter: Arc<FilterStore>,
    host: Arc<dyn ViewHost>,
    inner: Mutex<Inner>,
}

impl TripPresenter {
    pub fn new(
        points: Arc<PointsStore>,
        filter: Arc<FilterStore>,
        host: Arc<dyn ViewHost>,
    ) -> Arc<Self> {
        Arc::new(Self {
            points,
            filter,
            host,
            inner: Mutex::new(Inner::new()),
        })
    }

    /// Subscribe to both stores and render. Before the initial load
    /// completes this shows the loading placeholder; after a `destroy` it
    /// rebuilds the table from the stores' current state.
    pub fn init(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock();
            if inner.active {
                return;
            }
            inner.active = true;
            inner.loading = !self.points.is_loaded();
            self.render_table(&mut inner);
        }
        self.points
            .add_observer(self.clone() as Arc<dyn Observer<PointsEvent>>);
        self.filter
            .add_observer(self.clone() as Arc<dyn Observer<FilterEvent>>);
    }

    /// Tear everything down and unsubscribe, so the table stops reacting to
    /// model changes while another top-level view is shown.
    pub fn destroy(self: &Arc<Self>) {
        let closed = {
            let mut inner = self.inner.lock();
            if !inner.active {
                return;
            }
            inner.active = false;
            self.clear_table(&mut inner, true)
        };
        self.points
            .remove_observer(&(self.clone() as Arc<dyn Observer<PointsEvent>>));
        self.filter
            .remove_observer(&(self.clone() as Arc<dyn Observer<FilterEvent>>));
        info!("table presenter destroyed");
        if let Some(on_close) = closed {
            on_close();
        }
    }

    pub fn current_sort(&self) -> SortKind {
        self.inner.lock().sort
    }

    /// Selecting the active kind is a no-op; anything else reflows the list
    /// under the new comparator, keeping every row in VIEW mode.
    pub fn set_sort(&self, sort: SortKind) {
        let mut inner = self.inner.lock();
        if !inner.active || inner.loading || inner.sort == sort {
            return;
        }
        inner.sort = sort;
        let closed = self.clear_table(&mut inner, false);
        self.render_table(&mut inner);
        drop(inner);
        if let Some(on_close) = closed {
            on_close();
        }
    }

    /// Reflow, then open the creation form on top of the list. `on_close`
    /// fires when the form ends, by commit or cancel.
    pub fn create_point(&self, on_close: NewSessionClose) {
        let mut inner = self.inner.lock();
        if !inner.active || inner.loading {
            warn!("create refused: table is not ready");
            drop(inner);
            on_close();
            return;
        }
        let closed = self.clear_table(&mut inner, false);
        self.render_table(&mut inner);
        // The empty-state placeholder never shows behind the creation form.
        if let Some(view) = inner.no_points_view.take() {
            self.host.unmount(view);
        }
        if let Some(list) = inner.list_view {
            let ctx = self.ctx();
            inner.new_row = Some(NewRowSession::open(list, on_close, &ctx));
        }
        drop(inner);
        if let Some(previous) = closed {
            previous();
        }
    }

    /// Switch one row to EDIT mode. Every other session, including an open
    /// creation form, resets to VIEW first, so at most one row is editable.
    pub fn open_editor(&self, id: &PointId) {
        let mut inner = self.inner.lock();
        if !inner.rows.contains_key(id) {
            return;
        }
        let closed = self.close_new(&mut inner);
        let ctx = self.ctx();
        for (row_id, row) in inner.rows.iter_mut() {
            if row_id != id {
                row.reset(&ctx);
            }
        }
        if let Some(row) = inner.rows.get_mut(id) {
            row.open(&ctx);
        }
        drop(inner);
        if let Some(on_close) = closed {
            on_close();
        }
    }

    /// Explicit close: back to VIEW, discarding the draft.
    pub fn close_editor(&self, id: &PointId) {
        let mut inner = self.inner.lock();
        let ctx = self.ctx();
        if let Some(row) = inner.rows.get_mut(id) {
            row.reset(&ctx);
        }
    }

    /// The cancellation key. Routed to whichever session is editing: the
    /// creation form closes, an ordinary row reverts to its record.
    pub fn escape(&self) {
        let mut inner = self.inner.lock();
        if inner.new_row.is_some() {
            let closed = self.close_new(&mut inner);
            drop(inner);
            if let Some(on_close) = closed {
                on_close();
            }
            return;
        }
        let ctx = self.ctx();
        if let Some(row) = inner
            .rows
            .values_mut()
            .find(|row| row.mode() == Mode::Edit)
        {
            row.reset(&ctx);
        }
    }

    /// Cancel the creation form without committing.
    pub fn cancel_new(&self) {
        let mut inner = self.inner.lock();
        let closed = self.close_new(&mut inner);
        drop(inner);
        if let Some(on_close) = closed {
            on_close();
        }
    }

    /// Submit the open edit form for `id`. On success the store notification
    /// reflows the table; on failure the form stays open with its error
    /// affordance and the model is untouched.
    pub async fn submit_editor(&self, id: &PointId, draft: PointDraft) -> Result<()> {
        let point = {
            let mut inner = self.inner.lock();
            let ctx = RowContext {
                host: self.host.as_ref(),
                store: self.points.as_ref(),
            };
            let Some(row) = inner.rows.get_mut(id) else {
                bail!("no session for point {id}");
            };
            if row.mode() != Mode::Edit {
                bail!("point {id} is not being edited");
            }
            if !row.begin_intent(UserAction::UpdatePoint, &ctx) {
                bail!("point {id} already has an outstanding intent");
            }
            match draft.into_point(id.clone()) {
                Ok(point) => point,
                Err(err) => {
                    row.mark_failed(&ctx);
                    return Err(err.into());
                }
            }
        };
        match self.points.update_point(UpdateKind::Minor, point).await {
            Ok(_) => Ok(()),
            Err(err) => {
                error!(point_id = %id, error = %err, "failed to save point");
                self.restore_failed(id);
                Err(err)
            }
        }
    }

    /// Flip the favorite flag from VIEW mode. Carries PATCH semantics: only
    /// the affected row re-renders.
    pub async fn toggle_favorite(&self, id: &PointId) -> Result<()> {
        let updated = {
            let mut inner = self.inner.lock();
            let ctx = RowContext {
                host: self.host.as_ref(),
                store: self.points.as_ref(),
            };
            let Some(row) = inner.rows.get_mut(id) else {
                bail!("no session for point {id}");
            };
            if row.mode() != Mode::View {
                bail!("point {id} is being edited");
            }
            if !row.begin_intent(UserAction::UpdatePoint, &ctx) {
                bail!("point {id} already has an outstanding intent");
            }
            let point = row.point();
            point.with_favorite(!point.is_favorite)
        };
        match self.points.update_point(UpdateKind::Patch, updated).await {
            Ok(_) => {
                let mut inner = self.inner.lock();
                if let Some(row) = inner.rows.get_mut(id) {
                    row.end_intent();
                }
                Ok(())
            }
            Err(err) => {
                error!(point_id = %id, error = %err, "failed to toggle favorite");
                self.restore_failed(id);
                Err(err)
            }
        }
    }

    /// Delete the point behind a session. Emitted directly, without a mode
    /// transition.
    pub async fn request_delete(&self, id: &PointId) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            let ctx = RowContext {
                host: self.host.as_ref(),
                store: self.points.as_ref(),
            };
            let Some(row) = inner.rows.get_mut(id) else {
                bail!("no session for point {id}");
            };
            if !row.begin_intent(UserAction::DeletePoint, &ctx) {
                bail!("point {id} already has an outstanding intent");
            }
        }
        match self.points.delete_point(UpdateKind::Minor, id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(point_id = %id, error = %err, "failed to delete point");
                self.restore_failed(id);
                Err(err)
            }
        }
    }

    /// Submit the creation form. A draft without a destination is refused
    /// locally; a remote refusal leaves the form open with its error
    /// affordance. The close callback fires via the MINOR reflow on success.
    pub async fn submit_new(&self, draft: PointDraft) -> Result<Point> {
        {
            let mut inner = self.inner.lock();
            let ctx = RowContext {
                host: self.host.as_ref(),
                store: self.points.as_ref(),
            };
            let Some(session) = inner.new_row.as_mut() else {
                bail!("no creation in progress");
            };
            if !session.begin_intent(draft.clone(), &ctx) {
                bail!("a creation submit is already outstanding");
            }
            if draft.destination.is_none() {
                session.mark_failed(&ctx);
                bail!("draft has no destination");
            }
        }
        match self.points.add_point(UpdateKind::Minor, draft).await {
            Ok(point) => Ok(point),
            Err(err) => {
                error!(error = %err, "failed to create point");
                let mut inner = self.inner.lock();
                let ctx = RowContext {
                    host: self.host.as_ref(),
                    store: self.points.as_ref(),
                };
                if let Some(session) = inner.new_row.as_mut() {
                    session.mark_failed(&ctx);
                }
                Err(err)
            }
        }
    }

    fn ctx(&self) -> RowContext<'_> {
        RowContext {
            host: self.host.as_ref(),
            store: self.points.as_ref(),
        }
    }

    fn restore_failed(&self, id: &PointId) {
        let mut inner = self.inner.lock();
        let ctx = RowContext {
            host: self.host.as_ref(),
            store: self.points.as_ref(),
        };
        if let Some(row) = inner.rows.get_mut(id) {
            row.mark_failed(&ctx);
        }
    }

    /// Filtered-then-sorted projection of the store. Derived on demand,
    /// never cached across notifications.
    fn visible_points(&self, filter: FilterKind, sort: SortKind) -> Vec<Point> {
        let now = Utc::now();
        let mut points = policy::filter_points(filter, now, &self.points.points());
        points.sort_by(|a, b| policy::compare(sort, a, b));
        points
    }

    fn render_table(&self, inner: &mut Inner) {
        if inner.loading {
            if inner.loading_view.is_none() {
                let view =
                    self.host
                        .mount(MountPoint::Root, ViewSpec::Loading, MountPosition::AfterBegin);
                inner.loading_view = Some(view);
            }
            return;
        }

        let list =
            self.host
                .mount(MountPoint::Root, ViewSpec::PointList, MountPosition::BeforeEnd);
        inner.list_view = Some(list);

        inner.filter_kind = self.filter.current();
        let points = self.visible_points(inner.filter_kind, inner.sort);
        if points.is_empty() {
            inner.no_points_view = Some(self.host.mount(
                MountPoint::Within(list),
                ViewSpec::NoPoints {
                    filter: inner.filter_kind,
                },
                MountPosition::AfterBegin,
            ));
            return;
        }

        inner.sort_view = Some(self.host.mount(
            MountPoint::Root,
            ViewSpec::SortBar {
                selected: inner.sort,
            },
            MountPosition::AfterBegin,
        ));
        let ctx = self.ctx();
        for point in points {
            let id = point.id.clone();
            let row = RowSession::mount(point, list, &ctx);
            inner.rows.insert(id, row);
        }
    }

    /// Full teardown of the rendered table: every row session, the creation
    /// form, the sort control and the placeholders. Returns the creation
    /// form's close callback, to be invoked after the lock is released.
    fn clear_table(&self, inner: &mut Inner, reset_sort: bool) -> Option<NewSessionClose> {
        let ctx = RowContext {
            host: self.host.as_ref(),
            store: self.points.as_ref(),
        };
        let closed = inner.new_row.take().and_then(|session| session.destroy(&ctx));
        for (_, mut row) in inner.rows.drain() {
            row.destroy(&ctx);
        }
        if let Some(view) = inner.sort_view.take() {
            self.host.unmount(view);
        }
        if let Some(view) = inner.loading_view.take() {
            self.host.unmount(view);
        }
        if let Some(view) = inner.no_points_view.take() {
            self.host.unmount(view);
        }
        if let Some(view) = inner.list_view.take() {
            self.host.unmount(view);
        }
        if reset_sort {
            inner.sort = SortKind::default();
        }
        closed
    }

    /// Close the creation form outside a reflow, restoring the empty-state
    /// placeholder when the list it leaves behind has no rows.
    fn close_new(&self, inner: &mut Inner) -> Option<NewSessionClose> {
        let session = inner.new_row.take()?;
        let ctx = self.ctx();
        let closed = session.destroy(&ctx);
        if !inner.loading && inner.rows.is_empty() && inner.no_points_view.is_none() {
            if let Some(list) = inner.list_view {
                inner.filter_kind = self.filter.current();
                inner.no_points_view = Some(self.host.mount(
                    MountPoint::Within(list),
                    ViewSpec::NoPoints {
                        filter: inner.filter_kind,
                    },
                    MountPosition::AfterBegin,
                ));
            }
        }
        closed
    }

    fn apply_update(&self, kind: UpdateKind, payload: Option<&Point>) {
        let closed = {
            let mut inner = self.inner.lock();
            if !inner.active {
                return;
            }
            match kind {
                UpdateKind::Patch => {
                    if let Some(point) = payload {
                        let ctx = self.ctx();
                        // A session may have been torn down while the call
                        // was in flight; that is not an error.
                        if let Some(row) = inner.rows.get_mut(&point.id) {
                            row.rerender(point.clone(), &ctx);
                        }
                    }
                    None
                }
                UpdateKind::Minor => {
                    let closed = self.clear_table(&mut inner, false);
                    self.render_table(&mut inner);
                    closed
                }
                UpdateKind::Major => {
                    let closed = self.clear_table(&mut inner, true);
                    self.render_table(&mut inner);
                    closed
                }
                UpdateKind::Init => {
                    inner.loading = false;
                    if let Some(view) = inner.loading_view.take() {
                        self.host.unmount(view);
                    }
                    self.render_table(&mut inner);
                    None
                }
            }
        };
        if let Some(on_close) = closed {
            on_close();
        }
    }
}

impl Observer<PointsEvent> for TripPresenter {
    fn notify(&self, event: &PointsEvent) {
        self.apply_update(event.kind, event.payload.as_ref());
    }
}

impl Observer<FilterEvent> for TripPresenter {
    fn notify(&self, event: &FilterEvent) {
        self.apply_update(event.kind, None);
    }
}

#[cfg(test)]
#[path = "tests/trip_tests.rs"]
mod tests;
