//! Creation session: an edit form with no underlying record.

use chrono::Utc;
use tracing::warn;

use shared::domain::{PointDraft, UserAction};

use crate::presenter::row::{editor_spec, RowContext};
use crate::view::{MountPoint, MountPosition, ViewId};

/// Invoked after the creation form closes, whether by a successful ADD or
/// by cancellation. Lets the shell restore affordances it hid while the
/// form was open. Must not call back into the presenter.
pub type NewSessionClose = Box<dyn FnOnce() + Send>;

pub(crate) struct NewRowSession {
    draft: PointDraft,
    view: ViewId,
    pending: bool,
    rejected: bool,
    on_close: Option<NewSessionClose>,
}

impl NewRowSession {
    /// Mount the blank creation form at the head of the list and attach the
    /// escape listener; the form opens directly in edit mode.
    pub fn open(list: ViewId, on_close: NewSessionClose, ctx: &RowContext<'_>) -> Self {
        let draft = PointDraft::blank(Utc::now());
        let spec = editor_spec(None, draft.clone(), false, false, ctx);
        let view = ctx
            .host
            .mount(MountPoint::Within(list), spec, MountPosition::AfterBegin);
        ctx.host.attach_escape(view);
        Self {
            draft,
            view,
            pending: false,
            rejected: false,
            on_close: Some(on_close),
        }
    }

    pub fn begin_intent(&mut self, draft: PointDraft, ctx: &RowContext<'_>) -> bool {
        if self.pending {
            warn!(
                refused = ?UserAction::AddPoint,
                "creation refused: a submit is already outstanding"
            );
            return false;
        }
        self.draft = draft;
        self.pending = true;
        self.rejected = false;
        self.rerender(ctx);
        true
    }

    pub fn mark_failed(&mut self, ctx: &RowContext<'_>) {
        self.pending = false;
        self.rejected = true;
        self.rerender(ctx);
    }

    fn rerender(&self, ctx: &RowContext<'_>) {
        let spec = editor_spec(None, self.draft.clone(), self.pending, self.rejected, ctx);
        ctx.host.replace(self.view, spec);
    }

    /// Tear the form down. Returns the close callback for the caller to run
    /// once its own locks are released.
    pub fn destroy(mut self, ctx: &RowContext<'_>) -> Option<NewSessionClose> {
        ctx.host.detach_escape(self.view);
        ctx.host.unmount(self.view);
        self.on_close.take()
    }
}
