//! Render Tracker
//!
//! Replaces an instance's render slot. The original render runs inside the
//! instance's tracking session, so whatever it reads becomes the instance's
//! new dependency set and nothing it does may write reactive state.

use std::rc::Rc;

use super::session::ObserverState;
use crate::error::Error;
use crate::view::{Instance, RenderFn};

pub(crate) fn render_tracker(state: Rc<ObserverState>, original: RenderFn) -> RenderFn {
    Rc::new(move |instance: &Instance| {
        if !state.has_session() {
            // Reused without a fresh `init`.
            tracing::debug!(
                label = %state.label(),
                instance = %instance.id(),
                "re-attaching session before render"
            );
            state.attach(instance)?;
        }
        let session = state.session().ok_or_else(|| Error::SessionNotAttached {
            label: state.label().to_owned(),
        })?;

        let output = session.track(|| original(instance))?;
        state.mark_fresh();
        tracing::trace!(
            label = %state.label(),
            instance = %instance.id(),
            dependencies = session.dependency_count(),
            "tracked render"
        );
        output
    })
}
