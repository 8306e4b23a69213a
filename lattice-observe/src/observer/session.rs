//! Session Controller
//!
//! Every observed instance carries one [`ObserverState`]. It owns at most one
//! tracking session at a time. Attaching while a session exists, or
//! detaching while none does, means a lifecycle step was skipped; both are
//! reported as integration errors instead of being papered over, because a
//! leaked session keeps subscriptions alive and keeps invalidating an
//! instance nobody renders.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::reactive::Session;
use crate::view::Instance;

/// Per-instance integration state.
pub struct ObserverState {
    label: Rc<str>,
    session: RefCell<Option<Session>>,
    stale: Cell<bool>,
}

impl ObserverState {
    pub(crate) fn new(label: Rc<str>) -> Self {
        Self {
            label,
            session: RefCell::new(None),
            stale: Cell::new(true),
        }
    }

    /// The state attached to `instance`, if it is observed.
    pub fn of(instance: &Instance) -> Option<Rc<Self>> {
        instance.extension::<Self>()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether tracked data changed since the last completed render.
    pub fn is_stale(&self) -> bool {
        self.stale.get()
    }

    pub fn has_session(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Signals read during the last tracked render.
    pub fn dependency_count(&self) -> usize {
        self.session
            .borrow()
            .as_ref()
            .map(Session::dependency_count)
            .unwrap_or(0)
    }

    /// Whether the next assessment must force a render.
    ///
    /// Without a session nothing records what the instance read, so its last
    /// output cannot be trusted either.
    pub(crate) fn needs_render(&self) -> bool {
        self.is_stale() || !self.has_session()
    }

    pub(crate) fn mark_fresh(&self) {
        self.stale.set(false);
    }

    pub(crate) fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    /// Create this instance's tracking session.
    ///
    /// The instance is stale until the session completes its first tracked
    /// render. On invalidation the instance is marked stale and its
    /// `become_stale` hook runs with the instance's current attrs.
    pub fn attach(self: &Rc<Self>, instance: &Instance) -> Result<()> {
        if self.has_session() {
            tracing::error!(
                label = %self.label,
                instance = %instance.id(),
                "session already attached"
            );
            return Err(Error::SessionAlreadyAttached {
                label: self.label.to_string(),
            });
        }

        self.stale.set(true);

        let state = Rc::downgrade(self);
        let target = instance.downgrade();
        let session = Session::new(self.label.to_string(), move || {
            let (Some(state), Some(instance)) = (state.upgrade(), target.upgrade()) else {
                return;
            };
            state.stale.set(true);
            tracing::debug!(
                label = %state.label,
                instance = %instance.id(),
                "instance became stale"
            );

            let hook = instance.become_stale_hook();
            hook.invoke(&instance, &instance.attrs());
        });

        *self.session.borrow_mut() = Some(session);
        tracing::debug!(label = %self.label, instance = %instance.id(), "session attached");
        Ok(())
    }

    /// Dispose this instance's tracking session.
    pub fn detach(&self, instance: &Instance) -> Result<()> {
        let Some(session) = self.session.borrow_mut().take() else {
            tracing::error!(label = %self.label, instance = %instance.id(), "no session to detach");
            return Err(Error::SessionNotAttached {
                label: self.label.to_string(),
            });
        };

        session.dispose();
        tracing::debug!(label = %self.label, instance = %instance.id(), "session detached");
        Ok(())
    }
}

impl fmt::Debug for ObserverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverState")
            .field("label", &self.label)
            .field("stale", &self.is_stale())
            .field("session", &*self.session.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use crate::view::StaleHook;
    use serde_json::{json, Value};

    fn state(label: &str) -> Rc<ObserverState> {
        Rc::new(ObserverState::new(Rc::from(label)))
    }

    #[test]
    fn attach_and_detach_are_paired() {
        let instance = Instance::detached(json!({}));
        let state = state("Pair");

        state.attach(&instance).unwrap();
        assert!(state.has_session());
        assert!(state.is_stale());

        let err = state.attach(&instance).unwrap_err();
        assert!(matches!(err, Error::SessionAlreadyAttached { ref label } if label == "Pair"));
        assert!(err.is_integration_bug());

        state.detach(&instance).unwrap();
        assert!(!state.has_session());

        let err = state.detach(&instance).unwrap_err();
        assert!(matches!(err, Error::SessionNotAttached { .. }));
    }

    #[test]
    fn attach_marks_stale_again() {
        let instance = Instance::detached(json!({}));
        let state = state("Fresh");
        state.attach(&instance).unwrap();
        state.mark_fresh();
        state.detach(&instance).unwrap();
        assert!(!state.is_stale());
        assert!(state.needs_render());

        state.attach(&instance).unwrap();
        assert!(state.is_stale());
    }

    #[test]
    fn invalidation_marks_stale_and_calls_hook_with_attrs() {
        let instance = Instance::detached(json!({"id": 3}));
        let seen: Rc<RefCell<Vec<Value>>> = Rc::default();
        let seen_clone = seen.clone();
        instance.slots_mut().hooks.become_stale =
            StaleHook::Custom(Rc::new(move |_: &Instance, attrs: &Value| {
                seen_clone.borrow_mut().push(attrs.clone())
            }));

        let x = Signal::new(1);
        let state = state("Hooked");
        state.attach(&instance).unwrap();
        state.session().unwrap().track(|| x.get()).unwrap();
        state.mark_fresh();

        x.set(2);

        assert!(state.is_stale());
        assert_eq!(*seen.borrow(), vec![json!({"id": 3})]);
    }

    #[test]
    fn disabled_hook_still_marks_stale() {
        let instance = Instance::detached(json!({}));
        instance.slots_mut().hooks.become_stale = StaleHook::Disabled;

        let x = Signal::new(1);
        let state = state("Quiet");
        state.attach(&instance).unwrap();
        state.session().unwrap().track(|| x.get()).unwrap();
        state.mark_fresh();

        x.set(2);
        assert!(state.is_stale());
    }

    #[test]
    fn detached_session_stops_listening() {
        let instance = Instance::detached(json!({}));
        let x = Signal::new(1);
        let state = state("Gone");
        state.attach(&instance).unwrap();
        state.session().unwrap().track(|| x.get()).unwrap();
        state.mark_fresh();

        state.detach(&instance).unwrap();
        x.set(2);

        assert!(!state.is_stale());
        assert_eq!(x.subscriber_count(), 0);
    }
}
