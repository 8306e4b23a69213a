//! Hook Installer
//!
//! Runs from an observed instance's `init` slot, before any user `init`.
//! Each slot it replaces keeps the function it replaced and calls through to
//! it, so the instance behaves as declared apart from the added tracking.

use std::rc::Rc;

use super::gate::staleness_gate;
use super::session::ObserverState;
use super::track::render_tracker;
use crate::error::Result;
use crate::view::{Component, HookFn, Instance, StaleHook};

/// Copy of `component` whose `init` installs the observer, then runs the
/// component's own `init` with the same instance.
///
/// Callers pass undecorated descriptors only; see `shape::wrap`.
pub(crate) fn decorate(component: &Component, label: Rc<str>) -> Component {
    let original_init = component.init().cloned();
    let init: HookFn = Rc::new(move |instance: &Instance| {
        install(instance, &label)?;
        match &original_init {
            Some(init) => init(instance),
            None => Ok(()),
        }
    });
    component.with_init(Some(init)).mark_observed()
}

/// Decorate `instance`'s slots and attach its tracking session.
///
/// An instance that is already observed keeps its decorated slots; only the
/// session is attached, which fails if one is still live.
pub(crate) fn install(instance: &Instance, label: &Rc<str>) -> Result<()> {
    if let Some(state) = ObserverState::of(instance) {
        tracing::debug!(
            label = %state.label(),
            instance = %instance.id(),
            "instance already observed"
        );
        return state.attach(instance);
    }

    let state = Rc::new(ObserverState::new(label.clone()));
    {
        let mut slots = instance.slots_mut();

        let original_assess = slots.assess.take();
        let original_render = slots.render.clone();
        let original_unmount = slots.hooks.will_unmount.take();

        slots.assess = Some(staleness_gate(state.clone(), original_assess));
        slots.render = render_tracker(state.clone(), original_render);
        slots.hooks.will_unmount = Some(unmount_hook(state.clone(), original_unmount));

        if !slots.hooks.become_stale.is_configured() {
            slots.hooks.become_stale = StaleHook::Redraw;
        }
    }

    instance.insert_extension(state.clone());
    state.attach(instance)
}

fn unmount_hook(state: Rc<ObserverState>, original: Option<HookFn>) -> HookFn {
    Rc::new(move |instance: &Instance| {
        state.detach(instance)?;
        match &original {
            Some(hook) => hook(instance),
            None => Ok(()),
        }
    })
}
