//! Staleness Gate
//!
//! Replaces an instance's change-assessment slot. The original assessment,
//! if any, is always called so the runtime keeps storing the keys it would
//! have stored without the gate. A stale instance gets the same key back
//! with `force` set, which makes the runtime render without disturbing the
//! stored history. Without an original the key is constant, so only
//! staleness ever causes a render.

use std::rc::Rc;

use super::session::ObserverState;
use crate::view::{AssessFn, Assessment, Instance};

pub(crate) fn staleness_gate(state: Rc<ObserverState>, original: Option<AssessFn>) -> AssessFn {
    Rc::new(move |instance: &Instance| {
        let assessment = match &original {
            Some(assess) => assess(instance),
            None => Assessment::unchanged(),
        };

        if state.needs_render() {
            tracing::trace!(
                label = %state.label(),
                instance = %instance.id(),
                "stale; forcing render"
            );
            assessment.forced()
        } else {
            assessment
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn original_runs_on_every_call() {
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        let original: AssessFn = Rc::new(move |_: &Instance| {
            calls_clone.set(calls_clone.get() + 1);
            Assessment::new(json!(calls_clone.get()))
        });
        let instance = Instance::detached(json!({}));
        let state = Rc::new(ObserverState::new(Rc::from("Gate")));
        state.attach(&instance).unwrap();
        let gate = staleness_gate(state.clone(), Some(original));

        let stale = gate(&instance);
        assert_eq!(stale, Assessment::new(json!(1)).forced());

        state.mark_fresh();
        let fresh = gate(&instance);
        assert_eq!(fresh, Assessment::new(json!(2)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn without_original_only_staleness_renders() {
        let instance = Instance::detached(json!({}));
        let state = Rc::new(ObserverState::new(Rc::from("Gate")));
        state.attach(&instance).unwrap();
        let gate = staleness_gate(state.clone(), None);

        assert!(gate(&instance).should_render(Some(&json!(null))));

        state.mark_fresh();
        let fresh = gate(&instance);
        assert!(!fresh.should_render(Some(&json!(null))));
        assert!(fresh.should_render(None));
    }
}
