//! Shape Classifier
//!
//! Resolves which of the three declaration shapes a view has, derives its
//! debug label, and produces the declaration the runtime will actually see:
//! one whose resolved descriptor runs the hook installer first thing in
//! `init`.
//!
//! Wrapping is idempotent. A descriptor that is already observed, directly
//! or as the output of a factory, passes through untouched and keeps the
//! label it was first observed under.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::install::decorate;
use crate::view::{Component, DescriptorFactory, Instance, RenderFactory, View};

/// Label used when neither the call site nor the declaration names the view.
pub const ANONYMOUS_VIEW: &str = "<anonymous view>";

/// Explicit name, else the descriptor's own name, else [`ANONYMOUS_VIEW`].
pub fn debug_label(view: &View, name: Option<&str>) -> String {
    let declared = match view {
        View::Descriptor(component) => component.name(),
        View::DescriptorFactory(_) | View::RenderFactory(_) => None,
    };
    name.or(declared).unwrap_or(ANONYMOUS_VIEW).to_owned()
}

pub(crate) fn wrap(view: View, name: Option<&str>) -> View {
    let label: Rc<str> = Rc::from(debug_label(&view, name));
    tracing::debug!(%label, "observing view");

    match view {
        View::Descriptor(component) if component.is_observed() => View::Descriptor(component),
        View::Descriptor(component) => View::Descriptor(Rc::new(decorate(&component, label))),
        View::DescriptorFactory(factory) => {
            View::DescriptorFactory(wrap_descriptor_factory(factory, label))
        }
        View::RenderFactory(factory) => {
            View::DescriptorFactory(wrap_render_factory(factory, label))
        }
    }
}

/// Decorated descriptors, keyed by the identity of the descriptor they
/// were built from.
#[derive(Default)]
struct DecoratedCache {
    entries: RefCell<Vec<(Weak<Component>, Rc<Component>)>>,
}

impl DecoratedCache {
    fn get_or_decorate(&self, original: &Rc<Component>, label: &Rc<str>) -> Rc<Component> {
        if original.is_observed() {
            return original.clone();
        }

        let mut entries = self.entries.borrow_mut();
        entries.retain(|(source, _)| source.strong_count() > 0);

        if let Some((_, decorated)) = entries
            .iter()
            .find(|(source, _)| source.as_ptr() == Rc::as_ptr(original))
        {
            return decorated.clone();
        }

        let decorated = Rc::new(decorate(original, label.clone()));
        entries.push((Rc::downgrade(original), decorated.clone()));
        decorated
    }
}

fn wrap_descriptor_factory(factory: DescriptorFactory, label: Rc<str>) -> DescriptorFactory {
    let cache = DecoratedCache::default();
    Rc::new(move |instance: &Instance| cache.get_or_decorate(&factory(instance), &label))
}

fn wrap_render_factory(factory: RenderFactory, label: Rc<str>) -> DescriptorFactory {
    Rc::new(move |instance: &Instance| {
        let render = factory(instance);
        Rc::new(decorate(&Component::from_render(render), label.clone()))
    })
}
