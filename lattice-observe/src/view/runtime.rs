//! View Runtime
//!
//! A retained-mode runtime without a tree: it mounts instances, asks each
//! instance whether it needs to render, renders it, and keeps the output.
//!
//! # Render Pass
//!
//! 1. If the instance has an assessment slot, call it exactly once and store
//!    the returned key. Render when the key differs from the previously
//!    stored one, when nothing was stored yet, or when the assessment is
//!    forced.
//! 2. Without an assessment slot, always render.
//! 3. Call the render slot and keep the output.
//!
//! # Redraw Requests
//!
//! `Instance::redraw` lands in [`RuntimeInner::request_redraw`]. Depending on
//! [`RedrawMode`] the request is rendered on the spot or queued until
//! [`ViewRuntime::flush`]. The queue is an ordered set, so an instance asked
//! to redraw several times before a flush renders once.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use super::component::View;
use super::instance::{Instance, InstanceId};
use crate::config::{RedrawMode, RuntimeConfig};
use crate::error::{Error, Result};

pub(crate) struct RuntimeInner {
    config: RuntimeConfig,
    mounted: RefCell<IndexMap<InstanceId, Instance>>,
    retired: RefCell<IndexMap<InstanceId, Instance>>,
    queue: RefCell<IndexSet<InstanceId>>,
    /// Failures of renders triggered from inside a redraw request.
    errors: RefCell<Vec<(InstanceId, Error)>>,
}

impl RuntimeInner {
    pub(crate) fn request_redraw(this: &Rc<Self>, id: InstanceId) {
        if !this.mounted.borrow().contains_key(&id) {
            tracing::trace!(instance = %id, "redraw requested for instance that is not mounted");
            return;
        }

        match this.config.redraw {
            RedrawMode::Deferred => {
                tracing::debug!(instance = %id, "redraw queued");
                this.queue.borrow_mut().insert(id);
            }
            RedrawMode::Immediate => {
                tracing::debug!(instance = %id, "redraw running immediately");
                if let Err(err) = this.redraw(id) {
                    tracing::error!(instance = %id, %err, "immediate redraw failed");
                    this.errors.borrow_mut().push((id, err));
                }
            }
        }
    }

    fn instance(&self, id: InstanceId) -> Result<Instance> {
        self.mounted
            .borrow()
            .get(&id)
            .cloned()
            .ok_or(Error::UnknownInstance(id))
    }

    fn redraw(&self, id: InstanceId) -> Result<bool> {
        let instance = self.instance(id)?;
        self.render_pass(&instance)
    }

    fn render_pass(&self, instance: &Instance) -> Result<bool> {
        self.queue.borrow_mut().shift_remove(&instance.id());

        let should_render = match instance.assess_fn() {
            Some(assess) => {
                let assessment = assess(instance);
                let stored = instance.stored_key();
                let render = assessment.should_render(stored.as_ref());
                instance.store_key(assessment.key);
                render
            }
            None => true,
        };

        tracing::trace!(instance = %instance.id(), should_render, "assessed");
        if !should_render {
            return Ok(false);
        }

        let render = instance.render_fn();
        let output = render(instance)?;
        instance.record_output(output);
        Ok(true)
    }
}

/// Handle to a view runtime. Clones share the same runtime.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = ViewRuntime::new(RuntimeConfig::default());
/// let instance = runtime.mount(&view, json!({"title": "Inbox"}))?;
///
/// // Later, after signals changed:
/// runtime.flush()?;
/// ```
#[derive(Clone)]
pub struct ViewRuntime {
    inner: Rc<RuntimeInner>,
}

impl ViewRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                mounted: RefCell::new(IndexMap::new()),
                retired: RefCell::new(IndexMap::new()),
                queue: RefCell::new(IndexSet::new()),
                errors: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Create an instance of `view`, run its `init` slot, and render it.
    pub fn mount(&self, view: &View, attrs: Value) -> Result<Instance> {
        let instance = Instance::new(attrs, Rc::downgrade(&self.inner));
        let component = view.resolve(&instance);
        instance.load(&component);

        if let Some(init) = component.init() {
            init(&instance)?;
        }

        self.inner
            .mounted
            .borrow_mut()
            .insert(instance.id(), instance.clone());
        tracing::debug!(instance = %instance.id(), name = ?instance.name(), "mounted");

        self.inner.render_pass(&instance)?;
        Ok(instance)
    }

    /// Replace an instance's attrs and run a render pass.
    ///
    /// Returns whether the instance rendered.
    pub fn update(&self, id: InstanceId, attrs: Value) -> Result<bool> {
        let instance = self.inner.instance(id)?;
        instance.set_attrs(attrs);
        self.inner.render_pass(&instance)
    }

    /// Run a render pass now. Returns whether the instance rendered.
    pub fn redraw(&self, id: InstanceId) -> Result<bool> {
        self.inner.redraw(id)
    }

    /// Same as [`Instance::redraw`].
    pub fn request_redraw(&self, id: InstanceId) {
        RuntimeInner::request_redraw(&self.inner, id);
    }

    /// Run a render pass for every queued instance, oldest request first.
    ///
    /// Stops at the first failure, leaving later requests queued. Returns
    /// the number of instances that rendered.
    pub fn flush(&self) -> Result<usize> {
        let mut rendered = 0;
        loop {
            let next = self.inner.queue.borrow().first().copied();
            let Some(id) = next else { break };
            if self.inner.redraw(id)? {
                rendered += 1;
            }
        }
        Ok(rendered)
    }

    /// Run the instance's `will_unmount` slot and retire it.
    ///
    /// A retired instance can be brought back with [`ViewRuntime::reuse`]
    /// until [`ViewRuntime::release`] or [`ViewRuntime::purge_retired`]
    /// drops it. The instance is retired even if the hook fails.
    pub fn unmount(&self, id: InstanceId) -> Result<()> {
        let instance = self
            .inner
            .mounted
            .borrow_mut()
            .shift_remove(&id)
            .ok_or(Error::UnknownInstance(id))?;
        self.inner.queue.borrow_mut().shift_remove(&id);
        self.inner
            .retired
            .borrow_mut()
            .insert(id, instance.clone());
        tracing::debug!(instance = %id, "unmounted");

        match instance.will_unmount_hook() {
            Some(hook) => hook(&instance),
            None => Ok(()),
        }
    }

    /// Drop a retired instance for good. It can no longer be reused.
    pub fn release(&self, id: InstanceId) -> Result<()> {
        self.inner
            .retired
            .borrow_mut()
            .shift_remove(&id)
            .ok_or(Error::UnknownInstance(id))?;
        tracing::debug!(instance = %id, "released");
        Ok(())
    }

    /// Drop every retired instance. Returns how many were dropped.
    pub fn purge_retired(&self) -> usize {
        let purged = std::mem::take(&mut *self.inner.retired.borrow_mut());
        tracing::debug!(count = purged.len(), "purged retired instances");
        purged.len()
    }

    pub fn retired_count(&self) -> usize {
        self.inner.retired.borrow().len()
    }

    /// Mount a retired instance again without running `init`.
    ///
    /// Returns whether the instance rendered.
    pub fn reuse(&self, id: InstanceId, attrs: Value) -> Result<bool> {
        let instance = self
            .inner
            .retired
            .borrow_mut()
            .shift_remove(&id)
            .ok_or(Error::UnknownInstance(id))?;
        instance.set_attrs(attrs);
        self.inner
            .mounted
            .borrow_mut()
            .insert(id, instance.clone());
        tracing::debug!(instance = %id, "reused");

        self.inner.render_pass(&instance)
    }

    pub fn instance(&self, id: InstanceId) -> Option<Instance> {
        self.inner.instance(id).ok()
    }

    pub fn mounted_count(&self) -> usize {
        self.inner.mounted.borrow().len()
    }

    pub fn pending_redraws(&self) -> Vec<InstanceId> {
        self.inner.queue.borrow().iter().copied().collect()
    }

    /// Take the failures of renders run from inside redraw requests.
    pub fn take_errors(&self) -> Vec<(InstanceId, Error)> {
        std::mem::take(&mut *self.inner.errors.borrow_mut())
    }
}

impl Default for ViewRuntime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Component, VNode};
    use serde_json::json;
    use std::cell::Cell;

    fn counting_view(renders: Rc<Cell<usize>>) -> View {
        Component::new(move |instance| {
            renders.set(renders.get() + 1);
            Ok(VNode::text(instance.attrs()["label"].as_str().unwrap_or("").to_owned()))
        })
        .named("Label")
        .into_view()
    }

    #[test]
    fn mount_runs_init_then_renders() {
        let runtime = ViewRuntime::default();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (o1, o2) = (order.clone(), order.clone());
        let view = Component::new(move |_| {
            o1.borrow_mut().push("render");
            Ok(VNode::text("x"))
        })
        .on_init(move |_| {
            o2.borrow_mut().push("init");
            Ok(())
        })
        .into_view();

        let instance = runtime.mount(&view, json!({})).unwrap();

        assert_eq!(*order.borrow(), vec!["init", "render"]);
        assert_eq!(instance.render_count(), 1);
        assert_eq!(runtime.mounted_count(), 1);
    }

    #[test]
    fn without_assessment_every_pass_renders() {
        let renders = Rc::new(Cell::new(0));
        let runtime = ViewRuntime::default();
        let instance = runtime
            .mount(&counting_view(renders.clone()), json!({"label": "a"}))
            .unwrap();

        assert!(runtime.update(instance.id(), json!({"label": "b"})).unwrap());
        assert!(runtime.redraw(instance.id()).unwrap());

        assert_eq!(renders.get(), 3);
        assert_eq!(instance.last_output().unwrap().to_string(), "b");
    }

    #[test]
    fn assessment_key_gates_rendering() {
        let runtime = ViewRuntime::default();
        let view = Component::new(|i| Ok(VNode::text(i.attrs()["v"].to_string())))
            .diff(|i| i.attrs()["v"].clone())
            .into_view();
        let instance = runtime.mount(&view, json!({"v": 1})).unwrap();

        assert!(!runtime.update(instance.id(), json!({"v": 1})).unwrap());
        assert!(runtime.update(instance.id(), json!({"v": 2})).unwrap());
        assert_eq!(instance.render_count(), 2);
        assert_eq!(instance.assess_count(), 3);
        assert_eq!(instance.stored_key(), Some(json!(2)));
    }

    #[test]
    fn deferred_requests_coalesce_until_flush() {
        let renders = Rc::new(Cell::new(0));
        let runtime = ViewRuntime::new(RuntimeConfig::deferred());
        let instance = runtime.mount(&counting_view(renders.clone()), json!({})).unwrap();

        instance.redraw();
        runtime.request_redraw(instance.id());
        assert_eq!(runtime.pending_redraws(), vec![instance.id()]);
        assert_eq!(renders.get(), 1);

        assert_eq!(runtime.flush().unwrap(), 1);
        assert_eq!(renders.get(), 2);
        assert!(runtime.pending_redraws().is_empty());
    }

    #[test]
    fn immediate_requests_render_on_the_spot() {
        let renders = Rc::new(Cell::new(0));
        let runtime = ViewRuntime::new(RuntimeConfig::immediate());
        let instance = runtime.mount(&counting_view(renders.clone()), json!({})).unwrap();

        instance.redraw();

        assert_eq!(renders.get(), 2);
        assert!(runtime.pending_redraws().is_empty());
    }

    #[test]
    fn immediate_failures_are_collected() {
        let fail = Rc::new(Cell::new(false));
        let fail_clone = fail.clone();
        let runtime = ViewRuntime::new(RuntimeConfig::immediate());
        let view = Component::new(move |_| {
            if fail_clone.get() {
                Err(Error::render("boom"))
            } else {
                Ok(VNode::text("ok"))
            }
        })
        .into_view();
        let instance = runtime.mount(&view, json!({})).unwrap();

        fail.set(true);
        instance.redraw();

        let errors = runtime.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, instance.id());
        assert!(matches!(errors[0].1, Error::Render(ref m) if m == "boom"));
    }

    #[test]
    fn unmount_then_reuse_skips_init() {
        let inits = Rc::new(Cell::new(0));
        let unmounts = Rc::new(Cell::new(0));
        let (i, u) = (inits.clone(), unmounts.clone());
        let runtime = ViewRuntime::default();
        let view = Component::new(|_| Ok(VNode::text("x")))
            .on_init(move |_| {
                i.set(i.get() + 1);
                Ok(())
            })
            .will_unmount(move |_| {
                u.set(u.get() + 1);
                Ok(())
            })
            .into_view();

        let instance = runtime.mount(&view, json!({})).unwrap();
        runtime.unmount(instance.id()).unwrap();
        assert_eq!(runtime.mounted_count(), 0);
        assert!(runtime.instance(instance.id()).is_none());

        assert!(runtime.reuse(instance.id(), json!({})).unwrap());
        assert_eq!(inits.get(), 1);
        assert_eq!(unmounts.get(), 1);
        assert_eq!(instance.render_count(), 2);
    }

    #[test]
    fn unknown_instances_are_reported() {
        let runtime = ViewRuntime::default();
        let stray = Instance::detached(Value::Null);

        assert!(matches!(runtime.redraw(stray.id()), Err(Error::UnknownInstance(_))));
        assert!(matches!(runtime.unmount(stray.id()), Err(Error::UnknownInstance(_))));
        assert!(matches!(
            runtime.reuse(stray.id(), Value::Null),
            Err(Error::UnknownInstance(_))
        ));
    }

    #[test]
    fn requests_for_unmounted_instances_are_ignored() {
        let runtime = ViewRuntime::default();
        let instance = runtime
            .mount(&counting_view(Rc::new(Cell::new(0))), json!({}))
            .unwrap();
        runtime.unmount(instance.id()).unwrap();

        instance.redraw();
        assert!(runtime.pending_redraws().is_empty());
    }

    #[test]
    fn released_instances_are_dropped() {
        let runtime = ViewRuntime::default();
        let view = counting_view(Rc::new(Cell::new(0)));
        let kept = runtime.mount(&view, json!({})).unwrap().id();
        let weak = {
            let released = runtime.mount(&view, json!({})).unwrap();
            runtime.unmount(released.id()).unwrap();
            runtime.unmount(kept).unwrap();
            assert_eq!(runtime.retired_count(), 2);

            runtime.release(released.id()).unwrap();
            assert!(matches!(
                runtime.reuse(released.id(), json!({})),
                Err(Error::UnknownInstance(_))
            ));
            released.downgrade()
        };

        assert!(weak.upgrade().is_none());
        assert_eq!(runtime.retired_count(), 1);
        let stray = Instance::detached(Value::Null);
        assert!(matches!(runtime.release(stray.id()), Err(Error::UnknownInstance(_))));

        assert_eq!(runtime.purge_retired(), 1);
        assert_eq!(runtime.retired_count(), 0);
        assert!(matches!(runtime.reuse(kept, json!({})), Err(Error::UnknownInstance(_))));
    }
}
