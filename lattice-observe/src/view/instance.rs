//! View Instances
//!
//! An instance is one mounted occurrence of a view. It owns the slots the
//! runtime calls into (render, change assessment, hooks), the attrs it was
//! mounted with, and a typed extension table where integrations keep their
//! per-instance state without the runtime knowing about it.

use std::any::{Any, TypeId};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::Value;

use super::component::{AssessFn, Component, Hooks, HookFn, RenderFn, StaleHook};
use super::runtime::RuntimeInner;
use super::vnode::VNode;

/// Unique identifier for a view instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// The functions the runtime calls on an instance.
///
/// Integrations may replace any slot; a replacement that needs the previous
/// behavior keeps the previous function and calls it.
#[derive(Clone)]
pub struct Slots {
    pub render: RenderFn,
    pub assess: Option<AssessFn>,
    pub hooks: Hooks,
}

impl Slots {
    fn from_component(component: &Component) -> Self {
        Self {
            render: component.render_fn().clone(),
            assess: component.diff_fn().cloned(),
            hooks: component.hooks().clone(),
        }
    }
}

struct InstanceInner {
    id: InstanceId,
    name: RefCell<Option<String>>,
    attrs: RefCell<Value>,
    slots: RefCell<Slots>,
    extensions: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
    stored_key: RefCell<Option<Value>>,
    last_output: RefCell<Option<VNode>>,
    render_count: Cell<usize>,
    assess_count: Cell<usize>,
    runtime: Weak<RuntimeInner>,
}

/// Handle to a view instance. Clones refer to the same instance.
#[derive(Clone)]
pub struct Instance {
    inner: Rc<InstanceInner>,
}

impl Instance {
    pub(crate) fn new(attrs: Value, runtime: Weak<RuntimeInner>) -> Self {
        let placeholder: RenderFn = Rc::new(|_: &Instance| Ok(VNode::text("")));
        Self {
            inner: Rc::new(InstanceInner {
                id: InstanceId::next(),
                name: RefCell::new(None),
                attrs: RefCell::new(attrs),
                slots: RefCell::new(Slots {
                    render: placeholder,
                    assess: None,
                    hooks: Hooks::default(),
                }),
                extensions: RefCell::new(HashMap::new()),
                stored_key: RefCell::new(None),
                last_output: RefCell::new(None),
                render_count: Cell::new(0),
                assess_count: Cell::new(0),
                runtime,
            }),
        }
    }

    /// An instance that belongs to no runtime. Redraw requests are dropped.
    pub fn detached(attrs: Value) -> Self {
        Self::new(attrs, Weak::new())
    }

    /// Load the slots of the descriptor this instance was resolved to.
    pub(crate) fn load(&self, component: &Component) {
        *self.inner.name.borrow_mut() = component.name().map(str::to_owned);
        *self.inner.slots.borrow_mut() = Slots::from_component(component);
    }

    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    pub fn name(&self) -> Option<String> {
        self.inner.name.borrow().clone()
    }

    /// The data payload the instance is currently mounted with.
    pub fn attrs(&self) -> Value {
        self.inner.attrs.borrow().clone()
    }

    pub(crate) fn set_attrs(&self, attrs: Value) {
        *self.inner.attrs.borrow_mut() = attrs;
    }

    pub fn slots(&self) -> Ref<'_, Slots> {
        self.inner.slots.borrow()
    }

    pub fn slots_mut(&self) -> RefMut<'_, Slots> {
        self.inner.slots.borrow_mut()
    }

    pub fn render_fn(&self) -> RenderFn {
        self.inner.slots.borrow().render.clone()
    }

    pub fn assess_fn(&self) -> Option<AssessFn> {
        self.inner.slots.borrow().assess.clone()
    }

    pub fn will_unmount_hook(&self) -> Option<HookFn> {
        self.inner.slots.borrow().hooks.will_unmount.clone()
    }

    pub fn become_stale_hook(&self) -> StaleHook {
        self.inner.slots.borrow().hooks.become_stale.clone()
    }

    /// Attach integration state, replacing any value of the same type.
    pub fn insert_extension<T: Any>(&self, value: Rc<T>) {
        self.inner
            .extensions
            .borrow_mut()
            .insert(TypeId::of::<T>(), value);
    }

    pub fn extension<T: Any>(&self) -> Option<Rc<T>> {
        let extension = self
            .inner
            .extensions
            .borrow()
            .get(&TypeId::of::<T>())
            .cloned()?;
        extension.downcast::<T>().ok()
    }

    /// Ask the owning runtime to redraw this instance.
    pub fn redraw(&self) {
        match self.inner.runtime.upgrade() {
            Some(runtime) => RuntimeInner::request_redraw(&runtime, self.id()),
            None => tracing::trace!(instance = %self.id(), "redraw requested on detached instance"),
        }
    }

    /// Number of completed renders.
    pub fn render_count(&self) -> usize {
        self.inner.render_count.get()
    }

    /// Number of change-assessment calls made by the runtime.
    pub fn assess_count(&self) -> usize {
        self.inner.assess_count.get()
    }

    pub fn last_output(&self) -> Option<VNode> {
        self.inner.last_output.borrow().clone()
    }

    /// The key stored by the last change assessment.
    pub fn stored_key(&self) -> Option<Value> {
        self.inner.stored_key.borrow().clone()
    }

    pub(crate) fn store_key(&self, key: Value) {
        self.inner.assess_count.set(self.inner.assess_count.get() + 1);
        *self.inner.stored_key.borrow_mut() = Some(key);
    }

    pub(crate) fn record_output(&self, output: VNode) {
        self.inner.render_count.set(self.inner.render_count.get() + 1);
        *self.inner.last_output.borrow_mut() = Some(output);
    }

    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.inner.id)
            .field("name", &*self.inner.name.borrow())
            .field("render_count", &self.render_count())
            .finish()
    }
}

/// Non-owning handle to an instance.
#[derive(Clone)]
pub struct WeakInstance {
    inner: Weak<InstanceInner>,
}

impl WeakInstance {
    pub fn upgrade(&self) -> Option<Instance> {
        self.inner.upgrade().map(|inner| Instance { inner })
    }
}
