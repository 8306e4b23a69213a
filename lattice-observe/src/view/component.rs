//! View Declarations
//!
//! A view is declared in one of three shapes:
//!
//! - a [`Component`] descriptor carrying a render function and optional hooks
//! - a factory that builds a descriptor for each instance
//! - a factory that builds a bare render function for each instance
//!
//! Factories run once per mount and may close over per-instance state.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::instance::Instance;
use super::vnode::VNode;
use crate::error::Result;

pub type RenderResult = Result<VNode>;

/// Produces an instance's output.
pub type RenderFn = Rc<dyn Fn(&Instance) -> RenderResult>;

/// Decides whether an instance needs to render. See [`Assessment`].
pub type AssessFn = Rc<dyn Fn(&Instance) -> Assessment>;

/// Lifecycle hook (`init`, `will_unmount`).
pub type HookFn = Rc<dyn Fn(&Instance) -> Result<()>>;

/// Called with the instance and its attrs when its tracked data went stale.
pub type StaleFn = Rc<dyn Fn(&Instance, &Value)>;

pub type DescriptorFactory = Rc<dyn Fn(&Instance) -> Rc<Component>>;
pub type RenderFactory = Rc<dyn Fn(&Instance) -> RenderFn>;

/// The outcome of a change-assessment call.
///
/// The runtime stores `key` after every assessment and renders when the new
/// key differs from the stored one, when there is no stored key yet, or when
/// `force` is set. Forcing never changes what gets stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub key: Value,
    pub force: bool,
}

impl Assessment {
    pub fn new(key: Value) -> Self {
        Self { key, force: false }
    }

    /// A constant key: "nothing changed" once a first render happened.
    pub fn unchanged() -> Self {
        Self::new(Value::Null)
    }

    /// Same key, but render regardless of the comparison.
    pub fn forced(self) -> Self {
        Self {
            force: true,
            ..self
        }
    }

    pub fn should_render(&self, stored: Option<&Value>) -> bool {
        self.force || stored != Some(&self.key)
    }
}

/// What to do when an instance's tracked data changes.
#[derive(Clone, Default)]
pub enum StaleHook {
    /// Nothing configured yet.
    #[default]
    Unset,
    /// Explicitly configured to do nothing.
    Disabled,
    /// Ask the owning runtime to redraw the instance.
    Redraw,
    Custom(StaleFn),
}

impl StaleHook {
    /// Anything other than `Unset`, including `Disabled`.
    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn invoke(&self, instance: &Instance, attrs: &Value) {
        match self {
            Self::Unset | Self::Disabled => {}
            Self::Redraw => instance.redraw(),
            Self::Custom(hook) => hook(instance, attrs),
        }
    }
}

impl fmt::Debug for StaleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Disabled => f.write_str("Disabled"),
            Self::Redraw => f.write_str("Redraw"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Named lifecycle hooks.
#[derive(Clone, Default)]
pub struct Hooks {
    pub will_unmount: Option<HookFn>,
    pub become_stale: StaleHook,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("will_unmount", &self.will_unmount.is_some())
            .field("become_stale", &self.become_stale)
            .finish()
    }
}

/// A view descriptor.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
/// let counter = Component::new(move |_| Ok(VNode::text(count.get().to_string())))
///     .named("Counter")
///     .diff(|instance| instance.attrs()["id"].clone());
/// ```
#[derive(Clone)]
pub struct Component {
    name: Option<String>,
    init: Option<HookFn>,
    render: RenderFn,
    diff: Option<AssessFn>,
    hooks: Hooks,
    observed: bool,
}

impl Component {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Instance) -> RenderResult + 'static,
    {
        Self::from_render(Rc::new(render))
    }

    pub fn from_render(render: RenderFn) -> Self {
        Self {
            name: None,
            init: None,
            render,
            diff: None,
            hooks: Hooks::default(),
            observed: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn on_init<F>(mut self, init: F) -> Self
    where
        F: Fn(&Instance) -> Result<()> + 'static,
    {
        self.init = Some(Rc::new(init));
        self
    }

    /// Install a change-assessment function returning a comparison key.
    pub fn diff<F>(mut self, key: F) -> Self
    where
        F: Fn(&Instance) -> Value + 'static,
    {
        self.diff = Some(Rc::new(move |instance: &Instance| Assessment::new(key(instance))));
        self
    }

    pub fn will_unmount<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance) -> Result<()> + 'static,
    {
        self.hooks.will_unmount = Some(Rc::new(hook));
        self
    }

    pub fn become_stale<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance, &Value) + 'static,
    {
        self.hooks.become_stale = StaleHook::Custom(Rc::new(hook));
        self
    }

    /// Explicitly opt out of any staleness reaction.
    pub fn disable_become_stale(mut self) -> Self {
        self.hooks.become_stale = StaleHook::Disabled;
        self
    }

    /// Same descriptor with `init` replaced.
    pub fn with_init(&self, init: Option<HookFn>) -> Self {
        Self {
            init,
            ..self.clone()
        }
    }

    /// Flag the descriptor as already carrying the observer's `init`.
    pub(crate) fn mark_observed(mut self) -> Self {
        self.observed = true;
        self
    }

    pub(crate) fn is_observed(&self) -> bool {
        self.observed
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn init(&self) -> Option<&HookFn> {
        self.init.as_ref()
    }

    pub fn render_fn(&self) -> &RenderFn {
        &self.render
    }

    pub fn diff_fn(&self) -> Option<&AssessFn> {
        self.diff.as_ref()
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn into_view(self) -> View {
        View::Descriptor(Rc::new(self))
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("init", &self.init.is_some())
            .field("diff", &self.diff.is_some())
            .field("hooks", &self.hooks)
            .field("observed", &self.observed)
            .finish()
    }
}

/// A view declaration in one of its three shapes.
#[derive(Clone)]
pub enum View {
    Descriptor(Rc<Component>),
    DescriptorFactory(DescriptorFactory),
    RenderFactory(RenderFactory),
}

impl View {
    pub fn descriptor(component: Component) -> Self {
        Self::Descriptor(Rc::new(component))
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Instance) -> Rc<Component> + 'static,
    {
        Self::DescriptorFactory(Rc::new(factory))
    }

    pub fn render_factory<F, R>(factory: F) -> Self
    where
        F: Fn(&Instance) -> R + 'static,
        R: Fn(&Instance) -> RenderResult + 'static,
    {
        Self::RenderFactory(Rc::new(move |instance: &Instance| {
            let render: RenderFn = Rc::new(factory(instance));
            render
        }))
    }

    /// Turn the declaration into the descriptor used for one instance.
    pub(crate) fn resolve(&self, instance: &Instance) -> Rc<Component> {
        match self {
            Self::Descriptor(component) => component.clone(),
            Self::DescriptorFactory(factory) => factory(instance),
            Self::RenderFactory(factory) => Rc::new(Component::from_render(factory(instance))),
        }
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descriptor(component) => f.debug_tuple("Descriptor").field(component).finish(),
            Self::DescriptorFactory(_) => f.write_str("DescriptorFactory(..)"),
            Self::RenderFactory(_) => f.write_str("RenderFactory(..)"),
        }
    }
}
