//! View Runtime
//!
//! A small retained-mode view runtime: declarations, instances, and a
//! runtime that mounts, assesses, renders, redraws and unmounts them.
//!
//! The runtime knows nothing about reactivity. Integrations such as
//! [`observer`](crate::observer) plug in by decorating an instance's slots
//! from its `init` hook and keeping their own state in the instance's
//! extension table.

mod component;
mod instance;
mod runtime;
mod vnode;

pub use component::{
    AssessFn, Assessment, Component, DescriptorFactory, HookFn, Hooks, RenderFactory, RenderFn,
    RenderResult, StaleFn, StaleHook, View,
};
pub use instance::{Instance, InstanceId, Slots, WeakInstance};
pub use runtime::ViewRuntime;
pub use vnode::VNode;
