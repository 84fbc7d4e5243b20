//! Attaching a root component to a renderer and keeping it up to date.

use std::cell::RefCell;
use std::rc::Rc;

use weft_core::{EffectHandle, effect};
use weft_dom::diff::diff;
use weft_renderer::{NodeId, Renderer};

use crate::component::Component;
use crate::error::{Error, Result, UsageError};

/// A mounted root. Dropping the handle keeps the tick alive; call
/// [`Mounted::unmount`] to stop re-rendering.
pub struct Mounted {
    component: Component,
    handle: EffectHandle,
    error: Rc<RefCell<Option<Error>>>,
}

impl Mounted {
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// The fault raised by the most recent failing tick, if any.
    pub fn take_error(&self) -> Option<Error> {
        self.error.borrow_mut().take()
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    pub fn unmount(self) {
        self.handle.stop();
        self.component.set_mounted(false);
        log::debug!("unmounted `{}`", self.component.id());
    }
}

/// Mount `component` under the first node matching `selector` and re-render
/// it whenever observable state read by the last render changes.
pub fn mount<R>(component: &Component, renderer: Rc<RefCell<R>>, selector: &str) -> Result<Mounted>
where
    R: Renderer + 'static,
{
    if !component.is_root() {
        return Err(UsageError::MountChild { id: component.id().to_string() }.into());
    }
    if component.is_mounted() {
        return Err(UsageError::AlreadyMounted { id: component.id().to_string() }.into());
    }
    let mount_point = renderer
        .borrow()
        .query(selector)
        .ok_or_else(|| UsageError::MountPointNotFound { selector: selector.to_string() })?;
    log::debug!(
        "mounting `{}` at `{selector}` on {}",
        component.id(),
        renderer.borrow().backend_name()
    );

    let error: Rc<RefCell<Option<Error>>> = Rc::new(RefCell::new(None));
    let run = {
        let component = component.clone();
        let error = error.clone();
        move || {
            if let Err(err) = tick(&component, &*renderer, mount_point) {
                log::error!("render tick of `{}` failed: {err}", component.id());
                *error.borrow_mut() = Some(err);
            }
        }
    };
    let handle = effect(run);

    let first = error.borrow_mut().take();
    if let Some(err) = first {
        handle.stop();
        return Err(err);
    }
    component.set_mounted(true);
    Ok(Mounted { component: component.clone(), handle, error })
}

fn tick<R: Renderer>(component: &Component, renderer: &RefCell<R>, mount_point: NodeId) -> Result<()> {
    let previous = component.vnode();
    let next = component.render()?;
    match (previous, component.dom()) {
        (Some(previous), Some(node)) => {
            debug_assert!(!Rc::ptr_eq(&previous, &next), "render must produce a fresh tree");
            let patches = diff(&previous, &next);
            log::debug!("`{}` tick: {} patch(es)", component.id(), patches.len());
            if !patches.is_empty() {
                let node = renderer.borrow_mut().apply(node, &patches);
                component.set_dom(node);
            }
        }
        _ => {
            let mut renderer = renderer.borrow_mut();
            let node = renderer.create(&next);
            renderer.append_child(mount_point, node);
            component.set_dom(node);
        }
    }
    Ok(())
}
