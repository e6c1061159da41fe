//! Renderer - per-kind mount, update and unmount of virtual nodes.
//!
//! The renderer is the dispatcher between the reconciler's tree walk and
//! the host scene graph:
//!
//! ```text
//! Host      create object -> props -> Name -> children -> Parent -> ref -> events on
//! Function  render(props) -> children
//! Stateful  descriptor.mount / instance.update / instance.will_unmount
//! Portal    children under `target`
//! Fragment  group members under the node's own host parent
//! ```
//!
//! Errors raised while applying props are wrapped with the element's
//! creation site (see [`Checks::ELEMENT_TRACING`](crate::config::Checks)).

mod events;
mod properties;

pub use events::*;

use crate::config::{Config, TRACING_DISABLED_MESSAGE};
use crate::element::{Children, Element, ElementKind, ElementType, PropKey, PORTAL_TARGET};
use crate::error::{ReconcileError, Result};
use crate::host::{self, HostObject};
use crate::reconciler::{Reconciler, VirtualNode};
use crate::types::Value;

use properties::apply_ref;

/// Dispatches virtual node lifecycle operations by element kind.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: Config,
}

impl Renderer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether `value` is a host object of this renderer's scene graph.
    pub fn is_host_object(&self, value: &Value) -> bool {
        host::is_host_object(value)
    }

    // =========================================================================
    // Mount
    // =========================================================================

    /// Realize `node.current_element`.
    pub fn mount_virtual_node(&self, reconciler: &dyn Reconciler, node: &mut VirtualNode) -> Result<()> {
        let element = node.current_element.clone();
        log::trace!("mount {element:?} as `{}`", node.host_key);

        match element.element_type() {
            ElementType::Host(class_name) => self.mount_host(reconciler, node, &element, class_name)?,
            ElementType::Function(component) => {
                if self.config.prop_validation() {
                    component
                        .validate(element.props())
                        .map_err(|message| self.prop_error(&element, message))?;
                }
                let rendered = component.render(element.props());
                let host_parent = node.host_parent();
                reconciler.update_virtual_node_with_render_result(node, host_parent.as_ref(), &rendered)?;
            }
            ElementType::Stateful(component) => {
                if self.config.prop_validation() {
                    component
                        .validate_props(element.props())
                        .map_err(|message| self.prop_error(&element, message))?;
                }
                let instance = component.mount(reconciler, node)?;
                node.instance = Some(instance);
            }
            ElementType::Portal => {
                let target = portal_target(&element)?;
                let children = children_of(&element)?;
                reconciler.update_virtual_node_with_children(node, Some(&target), &children)?;
            }
            ElementType::Fragment(group) => {
                let children = Children::Group(group.clone());
                let host_parent = node.host_parent();
                reconciler.update_virtual_node_with_children(node, host_parent.as_ref(), &children)?;
            }
        }

        if self.config.internal_type_checks() {
            check_host_invariant(node)?;
        }
        Ok(())
    }

    fn mount_host(
        &self,
        reconciler: &dyn Reconciler,
        node: &mut VirtualNode,
        element: &Element,
        class_name: &str,
    ) -> Result<()> {
        let host = HostObject::new(class_name)?;
        node.host_object = Some(host.clone());

        self.apply_props(node, &host, element)
            .map_err(|error| self.prop_error(element, error))?;
        host.set_name(node.host_key.clone())?;

        let children = children_of(element)?;
        reconciler.update_virtual_node_with_children(node, Some(&host), &children)?;

        host.set_parent(node.host_parent().as_ref())?;
        apply_ref(element.props().get(&PropKey::Ref), Some(&host))?;

        if let Some(events) = &node.event_manager {
            events.resume();
        }
        Ok(())
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Bring `node` up to date with `new_element` (of the same shape).
    ///
    /// Returns the node to keep: usually `node` itself, but a portal whose
    /// target changed is replaced by a freshly mounted node. If the update
    /// fails, `node` is unmounted before the error is returned.
    pub fn update_virtual_node(
        &self,
        reconciler: &dyn Reconciler,
        mut node: VirtualNode,
        new_element: Element,
        new_state: Option<Value>,
    ) -> Result<VirtualNode> {
        log::trace!("update {:?} -> {new_element:?}", node.current_element);

        match self.update_in_place(reconciler, &mut node, &new_element, new_state) {
            Ok(UpdateOutcome::Updated) => {
                node.current_element = new_element;
                Ok(node)
            }
            Ok(UpdateOutcome::Vetoed) => Ok(node),
            Ok(UpdateOutcome::Replace) => reconciler.replace_virtual_node(node, new_element),
            Err(error) => {
                self.discard(node);
                Err(error)
            }
        }
    }

    fn update_in_place(
        &self,
        reconciler: &dyn Reconciler,
        node: &mut VirtualNode,
        new_element: &Element,
        new_state: Option<Value>,
    ) -> Result<UpdateOutcome> {
        if self.config.internal_type_checks() && node.kind() != new_element.kind() {
            return Err(ReconcileError::ElementKindMismatch {
                current: node.kind(),
                new: new_element.kind(),
            });
        }

        match new_element.element_type() {
            ElementType::Host(_) => self.update_host(reconciler, node, new_element)?,
            ElementType::Function(component) => {
                if self.config.prop_validation() {
                    component
                        .validate(new_element.props())
                        .map_err(|message| self.prop_error(new_element, message))?;
                }
                let rendered = component.render(new_element.props());
                let host_parent = node.host_parent();
                reconciler.update_virtual_node_with_render_result(node, host_parent.as_ref(), &rendered)?;
            }
            ElementType::Stateful(component) => {
                if self.config.prop_validation() {
                    component
                        .validate_props(new_element.props())
                        .map_err(|message| self.prop_error(new_element, message))?;
                }
                let Some(mut instance) = node.instance.take() else {
                    return Err(ReconcileError::ElementKindMismatch {
                        current: node.kind(),
                        new: new_element.kind(),
                    });
                };
                let result = instance.update(reconciler, node, new_element, new_state);
                node.instance = Some(instance);
                if !result? {
                    return Ok(UpdateOutcome::Vetoed);
                }
            }
            ElementType::Portal => {
                let old_target = portal_target(&node.current_element)?;
                let new_target = portal_target(new_element)?;
                if !old_target.ptr_eq(&new_target) {
                    log::debug!("portal target changed, remounting");
                    return Ok(UpdateOutcome::Replace);
                }
                let children = children_of(new_element)?;
                reconciler.update_virtual_node_with_children(node, Some(&new_target), &children)?;
            }
            ElementType::Fragment(group) => {
                let children = Children::Group(group.clone());
                let host_parent = node.host_parent();
                reconciler.update_virtual_node_with_children(node, host_parent.as_ref(), &children)?;
            }
        }
        Ok(UpdateOutcome::Updated)
    }

    fn update_host(&self, reconciler: &dyn Reconciler, node: &mut VirtualNode, new_element: &Element) -> Result<()> {
        let old_element = node.current_element.clone();
        let Some(host) = node.host_object.clone() else {
            return Err(ReconcileError::ElementKindMismatch {
                current: old_element.kind(),
                new: new_element.kind(),
            });
        };
        let old_props = old_element.props();
        let new_props = new_element.props();

        if let Some(events) = &node.event_manager {
            events.suspend();
        }

        let old_ref = old_props.get(&PropKey::Ref);
        let new_ref = new_props.get(&PropKey::Ref);
        let ref_changed = match (old_ref, new_ref) {
            (Some(old), Some(new)) => !old.same_as(new),
            (None, None) => false,
            _ => true,
        };
        if ref_changed {
            apply_ref(old_ref, None)?;
            apply_ref(new_ref, Some(&host))?;
        }

        self.update_props(node, &host, old_props, new_element)
            .map_err(|error| self.prop_error(new_element, error))?;

        if old_props.contains_key(&PropKey::Children) || new_props.contains_key(&PropKey::Children) {
            let children = children_of(new_element)?;
            reconciler.update_virtual_node_with_children(node, Some(&host), &children)?;
        }

        if let Some(events) = &node.event_manager {
            events.resume();
        }
        Ok(())
    }

    // =========================================================================
    // Unmount
    // =========================================================================

    /// Tear down `node` and its whole subtree.
    ///
    /// Every binding subscription and event connection is released before
    /// the node is dropped. Teardown runs to completion even when a ref
    /// rejects its detach; the first such error is returned afterwards.
    pub fn unmount_virtual_node(&self, mut node: VirtualNode) -> Result<()> {
        log::trace!("unmount {:?}", node.current_element);

        match node.kind() {
            ElementKind::Host => {
                let detached = apply_ref(node.current_element.props().get(&PropKey::Ref), None);
                let children = self.unmount_children(&mut node);

                for (_, subscription) in node.bindings.drain() {
                    subscription.disconnect();
                }
                if let Some(events) = node.event_manager.take() {
                    events.disconnect_all();
                }
                if let Some(host) = node.host_object.take() {
                    host.destroy();
                }
                detached.and(children)
            }
            ElementKind::Stateful => {
                if let Some(mut instance) = node.instance.take() {
                    instance.will_unmount();
                }
                self.unmount_children(&mut node)
            }
            ElementKind::Function | ElementKind::Portal | ElementKind::Fragment => {
                self.unmount_children(&mut node)
            }
        }
    }

    fn unmount_children(&self, node: &mut VirtualNode) -> Result<()> {
        let mut result = Ok(());
        for (_, child) in node.children.drain() {
            result = result.and(self.unmount_virtual_node(child));
        }
        result
    }

    /// Unmount a node whose mount or update failed part way.
    pub(crate) fn discard(&self, node: VirtualNode) {
        if let Err(error) = self.unmount_virtual_node(node) {
            log::warn!("cleanup after failed reconciliation: {error}");
        }
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// Where `element` was created, or a placeholder when tracing is off.
    fn source_site(&self, element: &Element) -> String {
        if self.config.element_tracing() {
            format!("in {} created at {}", element.display_name(), element.source())
        } else {
            TRACING_DISABLED_MESSAGE.to_string()
        }
    }

    fn prop_error(&self, element: &Element, error: impl ToString) -> ReconcileError {
        ReconcileError::PropApplication {
            message: error.to_string(),
            source_site: self.source_site(element),
        }
    }
}

enum UpdateOutcome {
    Updated,
    /// A stateful instance declined the new element.
    Vetoed,
    Replace,
}

fn portal_target(element: &Element) -> Result<HostObject> {
    match element.props().get_named(PORTAL_TARGET) {
        Some(value) => match value.as_value().and_then(Value::as_object) {
            Some(target) => Ok(target.clone()),
            None => Err(ReconcileError::InvalidTarget(value.describe())),
        },
        None => Err(ReconcileError::InvalidTarget("nothing".to_string())),
    }
}

fn children_of(element: &Element) -> Result<Children> {
    match element.props().get(&PropKey::Children) {
        Some(value) => Ok(value.as_children()?.into_owned()),
        None => Ok(Children::Empty),
    }
}

fn check_host_invariant(node: &VirtualNode) -> Result<()> {
    let is_host = node.kind() == ElementKind::Host;
    if is_host != node.host_object.is_some() {
        return Err(ReconcileError::ElementKindMismatch {
            current: node.kind(),
            new: node.kind(),
        });
    }
    Ok(())
}
