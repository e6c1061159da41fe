//! Property reconciliation for host nodes.
//!
//! One prop at a time: compare old and new, then
//! - skip unchanged values and the Children / Ref markers
//! - route Event / Change keys to the node's event manager
//! - detach the old binding, attach the new one, and assign the value
//!
//! Assigning `Nil` (or removing a prop) restores the class default.

use std::rc::Rc;

use super::events::SingleEventManager;
use super::Renderer;
use crate::binding::Binding;
use crate::element::{Element, EventHandler, PropKey, PropValue, Props};
use crate::error::{ReconcileError, Result};
use crate::host::{default_value, HostObject};
use crate::reconciler::VirtualNode;
use crate::types::Value;

impl Renderer {
    /// Apply every prop of `element` to a freshly created host object.
    pub(crate) fn apply_props(&self, node: &mut VirtualNode, host: &HostObject, element: &Element) -> Result<()> {
        for (key, value) in element.props().iter() {
            self.apply_prop(node, host, element, key, Some(value), None)?;
        }
        Ok(())
    }

    /// Diff `old` against `new_element`'s props and apply the differences.
    ///
    /// Keys present in `new` are applied first, then keys only in `old` are
    /// removed.
    pub(crate) fn update_props(
        &self,
        node: &mut VirtualNode,
        host: &HostObject,
        old: &Props,
        new_element: &Element,
    ) -> Result<()> {
        let new = new_element.props();
        for (key, value) in new.iter() {
            self.apply_prop(node, host, new_element, key, Some(value), old.get(key))?;
        }
        for (key, value) in old.iter() {
            if !new.contains_key(key) {
                self.apply_prop(node, host, new_element, key, None, Some(value))?;
            }
        }
        Ok(())
    }

    fn apply_prop(
        &self,
        node: &mut VirtualNode,
        host: &HostObject,
        element: &Element,
        key: &PropKey,
        new: Option<&PropValue>,
        old: Option<&PropValue>,
    ) -> Result<()> {
        match (new, old) {
            (None, None) => return Ok(()),
            (Some(new), Some(old)) if new.same_as(old) => return Ok(()),
            _ => {}
        }

        let name = match key {
            PropKey::Children | PropKey::Ref => return Ok(()),
            PropKey::Event(event) => {
                let handler = handler_of(key, new)?;
                return Ok(event_manager(node, host).connect_event(event, handler)?);
            }
            PropKey::Change(property) => {
                let handler = handler_of(key, new)?;
                return Ok(event_manager(node, host).connect_property_change(property, handler)?);
            }
            PropKey::Name(name) => name,
        };

        if let Some(PropValue::Binding(_)) = old {
            if let Some(subscription) = node.bindings.remove(name) {
                subscription.disconnect();
            }
        }

        match new {
            None => set_host_property(host, name, Value::Nil),
            Some(PropValue::Value(value)) => set_host_property(host, name, value.clone()),
            Some(PropValue::Binding(binding)) => {
                self.attach_binding(node, host, element, name, binding);
                set_host_property(host, name, binding.get_value())
            }
            Some(other) => Err(ReconcileError::InvalidPropValue {
                key: key.to_string(),
                expected: "a value or binding",
                got: other.describe(),
            }),
        }
    }

    /// Keep `name` following `binding`. Errors raised by later emissions go
    /// to the configured binding error hook.
    fn attach_binding(
        &self,
        node: &mut VirtualNode,
        host: &HostObject,
        element: &Element,
        name: &str,
        binding: &Binding,
    ) {
        let target = host.downgrade();
        let property = name.to_string();
        let source_site = self.source_site(element);
        let on_error = Rc::clone(&self.config.on_binding_error);

        let subscription = binding.subscribe(move |value| {
            let Some(host) = target.upgrade() else { return };
            if let Err(error) = set_host_property(&host, &property, value) {
                let error = ReconcileError::PropApplication {
                    message: format!(
                        "{error}\nwhile updating binding for `{property}` of {}",
                        host.class_name()
                    ),
                    source_site: source_site.clone(),
                };
                on_error(&error);
            }
        });
        log::debug!("bound {}.{name}", host.class_name());
        node.bindings.insert(name.to_string(), subscription);
    }
}

/// Assign a property, resolving `Nil` to the class default.
fn set_host_property(host: &HostObject, name: &str, value: Value) -> Result<()> {
    let value = match value {
        Value::Nil => default_value(host.class_name(), name).unwrap_or_default(),
        value => value,
    };
    Ok(host.set_property(name, value)?)
}

fn handler_of(key: &PropKey, value: Option<&PropValue>) -> Result<Option<EventHandler>> {
    match value {
        None | Some(PropValue::Value(Value::Nil)) => Ok(None),
        Some(PropValue::Handler(handler)) => Ok(Some(handler.clone())),
        Some(other) => Err(ReconcileError::InvalidPropValue {
            key: key.to_string(),
            expected: "a handler",
            got: other.describe(),
        }),
    }
}

fn event_manager<'a>(node: &'a mut VirtualNode, host: &HostObject) -> &'a SingleEventManager {
    node.event_manager.get_or_insert_with(|| SingleEventManager::new(host))
}

// =============================================================================
// Refs
// =============================================================================

/// Attach (`Some(host)`) or detach (`None`) a ref prop.
pub(crate) fn apply_ref(value: Option<&PropValue>, host: Option<&HostObject>) -> Result<()> {
    match value {
        None | Some(PropValue::Value(Value::Nil)) => Ok(()),
        Some(PropValue::RefCallback(callback)) => {
            callback(host);
            Ok(())
        }
        Some(PropValue::Binding(binding)) => {
            let value = host.map_or(Value::Nil, |host| Value::Object(host.clone()));
            binding
                .update(value)
                .map_err(|_| ReconcileError::InvalidRef("a derived binding cannot hold a ref".to_string()))
        }
        Some(other) => Err(ReconcileError::InvalidRef(format!(
            "expected a callback or binding, got {}",
            other.describe()
        ))),
    }
}
