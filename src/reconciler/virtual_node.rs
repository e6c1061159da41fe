//! Virtual nodes - the reconciler's record of one mounted element.

use std::collections::HashMap;
use std::fmt;

use crate::binding::Subscription;
use crate::component::ComponentInstance;
use crate::element::{ChildKey, Element, ElementKind};
use crate::host::{HostObject, WeakHostObject};
use crate::renderer::SingleEventManager;

/// One mounted element and everything it owns.
///
/// - `host_object` is set exactly when the element is a Host element
/// - `bindings` holds one subscription per bound host property
/// - `event_manager` exists once the node has had an event or change handler
/// - `instance` is the mounted stateful component, for Stateful elements
pub struct VirtualNode {
    pub(crate) current_element: Element,
    pub(crate) host_parent: WeakHostObject,
    pub(crate) host_key: String,
    pub(crate) host_object: Option<HostObject>,
    pub(crate) children: HashMap<ChildKey, VirtualNode>,
    pub(crate) bindings: HashMap<String, Subscription>,
    pub(crate) event_manager: Option<SingleEventManager>,
    pub(crate) instance: Option<Box<dyn ComponentInstance>>,
}

impl VirtualNode {
    pub(crate) fn new(element: Element, host_parent: Option<&HostObject>, host_key: String) -> Self {
        Self {
            current_element: element,
            host_parent: host_parent.map(HostObject::downgrade).unwrap_or_default(),
            host_key,
            host_object: None,
            children: HashMap::new(),
            bindings: HashMap::new(),
            event_manager: None,
            instance: None,
        }
    }

    /// The element this node currently reflects.
    pub fn element(&self) -> &Element {
        &self.current_element
    }

    pub fn kind(&self) -> ElementKind {
        self.current_element.kind()
    }

    /// Host object that this node's host output is parented under.
    pub fn host_parent(&self) -> Option<HostObject> {
        self.host_parent.upgrade()
    }

    /// Name given to this node's host object.
    pub fn host_key(&self) -> &str {
        &self.host_key
    }

    pub fn host_object(&self) -> Option<&HostObject> {
        self.host_object.as_ref()
    }

    pub fn child(&self, key: &ChildKey) -> Option<&VirtualNode> {
        self.children.get(key)
    }

    pub fn children(&self) -> impl Iterator<Item = (&ChildKey, &VirtualNode)> {
        self.children.iter()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of live binding subscriptions.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn event_manager(&self) -> Option<&SingleEventManager> {
        self.event_manager.as_ref()
    }

    /// Host objects produced by this subtree, outermost first.
    ///
    /// A Host node yields its own object; any other node yields those of its
    /// children.
    pub fn host_objects(&self) -> Vec<HostObject> {
        match &self.host_object {
            Some(host) => vec![host.clone()],
            None => self
                .children
                .values()
                .flat_map(VirtualNode::host_objects)
                .collect(),
        }
    }
}

impl fmt::Debug for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualNode")
            .field("element", &self.current_element)
            .field("host_key", &self.host_key)
            .field("host_object", &self.host_object)
            .field("children", &self.children)
            .field("bindings", &self.bindings.len())
            .field("event_manager", &self.event_manager)
            .finish_non_exhaustive()
    }
}
