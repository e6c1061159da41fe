//! Host objects - the mutable scene graph the reconciler writes into.
//!
//! A [`HostObject`] is a shared handle (cheap to clone, compared by identity).
//! Children are owned by their parent; the parent link is weak, so dropping
//! the root handle releases a whole detached subtree.
//!
//! Listeners are invoked after the internal borrow is released, so a listener
//! may freely read or mutate the object that fired it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use super::class_registry::{get_class, HostClass};
use crate::error::HostError;
use crate::types::Value;

/// Event listener: receives the firing object and the event arguments.
pub type EventListener = Rc<dyn Fn(&HostObject, &[Value])>;

/// Property-change listener: receives the object whose property changed.
pub type ChangeListener = Rc<dyn Fn(&HostObject)>;

// =============================================================================
// Host State
// =============================================================================

struct HostInner {
    class: Rc<HostClass>,
    state: RefCell<HostState>,
}

#[derive(Default)]
struct HostState {
    name: String,
    parent: Option<Weak<HostInner>>,
    children: Vec<HostObject>,
    /// Explicitly assigned values; reads fall back to class defaults.
    properties: HashMap<String, Value>,
    event_listeners: HashMap<String, Vec<(u64, EventListener)>>,
    change_listeners: HashMap<String, Vec<(u64, ChangeListener)>>,
    next_listener_id: u64,
    mutations: usize,
    destroyed: bool,
}

impl HostState {
    fn next_id(&mut self) -> u64 {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        id
    }
}

// =============================================================================
// Host Object
// =============================================================================

/// Handle to one object in the host scene graph.
#[derive(Clone)]
pub struct HostObject(Rc<HostInner>);

/// Non-owning handle to a host object.
#[derive(Clone, Default)]
pub struct WeakHostObject(Weak<HostInner>);

impl HostObject {
    /// Instantiate a registered class. The new object is named after its class.
    pub fn new(class_name: &str) -> Result<Self, HostError> {
        let class = get_class(class_name)
            .ok_or_else(|| HostError::UnknownClass(class_name.to_string()))?;

        Ok(Self(Rc::new(HostInner {
            state: RefCell::new(HostState {
                name: class.name.clone(),
                ..Default::default()
            }),
            class,
        })))
    }

    pub fn class_name(&self) -> &str {
        &self.0.class.name
    }

    pub fn class(&self) -> &HostClass {
        &self.0.class
    }

    pub fn downgrade(&self) -> WeakHostObject {
        WeakHostObject(Rc::downgrade(&self.0))
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // -------------------------------------------------------------------------
    // Name
    // -------------------------------------------------------------------------

    pub fn name(&self) -> String {
        self.0.state.borrow().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) -> Result<(), HostError> {
        let name = name.into();
        let mut state = self.writable_state()?;
        if state.name != name {
            state.name = name;
            state.mutations += 1;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    /// Read a property, falling back to the class default.
    pub fn get_property(&self, name: &str) -> Result<Value, HostError> {
        if !self.0.class.has_property(name) {
            return Err(self.unknown_property(name));
        }
        let state = self.0.state.borrow();
        Ok(state
            .properties
            .get(name)
            .or_else(|| self.0.class.defaults.get(name))
            .cloned()
            .unwrap_or_default())
    }

    /// Assign a property.
    ///
    /// Assigning the value the property already holds is not a mutation and
    /// does not notify change listeners.
    pub fn set_property(&self, name: &str, value: Value) -> Result<(), HostError> {
        if !self.0.class.has_property(name) {
            return Err(self.unknown_property(name));
        }

        let listeners = {
            let mut state = self.writable_state()?;
            let current = state
                .properties
                .get(name)
                .or_else(|| self.0.class.defaults.get(name));
            if current == Some(&value) {
                return Ok(());
            }
            state.properties.insert(name.to_string(), value);
            state.mutations += 1;
            state
                .change_listeners
                .get(name)
                .map(|listeners| listeners.iter().map(|(_, l)| l.clone()).collect::<Vec<_>>())
                .unwrap_or_default()
        };

        for listener in listeners {
            listener(self);
        }
        Ok(())
    }

    /// Number of observable mutations (property, name and parent changes).
    pub fn mutation_count(&self) -> usize {
        self.0.state.borrow().mutations
    }

    // -------------------------------------------------------------------------
    // Hierarchy
    // -------------------------------------------------------------------------

    pub fn parent(&self) -> Option<HostObject> {
        self.0
            .state
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(HostObject)
    }

    pub fn children(&self) -> Vec<HostObject> {
        self.0.state.borrow().children.clone()
    }

    pub fn find_first_child(&self, name: &str) -> Option<HostObject> {
        self.0
            .state
            .borrow()
            .children
            .iter()
            .find(|child| child.0.state.borrow().name == name)
            .cloned()
    }

    /// Move this object under `parent` (or detach it with `None`).
    pub fn set_parent(&self, parent: Option<&HostObject>) -> Result<(), HostError> {
        if let Some(parent) = parent {
            let mut ancestor = Some(parent.clone());
            while let Some(current) = ancestor {
                if current.ptr_eq(self) {
                    return Err(HostError::CircularParent {
                        child: self.name(),
                        parent: parent.name(),
                    });
                }
                ancestor = current.parent();
            }
            if parent.0.state.borrow().destroyed {
                return Err(parent.destroyed_error());
            }
        }

        drop(self.writable_state()?);

        let current = self.parent();
        match (&current, parent) {
            (Some(a), Some(b)) if a.ptr_eq(b) => return Ok(()),
            (None, None) => return Ok(()),
            _ => {}
        }

        if let Some(old) = current {
            old.0
                .state
                .borrow_mut()
                .children
                .retain(|child| !child.ptr_eq(self));
        }
        if let Some(new) = parent {
            new.0.state.borrow_mut().children.push(self.clone());
        }

        let mut state = self.0.state.borrow_mut();
        state.parent = parent.map(|p| Rc::downgrade(&p.0));
        state.mutations += 1;
        Ok(())
    }

    /// Detach and destroy this object and all of its descendants.
    ///
    /// Listeners are dropped; further mutation fails with [`HostError::Destroyed`].
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        // Parent is alive and we are not destroyed, so detaching cannot fail.
        let _ = self.set_parent(None);

        let children = std::mem::take(&mut self.0.state.borrow_mut().children);
        for child in children {
            child.0.state.borrow_mut().parent = None;
            child.destroy();
        }

        let mut state = self.0.state.borrow_mut();
        state.event_listeners.clear();
        state.change_listeners.clear();
        state.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.state.borrow().destroyed
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Listen to a class event.
    pub fn connect(
        &self,
        event: &str,
        listener: impl Fn(&HostObject, &[Value]) + 'static,
    ) -> Result<HostConnection, HostError> {
        if !self.0.class.has_event(event) {
            return Err(HostError::UnknownEvent {
                class: self.class_name().to_string(),
                event: event.to_string(),
            });
        }
        let mut state = self.writable_state()?;
        let id = state.next_id();
        state
            .event_listeners
            .entry(event.to_string())
            .or_default()
            .push((id, Rc::new(listener)));

        Ok(HostConnection {
            object: self.downgrade(),
            target: ConnectionTarget::Event(event.to_string()),
            id,
        })
    }

    /// Listen to changes of one property.
    pub fn property_changed(
        &self,
        property: &str,
        listener: impl Fn(&HostObject) + 'static,
    ) -> Result<HostConnection, HostError> {
        if !self.0.class.has_property(property) {
            return Err(self.unknown_property(property));
        }
        let mut state = self.writable_state()?;
        let id = state.next_id();
        state
            .change_listeners
            .entry(property.to_string())
            .or_default()
            .push((id, Rc::new(listener)));

        Ok(HostConnection {
            object: self.downgrade(),
            target: ConnectionTarget::PropertyChanged(property.to_string()),
            id,
        })
    }

    /// Fire a class event, invoking every listener in connection order.
    pub fn fire(&self, event: &str, args: &[Value]) -> Result<(), HostError> {
        if !self.0.class.has_event(event) {
            return Err(HostError::UnknownEvent {
                class: self.class_name().to_string(),
                event: event.to_string(),
            });
        }
        let listeners: Vec<EventListener> = self
            .0
            .state
            .borrow()
            .event_listeners
            .get(event)
            .map(|listeners| listeners.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        for listener in listeners {
            listener(self, args);
        }
        Ok(())
    }

    /// Number of live listeners, events and property changes combined.
    pub fn listener_count(&self) -> usize {
        let state = self.0.state.borrow();
        state.event_listeners.values().map(Vec::len).sum::<usize>()
            + state.change_listeners.values().map(Vec::len).sum::<usize>()
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn writable_state(&self) -> Result<std::cell::RefMut<'_, HostState>, HostError> {
        let state = self.0.state.borrow_mut();
        if state.destroyed {
            drop(state);
            return Err(self.destroyed_error());
        }
        Ok(state)
    }

    fn destroyed_error(&self) -> HostError {
        HostError::Destroyed {
            class: self.class_name().to_string(),
            name: self.name(),
        }
    }

    fn unknown_property(&self, property: &str) -> HostError {
        HostError::UnknownProperty {
            class: self.class_name().to_string(),
            property: property.to_string(),
        }
    }
}

impl PartialEq for HostObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for HostObject {}

impl Hash for HostObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.class_name(), self.0.state.borrow().name)
    }
}

impl WeakHostObject {
    pub fn upgrade(&self) -> Option<HostObject> {
        self.0.upgrade().map(HostObject)
    }
}

impl fmt::Debug for WeakHostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(object) => write!(f, "Weak({object:?})"),
            None => write!(f, "Weak(<dropped>)"),
        }
    }
}

// =============================================================================
// Connections
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum ConnectionTarget {
    Event(String),
    PropertyChanged(String),
}

/// Handle to one listener. Disconnecting twice is a no-op.
#[derive(Debug)]
pub struct HostConnection {
    object: WeakHostObject,
    target: ConnectionTarget,
    id: u64,
}

impl HostConnection {
    pub fn disconnect(&self) {
        let Some(object) = self.object.upgrade() else { return };
        let mut state = object.0.state.borrow_mut();
        let id = self.id;
        match &self.target {
            ConnectionTarget::Event(name) => {
                if let Some(listeners) = state.event_listeners.get_mut(name) {
                    listeners.retain(|(listener_id, _)| *listener_id != id);
                }
            }
            ConnectionTarget::PropertyChanged(name) => {
                if let Some(listeners) = state.change_listeners.get_mut(name) {
                    listeners.retain(|(listener_id, _)| *listener_id != id);
                }
            }
        }
    }
}
