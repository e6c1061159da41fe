//! Single Event Manager - one host object's event and change handlers.
//!
//! The manager owns at most one host connection per event (or per observed
//! property) and forwards to the handler currently registered for it.
//! Replacing a handler does not reconnect.
//!
//! # Status
//!
//! ```text
//! Disabled  (initial)  events are dropped
//! Suspended            events are queued
//! Enabled              events are delivered
//! ```
//!
//! `resume()` replays the queue against the handlers registered *at replay
//! time*, then enables the manager. Calling `resume()` on an enabled manager
//! is a no-op. Reconciliation suspends the manager while it diffs props so
//! no handler observes a half-updated host object.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::element::EventHandler;
use crate::error::HostError;
use crate::host::{HostConnection, HostObject, WeakHostObject};
use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Disabled,
    Suspended,
    Enabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ListenerKey {
    Event(String),
    Change(String),
}

struct ManagerState {
    status: EventStatus,
    resuming: bool,
    handlers: HashMap<ListenerKey, EventHandler>,
    connections: HashMap<ListenerKey, HostConnection>,
    queue: VecDeque<(ListenerKey, Vec<Value>)>,
}

/// Event and property-change handlers of one host object.
pub struct SingleEventManager {
    host: WeakHostObject,
    state: Rc<RefCell<ManagerState>>,
}

impl SingleEventManager {
    /// Create a disabled manager for `host`.
    pub fn new(host: &HostObject) -> Self {
        Self {
            host: host.downgrade(),
            state: Rc::new(RefCell::new(ManagerState {
                status: EventStatus::Disabled,
                resuming: false,
                handlers: HashMap::new(),
                connections: HashMap::new(),
                queue: VecDeque::new(),
            })),
        }
    }

    pub fn status(&self) -> EventStatus {
        self.state.borrow().status
    }

    /// Register, replace (`Some`) or remove (`None`) the handler of a host event.
    pub fn connect_event(&self, event: &str, handler: Option<EventHandler>) -> Result<(), HostError> {
        let key = ListenerKey::Event(event.to_string());
        self.set_handler(key, handler, |host, weak_state, key| {
            host.connect(event, move |host, args| {
                dispatch(&weak_state, &key, host, args);
            })
        })
    }

    /// Register, replace (`Some`) or remove (`None`) the handler of a property change.
    ///
    /// The handler receives the property's new value as its only argument.
    pub fn connect_property_change(
        &self,
        property: &str,
        handler: Option<EventHandler>,
    ) -> Result<(), HostError> {
        let key = ListenerKey::Change(property.to_string());
        let name = property.to_string();
        self.set_handler(key, handler, move |host, weak_state, key| {
            host.property_changed(property, move |host| {
                let value = host.get_property(&name).unwrap_or_default();
                dispatch(&weak_state, &key, host, std::slice::from_ref(&value));
            })
        })
    }

    fn set_handler(
        &self,
        key: ListenerKey,
        handler: Option<EventHandler>,
        connect: impl FnOnce(
            &HostObject,
            Weak<RefCell<ManagerState>>,
            ListenerKey,
        ) -> Result<HostConnection, HostError>,
    ) -> Result<(), HostError> {
        let Some(handler) = handler else {
            let connection = {
                let mut state = self.state.borrow_mut();
                state.handlers.remove(&key);
                state.connections.remove(&key)
            };
            if let Some(connection) = connection {
                connection.disconnect();
            }
            return Ok(());
        };

        let needs_connection = !self.state.borrow().connections.contains_key(&key);
        if needs_connection {
            if let Some(host) = self.host.upgrade() {
                let connection = connect(&host, Rc::downgrade(&self.state), key.clone())?;
                self.state.borrow_mut().connections.insert(key.clone(), connection);
            }
        }
        self.state.borrow_mut().handlers.insert(key, handler);
        Ok(())
    }

    /// Queue events instead of delivering them.
    pub fn suspend(&self) {
        let mut state = self.state.borrow_mut();
        state.status = EventStatus::Suspended;
        log::debug!("event manager suspended");
    }

    /// Deliver queued events, then enable delivery.
    pub fn resume(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.resuming {
                return;
            }
            state.resuming = true;
        }

        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                state
                    .queue
                    .pop_front()
                    .map(|(key, args)| (state.handlers.get(&key).cloned(), args))
            };
            let Some((handler, args)) = next else { break };
            if let (Some(handler), Some(host)) = (handler, self.host.upgrade()) {
                handler(&host, &args);
            }
        }

        let mut state = self.state.borrow_mut();
        state.resuming = false;
        if state.status != EventStatus::Enabled {
            log::debug!("event manager enabled");
        }
        state.status = EventStatus::Enabled;
    }

    /// Disconnect every host connection and drop every handler.
    pub fn disconnect_all(&self) {
        let connections: Vec<HostConnection> = {
            let mut state = self.state.borrow_mut();
            state.handlers.clear();
            state.queue.clear();
            state.connections.drain().map(|(_, connection)| connection).collect()
        };
        for connection in connections {
            connection.disconnect();
        }
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.state.borrow().handlers.len()
    }
}

impl fmt::Debug for SingleEventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SingleEventManager")
            .field("status", &state.status)
            .field("handlers", &state.handlers.len())
            .field("queued", &state.queue.len())
            .finish()
    }
}

fn dispatch(
    state: &Weak<RefCell<ManagerState>>,
    key: &ListenerKey,
    host: &HostObject,
    args: &[Value],
) {
    let Some(state) = state.upgrade() else { return };

    let handler = {
        let mut state = state.borrow_mut();
        match state.status {
            EventStatus::Disabled => None,
            EventStatus::Suspended => {
                state.queue.push_back((key.clone(), args.to_vec()));
                None
            }
            EventStatus::Enabled => state.handlers.get(key).cloned(),
        }
    };

    if let Some(handler) = handler {
        handler(host, args);
    }
}
