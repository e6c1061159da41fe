//! Class Registry - Host classes and their property defaults.
//!
//! Every host object is an instance of a registered class. The class declares
//! which properties and events exist and what each property's default is.
//! Reconciliation resets a removed property to `default_value(class, name)`.
//!
//! The registry is thread-local, like the rest of the host platform. A fresh
//! thread starts with the built-in classes:
//!
//! ```text
//! Folder          (no properties)
//! Frame           Size, Position, BackgroundColor, BackgroundTransparency, Visible, ZIndex
//! ScrollingFrame  Frame + CanvasSize, ScrollingEnabled
//! TextLabel       Frame + Text, TextSize, TextColor, TextWrapped
//! TextButton      TextLabel + AutoButtonColor
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::types::{Dimension, Rgba, Value};

// =============================================================================
// Host Class
// =============================================================================

/// Description of one host class: property defaults and event names.
#[derive(Debug, Clone, Default)]
pub struct HostClass {
    pub name: String,
    pub defaults: HashMap<String, Value>,
    pub events: HashSet<String>,
}

impl HostClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Declare a property with its default value.
    pub fn property(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.defaults.insert(name.to_string(), default.into());
        self
    }

    /// Declare an event.
    pub fn event(mut self, name: &str) -> Self {
        self.events.insert(name.to_string());
        self
    }

    /// Start a new class that inherits every property and event of `self`.
    pub fn extend(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defaults: self.defaults.clone(),
            events: self.events.clone(),
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.defaults.contains_key(name)
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.events.contains(name)
    }
}

fn builtin_classes() -> Vec<HostClass> {
    let folder = HostClass::new("Folder");

    let frame = HostClass::new("Frame")
        .property("Size", Dimension::Auto)
        .property("Position", Value::List(vec![Value::Number(0.0), Value::Number(0.0)]))
        .property("BackgroundColor", Rgba::WHITE)
        .property("BackgroundTransparency", 0.0)
        .property("Visible", true)
        .property("ZIndex", 1)
        .event("InputBegan")
        .event("InputEnded")
        .event("MouseEnter")
        .event("MouseLeave");

    let scrolling_frame = frame
        .extend("ScrollingFrame")
        .property("CanvasSize", Dimension::Auto)
        .property("ScrollingEnabled", true);

    let text_label = frame
        .extend("TextLabel")
        .property("Text", "Label")
        .property("TextSize", 14)
        .property("TextColor", Rgba::BLACK)
        .property("TextWrapped", false);

    let text_button = text_label
        .extend("TextButton")
        .property("Text", "Button")
        .property("AutoButtonColor", true)
        .event("Activated");

    vec![folder, frame, scrolling_frame, text_label, text_button]
}

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Map class name to its description.
    static CLASSES: RefCell<HashMap<String, Rc<HostClass>>> = RefCell::new(builtin_map());
}

fn builtin_map() -> HashMap<String, Rc<HostClass>> {
    builtin_classes()
        .into_iter()
        .map(|class| (class.name.clone(), Rc::new(class)))
        .collect()
}

/// Register (or replace) a host class.
pub fn register_class(class: HostClass) {
    CLASSES.with(|classes| {
        classes.borrow_mut().insert(class.name.clone(), Rc::new(class));
    });
}

/// Look up a class by name.
pub fn get_class(name: &str) -> Option<Rc<HostClass>> {
    CLASSES.with(|classes| classes.borrow().get(name).cloned())
}

/// Check whether a class is registered.
pub fn class_exists(name: &str) -> bool {
    CLASSES.with(|classes| classes.borrow().contains_key(name))
}

/// Platform default for `property` on instances of `class`.
///
/// `None` when either the class or the property is unknown.
pub fn default_value(class: &str, property: &str) -> Option<Value> {
    CLASSES.with(|classes| {
        classes
            .borrow()
            .get(class)
            .and_then(|class| class.defaults.get(property).cloned())
    })
}

/// Reset the registry to the built-in classes (for testing).
pub fn reset_classes() {
    CLASSES.with(|classes| *classes.borrow_mut() = builtin_map());
}
