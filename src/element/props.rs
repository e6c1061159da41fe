//! Props - the property set carried by an element.
//!
//! Keys are either ordinary host property names or special markers:
//!
//! ```text
//! PropKey::Name("Text")       plain host property (value or binding)
//! PropKey::Event("Activated") event handler
//! PropKey::Change("Text")     property-change handler
//! PropKey::Ref                ref callback or ref binding
//! PropKey::Children           child elements
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::children::Children;
use crate::binding::Binding;
use crate::error::{ReconcileError, Result};
use crate::host::HostObject;
use crate::types::{Dimension, Rgba, Value};

// =============================================================================
// Callback Types
// =============================================================================

/// Event handler: receives the host object and the event arguments.
///
/// Change handlers receive the new property value as their only argument.
pub type EventHandler = Rc<dyn Fn(&HostObject, &[Value])>;

/// Ref callback: receives the host object on mount and `None` on detach.
pub type RefCallback = Rc<dyn Fn(Option<&HostObject>)>;

// =============================================================================
// Prop Key / Prop Value
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropKey {
    /// A host property.
    Name(String),
    /// Child elements.
    Children,
    /// Ref marker.
    Ref,
    /// Host event subscription.
    Event(String),
    /// Host property-change subscription.
    Change(String),
}

impl PropKey {
    pub fn name(name: impl Into<String>) -> Self {
        PropKey::Name(name.into())
    }

    /// True for the markers handled by the dispatcher rather than by
    /// property reconciliation.
    pub fn is_marker(&self) -> bool {
        matches!(self, PropKey::Children | PropKey::Ref)
    }
}

impl fmt::Display for PropKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropKey::Name(name) => write!(f, "{name}"),
            PropKey::Children => write!(f, "[Children]"),
            PropKey::Ref => write!(f, "[Ref]"),
            PropKey::Event(name) => write!(f, "[Event.{name}]"),
            PropKey::Change(name) => write!(f, "[Change.{name}]"),
        }
    }
}

/// A property value.
#[derive(Clone)]
pub enum PropValue {
    /// Plain value assigned directly.
    Value(Value),
    /// Reactive value; the property follows every emission.
    Binding(Binding),
    /// Event or change handler.
    Handler(EventHandler),
    /// Ref callback.
    RefCallback(RefCallback),
    /// Child elements.
    Children(Children),
}

impl PropValue {
    /// Identity/value equality used to skip unchanged properties.
    ///
    /// Values compare by value; bindings and callbacks by identity.
    pub fn same_as(&self, other: &PropValue) -> bool {
        match (self, other) {
            (PropValue::Value(a), PropValue::Value(b)) => a == b,
            (PropValue::Binding(a), PropValue::Binding(b)) => a.ptr_eq(b),
            (PropValue::Handler(a), PropValue::Handler(b)) => Rc::ptr_eq(a, b),
            (PropValue::RefCallback(a), PropValue::RefCallback(b)) => Rc::ptr_eq(a, b),
            (PropValue::Children(a), PropValue::Children(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn as_binding(&self) -> Option<&Binding> {
        match self {
            PropValue::Binding(binding) => Some(binding),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            PropValue::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Interpret this value as children.
    ///
    /// Nil and booleans are accepted as "no children".
    pub fn as_children(&self) -> Result<Cow<'_, Children>> {
        match self {
            PropValue::Children(children) => Ok(Cow::Borrowed(children)),
            PropValue::Value(Value::Nil) => Ok(Cow::Owned(Children::Empty)),
            PropValue::Value(Value::Bool(b)) => Ok(Cow::Owned(Children::Bool(*b))),
            other => Err(ReconcileError::InvalidChildren(format!(
                "expected elements, got {}",
                other.describe()
            ))),
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            PropValue::Value(value) => value.type_name().to_string(),
            PropValue::Binding(_) => "binding".to_string(),
            PropValue::Handler(_) => "handler".to_string(),
            PropValue::RefCallback(_) => "ref callback".to_string(),
            PropValue::Children(_) => "children".to_string(),
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Value(value) => write!(f, "{value:?}"),
            PropValue::Binding(binding) => write!(f, "{binding:?}"),
            PropValue::Handler(_) => write!(f, "<handler>"),
            PropValue::RefCallback(_) => write!(f, "<ref callback>"),
            PropValue::Children(children) => write!(f, "{children:?}"),
        }
    }
}

macro_rules! prop_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropValue {
                fn from(value: $ty) -> Self {
                    PropValue::Value(Value::from(value))
                }
            }
        )*
    };
}

prop_value_from!(bool, f64, i32, &str, String, Rgba, Dimension, HostObject);

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::Value(value)
    }
}

impl From<Binding> for PropValue {
    fn from(binding: Binding) -> Self {
        PropValue::Binding(binding)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Unordered property set of one element.
///
/// # Example
///
/// ```ignore
/// let props = Props::new()
///     .with("Text", "Hello")
///     .bind("TextSize", size_binding)
///     .on("Activated", |_, _| println!("clicked"))
///     .children(group);
/// ```
#[derive(Clone, Default)]
pub struct Props {
    entries: HashMap<PropKey, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plain host property.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(PropKey::name(name), PropValue::Value(value.into()));
        self
    }

    /// Bind a host property to a binding.
    pub fn bind(mut self, name: &str, binding: Binding) -> Self {
        self.insert(PropKey::name(name), PropValue::Binding(binding));
        self
    }

    /// Handle a host event.
    pub fn on(mut self, event: &str, handler: impl Fn(&HostObject, &[Value]) + 'static) -> Self {
        self.insert(PropKey::Event(event.to_string()), PropValue::Handler(Rc::new(handler)));
        self
    }

    /// Handle changes of a host property.
    pub fn on_change(mut self, property: &str, handler: impl Fn(&HostObject, &[Value]) + 'static) -> Self {
        self.insert(PropKey::Change(property.to_string()), PropValue::Handler(Rc::new(handler)));
        self
    }

    /// Attach a ref callback.
    pub fn with_ref(mut self, callback: impl Fn(Option<&HostObject>) + 'static) -> Self {
        self.insert(PropKey::Ref, PropValue::RefCallback(Rc::new(callback)));
        self
    }

    /// Attach a ref binding (see [`create_ref`](crate::binding::create_ref)).
    pub fn with_ref_binding(mut self, binding: Binding) -> Self {
        self.insert(PropKey::Ref, PropValue::Binding(binding));
        self
    }

    /// Set the children.
    pub fn children(mut self, children: impl Into<Children>) -> Self {
        self.insert(PropKey::Children, PropValue::Children(children.into()));
        self
    }

    pub fn insert(&mut self, key: PropKey, value: PropValue) -> Option<PropValue> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: &PropKey) -> Option<PropValue> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &PropKey) -> Option<&PropValue> {
        self.entries.get(key)
    }

    /// Look up a plain host property by name.
    pub fn get_named(&self, name: &str) -> Option<&PropValue> {
        self.entries.get(&PropKey::name(name))
    }

    pub fn contains_key(&self, key: &PropKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropKey, &PropValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl FromIterator<(PropKey, PropValue)> for Props {
    fn from_iter<I: IntoIterator<Item = (PropKey, PropValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::create_binding;

    #[test]
    fn test_same_as_values_by_value() {
        assert!(PropValue::from("a").same_as(&PropValue::from("a")));
        assert!(!PropValue::from("a").same_as(&PropValue::from("b")));
    }

    #[test]
    fn test_same_as_bindings_by_identity() {
        let (a, _) = create_binding(1);
        let (b, _) = create_binding(1);

        assert!(PropValue::Binding(a.clone()).same_as(&PropValue::Binding(a.clone())));
        assert!(!PropValue::Binding(a).same_as(&PropValue::Binding(b)));
    }

    #[test]
    fn test_same_as_handlers_by_identity() {
        let handler: EventHandler = Rc::new(|_, _| {});
        let other: EventHandler = Rc::new(|_, _| {});

        assert!(PropValue::Handler(handler.clone()).same_as(&PropValue::Handler(handler.clone())));
        assert!(!PropValue::Handler(handler).same_as(&PropValue::Handler(other)));
    }

    #[test]
    fn test_as_children_accepts_nil_and_bool() {
        assert!(matches!(
            PropValue::Value(Value::Nil).as_children().unwrap().as_ref(),
            Children::Empty
        ));
        assert!(matches!(
            PropValue::Value(Value::Bool(false)).as_children().unwrap().as_ref(),
            Children::Bool(false)
        ));
        assert!(matches!(
            PropValue::from(3).as_children(),
            Err(ReconcileError::InvalidChildren(_))
        ));
    }

    #[test]
    fn test_builder() {
        let props = Props::new().with("Text", "hi").on("Activated", |_, _| {});

        assert_eq!(props.len(), 2);
        assert!(props.get_named("Text").is_some());
        assert!(props.contains_key(&PropKey::Event("Activated".into())));
        assert!(PropKey::Ref.is_marker());
        assert!(!PropKey::name("Text").is_marker());
    }
}
