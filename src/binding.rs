//! Bindings - observable values that can drive host properties.
//!
//! A binding is a reactive cell built on spark-signals:
//! - Source bindings wrap a `Signal<Value>` and are written through a [`BindingSetter`]
//! - Mapped and joined bindings wrap a `Derived<Value>` and are read-only
//!
//! Handing a binding to a host property keeps the property connected: every
//! emission re-applies that one property, outside of any reconciliation pass.
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::binding::create_binding;
//!
//! let (size, set_size) = create_binding(10);
//! let label = size.map(|v| format!("{:?} cells", v).into());
//!
//! let subscription = label.subscribe(|value| println!("{value:?}"));
//! set_size.set(20); // prints "20 cells"
//! subscription.disconnect();
//! ```

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use spark_signals::{derived, effect, signal, Derived, Signal};

use crate::error::{ReconcileError, Result};
use crate::types::Value;

// =============================================================================
// Binding
// =============================================================================

enum BindingSource {
    Source(Signal<Value>),
    Derived(Derived<Value>),
}

/// An observable value. Clones share the same cell and compare equal.
#[derive(Clone)]
pub struct Binding(Rc<BindingSource>);

/// Write half of a source binding.
#[derive(Clone)]
pub struct BindingSetter(Signal<Value>);

/// Create a source binding and the setter that drives it.
pub fn create_binding(initial: impl Into<Value>) -> (Binding, BindingSetter) {
    let cell = signal(initial.into());
    (
        Binding(Rc::new(BindingSource::Source(cell.clone()))),
        BindingSetter(cell),
    )
}

/// Create a ref: a source binding that holds the host object it is attached
/// to, or `Nil` while detached.
pub fn create_ref() -> Binding {
    create_binding(Value::Nil).0
}

/// Combine several bindings into one whose value is a [`Value::Record`].
///
/// The joined binding emits whenever any of its inputs does.
pub fn join_bindings<I, K>(bindings: I) -> Binding
where
    I: IntoIterator<Item = (K, Binding)>,
    K: Into<String>,
{
    let inputs: Vec<(String, Binding)> = bindings
        .into_iter()
        .map(|(key, binding)| (key.into(), binding))
        .collect();

    Binding(Rc::new(BindingSource::Derived(derived(move || {
        let record: BTreeMap<String, Value> = inputs
            .iter()
            .map(|(key, binding)| (key.clone(), binding.get_value()))
            .collect();
        Value::Record(record)
    }))))
}

impl Binding {
    /// Current value.
    pub fn get_value(&self) -> Value {
        match &*self.0 {
            BindingSource::Source(cell) => cell.get(),
            BindingSource::Derived(cell) => cell.get(),
        }
    }

    /// Derive a read-only binding by transforming every value.
    pub fn map(&self, transform: impl Fn(Value) -> Value + 'static) -> Binding {
        let source = self.clone();
        Binding(Rc::new(BindingSource::Derived(derived(move || {
            transform(source.get_value())
        }))))
    }

    /// Whether [`update`](Self::update) can write to this binding.
    pub fn is_updatable(&self) -> bool {
        matches!(&*self.0, BindingSource::Source(_))
    }

    /// Write a new value. Only source bindings accept writes.
    pub fn update(&self, value: Value) -> Result<()> {
        match &*self.0 {
            BindingSource::Source(cell) => {
                cell.set(value);
                Ok(())
            }
            BindingSource::Derived(_) => Err(ReconcileError::Binding(
                "bindings created by map or join cannot be updated directly".to_string(),
            )),
        }
    }

    /// Observe future values.
    ///
    /// The callback is not invoked with the current value, only with values
    /// emitted after this call. The returned [`Subscription`] must be kept
    /// alive; dropping it disconnects.
    pub fn subscribe(&self, callback: impl Fn(Value) + 'static) -> Subscription {
        let source = self.clone();
        let first_run = Cell::new(true);

        // The effect runs once immediately to track its dependency.
        let stop = effect(move || {
            let value = source.get_value();
            if first_run.replace(false) {
                return;
            }
            callback(value);
        });
        let stop: Box<dyn FnOnce()> = Box::new(stop);

        Subscription {
            stop: Cell::new(Some(stop)),
        }
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Binding) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.0 {
            BindingSource::Source(_) => "source",
            BindingSource::Derived(_) => "derived",
        };
        write!(f, "Binding<{kind}>({:?})", self.get_value())
    }
}

impl BindingSetter {
    /// Emit a new value to every subscriber.
    pub fn set(&self, value: impl Into<Value>) {
        self.0.set(value.into());
    }
}

impl fmt::Debug for BindingSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BindingSetter")
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Owning side of a binding subscription.
///
/// `disconnect` is idempotent. Dropping a connected subscription disconnects it.
pub struct Subscription {
    stop: Cell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    pub fn disconnect(&self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }

    pub fn is_connected(&self) -> bool {
        // Cell<Option<Box<_>>> has no peek; swap out and back.
        let stop = self.stop.take();
        let connected = stop.is_some();
        self.stop.set(stop);
        connected
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_subscribe_only_sees_future_values() {
        let (binding, setter) = create_binding(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();

        let _subscription = binding.subscribe(move |value| seen_clone.borrow_mut().push(value));
        assert!(seen.borrow().is_empty());

        setter.set(2);
        setter.set(3);
        assert_eq!(*seen.borrow(), vec![Value::from(2), Value::from(3)]);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let (binding, setter) = create_binding(1);
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();

        let subscription = binding.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        setter.set(2);
        assert_eq!(count.get(), 1);

        subscription.disconnect();
        subscription.disconnect();
        assert!(!subscription.is_connected());

        setter.set(3);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_map_is_read_only() {
        let (binding, setter) = create_binding(2);
        let doubled = binding.map(|v| Value::Number(v.as_number().unwrap_or(0.0) * 2.0));

        assert_eq!(doubled.get_value(), Value::Number(4.0));
        setter.set(5);
        assert_eq!(doubled.get_value(), Value::Number(10.0));

        assert!(!doubled.is_updatable());
        assert!(doubled.update(Value::Nil).is_err());
    }

    #[test]
    fn test_join_bindings() {
        let (width, set_width) = create_binding(1);
        let (height, _) = create_binding(2);
        let joined = join_bindings([("width", width), ("height", height)]);

        let seen = Rc::new(RefCell::new(Value::Nil));
        let seen_clone = seen.clone();
        let _subscription = joined.subscribe(move |value| *seen_clone.borrow_mut() = value);

        set_width.set(10);

        let Value::Record(record) = seen.borrow().clone() else {
            panic!("joined binding should emit a record");
        };
        assert_eq!(record.get("width"), Some(&Value::from(10)));
        assert_eq!(record.get("height"), Some(&Value::from(2)));
    }

    #[test]
    fn test_ref_starts_nil_and_updates() {
        crate::host::reset_classes();

        let host_ref = create_ref();
        assert_eq!(host_ref.get_value(), Value::Nil);

        let frame = crate::host::HostObject::new("Frame").unwrap();
        host_ref.update(Value::Object(frame.clone())).unwrap();
        assert_eq!(host_ref.get_value().as_object(), Some(&frame));
    }

    #[test]
    fn test_clones_compare_by_identity() {
        let (a, _) = create_binding(1);
        let (b, _) = create_binding(1);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
