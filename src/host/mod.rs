//! Host platform - the scene graph that virtual nodes render into.
//!
//! The reconciler never owns host semantics. It only needs:
//! - A class registry with per-property defaults ([`default_value`])
//! - Objects that can be created, named, parented, mutated and destroyed
//! - Event and property-change listeners
//!
//! # Architecture
//!
//! ```text
//! ClassRegistry (thread-local)      HostObject tree
//!   Frame  { Size, Visible, ... }     Folder "Root"
//!   TextLabel { Text, ... }  ──new──>   ├── Frame "Header"
//!                                       └── TextLabel "Title"
//! ```

mod class_registry;
mod object;

pub use class_registry::*;
pub use object::*;

use crate::types::Value;

/// Check whether a value is a host object.
pub fn is_host_object(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_host_object() {
        reset_classes();
        let frame = HostObject::new("Frame").unwrap();

        assert!(is_host_object(&Value::Object(frame)));
        assert!(!is_host_object(&Value::from("Frame")));
        assert!(!is_host_object(&Value::Nil));
    }
}
