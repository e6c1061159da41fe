//! Error types for reconciliation and the host scene graph.

use thiserror::Error;

use crate::element::ElementKind;

/// Errors raised by host objects and the class registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// No class with this name is registered
    #[error("unknown host class `{0}`")]
    UnknownClass(String),

    /// The class does not declare this property
    #[error("`{property}` is not a valid property of {class}")]
    UnknownProperty { class: String, property: String },

    /// The class does not declare this event
    #[error("`{event}` is not a valid event of {class}")]
    UnknownEvent { class: String, event: String },

    /// The object was destroyed and can no longer be mutated
    #[error("{class} `{name}` has been destroyed")]
    Destroyed { class: String, name: String },

    /// Parenting would create a cycle
    #[error("cannot parent {child} under {parent}: it would create a cycle")]
    CircularParent { child: String, parent: String },
}

/// Errors raised while mounting, updating or unmounting virtual nodes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    /// A children value has a shape that cannot be iterated
    #[error("invalid children: {0}")]
    InvalidChildren(String),

    /// Portal `target` is missing or not a host object
    #[error("portal target must be a host object, got {0}")]
    InvalidTarget(String),

    /// A ref prop is neither a callback nor an updatable binding
    #[error("invalid ref: {0}")]
    InvalidRef(String),

    /// Applying or updating properties failed.
    ///
    /// The message carries the underlying error and the element's creation
    /// site (or a placeholder when element tracing is off).
    #[error("{message}\n{source_site}")]
    PropApplication { message: String, source_site: String },

    /// A prop value does not fit its key (e.g. a number under an event key)
    #[error("{key} expects {expected}, got {got}")]
    InvalidPropValue {
        key: String,
        expected: &'static str,
        got: String,
    },

    /// A binding could not be read or updated
    #[error("binding error: {0}")]
    Binding(String),

    /// The dispatcher was asked to update a node with an element of another kind
    #[error("cannot update a {current:?} node with a {new:?} element")]
    ElementKindMismatch { current: ElementKind, new: ElementKind },

    /// Host platform failure outside property application
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;
