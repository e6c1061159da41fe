//! # spark-vdom
//!
//! Virtual-node reconciler that keeps a host scene graph in sync with
//! declarative element trees.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! reactive bindings.
//!
//! ## Architecture
//!
//! Elements describe desired output. The reconciler keeps one virtual node
//! per mounted element and diffs each new element tree against them; the
//! renderer turns the differences into host object mutations:
//!
//! ```text
//! Element tree → TreeReconciler (child diff by key) → Renderer (per kind) → HostObject
//!                                                           ↑
//!                                        Binding emissions ─┘ (one property, no diff)
//! ```
//!
//! ## Modules
//!
//! - [`element`] - Elements, props, children, key iteration
//! - [`binding`] - Observable values that drive host properties
//! - [`host`] - Host scene graph (classes, objects, events)
//! - [`renderer`] - Per-kind lifecycle dispatch, prop reconciliation, event manager
//! - [`reconciler`] - Virtual nodes, child diff, mounted trees
//! - [`component`] - Stateful component contract
//! - [`config`] - Optional runtime checks
//!
//! ## Example
//!
//! ```ignore
//! use spark_vdom::*;
//!
//! let root = HostObject::new("Folder")?;
//! let (size, set_size) = create_binding(10);
//!
//! let reconciler = TreeReconciler::default();
//! let tree = reconciler.mount_virtual_tree(
//!     create_element("TextLabel", Props::new().with("Text", "A").bind("TextSize", size)),
//!     Some(&root),
//!     Some("Label"),
//! )?;
//!
//! set_size.set(20); // TextSize follows, no reconciliation
//! reconciler.unmount_virtual_tree(tree)?;
//! ```

pub mod binding;
pub mod component;
pub mod config;
pub mod element;
pub mod error;
pub mod host;
pub mod reconciler;
pub mod renderer;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use binding::{create_binding, create_ref, join_bindings, Binding, BindingSetter, Subscription};

pub use component::{memo, ComponentInstance, Memo, StatefulComponent};

pub use config::{Checks, Config, TRACING_DISABLED_MESSAGE};

pub use element::{
    create_element, create_fragment, create_portal, get_element_by_key, iterate_elements,
    ChildKey, Children, Element, ElementKey, ElementKind, ElementType, EventHandler,
    FunctionComponent, Group, PropKey, PropValue, Props, RefCallback,
};

pub use error::{HostError, ReconcileError, Result};

pub use host::{
    class_exists, default_value, get_class, register_class, reset_classes, HostClass,
    HostConnection, HostObject, WeakHostObject,
};

pub use reconciler::{Reconciler, TreeReconciler, VirtualNode, VirtualTree, DEFAULT_TREE_KEY};

pub use renderer::{EventStatus, Renderer, SingleEventManager};
