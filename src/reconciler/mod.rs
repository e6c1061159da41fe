//! Reconciler - diff element trees against mounted virtual nodes.
//!
//! The [`Reconciler`] trait is the surface the renderer and stateful
//! components call back into. [`TreeReconciler`] implements it:
//!
//! ```text
//! mount_virtual_tree(element)
//!     └── mount_virtual_node ── Renderer::mount_virtual_node
//!             └── update_virtual_node_with_children   (child diff by ChildKey)
//!                     ├── key gone      → unmount_virtual_node
//!                     ├── key kept      → update_virtual_node
//!                     │                     ├── same element, no state → keep
//!                     │                     ├── shape changed          → replace_virtual_node
//!                     │                     └── otherwise              → Renderer::update_virtual_node
//!                     └── key new       → mount_virtual_node
//! ```

mod tree;
mod virtual_node;

pub use tree::*;
pub use virtual_node::*;

use crate::element::{Children, Element};
use crate::error::Result;
use crate::host::HostObject;
use crate::types::Value;

/// Tree-walking operations available to the renderer and to components.
pub trait Reconciler {
    /// Create and realize a node for `element`.
    ///
    /// A node that fails part way is unmounted before the error is returned.
    fn mount_virtual_node(
        &self,
        element: Element,
        host_parent: Option<&HostObject>,
        host_key: String,
    ) -> Result<VirtualNode>;

    /// Update `node` to `new_element`, returning the node to keep.
    ///
    /// On error `node` has already been unmounted.
    fn update_virtual_node(&self, node: VirtualNode, new_element: Element, new_state: Option<Value>) -> Result<VirtualNode>;

    /// Tear down `node` and its subtree.
    fn unmount_virtual_node(&self, node: VirtualNode) -> Result<()>;

    /// Diff `node`'s children against `children`.
    fn update_virtual_node_with_children(
        &self,
        node: &mut VirtualNode,
        host_parent: Option<&HostObject>,
        children: &Children,
    ) -> Result<()>;

    /// Diff `node`'s children against a component's render output.
    fn update_virtual_node_with_render_result(
        &self,
        node: &mut VirtualNode,
        host_parent: Option<&HostObject>,
        render_result: &Children,
    ) -> Result<()>;

    /// Unmount `node` and mount `new_element` in its place, under the same
    /// host parent and key.
    fn replace_virtual_node(&self, node: VirtualNode, new_element: Element) -> Result<VirtualNode>;
}
