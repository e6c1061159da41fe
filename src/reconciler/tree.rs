//! Tree reconciler and the mounted-tree handle.

use super::{Reconciler, VirtualNode};
use crate::config::Config;
use crate::element::{get_element_by_key, iterate_elements, ChildKey, Children, Element};
use crate::error::Result;
use crate::host::HostObject;
use crate::renderer::Renderer;
use crate::types::Value;

/// Host key given to a tree's root when none is supplied.
pub const DEFAULT_TREE_KEY: &str = "SparkTree";

// =============================================================================
// Tree Reconciler
// =============================================================================

/// Reconciler backed by a [`Renderer`].
#[derive(Debug, Clone, Default)]
pub struct TreeReconciler {
    renderer: Renderer,
}

impl TreeReconciler {
    pub fn new(renderer: Renderer) -> Self {
        Self { renderer }
    }

    pub fn with_config(config: Config) -> Self {
        Self::new(Renderer::new(config))
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Mount `element` as a new tree under `host_parent`.
    pub fn mount_virtual_tree(
        &self,
        element: Element,
        host_parent: Option<&HostObject>,
        host_key: Option<&str>,
    ) -> Result<VirtualTree> {
        let host_key = host_key.unwrap_or(DEFAULT_TREE_KEY).to_string();
        log::debug!("mounting tree `{host_key}`");
        let root = self.mount_virtual_node(element, host_parent, host_key)?;
        Ok(VirtualTree { root: Some(root) })
    }

    /// Reconcile a mounted tree against a new root element.
    ///
    /// If the update fails the tree is left unmounted: every node of the old
    /// tree has been unmounted and its host objects destroyed.
    pub fn update_virtual_tree(&self, tree: &mut VirtualTree, element: Element) -> Result<()> {
        let Some(root) = tree.root.take() else {
            log::warn!("update of an unmounted tree ignored");
            return Ok(());
        };
        tree.root = Some(self.update_virtual_node(root, element, None)?);
        Ok(())
    }

    /// Unmount every node of `tree`.
    pub fn unmount_virtual_tree(&self, mut tree: VirtualTree) -> Result<()> {
        match tree.root.take() {
            Some(root) => self.unmount_virtual_node(root),
            None => Ok(()),
        }
    }

    fn host_key_for(node: &VirtualNode, key: &ChildKey) -> String {
        match key {
            ChildKey::UseParentKey => node.host_key.clone(),
            ChildKey::Path(_) => key.to_string(),
        }
    }
}

impl Reconciler for TreeReconciler {
    fn mount_virtual_node(
        &self,
        element: Element,
        host_parent: Option<&HostObject>,
        host_key: String,
    ) -> Result<VirtualNode> {
        let mut node = VirtualNode::new(element, host_parent, host_key);
        if let Err(error) = self.renderer.mount_virtual_node(self, &mut node) {
            self.renderer.discard(node);
            return Err(error);
        }
        Ok(node)
    }

    fn update_virtual_node(&self, node: VirtualNode, new_element: Element, new_state: Option<Value>) -> Result<VirtualNode> {
        if node.current_element.ptr_eq(&new_element) && new_state.is_none() {
            return Ok(node);
        }
        if !node
            .current_element
            .element_type()
            .same_shape(new_element.element_type())
        {
            return self.replace_virtual_node(node, new_element);
        }
        self.renderer.update_virtual_node(self, node, new_element, new_state)
    }

    fn unmount_virtual_node(&self, node: VirtualNode) -> Result<()> {
        self.renderer.unmount_virtual_node(node)
    }

    fn update_virtual_node_with_children(
        &self,
        node: &mut VirtualNode,
        host_parent: Option<&HostObject>,
        children: &Children,
    ) -> Result<()> {
        let existing: Vec<ChildKey> = node.children.keys().cloned().collect();
        for key in existing {
            let Some(child) = node.children.remove(&key) else { continue };
            match get_element_by_key(children, &key) {
                Some(element) => {
                    let child = self.update_virtual_node(child, element.clone(), None)?;
                    node.children.insert(key, child);
                }
                None => self.unmount_virtual_node(child)?,
            }
        }

        for (key, element) in iterate_elements(children) {
            if node.children.contains_key(&key) {
                continue;
            }
            let host_key = Self::host_key_for(node, &key);
            let child = self.mount_virtual_node(element.clone(), host_parent, host_key)?;
            node.children.insert(key, child);
        }
        Ok(())
    }

    fn update_virtual_node_with_render_result(
        &self,
        node: &mut VirtualNode,
        host_parent: Option<&HostObject>,
        render_result: &Children,
    ) -> Result<()> {
        self.update_virtual_node_with_children(node, host_parent, render_result)
    }

    fn replace_virtual_node(&self, node: VirtualNode, new_element: Element) -> Result<VirtualNode> {
        let host_parent = node.host_parent();
        let host_key = node.host_key.clone();
        log::trace!("replace {:?} with {new_element:?}", node.current_element);

        self.unmount_virtual_node(node)?;
        self.mount_virtual_node(new_element, host_parent.as_ref(), host_key)
    }
}

// =============================================================================
// Virtual Tree
// =============================================================================

/// A mounted element tree.
#[derive(Debug, Default)]
pub struct VirtualTree {
    root: Option<VirtualNode>,
}

impl VirtualTree {
    pub fn root(&self) -> Option<&VirtualNode> {
        self.root.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.root.is_some()
    }
}
