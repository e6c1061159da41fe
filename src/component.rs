//! Stateful components - descriptors with their own lifecycle.
//!
//! The dispatcher treats a stateful component as an opaque capability:
//! it asks the descriptor to mount an instance onto a virtual node, forwards
//! updates to that instance, and tells it when it is about to unmount.
//! What an instance keeps between updates is its own business.
//!
//! [`memo`] builds the built-in stateful component: it renders a
//! [`FunctionComponent`] and skips re-rendering when none of its props
//! changed.

use std::rc::Rc;

use crate::element::{Element, FunctionComponent, Props};
use crate::error::Result;
use crate::reconciler::{Reconciler, VirtualNode};
use crate::types::Value;

/// Descriptor of a stateful component.
pub trait StatefulComponent {
    fn name(&self) -> &str;

    /// Checked before mount when prop validation is enabled.
    fn validate_props(&self, _props: &Props) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Build an instance for `node` and render its initial output.
    ///
    /// Children are rendered through
    /// [`Reconciler::update_virtual_node_with_render_result`].
    fn mount(&self, reconciler: &dyn Reconciler, node: &mut VirtualNode) -> Result<Box<dyn ComponentInstance>>;
}

/// A mounted stateful component.
pub trait ComponentInstance {
    /// Apply a new element and/or state.
    ///
    /// Returning `false` vetoes the update: the node keeps its previous
    /// element.
    fn update(
        &mut self,
        reconciler: &dyn Reconciler,
        node: &mut VirtualNode,
        new_element: &Element,
        new_state: Option<Value>,
    ) -> Result<bool>;

    /// Called once, before the node's children are unmounted.
    fn will_unmount(&mut self) {}
}

// =============================================================================
// Memo
// =============================================================================

/// Renders a function component, skipping renders whose props are unchanged.
pub struct Memo {
    name: String,
    render: Rc<FunctionComponent>,
}

/// Wrap `render` in a [`Memo`].
pub fn memo(render: &Rc<FunctionComponent>) -> Rc<dyn StatefulComponent> {
    Rc::new(Memo {
        name: format!("Memo({})", render.name()),
        render: render.clone(),
    })
}

impl StatefulComponent for Memo {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate_props(&self, props: &Props) -> std::result::Result<(), String> {
        self.render.validate(props)
    }

    fn mount(&self, reconciler: &dyn Reconciler, node: &mut VirtualNode) -> Result<Box<dyn ComponentInstance>> {
        let element = node.element().clone();
        let rendered = self.render.render(element.props());
        let host_parent = node.host_parent();
        reconciler.update_virtual_node_with_render_result(node, host_parent.as_ref(), &rendered)?;

        Ok(Box::new(MemoInstance {
            render: self.render.clone(),
        }))
    }
}

struct MemoInstance {
    render: Rc<FunctionComponent>,
}

impl ComponentInstance for MemoInstance {
    fn update(
        &mut self,
        reconciler: &dyn Reconciler,
        node: &mut VirtualNode,
        new_element: &Element,
        new_state: Option<Value>,
    ) -> Result<bool> {
        if new_state.is_none() && props_unchanged(node.element().props(), new_element.props()) {
            log::trace!("{} skipped render", self.render.name());
            return Ok(false);
        }

        let rendered = self.render.render(new_element.props());
        let host_parent = node.host_parent();
        reconciler.update_virtual_node_with_render_result(node, host_parent.as_ref(), &rendered)?;
        Ok(true)
    }
}

fn props_unchanged(old: &Props, new: &Props) -> bool {
    old.len() == new.len()
        && new
            .iter()
            .all(|(key, value)| old.get(key).is_some_and(|previous| previous.same_as(value)))
}
