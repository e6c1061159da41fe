//! Elements - immutable descriptions of desired output.
//!
//! Five element kinds:
//! - **Host**: a host object of a named class
//! - **Function**: a pure render function of props
//! - **Stateful**: a component descriptor with its own lifecycle
//! - **Portal**: children rendered under a different host parent (`target`)
//! - **Fragment**: a keyed group that flattens into its parent's children
//!
//! Elements are cheap to clone (shared) and never mutated after creation.
//! Each element records where it was created, reported in prop-application
//! errors when element tracing is on.
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::element::{create_element, Group, Props};
//!
//! let tree = create_element(
//!     "Frame",
//!     Props::new().with("Visible", true).children(
//!         Group::new()
//!             .insert("Title", create_element("TextLabel", Props::new().with("Text", "Hi")))
//!             .insert("Ok", create_element("TextButton", Props::new().on("Activated", |_, _| {}))),
//!     ),
//! );
//! ```

mod children;
mod iter;
mod props;

pub use children::*;
pub use iter::*;
pub use props::*;

use std::fmt;
use std::panic::Location;
use std::rc::Rc;

use crate::component::StatefulComponent;
use crate::host::HostObject;

// =============================================================================
// Element Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Host,
    Function,
    Stateful,
    Portal,
    Fragment,
}

// =============================================================================
// Function Components
// =============================================================================

type RenderFn = dyn Fn(&Props) -> Children;
type ValidateFn = dyn Fn(&Props) -> Result<(), String>;

/// A pure render function with an optional props validator.
///
/// Identity matters: two elements share a component only if they hold the
/// same `Rc<FunctionComponent>`.
pub struct FunctionComponent {
    name: String,
    render: Box<RenderFn>,
    validate: Option<Box<ValidateFn>>,
}

impl FunctionComponent {
    pub fn new(name: impl Into<String>, render: impl Fn(&Props) -> Children + 'static) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            render: Box::new(render),
            validate: None,
        })
    }

    pub fn with_validator(
        name: impl Into<String>,
        render: impl Fn(&Props) -> Children + 'static,
        validate: impl Fn(&Props) -> Result<(), String> + 'static,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            render: Box::new(render),
            validate: Some(Box::new(validate)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, props: &Props) -> Children {
        (self.render)(props)
    }

    pub fn validate(&self, props: &Props) -> Result<(), String> {
        match &self.validate {
            Some(validate) => validate(props),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Element
// =============================================================================

/// Variant-specific payload of an element.
#[derive(Clone)]
pub enum ElementType {
    /// Host class name.
    Host(String),
    Function(Rc<FunctionComponent>),
    Stateful(Rc<dyn StatefulComponent>),
    /// Target is read from the `target` prop.
    Portal,
    Fragment(Rc<Group>),
}

impl ElementType {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementType::Host(_) => ElementKind::Host,
            ElementType::Function(_) => ElementKind::Function,
            ElementType::Stateful(_) => ElementKind::Stateful,
            ElementType::Portal => ElementKind::Portal,
            ElementType::Fragment(_) => ElementKind::Fragment,
        }
    }

    /// Whether a node rendered from `self` can be updated in place to `other`.
    ///
    /// Kinds must match, and so must host classes and component identities.
    pub fn same_shape(&self, other: &ElementType) -> bool {
        match (self, other) {
            (ElementType::Host(a), ElementType::Host(b)) => a == b,
            (ElementType::Function(a), ElementType::Function(b)) => Rc::ptr_eq(a, b),
            (ElementType::Stateful(a), ElementType::Stateful(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (ElementType::Portal, ElementType::Portal) => true,
            (ElementType::Fragment(_), ElementType::Fragment(_)) => true,
            _ => false,
        }
    }
}

impl From<&str> for ElementType {
    fn from(class_name: &str) -> Self {
        ElementType::Host(class_name.to_string())
    }
}

impl From<&Rc<FunctionComponent>> for ElementType {
    fn from(component: &Rc<FunctionComponent>) -> Self {
        ElementType::Function(component.clone())
    }
}

impl From<Rc<dyn StatefulComponent>> for ElementType {
    fn from(component: Rc<dyn StatefulComponent>) -> Self {
        ElementType::Stateful(component)
    }
}

struct ElementInner {
    element_type: ElementType,
    props: Props,
    source: &'static Location<'static>,
}

/// Immutable description of one node's desired output.
#[derive(Clone)]
pub struct Element(Rc<ElementInner>);

impl Element {
    /// Build an element of any kind. The caller's location is recorded.
    #[track_caller]
    pub fn new(element_type: ElementType, props: Props) -> Self {
        Self(Rc::new(ElementInner {
            element_type,
            props,
            source: Location::caller(),
        }))
    }

    pub fn kind(&self) -> ElementKind {
        self.0.element_type.kind()
    }

    pub fn element_type(&self) -> &ElementType {
        &self.0.element_type
    }

    pub fn props(&self) -> &Props {
        &self.0.props
    }

    /// Where this element was created.
    pub fn source(&self) -> &'static Location<'static> {
        self.0.source
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.0.element_type, ElementType::Fragment(_))
    }

    /// The group of a fragment element.
    pub fn fragment_group(&self) -> Option<&Group> {
        match &self.0.element_type {
            ElementType::Fragment(group) => Some(group.as_ref()),
            _ => None,
        }
    }

    /// Host class name, for Host elements.
    pub fn class_name(&self) -> Option<&str> {
        match &self.0.element_type {
            ElementType::Host(class_name) => Some(class_name.as_str()),
            _ => None,
        }
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Human-readable name of what this element renders.
    pub fn display_name(&self) -> String {
        match &self.0.element_type {
            ElementType::Host(class_name) => class_name.clone(),
            ElementType::Function(component) => component.name().to_string(),
            ElementType::Stateful(component) => component.name().to_string(),
            ElementType::Portal => "Portal".to_string(),
            ElementType::Fragment(_) => "Fragment".to_string(),
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}<{}>", self.kind(), self.display_name())
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Create a Host, Function or Stateful element.
#[track_caller]
pub fn create_element(element_type: impl Into<ElementType>, props: Props) -> Element {
    Element::new(element_type.into(), props)
}

/// Create a fragment: its members flatten into the parent's children.
#[track_caller]
pub fn create_fragment(group: Group) -> Element {
    Element::new(ElementType::Fragment(Rc::new(group)), Props::new())
}

/// Render `children` under `target` instead of the portal's own host parent.
#[track_caller]
pub fn create_portal(target: &HostObject, children: impl Into<Children>) -> Element {
    Element::new(
        ElementType::Portal,
        Props::new().with(PORTAL_TARGET, target.clone()).children(children),
    )
}

/// Prop name holding a portal's target host object.
pub const PORTAL_TARGET: &str = "target";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let host = create_element("Frame", Props::new());
        let component = FunctionComponent::new("Empty", |_| Children::Empty);
        let function = create_element(&component, Props::new());
        let fragment = create_fragment(Group::new());

        assert_eq!(host.kind(), ElementKind::Host);
        assert_eq!(function.kind(), ElementKind::Function);
        assert_eq!(fragment.kind(), ElementKind::Fragment);
        assert_eq!(host.class_name(), Some("Frame"));
        assert!(fragment.is_fragment());
    }

    #[test]
    fn test_source_is_the_caller() {
        let element = create_element("Frame", Props::new());
        assert!(element.source().file().ends_with("mod.rs"));
    }

    #[test]
    fn test_same_shape() {
        let a = FunctionComponent::new("A", |_| Children::Empty);
        let b = FunctionComponent::new("B", |_| Children::Empty);

        assert!(ElementType::from("Frame").same_shape(&ElementType::from("Frame")));
        assert!(!ElementType::from("Frame").same_shape(&ElementType::from("TextLabel")));
        assert!(ElementType::from(&a).same_shape(&ElementType::from(&a)));
        assert!(!ElementType::from(&a).same_shape(&ElementType::from(&b)));
        assert!(!ElementType::Portal.same_shape(&ElementType::from("Frame")));
    }

    #[test]
    fn test_validator() {
        let component = FunctionComponent::with_validator(
            "NeedsText",
            |_| Children::Empty,
            |props| match props.get_named("Text") {
                Some(_) => Ok(()),
                None => Err("Text is required".to_string()),
            },
        );

        assert!(component.validate(&Props::new().with("Text", "x")).is_ok());
        assert!(component.validate(&Props::new()).is_err());
    }
}
