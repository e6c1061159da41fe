//! Children values and key addressing.
//!
//! A children value is one of:
//!
//! ```text
//! Children::Empty / Children::Bool   nothing to render
//! Children::Element(e)               exactly one child, addressed by the parent's key
//! Children::Group(g)                 keyed collection; nested groups flatten
//! ```
//!
//! Keys inside a group are [`ElementKey`]s: 1-based positions for pushed
//! children, names for inserted ones. The address of a flattened child is a
//! [`ChildKey`] path through every group it is nested in.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::Element;

// =============================================================================
// Keys
// =============================================================================

/// Key of one entry within a single group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKey {
    /// 1-based position.
    Index(usize),
    Name(String),
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKey::Index(index) => write!(f, "{index}"),
            ElementKey::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<usize> for ElementKey {
    fn from(index: usize) -> Self {
        ElementKey::Index(index)
    }
}

impl From<&str> for ElementKey {
    fn from(name: &str) -> Self {
        ElementKey::Name(name.to_string())
    }
}

impl From<String> for ElementKey {
    fn from(name: String) -> Self {
        ElementKey::Name(name)
    }
}

/// Address of a child within its sibling scope.
///
/// Every yielded key is a fresh value; holding on to one never observes
/// later iteration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildKey {
    /// The single child of a node reuses the node's own key.
    UseParentKey,
    /// Path of group keys, outermost first. Never empty.
    Path(Vec<ElementKey>),
}

impl ChildKey {
    /// A plain (non-nested) key.
    pub fn key(key: impl Into<ElementKey>) -> Self {
        ChildKey::Path(vec![key.into()])
    }

    /// A composite key through nested groups.
    pub fn path<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ElementKey>,
    {
        ChildKey::Path(keys.into_iter().map(Into::into).collect())
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, ChildKey::Path(path) if path.len() > 1)
    }
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildKey::UseParentKey => write!(f, "<parent>"),
            ChildKey::Path(path) => {
                for (i, key) in path.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    write!(f, "{key}")?;
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Group
// =============================================================================

/// Ordered, keyed collection of children.
///
/// Iteration follows insertion order. Re-inserting an existing key replaces
/// the entry in place.
#[derive(Clone, Default)]
pub struct Group {
    entries: Vec<(ElementKey, Children)>,
    positions: HashMap<ElementKey, usize>,
    next_index: usize,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child under the next positional key (1, 2, 3, ...).
    pub fn push(mut self, child: impl Into<Children>) -> Self {
        self.next_index += 1;
        let key = ElementKey::Index(self.next_index);
        self.set(key, child.into());
        self
    }

    /// Add a child under an explicit key.
    pub fn insert(mut self, key: impl Into<ElementKey>, child: impl Into<Children>) -> Self {
        let key = key.into();
        if let ElementKey::Index(index) = key {
            self.next_index = self.next_index.max(index);
        }
        self.set(key, child.into());
        self
    }

    fn set(&mut self, key: ElementKey, child: Children) {
        match self.positions.get(&key) {
            Some(&position) => {
                log::warn!("duplicate child key `{key}`, replacing the earlier entry");
                self.entries[position].1 = child;
            }
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, child));
            }
        }
    }

    pub fn get(&self, key: &ElementKey) -> Option<&Children> {
        self.positions.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ElementKey, &Children)> {
        self.entries.iter().map(|(key, child)| (key, child))
    }

    pub(crate) fn entry_at(&self, position: usize) -> Option<(&ElementKey, &Children)> {
        self.entries.get(position).map(|(key, child)| (key, child))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<C: Into<Children>> FromIterator<C> for Group {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        iter.into_iter().fold(Group::new(), |group, child| group.push(child))
    }
}

// =============================================================================
// Children
// =============================================================================

/// Any legal children value.
#[derive(Clone, Default)]
pub enum Children {
    #[default]
    Empty,
    /// Conditional rendering placeholder (`cond && element`).
    Bool(bool),
    Element(Element),
    Group(Rc<Group>),
}

impl Children {
    /// Identity comparison: same element or same group allocation.
    pub fn ptr_eq(&self, other: &Children) -> bool {
        match (self, other) {
            (Children::Empty, Children::Empty) => true,
            (Children::Bool(a), Children::Bool(b)) => a == b,
            (Children::Element(a), Children::Element(b)) => a.ptr_eq(b),
            (Children::Group(a), Children::Group(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// True when this value renders nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Children::Empty | Children::Bool(_) => true,
            Children::Element(_) => false,
            Children::Group(group) => group.is_empty(),
        }
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Children::Empty => write!(f, "Empty"),
            Children::Bool(b) => write!(f, "{b}"),
            Children::Element(element) => write!(f, "{element:?}"),
            Children::Group(group) => write!(f, "{group:?}"),
        }
    }
}

impl From<Element> for Children {
    fn from(element: Element) -> Self {
        Children::Element(element)
    }
}

impl From<Group> for Children {
    fn from(group: Group) -> Self {
        Children::Group(Rc::new(group))
    }
}

impl From<bool> for Children {
    fn from(value: bool) -> Self {
        Children::Bool(value)
    }
}

impl From<Option<Element>> for Children {
    fn from(element: Option<Element>) -> Self {
        element.map_or(Children::Empty, Children::Element)
    }
}
