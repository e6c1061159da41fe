//! Element iteration - flatten any children value into `(ChildKey, &Element)` pairs.
//!
//! Nested groups (and fragment elements inside a group) are spliced in at
//! their position, their members addressed by the composite key
//! `outer key + inner key`:
//!
//! ```text
//! [A, {x = B, y = C}, D]   ->   (1, A) ([2, x], B) ([2, y], C) (3, D)
//! ```
//!
//! The iterator keeps an explicit stack of frames, one per group being
//! walked. Each frame owns its key prefix, so every yielded key is a fresh
//! value.

use super::children::{ChildKey, Children, ElementKey, Group};
use super::Element;

// =============================================================================
// Iteration
// =============================================================================

/// Iterate the elements of a children value.
///
/// - `Empty` / `Bool`: nothing
/// - A single non-fragment element: one pair keyed [`ChildKey::UseParentKey`]
/// - A group or fragment element: its members, nested groups flattened
pub fn iterate_elements(children: &Children) -> ElementIter<'_> {
    let state = match children {
        Children::Empty | Children::Bool(_) => IterState::Done,
        Children::Element(element) => match element.fragment_group() {
            Some(group) => IterState::Frames(vec![Frame::root(group)]),
            None => IterState::Single(element),
        },
        Children::Group(group) => IterState::Frames(vec![Frame::root(group)]),
    };
    ElementIter { state }
}

/// Iterator returned by [`iterate_elements`].
pub struct ElementIter<'a> {
    state: IterState<'a>,
}

enum IterState<'a> {
    Done,
    Single(&'a Element),
    Frames(Vec<Frame<'a>>),
}

struct Frame<'a> {
    group: &'a Group,
    position: usize,
    prefix: Vec<ElementKey>,
}

impl<'a> Frame<'a> {
    fn root(group: &'a Group) -> Self {
        Self {
            group,
            position: 0,
            prefix: Vec::new(),
        }
    }
}

impl<'a> Iterator for ElementIter<'a> {
    type Item = (ChildKey, &'a Element);

    fn next(&mut self) -> Option<Self::Item> {
        if let IterState::Single(element) = self.state {
            self.state = IterState::Done;
            return Some((ChildKey::UseParentKey, element));
        }
        let IterState::Frames(stack) = &mut self.state else {
            return None;
        };

        loop {
            let frame = stack.last_mut()?;
            let group = frame.group;

            let Some((key, child)) = group.entry_at(frame.position) else {
                stack.pop();
                continue;
            };
            frame.position += 1;

            let mut path = frame.prefix.clone();
            path.push(key.clone());

            let nested = match child {
                Children::Empty | Children::Bool(_) => continue,
                Children::Group(nested) => nested.as_ref(),
                Children::Element(element) => match element.fragment_group() {
                    Some(nested) => nested,
                    None => return Some((ChildKey::Path(path), element)),
                },
            };

            stack.push(Frame {
                group: nested,
                position: 0,
                prefix: path,
            });
        }
    }
}

// =============================================================================
// Lookup
// =============================================================================

/// Find the element addressed by `key`, following the same shape rules as
/// [`iterate_elements`].
///
/// A composite key that no longer resolves (the nested group is gone or
/// changed shape) is simply not found.
pub fn get_element_by_key<'a>(children: &'a Children, key: &ChildKey) -> Option<&'a Element> {
    match children {
        Children::Empty | Children::Bool(_) => None,
        Children::Element(element) => match element.fragment_group() {
            Some(group) => lookup_path(group, key),
            None => (*key == ChildKey::UseParentKey).then_some(element),
        },
        Children::Group(group) => lookup_path(group, key),
    }
}

fn lookup_path<'a>(group: &'a Group, key: &ChildKey) -> Option<&'a Element> {
    let ChildKey::Path(path) = key else {
        return None;
    };
    let (last, parents) = path.split_last()?;

    let mut group = group;
    for key in parents {
        group = match group.get(key)? {
            Children::Group(nested) => nested.as_ref(),
            Children::Element(element) => element.fragment_group()?,
            Children::Empty | Children::Bool(_) => return None,
        };
    }

    match group.get(last)? {
        Children::Element(element) if !element.is_fragment() => Some(element),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{create_element, create_fragment, Props};

    fn label(text: &str) -> Element {
        create_element("TextLabel", Props::new().with("Text", text))
    }

    fn text_of(element: &Element) -> String {
        element
            .props()
            .get_named("Text")
            .and_then(|v| v.as_value())
            .and_then(|v| v.as_text())
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_nothing_and_booleans_are_empty() {
        assert_eq!(iterate_elements(&Children::Empty).count(), 0);
        assert_eq!(iterate_elements(&Children::Bool(true)).count(), 0);
        assert_eq!(iterate_elements(&Children::Bool(false)).count(), 0);
    }

    #[test]
    fn test_single_element_uses_parent_key() {
        let element = label("A");
        let children = Children::from(element.clone());

        let pairs: Vec<_> = iterate_elements(&children).collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, ChildKey::UseParentKey);
        assert!(pairs[0].1.ptr_eq(&element));

        assert!(get_element_by_key(&children, &ChildKey::UseParentKey)
            .is_some_and(|found| found.ptr_eq(&element)));
        assert!(get_element_by_key(&children, &ChildKey::key(1)).is_none());
    }

    #[test]
    fn test_nested_group_flattens_with_composite_keys() {
        let children = Children::from(
            Group::new()
                .push(label("A"))
                .push(create_fragment(Group::new().insert("x", label("B")).insert("y", label("C"))))
                .push(label("D")),
        );

        let pairs: Vec<(ChildKey, String)> = iterate_elements(&children)
            .map(|(key, element)| (key, text_of(element)))
            .collect();

        assert_eq!(
            pairs,
            vec![
                (ChildKey::key(1), "A".to_string()),
                (ChildKey::path([ElementKey::from(2), "x".into()]), "B".to_string()),
                (ChildKey::path([ElementKey::from(2), "y".into()]), "C".to_string()),
                (ChildKey::key(3), "D".to_string()),
            ]
        );
    }

    #[test]
    fn test_two_levels_produce_three_part_key() {
        let children = Children::from(
            Group::new().insert("outer", Group::new().insert("inner", Group::new().insert("leaf", label("L")))),
        );

        let pairs: Vec<_> = iterate_elements(&children).collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(
            pairs[0].0,
            ChildKey::path([ElementKey::from("outer"), "inner".into(), "leaf".into()])
        );

        let found = get_element_by_key(&children, &pairs[0].0).unwrap();
        assert_eq!(text_of(found), "L");
    }

    #[test]
    fn test_empty_group_is_empty_not_error() {
        assert_eq!(iterate_elements(&Children::from(Group::new())).count(), 0);
        assert_eq!(iterate_elements(&Children::from(create_fragment(Group::new()))).count(), 0);
    }

    #[test]
    fn test_booleans_inside_group_are_skipped() {
        let children = Children::from(Group::new().push(false).push(label("B")));
        let keys: Vec<ChildKey> = iterate_elements(&children).map(|(k, _)| k).collect();
        assert_eq!(keys, vec![ChildKey::key(2)]);
    }

    #[test]
    fn test_lookup_of_vanished_nested_group_is_not_found() {
        let before = Children::from(Group::new().insert("g", Group::new().insert("x", label("X"))));
        let after = Children::from(Group::new().insert("g", label("now a leaf")));
        let key = ChildKey::path([ElementKey::from("g"), "x".into()]);

        assert!(get_element_by_key(&before, &key).is_some());
        assert!(get_element_by_key(&after, &key).is_none());
        assert!(get_element_by_key(&after, &ChildKey::UseParentKey).is_none());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let children = Children::from(Group::new().push(label("A")).push(label("B")));
        assert_eq!(iterate_elements(&children).count(), 2);
        assert_eq!(iterate_elements(&children).count(), 2);
    }

    #[test]
    fn test_top_level_fragment_is_a_group() {
        let children = Children::from(create_fragment(Group::new().insert("a", label("A"))));
        let keys: Vec<ChildKey> = iterate_elements(&children).map(|(k, _)| k).collect();
        assert_eq!(keys, vec![ChildKey::key("a")]);
        assert!(get_element_by_key(&children, &ChildKey::key("a")).is_some());
    }
}
