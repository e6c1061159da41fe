//! End-to-end reconciliation against the built-in host classes.
//!
//! Each test mounts a real tree under a `Folder` root, drives it through
//! updates and binding emissions, and inspects the resulting host objects.
//!
//! Run with: cargo test --test end_to_end

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_vdom::*;

// =============================================================================
// HELPERS
// =============================================================================

fn setup() -> HostObject {
    reset_classes();
    HostObject::new("Folder").unwrap()
}

fn collecting_reconciler(checks: Checks) -> (TreeReconciler, Rc<RefCell<Vec<String>>>) {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = errors.clone();
    let config = Config::default()
        .with_checks(checks)
        .with_binding_error_hook(move |error| sink.borrow_mut().push(error.to_string()));
    (TreeReconciler::with_config(config), errors)
}

fn label(text: &str) -> Element {
    create_element("TextLabel", Props::new().with("Text", text))
}

// =============================================================================
// BINDINGS
// =============================================================================

#[test]
fn bound_property_follows_emissions_and_detaches_on_unmount() {
    let root = setup();
    let (reconciler, errors) = collecting_reconciler(Checks::NONE);
    let (size, set_size) = create_binding(Dimension::Cells(10));

    let tree = reconciler
        .mount_virtual_tree(
            create_element("TextLabel", Props::new().with("Text", "A").bind("Size", size)),
            Some(&root),
            Some("Label"),
        )
        .unwrap();

    let host = root.find_first_child("Label").unwrap();
    assert_eq!(host.get_property("Text").unwrap(), Value::from("A"));
    assert_eq!(host.get_property("Size").unwrap(), Value::from(Dimension::Cells(10)));
    assert_eq!(tree.root().unwrap().binding_count(), 1);

    set_size.set(Dimension::Cells(20));
    assert_eq!(host.get_property("Size").unwrap(), Value::from(Dimension::Cells(20)));

    reconciler.unmount_virtual_tree(tree).unwrap();
    assert!(host.is_destroyed());
    assert_eq!(host.listener_count(), 0);

    // Nothing is listening any more: no write to the destroyed object.
    set_size.set(Dimension::Cells(30));
    assert!(errors.borrow().is_empty());
    assert!(root.children().is_empty());
}

#[test]
fn swapping_bindings_moves_the_subscription() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let (first, set_first) = create_binding("one");
    let (second, set_second) = create_binding("two");

    let mut tree = reconciler
        .mount_virtual_tree(create_element("TextLabel", Props::new().bind("Text", first)), Some(&root), Some("L"))
        .unwrap();
    let host = root.find_first_child("L").unwrap();

    reconciler
        .update_virtual_tree(&mut tree, create_element("TextLabel", Props::new().bind("Text", second)))
        .unwrap();
    assert_eq!(host.get_property("Text").unwrap(), Value::from("two"));

    set_first.set("stale");
    assert_eq!(host.get_property("Text").unwrap(), Value::from("two"));
    set_second.set("fresh");
    assert_eq!(host.get_property("Text").unwrap(), Value::from("fresh"));
    assert_eq!(tree.root().unwrap().binding_count(), 1);
}

#[test]
fn mapped_and_joined_bindings_drive_properties() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let (count, set_count) = create_binding(1);
    let text = count.map(|value| Value::from(format!("{} items", value.as_number().unwrap_or(0.0))));

    let _tree = reconciler
        .mount_virtual_tree(create_element("TextLabel", Props::new().bind("Text", text)), Some(&root), Some("L"))
        .unwrap();
    let host = root.find_first_child("L").unwrap();
    assert_eq!(host.get_property("Text").unwrap(), Value::from("1 items"));

    set_count.set(3);
    assert_eq!(host.get_property("Text").unwrap(), Value::from("3 items"));

    let joined = join_bindings([("count", count.clone())]);
    assert!(matches!(joined.get_value(), Value::Record(record) if record.get("count") == Some(&Value::from(3))));
}

#[test]
fn binding_errors_are_wrapped_with_the_creation_site() {
    let root = setup();
    let (reconciler, errors) = collecting_reconciler(Checks::ELEMENT_TRACING);
    let (visible, set_visible) = create_binding(true);

    let tree = reconciler
        .mount_virtual_tree(create_element("Frame", Props::new().bind("Visible", visible)), Some(&root), Some("F"))
        .unwrap();
    let host = root.find_first_child("F").unwrap();

    // Destroying the object behind the reconciler's back makes the next write fail.
    host.destroy();
    set_visible.set(false);

    {
        let errors = errors.borrow();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("has been destroyed"));
        assert!(errors[0].contains("end_to_end.rs"));
    }
    drop(tree);
}

// =============================================================================
// PROPERTIES
// =============================================================================

#[test]
fn identical_update_causes_no_mutations() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let props = || {
        Props::new()
            .with("Text", "Same")
            .with("TextColor", Rgba::RED)
            .with("Size", Dimension::Percent(50.0))
    };

    let mut tree = reconciler
        .mount_virtual_tree(create_element("TextLabel", props()), Some(&root), Some("L"))
        .unwrap();
    let host = root.find_first_child("L").unwrap();
    let before = host.mutation_count();

    reconciler
        .update_virtual_tree(&mut tree, create_element("TextLabel", props()))
        .unwrap();
    assert_eq!(host.mutation_count(), before);
}

#[test]
fn removed_property_resets_to_class_default() {
    let root = setup();
    let reconciler = TreeReconciler::default();

    let mut tree = reconciler
        .mount_virtual_tree(
            create_element("Frame", Props::new().with("BackgroundColor", Rgba::RED).with("ZIndex", 5)),
            Some(&root),
            Some("F"),
        )
        .unwrap();
    let host = root.find_first_child("F").unwrap();
    assert_eq!(host.get_property("BackgroundColor").unwrap(), Value::from(Rgba::RED));

    reconciler
        .update_virtual_tree(&mut tree, create_element("Frame", Props::new().with("ZIndex", 5)))
        .unwrap();
    assert_eq!(host.get_property("BackgroundColor").unwrap(), Value::from(Rgba::WHITE));

    reconciler
        .update_virtual_tree(&mut tree, create_element("Frame", Props::new().with("ZIndex", Value::Nil)))
        .unwrap();
    assert_eq!(host.get_property("ZIndex").unwrap(), Value::from(1));
}

// =============================================================================
// EVENTS
// =============================================================================

#[test]
fn event_handlers_fire_after_mount() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let clicks = Rc::new(Cell::new(0));
    let counter = clicks.clone();

    let _tree = reconciler
        .mount_virtual_tree(
            create_element("TextButton", Props::new().on("Activated", move |_, _| counter.set(counter.get() + 1))),
            Some(&root),
            Some("Ok"),
        )
        .unwrap();
    let button = root.find_first_child("Ok").unwrap();

    button.fire("Activated", &[]).unwrap();
    button.fire("Activated", &[]).unwrap();
    assert_eq!(clicks.get(), 2);
}

#[test]
fn change_handlers_see_a_fully_updated_object() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let element = |text: &str, size: i32, tag: &'static str| {
        let sink = seen.clone();
        create_element(
            "TextLabel",
            Props::new()
                .with("Text", text)
                .with("TextSize", size)
                .on_change("Text", move |host, args| {
                    let size = host.get_property("TextSize").unwrap_or_default();
                    sink.borrow_mut().push((tag, args[0].clone(), size));
                }),
        )
    };

    let mut tree = reconciler.mount_virtual_tree(element("a", 10, "first"), Some(&root), Some("L")).unwrap();
    assert!(seen.borrow().is_empty());

    reconciler.update_virtual_tree(&mut tree, element("b", 20, "second")).unwrap();

    // Queued during the update, replayed with the handler current at resume.
    assert_eq!(*seen.borrow(), vec![("second", Value::from("b"), Value::from(20))]);
    assert_eq!(
        tree.root().unwrap().event_manager().map(SingleEventManager::status),
        Some(EventStatus::Enabled)
    );
}

#[test]
fn removing_a_handler_disconnects_it() {
    let root = setup();
    let reconciler = TreeReconciler::default();

    let mut tree = reconciler
        .mount_virtual_tree(create_element("TextButton", Props::new().on("Activated", |_, _| {})), Some(&root), Some("B"))
        .unwrap();
    let button = root.find_first_child("B").unwrap();
    assert_eq!(button.listener_count(), 1);

    reconciler
        .update_virtual_tree(&mut tree, create_element("TextButton", Props::new()))
        .unwrap();
    assert_eq!(button.listener_count(), 0);
}

// =============================================================================
// REFS
// =============================================================================

#[test]
fn refs_track_the_host_object() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let frame_ref = create_ref();

    let tree = reconciler
        .mount_virtual_tree(create_element("Frame", Props::new().with_ref_binding(frame_ref.clone())), Some(&root), Some("F"))
        .unwrap();
    let host = root.find_first_child("F").unwrap();
    assert!(frame_ref.get_value().as_object().is_some_and(|found| found.ptr_eq(&host)));

    reconciler.unmount_virtual_tree(tree).unwrap();
    assert!(frame_ref.get_value().is_nil());
}

#[test]
fn derived_ref_is_rejected() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let (value, _) = create_binding(1);

    let result = reconciler.mount_virtual_tree(
        create_element("Frame", Props::new().with_ref_binding(value.map(|v| v))),
        Some(&root),
        None,
    );
    assert!(matches!(result, Err(ReconcileError::InvalidRef(_))));
}

// =============================================================================
// PORTALS
// =============================================================================

#[test]
fn portal_target_change_remounts_children() {
    let root = setup();
    let first = HostObject::new("Folder").unwrap();
    let second = HostObject::new("Folder").unwrap();
    let reconciler = TreeReconciler::default();
    let toast = || Group::new().insert("Toast", label("hi"));

    let mut tree = reconciler.mount_virtual_tree(create_portal(&first, toast()), Some(&root), None).unwrap();
    let old_toast = first.find_first_child("Toast").unwrap();

    reconciler.update_virtual_tree(&mut tree, create_portal(&second, toast())).unwrap();

    assert!(first.children().is_empty());
    assert!(old_toast.is_destroyed());
    let new_toast = second.find_first_child("Toast").unwrap();
    assert!(!new_toast.ptr_eq(&old_toast));
    assert_eq!(tree.root().unwrap().host_objects().len(), 1);
}

#[test]
fn portal_with_same_target_updates_in_place() {
    let root = setup();
    let target = HostObject::new("Folder").unwrap();
    let reconciler = TreeReconciler::default();

    let mut tree = reconciler
        .mount_virtual_tree(create_portal(&target, Group::new().insert("T", label("a"))), Some(&root), None)
        .unwrap();
    let kept = target.find_first_child("T").unwrap();

    reconciler
        .update_virtual_tree(&mut tree, create_portal(&target, Group::new().insert("T", label("b"))))
        .unwrap();

    assert!(target.find_first_child("T").is_some_and(|t| t.ptr_eq(&kept)));
    assert_eq!(kept.get_property("Text").unwrap(), Value::from("b"));
}

// =============================================================================
// STATEFUL COMPONENTS
// =============================================================================

struct Frozen;

struct FrozenInstance {
    updates: Rc<Cell<usize>>,
}

thread_local! {
    static FROZEN_UPDATES: Rc<Cell<usize>> = Rc::new(Cell::new(0));
    static FROZEN_UNMOUNTS: Rc<Cell<usize>> = Rc::new(Cell::new(0));
}

impl StatefulComponent for Frozen {
    fn name(&self) -> &str {
        "Frozen"
    }

    fn mount(&self, reconciler: &dyn Reconciler, node: &mut VirtualNode) -> Result<Box<dyn ComponentInstance>> {
        let text = node.element().props().get_named("Text").cloned().unwrap_or_else(|| "".into());
        let mut props = Props::new();
        props.insert(PropKey::name("Text"), text);
        let host_parent = node.host_parent();
        reconciler.update_virtual_node_with_render_result(
            node,
            host_parent.as_ref(),
            &create_element("TextLabel", props).into(),
        )?;
        Ok(Box::new(FrozenInstance {
            updates: FROZEN_UPDATES.with(Rc::clone),
        }))
    }
}

impl ComponentInstance for FrozenInstance {
    fn update(
        &mut self,
        _reconciler: &dyn Reconciler,
        _node: &mut VirtualNode,
        _new_element: &Element,
        _new_state: Option<Value>,
    ) -> Result<bool> {
        self.updates.set(self.updates.get() + 1);
        Ok(false)
    }

    fn will_unmount(&mut self) {
        FROZEN_UNMOUNTS.with(|count| count.set(count.get() + 1));
    }
}

#[test]
fn stateful_veto_keeps_the_previous_element() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let frozen: Rc<dyn StatefulComponent> = Rc::new(Frozen);

    let first = create_element(frozen.clone(), Props::new().with("Text", "first"));
    let mut tree = reconciler.mount_virtual_tree(first.clone(), Some(&root), Some("Frozen")).unwrap();

    reconciler
        .update_virtual_tree(&mut tree, create_element(frozen.clone(), Props::new().with("Text", "second")))
        .unwrap();

    assert_eq!(FROZEN_UPDATES.with(|count| count.get()), 1);
    assert!(tree.root().unwrap().element().ptr_eq(&first));
    let host = root.find_first_child("Frozen").unwrap();
    assert_eq!(host.get_property("Text").unwrap(), Value::from("first"));

    reconciler.unmount_virtual_tree(tree).unwrap();
    assert_eq!(FROZEN_UNMOUNTS.with(|count| count.get()), 1);
    assert!(host.is_destroyed());
}

#[test]
fn memo_skips_renders_with_unchanged_props() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let renders = Rc::new(Cell::new(0));
    let counter = renders.clone();

    let card = FunctionComponent::new("Card", move |props| {
        counter.set(counter.get() + 1);
        let mut label = Props::new();
        if let Some(title) = props.get_named("Title") {
            label.insert(PropKey::name("Text"), title.clone());
        }
        create_element("TextLabel", label).into()
    });
    let memo = memo(&card);

    let mut tree = reconciler
        .mount_virtual_tree(create_element(memo.clone(), Props::new().with("Title", "a")), Some(&root), Some("Card"))
        .unwrap();
    assert_eq!(renders.get(), 1);

    reconciler
        .update_virtual_tree(&mut tree, create_element(memo.clone(), Props::new().with("Title", "a")))
        .unwrap();
    assert_eq!(renders.get(), 1);

    reconciler
        .update_virtual_tree(&mut tree, create_element(memo.clone(), Props::new().with("Title", "b")))
        .unwrap();
    assert_eq!(renders.get(), 2);
    let host = root.find_first_child("Card").unwrap();
    assert_eq!(host.get_property("Text").unwrap(), Value::from("b"));
}

// =============================================================================
// CHILDREN
// =============================================================================

#[test]
fn conditional_children_mount_and_unmount() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let panel = |show: bool| {
        create_element(
            "Frame",
            Props::new().children(Group::new().insert("Header", label("h")).insert("Body", show.then(|| label("b")))),
        )
    };

    let mut tree = reconciler.mount_virtual_tree(panel(false), Some(&root), Some("Panel")).unwrap();
    let frame = root.find_first_child("Panel").unwrap();
    assert!(frame.find_first_child("Body").is_none());

    reconciler.update_virtual_tree(&mut tree, panel(true)).unwrap();
    assert!(frame.find_first_child("Body").is_some());

    reconciler.update_virtual_tree(&mut tree, panel(false)).unwrap();
    assert!(frame.find_first_child("Body").is_none());
    assert_eq!(frame.children().len(), 1);
}

#[test]
fn invalid_children_are_rejected() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let mut props = Props::new();
    props.insert(PropKey::Children, PropValue::from(3));

    let result = reconciler.mount_virtual_tree(create_element("Frame", props), Some(&root), None);
    assert!(matches!(result, Err(ReconcileError::InvalidChildren(_))));
}

#[test]
fn unknown_class_is_a_host_error() {
    let root = setup();
    let reconciler = TreeReconciler::default();

    let result = reconciler.mount_virtual_tree(create_element("Sprocket", Props::new()), Some(&root), None);
    assert!(matches!(result, Err(ReconcileError::Host(HostError::UnknownClass(_)))));
}

// =============================================================================
// FAILURES
// =============================================================================

#[test]
fn failed_update_destroys_the_tree() {
    let root = setup();
    let (reconciler, errors) = collecting_reconciler(Checks::NONE);
    let (text, set_text) = create_binding("A");

    let mut tree = reconciler
        .mount_virtual_tree(create_element("TextLabel", Props::new().bind("Text", text)), Some(&root), Some("L"))
        .unwrap();
    let host = root.find_first_child("L").unwrap();

    let result = reconciler.update_virtual_tree(&mut tree, create_element("TextLabel", Props::new().with("Bogus", 1)));
    assert!(result.is_err());
    assert!(!tree.is_mounted());
    assert!(host.is_destroyed());
    assert_eq!(host.listener_count(), 0);

    reconciler.unmount_virtual_tree(tree).unwrap();
    assert!(root.children().is_empty());

    // The binding was released with the node: no write to the destroyed object.
    set_text.set("B");
    assert!(errors.borrow().is_empty());
}

#[test]
fn failed_child_update_releases_every_sibling() {
    let root = setup();
    let reconciler = TreeReconciler::default();
    let list = |b: Element| create_element("Frame", Props::new().children(Group::new().insert("a", label("A")).insert("b", b)));

    let mut tree = reconciler.mount_virtual_tree(list(label("B")), Some(&root), Some("List")).unwrap();
    let frame = root.find_first_child("List").unwrap();
    let a = frame.find_first_child("a").unwrap();
    let b = frame.find_first_child("b").unwrap();

    let broken = create_element("TextLabel", Props::new().with("Bogus", 1));
    assert!(reconciler.update_virtual_tree(&mut tree, list(broken)).is_err());

    assert!(a.is_destroyed());
    assert!(b.is_destroyed());
    assert!(frame.is_destroyed());
    assert!(root.children().is_empty());
}
