use rustc_hash::FxHashMap;

use crate::hierarchy_node::{
    any_subclass, ensure_node, for_each_subclass, lub_of_instantiated_subclasses, subclasses_by_mask,
    NodeTable, SubclassMask,
};
use crate::ids::ClassId;

const OBJECT: ClassId = ClassId(0);
const A: ClassId = ClassId(1);
const B: ClassId = ClassId(2);
const C: ClassId = ClassId(3);
const D: ClassId = ClassId(4);

fn chain() -> FxHashMap<ClassId, ClassId> {
    // Object <- A <- B <- C, Object <- A <- D
    [(A, OBJECT), (B, A), (C, B), (D, A)].into_iter().collect()
}

fn superclass_of(parents: &FxHashMap<ClassId, ClassId>) -> impl Fn(ClassId) -> Option<ClassId> + '_ {
    move |c| parents.get(&c).copied()
}

#[test]
fn ensure_node_builds_full_ancestor_chain_and_depths() {
    let parents = chain();
    let mut nodes = NodeTable::default();
    ensure_node(&mut nodes, C, &superclass_of(&parents));

    assert_eq!(nodes.get(&OBJECT).unwrap().depth, 0);
    assert_eq!(nodes.get(&A).unwrap().depth, 1);
    assert_eq!(nodes.get(&B).unwrap().depth, 2);
    assert_eq!(nodes.get(&C).unwrap().depth, 3);
    assert_eq!(nodes.get(&A).unwrap().children.as_slice(), &[B]);
}

#[test]
fn ensure_node_is_idempotent_and_preserves_child_order() {
    let parents = chain();
    let mut nodes = NodeTable::default();
    ensure_node(&mut nodes, B, &superclass_of(&parents));
    ensure_node(&mut nodes, D, &superclass_of(&parents));
    ensure_node(&mut nodes, B, &superclass_of(&parents));

    assert_eq!(nodes.get(&A).unwrap().children.as_slice(), &[B, D]);
}

#[test]
fn for_each_subclass_strict_excludes_root() {
    let parents = chain();
    let mut nodes = NodeTable::default();
    ensure_node(&mut nodes, C, &superclass_of(&parents));
    ensure_node(&mut nodes, D, &superclass_of(&parents));

    let strict = subclasses_by_mask(&nodes, A, SubclassMask::All, true);
    assert_eq!(strict, vec![B, C, D]);

    let non_strict = subclasses_by_mask(&nodes, A, SubclassMask::All, false);
    assert_eq!(non_strict, vec![A, B, C, D]);
}

#[test]
fn for_each_subclass_honors_skip_subclasses() {
    let parents = chain();
    let mut nodes = NodeTable::default();
    ensure_node(&mut nodes, C, &superclass_of(&parents));
    ensure_node(&mut nodes, D, &superclass_of(&parents));

    let mut visited = Vec::new();
    for_each_subclass(&nodes, A, SubclassMask::All, false, &mut |cls| {
        visited.push(cls);
        if cls == B {
            crate::hierarchy_node::WalkControl::SkipSubclasses
        } else {
            crate::hierarchy_node::WalkControl::Continue
        }
    });
    assert_eq!(visited, vec![A, B, D]);
}

#[test]
fn any_subclass_stops_at_first_match() {
    let parents = chain();
    let mut nodes = NodeTable::default();
    ensure_node(&mut nodes, C, &superclass_of(&parents));

    assert!(any_subclass(&nodes, A, SubclassMask::All, true, |c| c == B));
    assert!(!any_subclass(&nodes, A, SubclassMask::All, true, |c| c == ClassId(99)));
}

#[test]
fn lub_of_instantiated_subclasses_stops_at_split() {
    let parents = chain();
    let mut nodes = NodeTable::default();
    ensure_node(&mut nodes, C, &superclass_of(&parents));
    ensure_node(&mut nodes, D, &superclass_of(&parents));

    assert_eq!(lub_of_instantiated_subclasses(&nodes, A), None);

    nodes.get_mut(&C).unwrap().directly_instantiated = true;
    nodes.get_mut(&D).unwrap().directly_instantiated = true;
    nodes.get_mut(&B).unwrap().indirectly_instantiated_count = 1;
    nodes.get_mut(&A).unwrap().indirectly_instantiated_count = 2;

    // Both B (via C) and D are instantiated branches under A: split at A.
    assert_eq!(lub_of_instantiated_subclasses(&nodes, A), Some(A));
}

#[test]
fn lub_of_instantiated_subclasses_follows_single_branch() {
    let parents = chain();
    let mut nodes = NodeTable::default();
    ensure_node(&mut nodes, C, &superclass_of(&parents));

    nodes.get_mut(&C).unwrap().directly_instantiated = true;
    nodes.get_mut(&B).unwrap().indirectly_instantiated_count = 1;
    nodes.get_mut(&A).unwrap().indirectly_instantiated_count = 1;

    assert_eq!(lub_of_instantiated_subclasses(&nodes, A), Some(C));
}
