//! The subtype DAG: each registered class also gets a
//! [`ClassSet`], which layers "foreign" subtype roots — classes that
//! implement but do not extend it — on top of the subclass tree.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

use crate::hierarchy_node::{self, NodeTable, SubclassMask, WalkControl};
use crate::ids::ClassId;

pub(crate) type ClassSetTable = IndexMap<ClassId, ClassSet, FxBuildHasher>;

/// Per-class subtype index. Wraps the class's own `HierarchyNode` (looked
/// up by `cls` in the shared `NodeTable`) plus the set of other subtype
/// roots that implement it without extending it.
#[derive(Clone, Debug, Default)]
pub struct ClassSet {
    pub cls_is_set_for: Option<ClassId>,
    /// Foreign subtype roots, in resolver-registration order. A class
    /// reaches this list iff it is *not* also a subclass of `cls`; the two
    /// domains are disjoint by construction, so no deduplication set is
    /// needed in `subtypes_by_mask`.
    pub foreign_subtypes: SmallVec<[ClassId; 2]>,
}

impl ClassSet {
    pub(crate) fn for_class(cls: ClassId) -> Self {
        Self {
            cls_is_set_for: Some(cls),
            foreign_subtypes: SmallVec::new(),
        }
    }

    /// `addSubtype(node)`: appends a foreign subtype root. Idempotent with
    /// respect to the subclass tree — a node already reachable as a
    /// subclass of `cls` is never also recorded here (that invariant is
    /// enforced by the caller, `World::register_foreign_subtype`, which
    /// only calls this for classes that *implement* without *extending*).
    pub(crate) fn add_subtype(&mut self, node: ClassId) {
        if !self.foreign_subtypes.contains(&node) {
            self.foreign_subtypes.push(node);
        }
    }
}

/// `subtypesByMask(mask, strict)`: the node's own subclass
/// traversal, followed by each foreign subtype root's subclass traversal,
/// in registration order.
pub(crate) fn subtypes_by_mask(
    nodes: &NodeTable,
    class_sets: &ClassSetTable,
    cls: ClassId,
    mask: SubclassMask,
    strict: bool,
) -> Vec<ClassId> {
    let mut out = hierarchy_node::subclasses_by_mask(nodes, cls, mask, strict);
    if let Some(set) = class_sets.get(&cls) {
        for &foreign in &set.foreign_subtypes {
            out.extend(hierarchy_node::subclasses_by_mask(
                nodes, foreign, mask, false,
            ));
        }
    }
    out
}

pub(crate) fn for_each_subtype(
    nodes: &NodeTable,
    class_sets: &ClassSetTable,
    cls: ClassId,
    mask: SubclassMask,
    strict: bool,
    f: &mut dyn FnMut(ClassId) -> WalkControl,
) {
    let mut stopped = false;
    hierarchy_node::for_each_subclass(nodes, cls, mask, strict, &mut |c| {
        let ctl = f(c);
        if ctl == WalkControl::Stop {
            stopped = true;
        }
        ctl
    });
    if stopped {
        return;
    }
    if let Some(set) = class_sets.get(&cls) {
        for &foreign in &set.foreign_subtypes {
            if stopped {
                break;
            }
            hierarchy_node::for_each_subclass(nodes, foreign, mask, false, &mut |c| {
                let ctl = f(c);
                if ctl == WalkControl::Stop {
                    stopped = true;
                }
                ctl
            });
        }
    }
}

pub(crate) fn any_subtype(
    nodes: &NodeTable,
    class_sets: &ClassSetTable,
    cls: ClassId,
    mask: SubclassMask,
    strict: bool,
    mut predicate: impl FnMut(ClassId) -> bool,
) -> bool {
    let mut found = false;
    for_each_subtype(nodes, class_sets, cls, mask, strict, &mut |c| {
        if predicate(c) {
            found = true;
            WalkControl::Stop
        } else {
            WalkControl::Continue
        }
    });
    found
}

/// `getLubOfInstantiatedSubtypes()`: same as the subclass
/// version, but `None` unless *some* subtype (subclass or foreign) is
/// instantiated; a class with only an instantiated foreign subtype (and
/// no instantiated subclass of its own) still has no subclass-tree LUB, so
/// this does not simply delegate to `hierarchy_node::lub_of_instantiated_subclasses`.
pub(crate) fn lub_of_instantiated_subtypes(
    nodes: &NodeTable,
    class_sets: &ClassSetTable,
    cls: ClassId,
) -> Option<ClassId> {
    if any_subtype(
        nodes,
        class_sets,
        cls,
        SubclassMask::DirectlyInstantiated,
        false,
        |_| true,
    ) {
        hierarchy_node::lub_of_instantiated_subclasses(nodes, cls).or(Some(cls))
    } else {
        None
    }
}

/// `instantiatedSubtypeCount`: instantiated-subclass count on
/// the node plus the sum over foreign subtypes.
pub(crate) fn instantiated_subtype_count(
    nodes: &NodeTable,
    class_sets: &ClassSetTable,
    cls: ClassId,
) -> usize {
    let own = hierarchy_node::subclasses_by_mask(
        nodes,
        cls,
        SubclassMask::DirectlyInstantiated,
        true,
    )
    .len();
    let foreign: usize = class_sets
        .get(&cls)
        .map(|set| {
            set.foreign_subtypes
                .iter()
                .map(|&root| {
                    hierarchy_node::subclasses_by_mask(
                        nodes,
                        root,
                        SubclassMask::DirectlyInstantiated,
                        false,
                    )
                    .len()
                })
                .sum()
        })
        .unwrap_or(0);
    own + foreign
        + usize::from(
            nodes
                .get(&cls)
                .is_some_and(|n| n.directly_instantiated),
        )
}

/// `hasOnlyInstantiatedSubclasses`: no foreign subtype is instantiated.
pub(crate) fn has_only_instantiated_subclasses(class_sets: &ClassSetTable, nodes: &NodeTable, cls: ClassId) -> bool {
    match class_sets.get(&cls) {
        None => true,
        Some(set) => !set.foreign_subtypes.iter().any(|&root| {
            nodes
                .get(&root)
                .is_some_and(hierarchy_node::HierarchyNode::is_instantiated)
                || hierarchy_node::any_subclass(
                    nodes,
                    root,
                    SubclassMask::DirectlyInstantiated,
                    false,
                    |_| true,
                )
        }),
    }
}

/// `hasOnlySubclasses(cls)`: unconditionally true
/// iff `cls` has no foreign subtypes registered at all, independent of
/// instantiation state.
pub(crate) fn has_only_subclasses(class_sets: &ClassSetTable, cls: ClassId) -> bool {
    class_sets
        .get(&cls)
        .is_none_or(|set| set.foreign_subtypes.is_empty())
}
