//! The subclass tree: one [`HierarchyNode`] per registered
//! class, linked by parent pointers, with deterministic child ordering.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

use crate::ids::ClassId;

/// `nodes` is keyed by `ClassId` in registration order so that whole-world
/// scans (`dump`, "all instantiated classes") are deterministic without a
/// separate ordering pass.
pub(crate) type NodeTable = IndexMap<ClassId, HierarchyNode, FxBuildHasher>;

/// The mask predicate a traversal filters on: currently a single value,
/// `DirectlyInstantiated`, alongside the unfiltered `All` walk used
/// internally by `dump`/`subtypesOf`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SubclassMask {
    All,
    DirectlyInstantiated,
}

impl SubclassMask {
    fn matches(self, node: &HierarchyNode) -> bool {
        match self {
            Self::All => true,
            Self::DirectlyInstantiated => node.directly_instantiated,
        }
    }
}

/// Control value returned from a traversal callback.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WalkControl {
    Continue,
    /// Prune this node's children, but keep visiting its siblings.
    SkipSubclasses,
    /// Abort the whole walk immediately.
    Stop,
}

/// One node in the subclass tree.
#[derive(Clone, Debug)]
pub struct HierarchyNode {
    pub cls: ClassId,
    pub parent: Option<ClassId>,
    pub depth: u32,
    pub directly_instantiated: bool,
    /// Number of strict descendants that are directly instantiated.
    pub indirectly_instantiated_count: u32,
    /// Insertion order preserved — part of the observable contract.
    pub children: SmallVec<[ClassId; 4]>,
}

impl HierarchyNode {
    fn root(cls: ClassId) -> Self {
        Self {
            cls,
            parent: None,
            depth: 0,
            directly_instantiated: false,
            indirectly_instantiated_count: 0,
            children: SmallVec::new(),
        }
    }

    fn child_of(cls: ClassId, parent: ClassId, depth: u32) -> Self {
        Self {
            cls,
            parent: Some(parent),
            depth,
            directly_instantiated: false,
            indirectly_instantiated_count: 0,
            children: SmallVec::new(),
        }
    }

    /// `isInstantiated = directlyInstantiated || indirectlyInstantiatedCount > 0`.
    pub fn is_instantiated(&self) -> bool {
        self.directly_instantiated || self.indirectly_instantiated_count > 0
    }

    pub fn is_indirectly_instantiated(&self) -> bool {
        self.indirectly_instantiated_count > 0
    }
}

/// `ensureNode(cls)`: recursive, ensures the parent first so
/// every node's ancestor chain up to the root always exists (invariant I2).
/// `superclass_of` is a callback rather than a capability trait so this
/// module stays free of any dependency on `ClassFacts`'s object safety.
pub(crate) fn ensure_node(
    nodes: &mut NodeTable,
    cls: ClassId,
    superclass_of: &dyn Fn(ClassId) -> Option<ClassId>,
) {
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
        if nodes.contains_key(&cls) {
            return;
        }
        match superclass_of(cls) {
            None => {
                nodes.insert(cls, HierarchyNode::root(cls));
            }
            Some(parent) => {
                ensure_node(nodes, parent, superclass_of);
                let depth = nodes.get(&parent).expect("just ensured").depth + 1;
                nodes.insert(cls, HierarchyNode::child_of(cls, parent, depth));
                nodes
                    .get_mut(&parent)
                    .expect("just ensured")
                    .children
                    .push(cls);
            }
        }
    })
}

fn walk(
    nodes: &NodeTable,
    root: ClassId,
    mask: SubclassMask,
    strict: bool,
    f: &mut dyn FnMut(ClassId) -> WalkControl,
) -> WalkControl {
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
        let Some(node) = nodes.get(&root) else {
            return WalkControl::Continue;
        };
        let visit_self = !strict;
        if visit_self && mask.matches(node) {
            match f(root) {
                WalkControl::Continue => {}
                WalkControl::SkipSubclasses => return WalkControl::Continue,
                WalkControl::Stop => return WalkControl::Stop,
            }
        }
        for &child in &node.children {
            match walk(nodes, child, mask, false, f) {
                WalkControl::Continue | WalkControl::SkipSubclasses => {}
                WalkControl::Stop => return WalkControl::Stop,
            }
        }
        WalkControl::Continue
    })
}

/// `forEachSubclass(f, mask, strict)`: pre-order traversal
/// over the child list, honoring `SkipSubclasses`/`Stop` control values.
pub(crate) fn for_each_subclass(
    nodes: &NodeTable,
    root: ClassId,
    mask: SubclassMask,
    strict: bool,
    f: &mut dyn FnMut(ClassId) -> WalkControl,
) {
    walk(nodes, root, mask, strict, f);
}

/// Lazy in spirit (it stops at the first match) but materialized eagerly
/// here since Rust has no free-floating generator equivalent to the
/// source's "lazy, finite, non-restartable sequence" without an iterator
/// adapter; callers that want incremental consumption use
/// `for_each_subclass` with `Stop` directly.
pub(crate) fn subclasses_by_mask(
    nodes: &NodeTable,
    root: ClassId,
    mask: SubclassMask,
    strict: bool,
) -> Vec<ClassId> {
    let mut out = Vec::new();
    for_each_subclass(nodes, root, mask, strict, &mut |cls| {
        out.push(cls);
        WalkControl::Continue
    });
    out
}

pub(crate) fn any_subclass(
    nodes: &NodeTable,
    root: ClassId,
    mask: SubclassMask,
    strict: bool,
    mut predicate: impl FnMut(ClassId) -> bool,
) -> bool {
    let mut found = false;
    for_each_subclass(nodes, root, mask, strict, &mut |cls| {
        if predicate(cls) {
            found = true;
            WalkControl::Stop
        } else {
            WalkControl::Continue
        }
    });
    found
}

/// `getLubOfInstantiatedSubclasses()`: walk down from
/// `root` following the unique child that dominates all instantiated
/// descendants; stop at the first split or at a directly-instantiated
/// node. Returns `None` if no descendant of `root` is instantiated.
pub(crate) fn lub_of_instantiated_subclasses(nodes: &NodeTable, root: ClassId) -> Option<ClassId> {
    let mut current = root;
    loop {
        let node = nodes.get(&current)?;
        if node.directly_instantiated {
            return Some(current);
        }
        if !node.is_instantiated() {
            return None;
        }
        let instantiated_children: SmallVec<[ClassId; 2]> = node
            .children
            .iter()
            .copied()
            .filter(|&c| nodes.get(&c).is_some_and(HierarchyNode::is_instantiated))
            .collect();
        match instantiated_children.as_slice() {
            [only] => current = *only,
            _ => return Some(current),
        }
    }
}
