//! `World`: the façade that owns every index and orchestrates registration
//! and `close()`.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxBuildHasher, FxHashSet};
use tracing::{debug, instrument};

use crate::capabilities::{Backend, ClassFacts, CompilerOptions, CoreClasses, ElementFacts, Reporter, ResolverWorld};
use crate::class_set::{ClassSet, ClassSetTable};
use crate::error::WorldError;
use crate::function_set::FunctionSet;
use crate::hierarchy_node::{self, HierarchyNode, NodeTable};
use crate::ids::{ClassId, ElementId, TypedefId};
use crate::mixin_index::MixinIndex;
use crate::side_effects::SideEffectRegistry;

/// The façade. Single-threaded cooperative: every injected
/// capability is a boxed trait object owned for `World`'s whole lifetime.
pub struct World {
    pub(crate) closed: bool,
    pub(crate) options: CompilerOptions,

    pub(crate) core_classes: Box<dyn CoreClasses>,
    pub(crate) backend: Box<dyn Backend>,
    pub(crate) resolver: Box<dyn ResolverWorld>,
    pub(crate) reporter: Box<dyn Reporter>,
    pub(crate) class_facts: Box<dyn ClassFacts>,
    pub(crate) element_facts: Box<dyn ElementFacts>,

    pub(crate) nodes: NodeTable,
    pub(crate) class_sets: ClassSetTable,
    pub(crate) mixin_index: MixinIndex,
    pub(crate) function_set: FunctionSet,
    pub(crate) side_effects: SideEffectRegistry,
    pub(crate) typedefs: IndexSet<TypedefId, FxBuildHasher>,

    /// Built during `close()`: ancestor → union of the supertypes of every
    /// directly-instantiated descendant.
    pub(crate) types_implemented_by_subclasses: IndexMap<ClassId, FxHashSet<ClassId>, FxBuildHasher>,

    /// Memo for `everySubtypeIsSubclassOfOrMixinUseOf`:
    /// installed on first query, never evicted.
    pub(crate) every_subtype_memo: std::cell::RefCell<rustc_hash::FxHashMap<(ClassId, ClassId), bool>>,

    /// Classes already folded into the closed world by a prior `close()`
    /// call; supports idempotent incremental re-close.
    pub(crate) already_populated: FxHashSet<ClassId>,
}

/// Everything `World::new` needs, bundled the way `tsz-solver`'s
/// `RelationQueryInputs` bundles its injected providers, so construction
/// reads as one call instead of eight positional booleans-and-boxes.
pub struct WorldCapabilities {
    pub core_classes: Box<dyn CoreClasses>,
    pub backend: Box<dyn Backend>,
    pub resolver: Box<dyn ResolverWorld>,
    pub reporter: Box<dyn Reporter>,
    pub class_facts: Box<dyn ClassFacts>,
    pub element_facts: Box<dyn ElementFacts>,
    pub options: CompilerOptions,
}

impl World {
    pub fn new(capabilities: WorldCapabilities) -> Self {
        Self {
            closed: false,
            options: capabilities.options,
            core_classes: capabilities.core_classes,
            backend: capabilities.backend,
            resolver: capabilities.resolver,
            reporter: capabilities.reporter,
            class_facts: capabilities.class_facts,
            element_facts: capabilities.element_facts,
            nodes: NodeTable::default(),
            class_sets: ClassSetTable::default(),
            mixin_index: MixinIndex::default(),
            function_set: FunctionSet::default(),
            side_effects: SideEffectRegistry::default(),
            typedefs: IndexSet::default(),
            types_implemented_by_subclasses: IndexMap::default(),
            every_subtype_memo: std::cell::RefCell::new(rustc_hash::FxHashMap::default()),
            already_populated: FxHashSet::default(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// `false` while incremental compilation is active, even though
    /// `close()` itself remains callable.
    pub fn has_closed_world_assumption(&self) -> bool {
        !self.options.has_incremental_support
    }

    pub(crate) fn assert_closed(&self, what: &str) {
        assert!(self.closed, "{what}: called before the world was closed");
    }

    pub(crate) fn assert_open(&self, what: &str) {
        assert!(!self.closed, "{what}: called after the world was closed");
    }

    /// `registerClass(cls)`: ensures the hierarchy node and class set;
    /// does not mark `cls` instantiated. Canonicalizes `cls` first — a
    /// patch or forwarding `ClassId` must land on the same node as its
    /// declaration.
    pub fn register_class(&mut self, cls: ClassId) {
        self.assert_open("registerClass");
        let cls = self.class_facts.declaration(cls);
        self.ensure_structural(cls);
    }

    /// `registerClosureClass(cls)`: ensures the node and marks it directly
    /// instantiated. Callable post-close — closure classes are synthesized
    /// during IR construction after the class world has already closed.
    pub fn register_closure_class(&mut self, cls: ClassId) {
        let cls = self.class_facts.declaration(cls);
        self.ensure_structural(cls);
        self.mark_directly_instantiated(cls);
    }

    pub fn register_typedef(&mut self, td: TypedefId) {
        self.assert_open("registerTypedef");
        self.typedefs.insert(td);
    }

    /// `registerUsedElement(e)`: added to `FunctionSet` iff
    /// `isInstanceMember && !isAbstract`.
    pub fn register_used_element(&mut self, e: ElementId) {
        self.assert_open("registerUsedElement");
        self.function_set.register(self.element_facts.as_ref(), e);
    }

    /// `registerMixinUse(app, mixin)`: requires `mixin.isDeclaration`.
    pub fn register_mixin_use(&mut self, application: ClassId, mixin: ClassId) {
        self.assert_open("registerMixinUse");
        if !self.class_facts.is_declaration(mixin) {
            self.reporter
                .internal_error(Some(mixin), "registerMixinUse: mixin is not a declaration");
        }
        let application = self.class_facts.declaration(application);
        let mixin = self.class_facts.declaration(mixin);
        self.ensure_structural(application);
        self.ensure_structural(mixin);
        self.mixin_index.register(mixin, application);
    }

    /// `close()`: transitions to the closed phase. Idempotent second calls
    /// fail with `AlreadyClosed`.
    #[instrument(skip(self))]
    pub fn close(&mut self) -> Result<(), WorldError> {
        if self.closed {
            return Err(WorldError::AlreadyClosed);
        }
        debug!("closing world");

        let directly_instantiated = self.resolver.directly_instantiated_classes();
        for cls in directly_instantiated {
            if self.options.has_incremental_support && self.already_populated.contains(&cls) {
                continue;
            }
            if !self.class_facts.is_declaration(cls) || !self.class_facts.is_resolved(cls) {
                self.reporter.internal_error(
                    Some(cls),
                    "close(): directly instantiated class is not a resolved declaration",
                );
            }
            self.ensure_structural(cls);
            self.mark_directly_instantiated(cls);
            self.already_populated.insert(cls);
        }

        let function_class = self.core_classes.function_class();
        let callable_classes: Vec<ClassId> = self
            .nodes
            .keys()
            .copied()
            .filter(|&c| self.class_facts.has_call_type(c))
            .collect();
        for cls in callable_classes {
            self.class_sets
                .entry(function_class)
                .or_insert_with(|| ClassSet::for_class(function_class))
                .add_subtype(cls);
        }

        self.closed = true;
        Ok(())
    }

    /// Shared by `close()` step 1 and `registerClosureClass`.
    fn mark_directly_instantiated(&mut self, cls: ClassId) {
        if let Some(node) = self.nodes.get_mut(&cls) {
            if node.directly_instantiated {
                return;
            }
            node.directly_instantiated = true;
        }

        let supertypes: FxHashSet<ClassId> = self
            .class_facts
            .all_supertypes(cls)
            .into_iter()
            .map(|edge| edge.class)
            .collect();

        let mut ancestor = self.nodes.get(&cls).and_then(|n| n.parent);
        while let Some(a) = ancestor {
            self.types_implemented_by_subclasses
                .entry(a)
                .or_default()
                .extend(supertypes.iter().copied());
            if let Some(node) = self.nodes.get_mut(&a) {
                node.indirectly_instantiated_count += 1;
            }
            ancestor = self.nodes.get(&a).and_then(|n| n.parent);
        }
    }

    fn ensure_structural(&mut self, cls: ClassId) {
        let facts = &*self.class_facts;
        hierarchy_node::ensure_node(&mut self.nodes, cls, &|c| facts.superclass(c));
        self.class_sets
            .entry(cls)
            .or_insert_with(|| ClassSet::for_class(cls));

        let mut ancestors: FxHashSet<ClassId> = FxHashSet::default();
        let mut cur = facts.superclass(cls);
        while let Some(a) = cur {
            ancestors.insert(a);
            cur = facts.superclass(a);
        }

        let own_supertypes = facts.all_supertypes(cls);
        let superclass_supertypes: FxHashSet<ClassId> = facts
            .superclass(cls)
            .map(|sc| facts.all_supertypes(sc).into_iter().map(|e| e.class).collect())
            .unwrap_or_default();

        for edge in &own_supertypes {
            let s = edge.class;
            if s == cls || ancestors.contains(&s) || superclass_supertypes.contains(&s) {
                continue;
            }
            hierarchy_node::ensure_node(&mut self.nodes, s, &|c| facts.superclass(c));
            self.class_sets
                .entry(s)
                .or_insert_with(|| ClassSet::for_class(s));
            self.class_sets.get_mut(&s).expect("just ensured").add_subtype(cls);
        }
    }

    /// Exposed so driver debug tooling can use it outside this crate's own
    /// test binary, even though most callers only need it in tests.
    pub fn get_class_hierarchy_node(&self, cls: ClassId) -> Option<&HierarchyNode> {
        let cls = self.class_facts.declaration(cls);
        self.nodes.get(&cls)
    }

    pub fn get_class_set(&self, cls: ClassId) -> Option<&ClassSet> {
        let cls = self.class_facts.declaration(cls);
        self.class_sets.get(&cls)
    }

    pub fn all_typedefs(&self) -> impl Iterator<Item = TypedefId> + '_ {
        self.typedefs.iter().copied()
    }
}
