//! Mixin-use index: maps each mixin class to the
//! applications that use it, and derives the *live* projection lazily.

use std::cell::RefCell;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use tracing::trace;

use crate::capabilities::ClassFacts;
use crate::hierarchy_node::{HierarchyNode, NodeTable};
use crate::ids::ClassId;

type UsesTable = IndexMap<ClassId, SmallVec<[ClassId; 2]>, FxBuildHasher>;

/// `allMixinUsesOf` / `mixinUsesOf`'s backing store. The live projection is
/// computed once, lazily, at first access after close and
/// cached in `live_cache`; this is the same lazy-compute-behind-interior-
/// mutability shape `tsz-binder` uses for its import/export resolution
/// caches (`ExportCacheStorage`/`IdentifierCacheStorage`, both
/// lock-wrapped maps populated on first query).
#[derive(Default)]
pub(crate) struct MixinIndex {
    uses: UsesTable,
    live_cache: RefCell<Option<UsesTable>>,
}

impl MixinIndex {
    /// `registerMixinUse(app, mixin)`: requires `mixin.isDeclaration`
    /// (enforced by the caller, `World::register_mixin_use`).
    pub(crate) fn register(&mut self, mixin: ClassId, application: ClassId) {
        self.uses.entry(mixin).or_default().push(application);
        *self.live_cache.borrow_mut() = None;
    }

    /// `allMixinUsesOf(mixin)`: direct lookup, including non-live
    /// applications.
    pub(crate) fn all_uses_of(&self, mixin: ClassId) -> &[ClassId] {
        self.uses.get(&mixin).map_or(&[], SmallVec::as_slice)
    }

    /// `mixinUsesOf(mixin)`: the live projection, computed once per close
    /// and cached. An application `a` of mixin `m` is live iff it is
    /// instantiated; if `a` is itself a *named* mixin application, the
    /// rule is applied transitively — any application that mixes `a` is
    /// examined too, since `class C = S with M` is equivalent to directly
    /// mixing `M`.
    pub(crate) fn uses_of(&self, nodes: &NodeTable, facts: &dyn ClassFacts, mixin: ClassId) -> SmallVec<[ClassId; 2]> {
        if self.live_cache.borrow().is_none() {
            trace!("computing live mixin-use projection");
            let mut computed = UsesTable::default();
            for &m in self.uses.keys() {
                let live = self.live_uses_of_uncached(nodes, facts, m);
                if !live.is_empty() {
                    computed.insert(m, live);
                }
            }
            *self.live_cache.borrow_mut() = Some(computed);
        }
        self.live_cache
            .borrow()
            .as_ref()
            .and_then(|cache| cache.get(&mixin).cloned())
            .unwrap_or_default()
    }

    fn live_uses_of_uncached(
        &self,
        nodes: &NodeTable,
        facts: &dyn ClassFacts,
        mixin: ClassId,
    ) -> SmallVec<[ClassId; 2]> {
        let mut result = SmallVec::new();
        let mut frontier: Vec<ClassId> = self.all_uses_of(mixin).to_vec();
        let mut seen: SmallVec<[ClassId; 4]> = SmallVec::new();
        while let Some(application) = frontier.pop() {
            if seen.contains(&application) {
                continue;
            }
            seen.push(application);
            let is_live = nodes
                .get(&application)
                .is_some_and(HierarchyNode::is_instantiated);
            if is_live {
                result.push(application);
            }
            if facts.is_named_mixin_application(application) {
                frontier.extend(self.all_uses_of(application).iter().copied());
            }
        }
        result
    }

    /// `isSubclassOfMixinUseOf(cls, mixin)`: walk `cls` and its
    /// superclasses, canonicalizing to declarations; true as soon as a
    /// class in the chain is a mixin application whose mixin canonicalizes
    /// to `mixin`.
    pub(crate) fn is_subclass_of_mixin_use_of(
        &self,
        nodes: &NodeTable,
        facts: &dyn ClassFacts,
        cls: ClassId,
        mixin: ClassId,
    ) -> bool {
        let mixin_decl = facts.declaration(mixin);
        let mut current = Some(cls);
        while let Some(c) = current {
            let decl = facts.declaration(c);
            if facts.is_mixin_application(decl)
                && facts
                    .mixin_of(decl)
                    .map(|m| facts.declaration(m))
                    == Some(mixin_decl)
            {
                return true;
            }
            current = nodes.get(&c).and_then(|n| n.parent);
        }
        false
    }

    /// `hasAnySubclassThatMixes(superclass, mixin)`: for each application
    /// of `mixin`, test `isSubclassOf(app, superclass)` — deliberately
    /// without special-casing `superclass` itself even when instantiated.
    pub(crate) fn has_any_subclass_that_mixes(
        &self,
        is_subclass_of: &dyn Fn(ClassId, ClassId) -> bool,
        superclass: ClassId,
        mixin: ClassId,
    ) -> bool {
        self.all_uses_of(mixin)
            .iter()
            .any(|&app| is_subclass_of(app, superclass))
    }
}
