//! Closed-world queries. Every
//! query here requires the world to already be closed.

use std::fmt::Write as _;

use rustc_hash::FxHashSet;

use crate::capabilities::{SupertypeEdge, TypeMask};
use crate::class_set::{self, ClassSet};
use crate::hierarchy_node::{self, HierarchyNode, SubclassMask};
use crate::ids::{CallKind, ClassId, ElementId, Selector};
use crate::side_effects::SideEffects;
use crate::world::World;

/// Result of `extendMaskIfReachesAll`: either the mask is narrow enough to
/// stay as-is, or it must be treated as the dynamic top. The engine never
/// constructs a top mask itself — this marks that the caller should use one.
pub enum MaskOrTop<'a> {
    Mask(&'a dyn TypeMask),
    DynamicTop,
}

/// Passed to `FunctionSet::filter` when the caller wants every match
/// regardless of receiver class (used by `elements_for_selector`).
struct UnfilteredMask;

impl TypeMask for UnfilteredMask {
    fn contains_class(&self, _cls: ClassId) -> bool {
        true
    }
    fn locate_single_element(&self, _selector: &Selector, _world: &World) -> Option<ElementId> {
        None
    }
    fn needs_no_such_method_handling(&self, _selector: &Selector, _world: &World) -> bool {
        false
    }
}

impl World {
    /// `isSubclassOf(a, b)`: reflexive — `a` is `b` itself or reachable by
    /// walking `a`'s superclass chain.
    pub fn is_subclass_of(&self, a: ClassId, b: ClassId) -> bool {
        self.assert_closed("isSubclassOf");
        let a = self.class_facts.declaration(a);
        let b = self.class_facts.declaration(b);
        let mut current = Some(a);
        while let Some(c) = current {
            if c == b {
                return true;
            }
            current = self.nodes.get(&c).and_then(|n| n.parent);
        }
        false
    }

    /// `isSubtypeOf(a, b)`: reflexive membership in `b`'s `ClassSet`
    /// (subclass tree plus foreign subtype roots, which already include any
    /// class implicitly implementing `Function` after `close()`'s step 2).
    pub fn is_subtype_of(&self, a: ClassId, b: ClassId) -> bool {
        self.assert_closed("isSubtypeOf");
        let a = self.class_facts.declaration(a);
        let b = self.class_facts.declaration(b);
        class_set::any_subtype(&self.nodes, &self.class_sets, b, SubclassMask::All, false, |c| c == a)
    }

    pub fn subclasses_of(&self, cls: ClassId) -> Vec<ClassId> {
        self.assert_closed("subclassesOf");
        let cls = self.class_facts.declaration(cls);
        hierarchy_node::subclasses_by_mask(&self.nodes, cls, SubclassMask::All, false)
    }

    pub fn strict_subclasses_of(&self, cls: ClassId) -> Vec<ClassId> {
        self.assert_closed("strictSubclassesOf");
        let cls = self.class_facts.declaration(cls);
        hierarchy_node::subclasses_by_mask(&self.nodes, cls, SubclassMask::All, true)
    }

    pub fn subtypes_of(&self, cls: ClassId) -> Vec<ClassId> {
        self.assert_closed("subtypesOf");
        let cls = self.class_facts.declaration(cls);
        class_set::subtypes_by_mask(&self.nodes, &self.class_sets, cls, SubclassMask::All, false)
    }

    pub fn strict_subtypes_of(&self, cls: ClassId) -> Vec<ClassId> {
        self.assert_closed("strictSubtypesOf");
        let cls = self.class_facts.declaration(cls);
        class_set::subtypes_by_mask(&self.nodes, &self.class_sets, cls, SubclassMask::All, true)
    }

    /// `haveAnyCommonSubtypes(a, b)`: non-empty intersection of `subtypesOf`.
    pub fn have_any_common_subtypes(&self, a: ClassId, b: ClassId) -> bool {
        self.assert_closed("haveAnyCommonSubtypes");
        let a = self.class_facts.declaration(a);
        let b = self.class_facts.declaration(b);
        let a_subtypes: FxHashSet<ClassId> = self.subtypes_of(a).into_iter().collect();
        class_set::any_subtype(&self.nodes, &self.class_sets, b, SubclassMask::All, false, |c| {
            a_subtypes.contains(&c)
        })
    }

    /// `commonSupertypesOf(a, b)`: starting from `a`'s own ordered supertype
    /// chain at `min(hierarchyDepth(a), hierarchyDepth(b))`, walk upward
    /// toward `Object`, accepting each candidate ancestor that also appears
    /// in `b`'s supertype set. Emitted in that walk order, terminating with
    /// `Object`.
    pub fn common_supertypes_of(&self, a: ClassId, b: ClassId) -> Vec<ClassId> {
        self.assert_closed("commonSupertypesOf");
        let a = self.class_facts.declaration(a);
        let b = self.class_facts.declaration(b);

        let depth_a = self.class_facts.hierarchy_depth(a);
        let depth_b = self.class_facts.hierarchy_depth(b);
        let limit = depth_a.min(depth_b);

        let mut a_chain = self.class_facts.all_supertypes(a);
        a_chain.push(SupertypeEdge { class: a, depth: depth_a });
        a_chain.retain(|edge| edge.depth <= limit);
        a_chain.sort_by(|x, y| y.depth.cmp(&x.depth));

        let b_supertypes: FxHashSet<ClassId> = self
            .class_facts
            .all_supertypes(b)
            .into_iter()
            .map(|edge| edge.class)
            .chain(std::iter::once(b))
            .collect();

        a_chain
            .into_iter()
            .map(|edge| edge.class)
            .filter(|c| b_supertypes.contains(c))
            .collect()
    }

    /// `everySubtypeIsSubclassOfOrMixinUseOf(cls, other)`: every subtype of
    /// `cls` is either a subclass of `other` or a subclass of some use of
    /// `other` as a mixin. Memoized per `(cls, other)` pair — never evicted,
    /// the world is frozen once closed.
    pub fn every_subtype_is_subclass_of_or_mixin_use_of(&self, cls: ClassId, other: ClassId) -> bool {
        self.assert_closed("everySubtypeIsSubclassOfOrMixinUseOf");
        let cls = self.class_facts.declaration(cls);
        let other = self.class_facts.declaration(other);
        if let Some(&cached) = self.every_subtype_memo.borrow().get(&(cls, other)) {
            return cached;
        }
        let result = self.subtypes_of(cls).into_iter().all(|s| {
            self.is_subclass_of(s, other)
                || self
                    .mixin_index
                    .is_subclass_of_mixin_use_of(&self.nodes, self.class_facts.as_ref(), s, other)
        });
        self.every_subtype_memo.borrow_mut().insert((cls, other), result);
        result
    }

    /// `hasAnySubclassThatImplements(cls, iface)`: reads the union built
    /// during `close()` step 1.d, not a fresh traversal.
    pub fn has_any_subclass_that_implements(&self, cls: ClassId, iface: ClassId) -> bool {
        self.assert_closed("hasAnySubclassThatImplements");
        let cls = self.class_facts.declaration(cls);
        let iface = self.class_facts.declaration(iface);
        self.types_implemented_by_subclasses
            .get(&cls)
            .is_some_and(|set| set.contains(&iface))
    }

    /// `hasAnySubclassThatMixes(superclass, mixin)`.
    pub fn has_any_subclass_that_mixes(&self, superclass: ClassId, mixin: ClassId) -> bool {
        self.assert_closed("hasAnySubclassThatMixes");
        let superclass = self.class_facts.declaration(superclass);
        let mixin = self.class_facts.declaration(mixin);
        self.mixin_index
            .has_any_subclass_that_mixes(&|a, b| self.is_subclass_of(a, b), superclass, mixin)
    }

    pub fn all_mixin_uses_of(&self, mixin: ClassId) -> Vec<ClassId> {
        self.assert_closed("allMixinUsesOf");
        let mixin = self.class_facts.declaration(mixin);
        self.mixin_index.all_uses_of(mixin).to_vec()
    }

    pub fn mixin_uses_of(&self, mixin: ClassId) -> Vec<ClassId> {
        self.assert_closed("mixinUsesOf");
        let mixin = self.class_facts.declaration(mixin);
        self.mixin_index
            .uses_of(&self.nodes, self.class_facts.as_ref(), mixin)
            .to_vec()
    }

    /// `locateSingleElement(selector, mask)`: delegates to the injected
    /// `TypeMask`, which is the only party that knows how to resolve a
    /// selector against its own receiver-class domain.
    pub fn locate_single_element(&self, selector: &Selector, mask: &dyn TypeMask) -> Option<ElementId> {
        self.assert_closed("locateSingleElement");
        mask.locate_single_element(selector, self)
    }

    /// Elements registered under `selector`'s `(name, arity)`, unfiltered by
    /// receiver class, paired with each element's owner class. A `TypeMask`
    /// implementation combines this with its own `contains_class` to
    /// resolve `locate_single_element` / `needs_no_such_method_handling`
    /// without needing access to `FunctionSet` itself, which stays
    /// crate-private.
    pub fn elements_for_selector(&self, selector: &Selector) -> Vec<(ElementId, ClassId)> {
        self.assert_closed("elements_for_selector");
        self.function_set
            .filter(self.element_facts.as_ref(), selector, &UnfilteredMask)
            .map(|e| (e, self.element_facts.owner_class(e)))
            .collect()
    }

    /// `locateSingleField(selector, mask)`: like `locateSingleElement`, but
    /// narrowed to `FunctionSet` members that are fields.
    pub fn locate_single_field(&self, selector: &Selector, mask: &dyn TypeMask) -> Option<ElementId> {
        self.assert_closed("locateSingleField");
        let mut matches = self
            .function_set
            .filter(self.element_facts.as_ref(), selector, mask)
            .filter(|&e| self.element_facts.is_field(e));
        let first = matches.next()?;
        if matches.next().is_some() {
            None
        } else {
            Some(first)
        }
    }

    /// `extendMaskIfReachesAll(selector, mask)`: only meaningful under
    /// `enabled_invoke_on`. If `mask.needsNoSuchMethodHandling(selector,
    /// world)`, the mask must be broadened to the dynamic top, since a
    /// `noSuchMethod` receiver outside `mask` could still answer `selector`;
    /// otherwise `mask` is returned unchanged. A `None` mask is itself
    /// already the dynamic top.
    pub fn extend_mask_if_reaches_all<'a>(&self, selector: &Selector, mask: Option<&'a dyn TypeMask>) -> MaskOrTop<'a> {
        self.assert_closed("extendMaskIfReachesAll");
        let Some(mask) = mask else {
            return MaskOrTop::DynamicTop;
        };
        if self.options.enabled_invoke_on && mask.needs_no_such_method_handling(selector, self) {
            MaskOrTop::DynamicTop
        } else {
            MaskOrTop::Mask(mask)
        }
    }

    /// `getSideEffectsOfSelector(selector, mask)`: `closureCall` selectors
    /// return `empty` immediately. Otherwise unions, across every live
    /// member `selector` could dispatch to within `mask`: for a field, a
    /// getter depends on the instance-property store (unless
    /// `fieldNeverChanges`), a setter changes the instance property, and a
    /// call selector sets every effect and every depends-on; for a non-field
    /// member, `getSideEffectsOfElement`.
    pub fn get_side_effects_of_selector(&mut self, selector: &Selector, mask: &dyn TypeMask) -> SideEffects {
        assert!(self.closed, "getSideEffectsOfSelector: called before the world was closed");
        if selector.kind == CallKind::ClosureCall {
            return SideEffects::empty();
        }
        let matches: Vec<ElementId> = self
            .function_set
            .filter(self.element_facts.as_ref(), selector, mask)
            .collect();
        let mut acc = SideEffects::empty();
        for e in matches {
            if self.element_facts.is_field(e) {
                acc |= match selector.kind {
                    CallKind::Getter if self.field_never_changes(e) => SideEffects::empty(),
                    CallKind::Getter => SideEffects::DEPENDS_ON_INSTANCE_PROPERTY_STORE,
                    CallKind::Setter => SideEffects::CHANGES_INSTANCE_PROPERTY,
                    CallKind::Call => SideEffects::all(),
                    CallKind::ClosureCall => unreachable!("closureCall selectors return above"),
                };
            } else {
                acc |= self.side_effects.get_side_effects_of_element(self.element_facts.as_ref(), e);
            }
        }
        acc
    }

    pub fn register_side_effects(&mut self, e: ElementId, eff: SideEffects) {
        self.side_effects.register_side_effects(self.element_facts.as_ref(), e, eff);
    }

    pub fn register_side_effects_free(&mut self, e: ElementId) {
        self.side_effects.register_side_effects_free(self.element_facts.as_ref(), e);
    }

    pub fn register_cannot_throw(&mut self, e: ElementId) {
        self.side_effects.register_cannot_throw(self.element_facts.as_ref(), e);
    }

    pub fn get_cannot_throw(&self, e: ElementId) -> bool {
        self.side_effects.get_cannot_throw(self.element_facts.as_ref(), e)
    }

    pub fn add_function_called_in_loop(&mut self, e: ElementId) {
        self.side_effects.add_function_called_in_loop(self.element_facts.as_ref(), e);
    }

    pub fn is_called_in_loop(&self, e: ElementId) -> bool {
        self.side_effects.is_called_in_loop(self.element_facts.as_ref(), e)
    }

    pub fn register_might_be_passed_to_apply(&mut self, e: ElementId) {
        self.side_effects
            .register_might_be_passed_to_apply(self.element_facts.as_ref(), e);
    }

    pub fn get_might_be_passed_to_apply(&self, e: ElementId) -> bool {
        self.side_effects
            .get_might_be_passed_to_apply(self.element_facts.as_ref(), e)
    }

    pub fn field_never_changes(&self, e: ElementId) -> bool {
        let is_native = self.backend.is_native(e);
        self.side_effects
            .field_never_changes(self.element_facts.as_ref(), self.resolver.as_ref(), is_native, e)
    }

    // ---- Supplemental queries ----

    pub fn is_indirectly_instantiated(&self, cls: ClassId) -> bool {
        self.assert_closed("isIndirectlyInstantiated");
        let cls = self.class_facts.declaration(cls);
        self.nodes.get(&cls).is_some_and(HierarchyNode::is_indirectly_instantiated)
    }

    pub fn strict_subclass_count(&self, cls: ClassId) -> usize {
        self.strict_subclasses_of(cls).len()
    }

    pub fn strict_subtype_count(&self, cls: ClassId) -> usize {
        self.strict_subtypes_of(cls).len()
    }

    pub fn has_any_strict_subtype(&self, cls: ClassId) -> bool {
        self.assert_closed("hasAnyStrictSubtype");
        let cls = self.class_facts.declaration(cls);
        class_set::any_subtype(&self.nodes, &self.class_sets, cls, SubclassMask::All, true, |_| true)
    }

    pub fn has_only_subclasses(&self, cls: ClassId) -> bool {
        self.assert_closed("hasOnlySubclasses");
        let cls = self.class_facts.declaration(cls);
        class_set::has_only_subclasses(&self.class_sets, cls)
    }

    pub fn has_only_instantiated_subclasses(&self, cls: ClassId) -> bool {
        self.assert_closed("hasOnlyInstantiatedSubclasses");
        let cls = self.class_facts.declaration(cls);
        class_set::has_only_instantiated_subclasses(&self.class_sets, &self.nodes, cls)
    }

    pub fn instantiated_subtype_count(&self, cls: ClassId) -> usize {
        self.assert_closed("instantiatedSubtypeCount");
        let cls = self.class_facts.declaration(cls);
        class_set::instantiated_subtype_count(&self.nodes, &self.class_sets, cls)
    }

    pub fn get_lub_of_instantiated_subclasses(&self, cls: ClassId) -> Option<ClassId> {
        self.assert_closed("getLubOfInstantiatedSubclasses");
        let cls = self.class_facts.declaration(cls);
        hierarchy_node::lub_of_instantiated_subclasses(&self.nodes, cls)
    }

    pub fn get_lub_of_instantiated_subtypes(&self, cls: ClassId) -> Option<ClassId> {
        self.assert_closed("getLubOfInstantiatedSubtypes");
        let cls = self.class_facts.declaration(cls);
        class_set::lub_of_instantiated_subtypes(&self.nodes, &self.class_sets, cls)
    }

    /// `dump(cls)`: a human-readable snapshot of the subclass tree rooted
    /// at `cls`, or the whole forest when `cls` is `None`. Intended for
    /// debug tooling and snapshot tests, not a stable
    /// wire format.
    pub fn dump(&self, cls: Option<ClassId>) -> String {
        let mut out = String::new();
        match cls.map(|c| self.class_facts.declaration(c)) {
            Some(root) => self.dump_node(&mut out, root, 0),
            None => {
                let roots: Vec<ClassId> = self
                    .nodes
                    .iter()
                    .filter(|(_, n)| n.parent.is_none())
                    .map(|(&c, _)| c)
                    .collect();
                for root in roots {
                    self.dump_node(&mut out, root, 0);
                }
            }
        }
        out
    }

    fn dump_node(&self, out: &mut String, cls: ClassId, depth: usize) {
        let Some(node) = self.nodes.get(&cls) else {
            return;
        };
        let marker = if node.directly_instantiated { "*" } else { "" };
        let _ = writeln!(
            out,
            "{:indent$}{cls:?}{marker} (indirect={})",
            "",
            node.indirectly_instantiated_count,
            indent = depth * 2,
        );
        for &child in &node.children {
            self.dump_node(out, child, depth + 1);
        }
        if let Some(ClassSet { foreign_subtypes, .. }) = self.class_sets.get(&cls) {
            for &foreign in foreign_subtypes {
                self.dump_node(out, foreign, depth + 1);
            }
        }
    }
}
