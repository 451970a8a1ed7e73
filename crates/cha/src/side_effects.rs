//! `SideEffectRegistry`: element → side-effects map plus the
//! `cannotThrow`/`calledInLoop`/`mightBePassedToApply` predicate sets. All
//! of these remain writable after `close()` — they are refined during type
//! inference, which runs after the class world closes.

use rustc_hash::FxHashSet;
use rustc_hash::FxHashMap;

use crate::capabilities::{ElementFacts, ResolverWorld};
use crate::ids::ElementId;

bitflags::bitflags! {
    /// A fixed bitset with monotone union semantics.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct SideEffects: u8 {
        const CHANGES_INSTANCE_PROPERTY = 1 << 0;
        const CHANGES_STATIC_PROPERTY = 1 << 1;
        const CHANGES_INDEX = 1 << 2;
        const DEPENDS_ON_INSTANCE_PROPERTY_STORE = 1 << 3;
        const DEPENDS_ON_STATIC_PROPERTY_STORE = 1 << 4;
        const DEPENDS_ON_INDEX_STORE = 1 << 5;
    }
}

#[derive(Default)]
pub(crate) struct SideEffectRegistry {
    effects: FxHashMap<ElementId, SideEffects>,
    side_effects_free: FxHashSet<ElementId>,
    cannot_throw: FxHashSet<ElementId>,
    called_in_loop: FxHashSet<ElementId>,
    might_be_passed_to_apply: FxHashSet<ElementId>,
}

impl SideEffectRegistry {
    /// `registerSideEffects(e, eff)`: a no-op once `e` has been proven
    /// side-effects-free — that status is pinned, not overwritten.
    pub(crate) fn register_side_effects(&mut self, facts: &dyn ElementFacts, e: ElementId, eff: SideEffects) {
        let decl = facts.declaration(e);
        if self.side_effects_free.contains(&decl) {
            return;
        }
        self.effects
            .entry(decl)
            .and_modify(|existing| *existing |= eff)
            .or_insert(eff);
    }

    pub(crate) fn register_side_effects_free(&mut self, facts: &dyn ElementFacts, e: ElementId) {
        let decl = facts.declaration(e);
        self.effects.insert(decl, SideEffects::empty());
        self.side_effects_free.insert(decl);
    }

    /// `getSideEffectsOfElement(e)`: installs and returns a fresh `empty`
    /// default if nothing has been recorded yet, so later callers observe
    /// a consistent value. Asserts `e` is neither a generative constructor
    /// body nor a field — both violate this registry's model.
    pub(crate) fn get_side_effects_of_element(&mut self, facts: &dyn ElementFacts, e: ElementId) -> SideEffects {
        assert!(
            !facts.is_generative_constructor_body(e),
            "generative constructor bodies are not modeled by the side-effect registry"
        );
        assert!(
            !facts.is_field(e),
            "fields are not modeled by the side-effect registry; query fieldNeverChanges instead"
        );
        let decl = facts.declaration(e);
        *self.effects.entry(decl).or_insert_with(SideEffects::empty)
    }

    pub(crate) fn register_cannot_throw(&mut self, facts: &dyn ElementFacts, e: ElementId) {
        self.cannot_throw.insert(facts.declaration(e));
    }

    pub(crate) fn get_cannot_throw(&self, facts: &dyn ElementFacts, e: ElementId) -> bool {
        self.cannot_throw.contains(&facts.declaration(e))
    }

    pub(crate) fn add_function_called_in_loop(&mut self, facts: &dyn ElementFacts, e: ElementId) {
        self.called_in_loop.insert(facts.declaration(e));
    }

    pub(crate) fn is_called_in_loop(&self, facts: &dyn ElementFacts, e: ElementId) -> bool {
        self.called_in_loop.contains(&facts.declaration(e))
    }

    pub(crate) fn register_might_be_passed_to_apply(&mut self, facts: &dyn ElementFacts, e: ElementId) {
        self.might_be_passed_to_apply.insert(facts.declaration(e));
    }

    /// If `e` is a synthesized closure call-method, forwards to its
    /// originating expression element.
    pub(crate) fn get_might_be_passed_to_apply(&self, facts: &dyn ElementFacts, e: ElementId) -> bool {
        let target = if facts.is_synthesized_closure_call_method(e) {
            facts.originating_closure_expression(e).unwrap_or(e)
        } else {
            e
        };
        self.might_be_passed_to_apply
            .contains(&facts.declaration(target))
    }

    /// `fieldNeverChanges(e)`: `false` unless `e.isField`.
    /// Native fields are always `false` (they may alias changing host
    /// state). `isFinal || isConst` is always `true`. Otherwise, for
    /// instance members: `true` iff the resolver has not seen a setter
    /// invocation *and* has not recorded a field-setter for `e`.
    pub(crate) fn field_never_changes(
        &self,
        facts: &dyn ElementFacts,
        resolver: &dyn ResolverWorld,
        is_native: bool,
        e: ElementId,
    ) -> bool {
        if !facts.is_field(e) {
            return false;
        }
        if is_native {
            return false;
        }
        if facts.is_final(e) || facts.is_const(e) {
            return true;
        }
        if !facts.is_instance_member(e) {
            return false;
        }
        let decl = facts.declaration(e);
        if resolver.has_invoked_setter(e) {
            return false;
        }
        !resolver.field_setters().iter().any(|&s| facts.declaration(s) == decl)
    }
}
