//! `FunctionSet`: maps `(selector-name, arity-shape)` to
//! the set of live instance members that could respond, filterable by
//! receiver mask.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::capabilities::{ElementFacts, TypeMask};
use crate::ids::{ArityShape, ElementId, Selector};

#[derive(Default)]
pub(crate) struct FunctionSet {
    by_key: FxHashMap<(String, ArityShape), SmallVec<[ElementId; 2]>>,
}

impl FunctionSet {
    /// `registerUsedElement(e)`: only `isInstanceMember && !isAbstract`
    /// elements are added.
    pub(crate) fn register(&mut self, facts: &dyn ElementFacts, e: ElementId) {
        if !facts.is_instance_member(e) || facts.is_abstract(e) {
            return;
        }
        let key = facts.selector_key(e);
        let bucket = self.by_key.entry(key).or_default();
        if !bucket.contains(&e) {
            bucket.push(e);
        }
    }

    /// Elements registered under `selector`'s `(name, arity)`, restricted
    /// to those whose owning class is in `mask`.
    pub(crate) fn filter<'a>(
        &'a self,
        facts: &'a dyn ElementFacts,
        selector: &Selector,
        mask: &'a dyn TypeMask,
    ) -> impl Iterator<Item = ElementId> + 'a {
        let key = selector.lookup_key();
        self.by_key
            .get(&(key.0.to_string(), key.1))
            .into_iter()
            .flatten()
            .copied()
            .filter(move |&e| mask.contains_class(facts.owner_class(e)))
    }
}
