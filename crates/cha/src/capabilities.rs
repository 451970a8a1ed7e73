//! Injected capabilities: everything the engine reads from or
//! reports through, but does not own.
//!
//! `World` is constructed once with a full set of these and holds them for
//! its entire lifetime (the engine is single-threaded cooperative, so
//! `Box<dyn Trait>` is enough — no `Arc`/`Send`/`Sync` bound is
//! needed).

use crate::ids::{ClassId, ElementId};

/// A supertype edge as exposed by a class: the supertype itself and its
/// depth, already deduplicated and transitive.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SupertypeEdge {
    pub class: ClassId,
    pub depth: u32,
}

/// Per-class facts the engine reads when a class is registered or queried.
/// Implemented by the resolver's class model; the engine never constructs
/// or mutates a `Class` itself.
pub trait ClassFacts {
    /// Canonical identity: all queries canonicalize to this before using a
    /// `ClassId` as a map key.
    fn declaration(&self, cls: ClassId) -> ClassId;
    fn superclass(&self, cls: ClassId) -> Option<ClassId>;
    /// Transitive, deduplicated, depth-annotated supertypes.
    fn all_supertypes(&self, cls: ClassId) -> Vec<SupertypeEdge>;
    fn is_mixin_application(&self, cls: ClassId) -> bool;
    /// Non-null iff `is_mixin_application(cls)`.
    fn mixin_of(&self, cls: ClassId) -> Option<ClassId>;
    /// Non-null iff the class has a synthetic call method (structural
    /// function subtype).
    fn has_call_type(&self, cls: ClassId) -> bool;
    fn hierarchy_depth(&self, cls: ClassId) -> u32;
    fn is_resolved(&self, cls: ClassId) -> bool;
    fn is_declaration(&self, cls: ClassId) -> bool;
    /// Named mixin applications are declared separately from anonymous
    /// ones; `MixinIndex::mixin_uses_of` treats only named applications as
    /// eligible for transitive liveness.
    fn is_named_mixin_application(&self, cls: ClassId) -> bool;
}

/// Per-element facts the engine reads when an element is registered or
/// queried.
pub trait ElementFacts {
    fn declaration(&self, e: ElementId) -> ElementId;
    fn owner_class(&self, e: ElementId) -> ClassId;
    fn is_instance_member(&self, e: ElementId) -> bool;
    fn is_abstract(&self, e: ElementId) -> bool;
    fn is_field(&self, e: ElementId) -> bool;
    fn is_final(&self, e: ElementId) -> bool;
    fn is_const(&self, e: ElementId) -> bool;
    fn is_getter(&self, e: ElementId) -> bool;
    fn is_setter(&self, e: ElementId) -> bool;
    fn is_generative_constructor_body(&self, e: ElementId) -> bool;
    /// True for the synthesized call-method of a closure class; used by
    /// `mightBePassedToApply` to forward to the originating expression.
    fn is_synthesized_closure_call_method(&self, e: ElementId) -> bool;
    fn originating_closure_expression(&self, e: ElementId) -> Option<ElementId>;
    /// The `(name, arity)` pair `FunctionSet` indexes instance members
    /// under; `Element` is otherwise opaque here, but a name and call
    /// shape are exactly what a selector needs to match against.
    fn selector_key(&self, e: ElementId) -> (String, crate::ids::ArityShape);
}

/// Yields the canonical built-in class handles.
pub trait CoreClasses {
    fn object_class(&self) -> ClassId;
    /// The language's structural `Function` class.
    fn function_class(&self) -> ClassId;
}

/// Backend-specific facts that are not part of the class/element model
/// proper but still needed by the closed-world queries.
pub trait Backend {
    fn is_native(&self, e: ElementId) -> bool;
    fn is_js_interop_class(&self, cls: ClassId) -> bool;
    fn is_foreign(&self, e: ElementId) -> bool;
    /// The designated host-object class used as the LUB for JS-interop
    /// classes.
    fn js_interop_root(&self) -> ClassId;
}

/// The resolver's view of the open world, as needed at `close()` time and
/// by `fieldNeverChanges`.
pub trait ResolverWorld {
    fn directly_instantiated_classes(&self) -> Vec<ClassId>;
    fn is_implemented(&self, cls: ClassId) -> bool;
    fn has_invoked_setter(&self, e: ElementId) -> bool;
    fn field_setters(&self) -> Vec<ElementId>;
}

/// Compiler-wide configuration. Plain data, not a capability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    /// When true, `close()` is valid but the closed-world guarantee is
    /// weaker; exposed to callers via
    /// `World::has_closed_world_assumption`.
    pub has_incremental_support: bool,
    /// Gates `extendMaskIfReachesAll`.
    pub enabled_invoke_on: bool,
}

/// Diagnostic sink for internal-invariant violations.
/// `internal_error` never returns: a whole-program compiler has no
/// sensible way to continue once a structural invariant has broken.
pub trait Reporter {
    fn internal_error(&self, cls: Option<ClassId>, message: &str) -> !;
}

/// The abstract type-mask domain consumed by devirtualization queries.
/// The engine never constructs or allocates masks.
pub trait TypeMask {
    /// Whether `cls` is among the mask's possible receiver classes; used
    /// to filter `FunctionSet`/`ClassSet` results by receiver mask.
    fn contains_class(&self, cls: ClassId) -> bool;
    fn locate_single_element(
        &self,
        selector: &crate::ids::Selector,
        world: &crate::world::World,
    ) -> Option<ElementId>;
    fn needs_no_such_method_handling(
        &self,
        selector: &crate::ids::Selector,
        world: &crate::world::World,
    ) -> bool;
}
