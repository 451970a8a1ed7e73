//! Shared fixture harness for the black-box integration tests: a small,
//! declaratively-built `ClassFacts`/`ElementFacts`/`CoreClasses`/`Backend`/
//! `ResolverWorld`/`Reporter` implementation plus a couple of `TypeMask`
//! fixtures, analogous to the `AlwaysRejectOverride`/`NoopResolver` fixture
//! pattern used by `tsz-solver`'s relation-query tests.

#![allow(dead_code)]

use cha::{
    ArityShape, Backend, CallKind, ClassFacts, ClassId, CompilerOptions, CoreClasses, ElementFacts, ElementId,
    Reporter, ResolverWorld, Selector, SupertypeEdge, TypeMask, World, WorldCapabilities,
};
use rustc_hash::{FxHashMap, FxHashSet};

pub const OBJECT: ClassId = ClassId(0);
pub const FUNCTION: ClassId = ClassId(1);

#[derive(Clone, Default)]
pub struct ClassDecl {
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub mixin_of: Option<ClassId>,
    pub named_mixin_application: bool,
    pub has_call_type: bool,
}

#[derive(Clone, Default)]
pub struct ElementDecl {
    pub owner: ClassId,
    pub name: String,
    pub arity: ArityShape,
    pub is_instance_member: bool,
    pub is_abstract: bool,
    pub is_field: bool,
    pub is_final: bool,
}

/// Builds up a small class/element universe, then hands out the
/// `WorldCapabilities` a test needs to construct a `World`.
#[derive(Default)]
pub struct FixtureBuilder {
    classes: FxHashMap<ClassId, ClassDecl>,
    elements: FxHashMap<ElementId, ElementDecl>,
    instantiated: FxHashSet<ClassId>,
    invoked_setters: FxHashSet<ElementId>,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        let mut b = Self::default();
        b.classes.insert(OBJECT, ClassDecl::default());
        b.classes.insert(FUNCTION, ClassDecl::default());
        b
    }

    pub fn class(mut self, id: ClassId, superclass: ClassId, interfaces: &[ClassId]) -> Self {
        self.classes.insert(
            id,
            ClassDecl {
                superclass: Some(superclass),
                interfaces: interfaces.to_vec(),
                ..Default::default()
            },
        );
        self
    }

    pub fn mixin_application(mut self, id: ClassId, superclass: ClassId, mixin: ClassId, named: bool) -> Self {
        self.classes.insert(
            id,
            ClassDecl {
                superclass: Some(superclass),
                mixin_of: Some(mixin),
                named_mixin_application: named,
                ..Default::default()
            },
        );
        self
    }

    pub fn callable_class(mut self, id: ClassId, superclass: ClassId) -> Self {
        self.classes.insert(
            id,
            ClassDecl {
                superclass: Some(superclass),
                has_call_type: true,
                ..Default::default()
            },
        );
        self
    }

    pub fn instantiate(mut self, id: ClassId) -> Self {
        self.instantiated.insert(id);
        self
    }

    pub fn invoke_setter(mut self, id: ElementId) -> Self {
        self.invoked_setters.insert(id);
        self
    }

    pub fn element(mut self, id: ElementId, owner: ClassId, name: &str, decl: ElementDecl) -> Self {
        self.elements.insert(
            id,
            ElementDecl {
                owner,
                name: name.to_string(),
                ..decl
            },
        );
        self
    }

    pub fn build(self) -> World {
        let facts = Fixture {
            classes: self.classes,
            elements: self.elements,
        };
        let resolver = FixtureResolver {
            instantiated: self.instantiated,
            invoked_setters: self.invoked_setters,
        };
        let capabilities = WorldCapabilities {
            core_classes: Box::new(FixtureCoreClasses),
            backend: Box::new(FixtureBackend),
            resolver: Box::new(resolver),
            reporter: Box::new(PanicReporter),
            class_facts: Box::new(facts.clone()),
            element_facts: Box::new(facts),
            options: CompilerOptions {
                has_incremental_support: false,
                enabled_invoke_on: true,
            },
        };
        World::new(capabilities)
    }
}

#[derive(Clone)]
struct Fixture {
    classes: FxHashMap<ClassId, ClassDecl>,
    elements: FxHashMap<ElementId, ElementDecl>,
}

impl Fixture {
    fn collect_supertypes(&self, cls: ClassId, depth: u32, out: &mut Vec<SupertypeEdge>, seen: &mut FxHashSet<ClassId>) {
        let Some(decl) = self.classes.get(&cls) else {
            return;
        };
        if let Some(sup) = decl.superclass {
            if seen.insert(sup) {
                out.push(SupertypeEdge { class: sup, depth });
            }
            self.collect_supertypes(sup, depth + 1, out, seen);
        }
        for &iface in &decl.interfaces {
            if seen.insert(iface) {
                out.push(SupertypeEdge { class: iface, depth });
            }
            self.collect_supertypes(iface, depth + 1, out, seen);
        }
    }
}

impl ClassFacts for Fixture {
    fn declaration(&self, cls: ClassId) -> ClassId {
        cls
    }
    fn superclass(&self, cls: ClassId) -> Option<ClassId> {
        self.classes.get(&cls).and_then(|d| d.superclass)
    }
    fn all_supertypes(&self, cls: ClassId) -> Vec<SupertypeEdge> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_supertypes(cls, 1, &mut out, &mut seen);
        out
    }
    fn is_mixin_application(&self, cls: ClassId) -> bool {
        self.classes.get(&cls).is_some_and(|d| d.mixin_of.is_some())
    }
    fn mixin_of(&self, cls: ClassId) -> Option<ClassId> {
        self.classes.get(&cls).and_then(|d| d.mixin_of)
    }
    fn has_call_type(&self, cls: ClassId) -> bool {
        self.classes.get(&cls).is_some_and(|d| d.has_call_type)
    }
    fn hierarchy_depth(&self, cls: ClassId) -> u32 {
        self.all_supertypes(cls).len() as u32
    }
    fn is_resolved(&self, _cls: ClassId) -> bool {
        true
    }
    fn is_declaration(&self, _cls: ClassId) -> bool {
        true
    }
    fn is_named_mixin_application(&self, cls: ClassId) -> bool {
        self.classes.get(&cls).is_some_and(|d| d.named_mixin_application)
    }
}

impl ElementFacts for Fixture {
    fn declaration(&self, e: ElementId) -> ElementId {
        e
    }
    fn owner_class(&self, e: ElementId) -> ClassId {
        self.elements.get(&e).map_or(OBJECT, |d| d.owner)
    }
    fn is_instance_member(&self, e: ElementId) -> bool {
        self.elements.get(&e).is_some_and(|d| d.is_instance_member)
    }
    fn is_abstract(&self, e: ElementId) -> bool {
        self.elements.get(&e).is_some_and(|d| d.is_abstract)
    }
    fn is_field(&self, e: ElementId) -> bool {
        self.elements.get(&e).is_some_and(|d| d.is_field)
    }
    fn is_final(&self, e: ElementId) -> bool {
        self.elements.get(&e).is_some_and(|d| d.is_final)
    }
    fn is_const(&self, _e: ElementId) -> bool {
        false
    }
    fn is_getter(&self, _e: ElementId) -> bool {
        false
    }
    fn is_setter(&self, _e: ElementId) -> bool {
        false
    }
    fn is_generative_constructor_body(&self, _e: ElementId) -> bool {
        false
    }
    fn is_synthesized_closure_call_method(&self, _e: ElementId) -> bool {
        false
    }
    fn originating_closure_expression(&self, _e: ElementId) -> Option<ElementId> {
        None
    }
    fn selector_key(&self, e: ElementId) -> (String, ArityShape) {
        self.elements
            .get(&e)
            .map_or(("<unknown>".to_string(), ArityShape::default()), |d| {
                (d.name.clone(), d.arity)
            })
    }
}

struct FixtureCoreClasses;

impl CoreClasses for FixtureCoreClasses {
    fn object_class(&self) -> ClassId {
        OBJECT
    }
    fn function_class(&self) -> ClassId {
        FUNCTION
    }
}

struct FixtureBackend;

impl Backend for FixtureBackend {
    fn is_native(&self, _e: ElementId) -> bool {
        false
    }
    fn is_js_interop_class(&self, _cls: ClassId) -> bool {
        false
    }
    fn is_foreign(&self, _e: ElementId) -> bool {
        false
    }
    fn js_interop_root(&self) -> ClassId {
        OBJECT
    }
}

struct FixtureResolver {
    instantiated: FxHashSet<ClassId>,
    invoked_setters: FxHashSet<ElementId>,
}

impl ResolverWorld for FixtureResolver {
    fn directly_instantiated_classes(&self) -> Vec<ClassId> {
        self.instantiated.iter().copied().collect()
    }
    fn is_implemented(&self, cls: ClassId) -> bool {
        self.instantiated.contains(&cls)
    }
    fn has_invoked_setter(&self, e: ElementId) -> bool {
        self.invoked_setters.contains(&e)
    }
    fn field_setters(&self) -> Vec<ElementId> {
        Vec::new()
    }
}

struct PanicReporter;

impl Reporter for PanicReporter {
    fn internal_error(&self, cls: Option<ClassId>, message: &str) -> ! {
        panic!("internal error ({cls:?}): {message}");
    }
}

/// A mask whose receiver domain is exactly the classes it's built with.
pub struct SetMask(pub FxHashSet<ClassId>);

impl SetMask {
    pub fn of(classes: &[ClassId]) -> Self {
        Self(classes.iter().copied().collect())
    }
}

impl TypeMask for SetMask {
    fn contains_class(&self, cls: ClassId) -> bool {
        self.0.contains(&cls)
    }
    fn locate_single_element(&self, selector: &Selector, world: &World) -> Option<ElementId> {
        let mut matches = world
            .elements_for_selector(selector)
            .into_iter()
            .filter(|&(_, owner)| self.contains_class(owner))
            .map(|(e, _)| e);
        let first = matches.next()?;
        if matches.next().is_some() {
            None
        } else {
            Some(first)
        }
    }
    fn needs_no_such_method_handling(&self, selector: &Selector, world: &World) -> bool {
        self.locate_single_element(selector, world).is_none()
    }
}

pub fn selector(name: &str, required: u16) -> Selector {
    Selector::new(name, ArityShape::exact(required), CallKind::Call)
}
