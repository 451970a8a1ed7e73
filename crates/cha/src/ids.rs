//! Opaque handles and the call-selector value used throughout the engine.
//!
//! `Class`, `Element`, and `Typedef` are owned by the resolver (see
//! [`crate::capabilities`]); the engine only ever sees the stable handles
//! defined here.

use std::fmt;

/// Stable handle for a class, assigned and owned by the resolver.
///
/// All queries canonicalize to the class's `declaration` handle (see
/// [`crate::capabilities::ClassFacts::declaration`]) before using a
/// `ClassId` as a map key; forgetting to canonicalize at a new entry
/// point is the most common source of hash-lookup misses under patch
/// classes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u32);

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class#{}", self.0)
    }
}

/// Stable handle for a named program element (function, field, constructor).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u32);

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element#{}", self.0)
    }
}

/// Stable handle for a typedef.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedefId(pub u32);

impl fmt::Debug for TypedefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Typedef#{}", self.0)
    }
}

/// The call-kind component of a [`Selector`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CallKind {
    Getter,
    Setter,
    Call,
    ClosureCall,
}

/// Shape of a call site's argument list, used as part of `FunctionSet`'s
/// lookup key alongside the selector name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct ArityShape {
    pub required: u16,
    pub optional: u16,
    pub has_rest: bool,
}

impl ArityShape {
    pub const fn exact(required: u16) -> Self {
        Self {
            required,
            optional: 0,
            has_rest: false,
        }
    }
}

/// A call-site descriptor: name + arity + call-kind.
///
/// `FunctionSet` keys only on `(name, arity)`; `kind` is carried on the
/// selector for callers that need to interpret a matched member
/// differently depending on how it was invoked (e.g. a field hit by a
/// `Getter` selector vs. a `Setter` one).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Selector {
    pub name: String,
    pub arity: ArityShape,
    pub kind: CallKind,
}

impl Selector {
    pub fn new(name: impl Into<String>, arity: ArityShape, kind: CallKind) -> Self {
        Self {
            name: name.into(),
            arity,
            kind,
        }
    }

    /// The `(name, arity)` pair `FunctionSet` actually indexes by.
    pub(crate) fn lookup_key(&self) -> (&str, ArityShape) {
        (self.name.as_str(), self.arity)
    }
}
