//! Closed-world class-hierarchy analysis (CHA) engine for a whole-program
//! optimizing compiler.
//!
//! `World` is built incrementally during the open phase (`register_class`,
//! `register_mixin_use`, `register_used_element`, ...), then frozen by
//! [`World::close`]. Every subclass/subtype/mixin/devirtualization/
//! side-effect query on `World` requires the closed phase; calling one
//! earlier is a caller bug and panics (see [`capabilities`] and
//! [`error`]).

mod capabilities;
mod class_set;
mod error;
mod function_set;
mod hierarchy_node;
mod ids;
mod mixin_index;
mod queries;
mod side_effects;
mod world;

#[cfg(test)]
mod tests;

pub use capabilities::{
    Backend, ClassFacts, CompilerOptions, CoreClasses, ElementFacts, Reporter, ResolverWorld,
    SupertypeEdge, TypeMask,
};
pub use class_set::ClassSet;
pub use error::WorldError;
pub use hierarchy_node::{HierarchyNode, SubclassMask, WalkControl};
pub use ids::{ArityShape, CallKind, ClassId, ElementId, Selector, TypedefId};
pub use queries::MaskOrTop;
pub use side_effects::SideEffects;
pub use world::{World, WorldCapabilities};
