//! Class schema: property definitions, class definitions with their
//! class-table-inheritance chain, validation rules and the registry.

pub mod class_def;
pub mod definition;
pub mod prop_def;
pub mod registry;
pub mod rules;

pub use class_def::{ClassDef, KeyColumn, PrimaryKeyDef, TableLevel};
pub use definition::{ClassDefinition, PrimaryKeyDefinition, PropDefinition};
pub use prop_def::{display_name_for, PropDef, ReadWriteRule};
pub use registry::{ClassDefRegistry, ClassDefRegistryBuilder};
pub use rules::{LengthRule, ObjectRule, PredicateRule, PropRule, RangeRule, RuleDefinition};
