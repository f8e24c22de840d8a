//! Business objects: property holders, lifecycle state and collections.

pub mod business_object;
pub mod collection;
pub mod prop;
pub mod state;

pub use business_object::{lock, BOSnapshot, BusinessObject, SharedBo};
pub use collection::BusinessObjectCollection;
pub use prop::BOProp;
pub use state::BOState;
