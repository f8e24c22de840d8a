pub mod bo;
pub mod number;
pub mod schema;
pub mod sql;
pub mod value;
