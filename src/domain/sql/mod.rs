//! SQL statement model and generators.

pub mod formatter;
pub mod generator;
pub mod statement;

pub use formatter::{PlaceholderStyle, SqlFormatter};
pub use generator::StatementGenerator;
pub use statement::{ColumnValue, SqlStatement, SqlStatementCollection, StatementKind};
