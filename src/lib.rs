pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;

// Convenience re-exports (keeps call-sites clean)
pub use app::committer::TransactionCommitter;
pub use app::data_accessor::DataAccessor;
pub use app::loader::BusinessObjectLoader;
pub use app::number_generator::NumberGenerator;
pub use domain::bo::{lock, BusinessObject, BusinessObjectCollection, SharedBo};
pub use domain::schema::{ClassDefRegistry, ClassDefinition, PropDefinition};
pub use domain::value::{PropType, PropValue};
pub use error::{PersistError, StoreError};
pub use infra::config::StoreConfig;
pub use storage::{InMemoryStore, PgStore, Store};
