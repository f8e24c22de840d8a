//! Entry point tying a store to a class registry.

use crate::app::committer::TransactionCommitter;
use crate::app::loader::BusinessObjectLoader;
use crate::app::number_generator::NumberGenerator;
use crate::domain::bo::{BusinessObject, SharedBo};
use crate::domain::schema::ClassDefRegistry;
use crate::domain::value::PropValue;
use crate::error::Result;
use crate::infra::config::StoreConfig;
use crate::storage::{self, Store};
use std::sync::Arc;

/// Hands out committers, loaders and number generators bound to one store and
/// one registry.
#[derive(Clone)]
pub struct DataAccessor {
    store: Arc<dyn Store>,
    registry: Arc<ClassDefRegistry>,
}

impl DataAccessor {
    /// Wraps `store` and makes sure it has every table `registry` needs.
    pub async fn new(store: Arc<dyn Store>, registry: ClassDefRegistry) -> Result<Self> {
        store.ensure_schema(&registry).await?;
        log::info!(
            "data accessor ready on {} store ({} classes)",
            store.name(),
            registry.list_classes().len()
        );
        Ok(Self {
            store,
            registry: Arc::new(registry),
        })
    }

    /// Connects the configured store and loads the configured schema file.
    /// Without a schema file only the built-in classes are registered.
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        let registry = match &config.schema_path {
            Some(path) => {
                log::info!("loading class definitions from {}", path.display());
                ClassDefRegistry::from_file(path)?
            }
            None => ClassDefRegistry::builder().build()?,
        };
        let store = storage::connect(config).await?;
        Self::new(store, registry).await
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ClassDefRegistry> {
        &self.registry
    }

    pub fn committer(&self) -> TransactionCommitter {
        TransactionCommitter::new(self.store.clone(), self.registry.clone())
    }

    pub fn loader(&self) -> BusinessObjectLoader {
        BusinessObjectLoader::new(self.store.clone())
    }

    /// A new, unsaved object of the named class.
    pub fn create(&self, class_name: &str) -> Result<SharedBo> {
        let class_def = self.registry.class_def(class_name)?;
        Ok(BusinessObject::new(class_def).into_shared())
    }

    /// Commits one object on its own.
    pub async fn save(&self, bo: &SharedBo) -> Result<usize> {
        let mut committer = self.committer();
        committer.add_business_object(bo.clone());
        committer.commit_transaction().await
    }

    pub async fn load(
        &self,
        class_name: &str,
        key: &[(String, PropValue)],
    ) -> Result<Option<SharedBo>> {
        let class_def = self.registry.class_def(class_name)?;
        self.loader().load(&class_def, key).await
    }

    pub async fn load_by_id(
        &self,
        class_name: &str,
        id: impl Into<PropValue>,
    ) -> Result<Option<SharedBo>> {
        let class_def = self.registry.class_def(class_name)?;
        self.loader().load_by_id(&class_def, id).await
    }

    pub async fn number_generator(&self, number_type: &str) -> Result<NumberGenerator> {
        NumberGenerator::new(self, number_type).await
    }
}
