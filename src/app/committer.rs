//! Atomic commit of a set of business objects.

use crate::domain::bo::{lock, BOSnapshot, BusinessObjectCollection, SharedBo};
use crate::domain::schema::ClassDefRegistry;
use crate::domain::sql::{SqlStatementCollection, StatementGenerator};
use crate::error::{PersistError, Result};
use crate::storage::Store;
use chrono::Utc;
use std::sync::Arc;

/// Collects business objects and writes all of their pending changes in one
/// store transaction.
///
/// Either every staged object is persisted and finalized, or the store is
/// untouched and every object is back in the state it had before
/// [`commit_transaction`](Self::commit_transaction) was called.
pub struct TransactionCommitter {
    store: Arc<dyn Store>,
    registry: Arc<ClassDefRegistry>,
    generator: StatementGenerator,
    staged: Vec<SharedBo>,
    collections: Vec<BusinessObjectCollection>,
    committed: bool,
}

impl TransactionCommitter {
    pub fn new(store: Arc<dyn Store>, registry: Arc<ClassDefRegistry>) -> Self {
        Self::with_generator(store, registry, StatementGenerator::default())
    }

    pub fn with_generator(
        store: Arc<dyn Store>,
        registry: Arc<ClassDefRegistry>,
        generator: StatementGenerator,
    ) -> Self {
        Self {
            store,
            registry,
            generator,
            staged: Vec::new(),
            collections: Vec::new(),
            committed: false,
        }
    }

    /// Stages an object. Staging the same instance again is a no-op.
    pub fn add_business_object(&mut self, bo: SharedBo) {
        if !self.staged.iter().any(|s| Arc::ptr_eq(s, &bo)) {
            self.staged.push(bo);
            self.committed = false;
        }
    }

    /// Stages every member of `collection` that has something to write, and
    /// purges committed deletions from it afterwards.
    pub fn add_collection(&mut self, collection: &BusinessObjectCollection) {
        for bo in collection.pending() {
            self.add_business_object(bo);
        }
        if !self
            .collections
            .iter()
            .any(|c| c.shares_members_with(collection))
        {
            self.collections.push(collection.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// True when the last commit succeeded and nothing was staged since.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Statements a commit would execute right now, without touching the
    /// objects. Surrogate keys not yet assigned show up as NULL.
    pub fn pending_statements(&self) -> Result<SqlStatementCollection> {
        let mut statements = SqlStatementCollection::new();
        for bo in &self.staged {
            statements.append(self.generator.persist_statements(&lock(bo))?);
        }
        Ok(statements)
    }

    /// Commits every staged object and returns the number of statements
    /// executed. Objects already written by an earlier commit only produce
    /// statements if they were changed again, so committing twice with
    /// nothing new returns 0 while anything staged or edited since is written.
    pub async fn commit_transaction(&mut self) -> Result<usize> {
        self.check_schema()?;
        self.check_valid()?;

        let (snapshots, statements) = self.prepare()?;

        if statements.is_empty() {
            self.finalize();
            return Ok(0);
        }

        log::debug!("executing {} statements:\n{}", statements.len(), statements);
        match self.store.execute_batch(&statements).await {
            Ok(_) => {
                self.finalize();
                log::info!(
                    "committed {} objects with {} statements",
                    self.staged.len(),
                    statements.len()
                );
                Ok(statements.len())
            }
            Err(source) => {
                self.restore(snapshots);
                log::warn!("commit failed, objects restored: {}", source);
                Err(PersistError::Persistence { source })
            }
        }
    }

    fn check_schema(&self) -> Result<()> {
        for bo in &self.staged {
            let bo = lock(bo);
            if !self.registry.contains(bo.class_def()) {
                return Err(PersistError::SchemaMismatch(format!(
                    "class '{}' is not the registered definition",
                    bo.class_name()
                )));
            }
        }
        Ok(())
    }

    fn check_valid(&self) -> Result<()> {
        let failures: Vec<String> = self
            .staged
            .iter()
            .filter_map(|bo| {
                let bo = lock(bo);
                if bo.state().is_deleted() || bo.is_valid() {
                    None
                } else {
                    Some(format!("{}: {}", bo.class_name(), bo.is_valid_message()))
                }
            })
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PersistError::Validation {
                message: failures.join("\n"),
            })
        }
    }

    /// Snapshots, stamps and generates statements for each object in staging
    /// order. On a generation error the objects already touched are restored.
    fn prepare(&self) -> Result<(Vec<BOSnapshot>, SqlStatementCollection)> {
        let now = Utc::now();
        let mut snapshots = Vec::with_capacity(self.staged.len());
        let mut statements = SqlStatementCollection::new();
        for bo in &self.staged {
            let generated = {
                let mut bo = lock(bo);
                snapshots.push(bo.snapshot());
                bo.update_object_before_persisting(now);
                self.generator.persist_statements(&bo)
            };
            match generated {
                Ok(s) => statements.append(s),
                Err(e) => {
                    self.restore(snapshots);
                    return Err(e);
                }
            }
        }
        Ok((snapshots, statements))
    }

    fn finalize(&mut self) {
        for bo in &self.staged {
            lock(bo).after_save();
        }
        for collection in &self.collections {
            let purged = collection.purge_deleted();
            if purged > 0 {
                log::debug!("purged {} deleted objects from collection", purged);
            }
        }
        self.committed = true;
    }

    fn restore(&self, snapshots: Vec<BOSnapshot>) {
        for (bo, snapshot) in self.staged.iter().zip(snapshots) {
            lock(bo).restore(snapshot);
        }
    }
}
