use crate::domain::bo::business_object::{lock, BusinessObject, SharedBo};
use crate::domain::schema::ClassDef;
use crate::error::{PersistError, Result};
use std::sync::{Arc, Mutex};

/// An ordered, shared set of business objects of one class.
///
/// Clones share the same members. After a commit that deleted members, the
/// committer purges them from every collection staged with it.
#[derive(Debug, Clone)]
pub struct BusinessObjectCollection {
    class_def: Arc<ClassDef>,
    members: Arc<Mutex<Vec<SharedBo>>>,
}

impl BusinessObjectCollection {
    pub fn new(class_def: Arc<ClassDef>) -> Self {
        Self {
            class_def,
            members: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn class_def(&self) -> &Arc<ClassDef> {
        &self.class_def
    }

    /// Creates a new object of the collection's class and adds it.
    pub fn create_business_object(&self) -> SharedBo {
        let bo = BusinessObject::new(self.class_def.clone()).into_shared();
        self.lock_members().push(bo.clone());
        bo
    }

    /// Adds an object. Adding the same instance twice is a no-op.
    pub fn add(&self, bo: SharedBo) -> Result<()> {
        let class_name = lock(&bo).class_def().class_name().to_string();
        let fits = lock(&bo).class_def().is_a(self.class_def.class_name());
        if !fits {
            return Err(PersistError::SchemaMismatch(format!(
                "cannot add '{}' to a collection of '{}'",
                class_name,
                self.class_def.class_name()
            )));
        }
        let mut members = self.lock_members();
        if !members.iter().any(|m| Arc::ptr_eq(m, &bo)) {
            members.push(bo);
        }
        Ok(())
    }

    /// Marks every member for deletion; rows go on the next commit.
    pub fn mark_all_for_delete(&self) {
        for bo in self.members() {
            lock(&bo).mark_for_delete();
        }
    }

    pub fn cancel_edits(&self) {
        for bo in self.members() {
            lock(&bo).cancel_edits();
        }
    }

    pub fn members(&self) -> Vec<SharedBo> {
        self.lock_members().clone()
    }

    /// Members a commit would write something for.
    pub fn pending(&self) -> Vec<SharedBo> {
        self.members()
            .into_iter()
            .filter(|bo| lock(bo).has_pending_changes())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock_members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_members().is_empty()
    }

    pub fn contains(&self, bo: &SharedBo) -> bool {
        self.lock_members().iter().any(|m| Arc::ptr_eq(m, bo))
    }

    /// True when both handles are clones of the same collection.
    pub fn shares_members_with(&self, other: &BusinessObjectCollection) -> bool {
        Arc::ptr_eq(&self.members, &other.members)
    }

    /// Drops members whose deletion has been committed.
    pub(crate) fn purge_deleted(&self) -> usize {
        let mut members = self.lock_members();
        let before = members.len();
        members.retain(|bo| {
            let bo = lock(bo);
            !(bo.state().is_deleted() && !bo.has_pending_changes())
        });
        before - members.len()
    }

    fn lock_members(&self) -> std::sync::MutexGuard<'_, Vec<SharedBo>> {
        self.members
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
