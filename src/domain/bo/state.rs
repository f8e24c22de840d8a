/// Point-in-time view of a business object's lifecycle flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BOState {
    pub(crate) is_new: bool,
    pub(crate) is_dirty: bool,
    pub(crate) is_deleted: bool,
    pub(crate) is_editing: bool,
    pub(crate) is_valid: bool,
}

impl BOState {
    /// Never successfully committed (or deleted by a committed transaction).
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Some property differs from its persisted value.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }
}
