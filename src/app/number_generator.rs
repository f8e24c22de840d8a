//! Sequential numbers kept in the `numbergenerator` table.
//!
//! There is no locking: two generators created for the same number type
//! before either saves will hand out the same number. The second save then
//! fails on the key or overwrites the counter, depending on whether the row
//! already existed.

use crate::app::committer::TransactionCommitter;
use crate::app::data_accessor::DataAccessor;
use crate::domain::number::BOSequenceNumber;
use crate::domain::value::PropValue;
use crate::error::{PersistError, Result};

pub struct NumberGenerator {
    accessor: DataAccessor,
    counter: BOSequenceNumber,
}

impl NumberGenerator {
    /// Loads the counter for `number_type`, or starts a new one at zero.
    pub async fn new(accessor: &DataAccessor, number_type: &str) -> Result<Self> {
        let class_def = accessor.registry().class_def(BOSequenceNumber::CLASS_NAME)?;
        let key = [(
            BOSequenceNumber::NUMBER_TYPE.to_string(),
            PropValue::from(number_type),
        )];
        let counter = match accessor.loader().load(&class_def, &key).await? {
            Some(bo) => BOSequenceNumber::from_shared(bo),
            None => {
                log::debug!("no counter for '{}' yet, starting at 0", number_type);
                BOSequenceNumber::new(class_def, number_type)?
            }
        };
        Ok(Self {
            accessor: accessor.clone(),
            counter,
        })
    }

    pub fn number_type(&self) -> String {
        self.counter.number_type()
    }

    pub fn current(&self) -> i64 {
        self.counter.sequence_number()
    }

    /// Increments the counter in memory and returns the new value. The
    /// counter is left unchanged when it is already at `i64::MAX`.
    pub fn next_number(&mut self) -> Result<i64> {
        let current = self.counter.sequence_number();
        let next = current
            .checked_add(1)
            .ok_or_else(|| PersistError::SequenceExhausted {
                number_type: self.counter.number_type(),
                current,
            })?;
        self.counter.set_sequence_number(next)?;
        Ok(next)
    }

    pub fn set_sequence_number(&mut self, value: i64) -> Result<()> {
        self.counter.set_sequence_number(value)
    }

    /// Persists the counter in its own transaction.
    pub async fn save(&self) -> Result<usize> {
        self.accessor.save(self.counter.shared()).await
    }

    /// Stages the counter so it commits together with the objects using it.
    pub fn add_to_committer(&self, committer: &mut TransactionCommitter) {
        committer.add_business_object(self.counter.shared().clone());
    }
}
