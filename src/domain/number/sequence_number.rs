use crate::domain::bo::{lock, BusinessObject, SharedBo};
use crate::domain::schema::{ClassDef, ClassDefinition, PropDefinition};
use crate::domain::value::PropType;
use crate::error::Result;
use std::sync::Arc;

/// Typed view over a `BOSequenceNumber` object: one row per number type in
/// the `numbergenerator` table.
#[derive(Debug, Clone)]
pub struct BOSequenceNumber {
    bo: SharedBo,
}

impl BOSequenceNumber {
    pub const CLASS_NAME: &'static str = "BOSequenceNumber";
    pub const TABLE_NAME: &'static str = "numbergenerator";
    pub const NUMBER_TYPE: &'static str = "NumberType";
    pub const SEQUENCE_NUMBER: &'static str = "SequenceNumber";

    /// Definition registered in every [`ClassDefRegistry`](crate::domain::schema::ClassDefRegistry).
    pub fn class_definition() -> ClassDefinition {
        ClassDefinition::new(Self::CLASS_NAME)
            .table(Self::TABLE_NAME)
            .natural_key([Self::NUMBER_TYPE])
            .prop(PropDefinition::new(Self::NUMBER_TYPE, PropType::String).compulsory())
            .prop(PropDefinition::new(Self::SEQUENCE_NUMBER, PropType::Integer).default_value(0i64))
    }

    /// A counter that has never been saved, starting at zero.
    pub fn new(class_def: Arc<ClassDef>, number_type: &str) -> Result<Self> {
        let mut bo = BusinessObject::new(class_def);
        bo.set_property_value(Self::NUMBER_TYPE, number_type)?;
        Ok(Self {
            bo: bo.into_shared(),
        })
    }

    pub fn from_shared(bo: SharedBo) -> Self {
        Self { bo }
    }

    pub fn shared(&self) -> &SharedBo {
        &self.bo
    }

    pub fn number_type(&self) -> String {
        lock(&self.bo)
            .get_string(Self::NUMBER_TYPE)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Current counter value; an unset counter reads as zero.
    pub fn sequence_number(&self) -> i64 {
        lock(&self.bo)
            .get_i64(Self::SEQUENCE_NUMBER)
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    pub fn set_sequence_number(&self, value: i64) -> Result<()> {
        lock(&self.bo).set_property_value(Self::SEQUENCE_NUMBER, value)
    }
}
