//! Registry row model and conversions.

use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::UtcDateTime;

/// One registered fact: this item, under this custom-model-data number, was
/// defined by the pack with this content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRecord {
    pub item_name: String,
    /// The numeric `custom_model_data` predicate value.
    pub model_num: i64,
    /// Lowercase hex SHA-384 of the source pack's raw archive bytes.
    pub pack_hash: String,
    pub updated_on: UtcDateTime,
}

impl RegistryRecord {
    pub fn new(
        item_name: impl Into<String>,
        model_num: i64,
        pack_hash: impl Into<String>,
        updated_on: UtcDateTime,
    ) -> Self {
        Self {
            item_name: item_name.into(),
            model_num,
            pack_hash: pack_hash.into(),
            updated_on,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ItemRow {
    item_name: String,
    model_num: i64,
    pack_hash: String,
    updated_on: i64,
}
impl TryFrom<ItemRow> for RegistryRecord {
    type Error = Error;
    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            item_name: row.item_name,
            model_num: row.model_num,
            pack_hash: row.pack_hash,
            updated_on: UtcDateTime::from_unix_timestamp(row.updated_on)
                .or_raise(|| ErrorKind::InvalidData("update date"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_model() {
        let now = UtcDateTime::now();
        let row = ItemRow {
            item_name: "bow".to_string(),
            model_num: 42,
            pack_hash: "cafe".repeat(24),
            updated_on: now.unix_timestamp(),
        };
        let record = RegistryRecord::try_from(row).unwrap();
        assert_eq!(record.item_name, "bow");
        assert_eq!(record.model_num, 42);
        // Unix timestamps are whole seconds; the nanoseconds are gone.
        assert_eq!(record.updated_on, now.replace_nanosecond(0).unwrap());
    }
}
