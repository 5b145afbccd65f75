//! The grouping unit over which transaction order is maintained.

use serde::{Deserialize, Serialize};

use crate::database_id::CategoryId;

/// Either a category or the plan's pool of unallocated transactions.
///
/// Serialized as the category ID, with `null` for the unallocated pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<CategoryId>", into = "Option<CategoryId>")]
pub enum Column {
    /// Transactions that have not been assigned a category.
    #[default]
    Unallocated,
    /// Transactions assigned to the category with this ID.
    Category(CategoryId),
}

impl Column {
    /// The category ID as stored in the `category_id` column.
    pub fn category_id(self) -> Option<CategoryId> {
        match self {
            Column::Unallocated => None,
            Column::Category(id) => Some(id),
        }
    }
}

impl From<Option<CategoryId>> for Column {
    fn from(category_id: Option<CategoryId>) -> Self {
        match category_id {
            Some(id) => Column::Category(id),
            None => Column::Unallocated,
        }
    }
}

impl From<Column> for Option<CategoryId> {
    fn from(column: Column) -> Self {
        column.category_id()
    }
}

#[cfg(test)]
mod tests {
    use crate::column::Column;

    #[test]
    fn null_is_unallocated() {
        let column: Column = serde_json::from_str("null").unwrap();

        assert_eq!(column, Column::Unallocated);
        assert_eq!(serde_json::to_string(&column).unwrap(), "null");
    }

    #[test]
    fn id_is_category() {
        let column: Column = serde_json::from_str("7").unwrap();

        assert_eq!(column, Column::Category(7));
        assert_eq!(column.category_id(), Some(7));
    }
}
