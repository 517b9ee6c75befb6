use crate::models::{ColumnAttribute, PortableColumn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An ordered, named set of resolved columns together with their raw catalog
/// attributes.
///
/// The three views are always aligned: `names[i]` is `columns[i].name`, and
/// `attributes` has exactly one entry per name. Order is catalog (ordinal)
/// order for the physical column set, but index order for primary-key and
/// replica-identity subsets, because key comparison downstream has to happen
/// in the key's natural order.
#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSet {
    pub columns: Vec<PortableColumn>,
    pub attributes: HashMap<String, ColumnAttribute>,
    pub names: Vec<String>,
}

impl ColumnSet {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn attribute(&self, column_name: &str) -> Option<&ColumnAttribute> {
        self.attributes.get(column_name)
    }
}
