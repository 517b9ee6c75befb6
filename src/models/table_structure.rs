use crate::client::FromPgChar;
use crate::models::ColumnSet;
use crate::{PgStructureError, Result};
use serde::{Deserialize, Serialize};

/// A detached, point-in-time description of one table, produced by a single
/// fetch under a single transaction. Holds no reference to the connection
/// that produced it.
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct TableStructure {
    /// Every live (non-dropped) column, in catalog order.
    pub physical_columns: ColumnSet,
    /// Present only when requested and the table has a primary key, in
    /// index order.
    pub primary_key_columns: Option<ColumnSet>,
    /// Present only when requested; see [`ReplicaIdentity`] for the three
    /// resolved states.
    pub replica_identity: Option<ReplicaIdentity>,
}

impl TableStructure {
    /// The explicit replica-identity key columns, if the table has any.
    /// `FullRow` and `Nothing` both yield `None` here; callers that need to
    /// tell them apart match on [`TableStructure::replica_identity`].
    pub fn replica_identity_columns(&self) -> Option<&ColumnSet> {
        match &self.replica_identity {
            Some(ReplicaIdentity::Key(columns)) => Some(columns),
            _ => None,
        }
    }
}

/// The resolved replica identity of a table.
///
/// `FullRow` (policy FULL: change records carry every column, there is no key
/// index to enumerate) is deliberately distinct from `Nothing` (no identity
/// at all): a table with identity FULL can still be matched row-by-row
/// downstream, a table with no identity cannot.
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub enum ReplicaIdentity {
    /// Policy DEFAULT resolved through the primary key, or policy USING
    /// INDEX resolved through the marked unique index. Columns are in index
    /// order.
    Key(ColumnSet),
    /// Policy FULL: every column identifies the row.
    FullRow,
    /// Policy NOTHING, or policy DEFAULT on a table without a primary key.
    /// Updates and deletes cannot be uniquely matched downstream.
    Nothing,
}

/// Mirror of `pg_class.relreplident`.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum ReplicaIdentityPolicy {
    Default,
    Nothing,
    Full,
    UsingIndex,
}

impl FromPgChar for ReplicaIdentityPolicy {
    fn from_pg_char(c: char) -> Result<Self> {
        match c {
            'd' => Ok(ReplicaIdentityPolicy::Default),
            'n' => Ok(ReplicaIdentityPolicy::Nothing),
            'f' => Ok(ReplicaIdentityPolicy::Full),
            'i' => Ok(ReplicaIdentityPolicy::UsingIndex),
            _ => Err(PgStructureError::UnknownReplicaIdentityPolicy(c)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_identity_policy_from_catalog_flag() {
        assert_eq!(
            ReplicaIdentityPolicy::from_pg_char('d').unwrap(),
            ReplicaIdentityPolicy::Default
        );
        assert_eq!(
            ReplicaIdentityPolicy::from_pg_char('n').unwrap(),
            ReplicaIdentityPolicy::Nothing
        );
        assert_eq!(
            ReplicaIdentityPolicy::from_pg_char('f').unwrap(),
            ReplicaIdentityPolicy::Full
        );
        assert_eq!(
            ReplicaIdentityPolicy::from_pg_char('i').unwrap(),
            ReplicaIdentityPolicy::UsingIndex
        );
        assert!(ReplicaIdentityPolicy::from_pg_char('x').is_err());
    }

    #[test]
    fn full_row_and_nothing_are_distinct() {
        let full = TableStructure {
            physical_columns: ColumnSet::default(),
            primary_key_columns: None,
            replica_identity: Some(ReplicaIdentity::FullRow),
        };
        let nothing = TableStructure {
            physical_columns: ColumnSet::default(),
            primary_key_columns: None,
            replica_identity: Some(ReplicaIdentity::Nothing),
        };
        let not_requested = TableStructure {
            physical_columns: ColumnSet::default(),
            primary_key_columns: None,
            replica_identity: None,
        };

        assert_ne!(full, nothing);
        assert_ne!(full, not_requested);
        assert_ne!(nothing, not_requested);
        assert!(full.replica_identity_columns().is_none());
        assert!(nothing.replica_identity_columns().is_none());
    }
}
