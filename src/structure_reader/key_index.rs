use crate::client::{query_rows, FromRow, RowEnumExt};
use crate::models::ReplicaIdentityPolicy;
use crate::structure_reader::StructureReader;
use crate::{PgStructureError, Result};
use tokio_postgres::{GenericClient, Row};
use tracing::instrument;

struct ReplicaIdentityPolicyRow {
    policy: ReplicaIdentityPolicy,
}

impl FromRow for ReplicaIdentityPolicyRow {
    fn from_row(row: Row) -> Result<Self> {
        Ok(ReplicaIdentityPolicyRow {
            policy: row.try_get_enum_value(0)?,
        })
    }
}

impl<C: GenericClient + Sync> StructureReader<'_, C> {
    /// Column names of the table's primary key in index order, empty when
    /// the table has none. Many replicated tables legitimately lack one, so
    /// absence is not an error. The first indnkeyatts entries of indkey are
    /// the key proper; anything after that is a covering INCLUDE column and
    /// does not identify rows.
    #[instrument(skip(self))]
    pub(in crate::structure_reader) async fn get_primary_key_columns(
        &self,
        table_oid: u32,
    ) -> Result<Vec<String>> {
        //language=postgresql
        let query = r#"
select a.attname
from pg_index i
         join pg_attribute a on a.attrelid = i.indrelid and a.attnum = any (i.indkey)
where i.indrelid = $1
  and i.indisprimary
  and array_position(i.indkey::int2[], a.attnum) <= i.indnkeyatts
order by array_position(i.indkey::int2[], a.attnum);
"#;

        let rows: Vec<(String,)> = query_rows(self.client, query, &[&table_oid]).await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// The table's effective replica identity policy (pg_class.relreplident).
    /// The oid was resolved earlier in the same fetch, so a missing pg_class
    /// row can only mean the table was dropped between the two queries,
    /// which a bare client outside a transaction does not prevent.
    #[instrument(skip(self))]
    pub(in crate::structure_reader) async fn get_replica_identity_policy(
        &self,
        table_oid: u32,
        schema: &str,
        table: &str,
    ) -> Result<ReplicaIdentityPolicy> {
        //language=postgresql
        let query = r#"
select cl.relreplident
from pg_class cl
where cl.oid = $1;
"#;

        let rows: Vec<ReplicaIdentityPolicyRow> =
            query_rows(self.client, query, &[&table_oid]).await?;

        match rows.into_iter().next() {
            Some(row) => Ok(row.policy),
            None => Err(PgStructureError::TableNotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            }),
        }
    }

    /// Column names of the index marked REPLICA IDENTITY USING INDEX, in
    /// index order. Empty when no index carries the mark, which for a table
    /// whose policy is USING INDEX means the catalog is inconsistent.
    #[instrument(skip(self))]
    pub(in crate::structure_reader) async fn get_replica_identity_index_columns(
        &self,
        table_oid: u32,
    ) -> Result<Vec<String>> {
        //language=postgresql
        let query = r#"
select a.attname
from pg_index i
         join pg_attribute a on a.attrelid = i.indrelid and a.attnum = any (i.indkey)
where i.indrelid = $1
  and i.indisreplident
  and array_position(i.indkey::int2[], a.attnum) <= i.indnkeyatts
order by array_position(i.indkey::int2[], a.attnum);
"#;

        let rows: Vec<(String,)> = query_rows(self.client, query, &[&table_oid]).await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
