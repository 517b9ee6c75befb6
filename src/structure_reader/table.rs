use crate::client::query_rows;
use crate::structure_reader::StructureReader;
use crate::Result;
use tokio_postgres::GenericClient;
use tracing::instrument;

impl<C: GenericClient + Sync> StructureReader<'_, C> {
    /// Resolves a table name to its pg_class oid; `None` means the table
    /// does not exist in the schema at the current snapshot.
    #[instrument(skip(self))]
    pub(in crate::structure_reader) async fn resolve_table_oid(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Option<u32>> {
        //language=postgresql
        let query = r#"
select cl.oid
from pg_class cl
         join pg_namespace ns on ns.oid = cl.relnamespace
where ns.nspname = $1
  and cl.relname = $2
  and cl.relkind in ('r', 'p');
"#;

        let rows: Vec<(u32,)> = query_rows(self.client, query, &[&schema, &table]).await?;
        Ok(rows.into_iter().next().map(|r| r.0))
    }

    /// All table names of a schema, lexicographically ordered. The caller
    /// fingerprints the returned sequence to version the schema, so the
    /// order must not depend on physical catalog storage. A missing schema
    /// is indistinguishable from an empty one here.
    #[instrument(skip(self))]
    pub async fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        //language=postgresql
        let query = r#"
select cl.relname
from pg_class cl
         join pg_namespace ns on ns.oid = cl.relnamespace
where ns.nspname = $1
  and cl.relkind in ('r', 'p')
order by cl.relname;
"#;

        let rows: Vec<(String,)> = query_rows(self.client, query, &[&schema]).await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
