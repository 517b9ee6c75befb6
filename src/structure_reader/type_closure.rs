use crate::client::{query_rows, FromRow, RowEnumExt};
use crate::structure_reader::StructureReader;
use crate::type_resolver::{PgTypeEntry, PgTypeKind};
use crate::Result;
use std::collections::HashMap;
use tokio_postgres::{GenericClient, Row};
use tracing::instrument;

struct PgTypeRow {
    oid: u32,
    name: String,
    kind: PgTypeKind,
    is_array: bool,
    base_oid: u32,
    element_oid: u32,
    modifier: i32,
}

impl FromRow for PgTypeRow {
    fn from_row(row: Row) -> Result<Self> {
        Ok(PgTypeRow {
            oid: row.try_get(0)?,
            name: row.try_get(1)?,
            kind: row.try_get_enum_value(2)?,
            is_array: row.try_get(3)?,
            base_oid: row.try_get(4)?,
            element_oid: row.try_get(5)?,
            modifier: row.try_get(6)?,
        })
    }
}

impl<C: GenericClient + Sync> StructureReader<'_, C> {
    /// Loads the pg_type rows for the given oids plus everything reachable
    /// through domain base types and array element types, so that the type
    /// resolver can recurse without further catalog reads. The closure is
    /// read under the fetch's transaction and therefore matches the
    /// attribute snapshot exactly.
    #[instrument(skip_all)]
    pub(in crate::structure_reader) async fn get_type_closure(
        &self,
        type_oids: &[u32],
    ) -> Result<HashMap<u32, PgTypeEntry>> {
        if type_oids.is_empty() {
            return Ok(HashMap::new());
        }

        //language=postgresql
        let query = r#"
with recursive type_closure as (select t.oid,
                                       t.typname,
                                       t.typtype,
                                       t.typcategory = 'A' as is_array,
                                       t.typbasetype,
                                       t.typelem,
                                       t.typtypmod
                                from pg_type t
                                where t.oid = any ($1)
                                union
                                select t.oid,
                                       t.typname,
                                       t.typtype,
                                       t.typcategory = 'A',
                                       t.typbasetype,
                                       t.typelem,
                                       t.typtypmod
                                from pg_type t
                                         join type_closure c on t.oid = c.typbasetype or t.oid = c.typelem)
select oid, typname, typtype, is_array, typbasetype, typelem, typtypmod
from type_closure;
"#;

        let oids = type_oids.to_vec();
        let rows: Vec<PgTypeRow> = query_rows(self.client, query, &[&oids]).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.oid,
                    PgTypeEntry {
                        name: row.name,
                        kind: row.kind,
                        is_array: row.is_array,
                        base_oid: row.base_oid,
                        element_oid: row.element_oid,
                        modifier: row.modifier,
                    },
                )
            })
            .collect())
    }
}
