use crate::client::{query_rows, FromRow, RowEnumExt};
use crate::models::GenerationKind;
use crate::structure_reader::StructureReader;
use crate::Result;
use tokio_postgres::{GenericClient, Row};
use tracing::instrument;

/// One live column of a table, straight from pg_attribute.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct AttributeRow {
    pub name: String,
    pub type_oid: u32,
    pub type_modifier: i32,
    pub ordinal_position: i16,
    pub is_nullable: bool,
    pub has_default: bool,
    pub generated: GenerationKind,
    /// Default or generation expression source, empty if neither.
    pub expression: String,
    /// Declared array dimensions (attndims), 0 for non-arrays.
    pub dimensions: i32,
}

impl FromRow for AttributeRow {
    fn from_row(row: Row) -> Result<Self> {
        Ok(AttributeRow {
            name: row.try_get(0)?,
            type_oid: row.try_get(1)?,
            type_modifier: row.try_get(2)?,
            ordinal_position: row.try_get(3)?,
            is_nullable: row.try_get(4)?,
            has_default: row.try_get(5)?,
            generated: row.try_get_enum_value(6)?,
            expression: row.try_get(7)?,
            dimensions: row.try_get(8)?,
        })
    }
}

impl<C: GenericClient + Sync> StructureReader<'_, C> {
    /// Live, non-dropped columns of a table in catalog order, with the raw
    /// metadata the type resolver and the attribute map need. A column of a
    /// not-null domain counts as non-nullable even though pg_attribute
    /// itself says otherwise.
    #[instrument(skip(self))]
    pub(in crate::structure_reader) async fn get_attributes(
        &self,
        table_oid: u32,
    ) -> Result<Vec<AttributeRow>> {
        //language=postgresql
        let query = r#"
select attr.attname,
       attr.atttypid,
       attr.atttypmod,
       attr.attnum,
       not (attr.attnotnull or (t.typtype = 'd' and t.typnotnull)) as is_nullable,
       attr.atthasdef,
       attr.attgenerated,
       coalesce(pg_get_expr(ad.adbin, ad.adrelid), '')             as expression,
       attr.attndims::int4                                         as dimensions
from pg_attribute attr
         join pg_type t on t.oid = attr.atttypid
         left join pg_attrdef ad on ad.adrelid = attr.attrelid and ad.adnum = attr.attnum
where attr.attrelid = $1
  and attr.attnum > 0
  and not attr.attisdropped
order by attr.attnum;
"#;

        query_rows(self.client, query, &[&table_oid]).await
    }
}
