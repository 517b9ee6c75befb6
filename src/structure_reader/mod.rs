use crate::models::{ColumnSet, ReplicaIdentity, ReplicaIdentityPolicy, TableStructure};
use crate::structure_reader::attribute::AttributeRow;
use crate::structure_reader::column_set::{build_column_set, ensure_catalog_order, rows_in_key_order};
use crate::type_resolver::TypeResolver;
use crate::{PgStructureError, PostgresConnection, Result};
use itertools::Itertools;
use tokio_postgres::GenericClient;
use tracing::instrument;

mod attribute;
mod column_set;
mod key_index;
mod table;
mod type_closure;

/// What a structure fetch should include, beyond the always-present physical
/// column set.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Wrap columns postgres allows to be null in the portable nullable
    /// variant. Never affects columns with an enforced NOT NULL.
    pub use_nulls: bool,
    pub with_primary_key: bool,
    pub with_replica_identity: bool,
    /// Restrict the physical column set to these names. Filter order is
    /// ignored; catalog order wins. Key subsets are resolved against the
    /// full column list regardless, so a key column outside the filter still
    /// shows up in the key sets.
    pub column_filter: Option<Vec<String>>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            use_nulls: true,
            with_primary_key: false,
            with_replica_identity: false,
            column_filter: None,
        }
    }
}

/// Reads table structures through a borrowed client or transaction.
///
/// When constructed over a [`tokio_postgres::Transaction`], every catalog
/// query observes that transaction's snapshot, which lets a caller fetch
/// many tables (and dump their data) under one consistent view. Queries run
/// strictly sequentially; the reader keeps no state between calls.
pub struct StructureReader<'a, C> {
    client: &'a C,
}

impl<'a, C: GenericClient + Sync> StructureReader<'a, C> {
    pub fn new(client: &'a C) -> StructureReader<'a, C> {
        StructureReader { client }
    }

    /// Fetches the complete structure of one table. All-or-nothing: any
    /// resolution or query failure aborts the whole fetch, there is no
    /// partial structure.
    #[instrument(skip(self, options))]
    pub async fn fetch_table_structure(
        &self,
        schema: &str,
        table: &str,
        options: &FetchOptions,
    ) -> Result<TableStructure> {
        let table_oid = self.resolve_table_oid(schema, table).await?.ok_or_else(|| {
            PgStructureError::TableNotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            }
        })?;

        let attribute_rows = self.get_attributes(table_oid).await?;
        ensure_catalog_order(&attribute_rows, schema, table)?;

        let type_oids = attribute_rows
            .iter()
            .map(|r| r.type_oid)
            .unique()
            .collect_vec();
        let resolver = TypeResolver::new(self.get_type_closure(&type_oids).await?);

        let physical_rows = match &options.column_filter {
            Some(filter) => attribute_rows
                .iter()
                .filter(|r| filter.contains(&r.name))
                .cloned()
                .collect_vec(),
            None => attribute_rows.clone(),
        };
        let physical_columns =
            build_column_set(&physical_rows, &resolver, options.use_nulls, schema, table)?;

        let primary_key_columns = if options.with_primary_key {
            let key_names = self.get_primary_key_columns(table_oid).await?;
            if key_names.is_empty() {
                None
            } else {
                Some(self.build_key_set(
                    &attribute_rows,
                    &key_names,
                    &resolver,
                    options,
                    schema,
                    table,
                )?)
            }
        } else {
            None
        };

        let replica_identity = if options.with_replica_identity {
            Some(
                self.resolve_replica_identity(
                    table_oid,
                    &attribute_rows,
                    &resolver,
                    options,
                    schema,
                    table,
                )
                .await?,
            )
        } else {
            None
        };

        Ok(TableStructure {
            physical_columns,
            primary_key_columns,
            replica_identity,
        })
    }

    /// Resolves the table's replica identity through the four catalog
    /// policies: DEFAULT borrows the primary key (or degrades to `Nothing`
    /// without one), USING INDEX reads the marked index, FULL and NOTHING
    /// map to their sentinels.
    async fn resolve_replica_identity(
        &self,
        table_oid: u32,
        attribute_rows: &[AttributeRow],
        resolver: &TypeResolver,
        options: &FetchOptions,
        schema: &str,
        table: &str,
    ) -> Result<ReplicaIdentity> {
        match self
            .get_replica_identity_policy(table_oid, schema, table)
            .await?
        {
            ReplicaIdentityPolicy::Full => Ok(ReplicaIdentity::FullRow),
            ReplicaIdentityPolicy::Nothing => Ok(ReplicaIdentity::Nothing),
            ReplicaIdentityPolicy::Default => {
                let key_names = self.get_primary_key_columns(table_oid).await?;
                if key_names.is_empty() {
                    Ok(ReplicaIdentity::Nothing)
                } else {
                    Ok(ReplicaIdentity::Key(self.build_key_set(
                        attribute_rows,
                        &key_names,
                        resolver,
                        options,
                        schema,
                        table,
                    )?))
                }
            }
            ReplicaIdentityPolicy::UsingIndex => {
                let key_names = self.get_replica_identity_index_columns(table_oid).await?;
                if key_names.is_empty() {
                    return Err(PgStructureError::AmbiguousReplicaIdentity {
                        schema: schema.to_string(),
                        table: table.to_string(),
                    });
                }
                Ok(ReplicaIdentity::Key(self.build_key_set(
                    attribute_rows,
                    &key_names,
                    resolver,
                    options,
                    schema,
                    table,
                )?))
            }
        }
    }

    fn build_key_set(
        &self,
        attribute_rows: &[AttributeRow],
        key_names: &[String],
        resolver: &TypeResolver,
        options: &FetchOptions,
        schema: &str,
        table: &str,
    ) -> Result<ColumnSet> {
        let key_rows = rows_in_key_order(attribute_rows, key_names).ok_or_else(|| {
            PgStructureError::CorruptColumnSet {
                schema: schema.to_string(),
                table: table.to_string(),
                reason: format!(
                    "key columns {:?} are not all present in the attribute list",
                    key_names
                ),
            }
        })?;

        build_column_set(&key_rows, resolver, options.use_nulls, schema, table)
    }
}

/// Fetches one table's structure on a bare connection, opening and
/// committing its own read-only transaction. Callers that need several
/// tables (or a data dump) under one snapshot should open the transaction
/// themselves and use [`StructureReader`] directly.
pub async fn fetch_table_structure(
    connection: &mut PostgresConnection,
    schema: &str,
    table: &str,
    options: &FetchOptions,
) -> Result<TableStructure> {
    let tx = connection.read_only_transaction().await?;
    let structure = StructureReader::new(&tx)
        .fetch_table_structure(schema, table, options)
        .await?;
    tx.commit().await?;
    Ok(structure)
}

/// Lists a schema's tables on a bare connection under its own read-only
/// transaction. See [`StructureReader::list_tables`] for ordering semantics.
pub async fn list_tables(connection: &mut PostgresConnection, schema: &str) -> Result<Vec<String>> {
    let tx = connection.read_only_transaction().await?;
    let tables = StructureReader::new(&tx).list_tables(schema).await?;
    tx.commit().await?;
    Ok(tables)
}
