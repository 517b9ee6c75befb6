use crate::{PgStructureError, Result};
use std::fmt::Display;
use tokio::task::JoinHandle;
use tokio_postgres::row::RowIndex;
use tokio_postgres::types::{FromSqlOwned, ToSql};
use tokio_postgres::{Client, GenericClient, NoTls, Row, Transaction};

/// A connected postgres client together with the spawned task driving the
/// actual socket. This is the "bare connection" entry point: structure
/// fetches against it open their own read-only transaction. Callers that
/// need several fetches (or a data dump) under one snapshot call
/// [`PostgresConnection::read_only_transaction`] and drive the readers
/// through that transaction instead.
pub struct PostgresConnection {
    client: Client,
    join_handle: JoinHandle<Result<()>>,
    version: i32,
}

impl PostgresConnection {
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

        // The connection object performs the actual communication with the database,
        // so spawn it off to run on its own.
        let join_handle = tokio::spawn(async move {
            match connection.await {
                Err(e) => Err(PgStructureError::PostgresError(e)),
                Ok(_) => Ok(()),
            }
        });

        let messages = client.simple_query("SHOW server_version_num;").await?;
        let row = messages
            .iter()
            .find_map(|m| match m {
                tokio_postgres::SimpleQueryMessage::Row(row) => Some(row),
                _ => None,
            })
            .ok_or(PgStructureError::InvalidPostgresVersionResponse)?;

        let version: i32 = row
            .get(0)
            .ok_or(PgStructureError::InvalidPostgresVersionResponse)?
            .parse()
            .map_err(|_| PgStructureError::InvalidPostgresVersionResponse)?;

        // attgenerated and the generation expressions we read only exist
        // from postgres 12 onwards.
        if version < 120000 {
            return Err(PgStructureError::UnsupportedPostgresVersion(version));
        }
        let version = version / 1000;

        Ok(PostgresConnection {
            client,
            join_handle,
            version,
        })
    }

    /// Starts a read-only transaction. Every catalog query executed through
    /// the returned transaction observes the same snapshot.
    pub async fn read_only_transaction(&mut self) -> Result<Transaction<'_>> {
        let tx = self
            .client
            .build_transaction()
            .read_only(true)
            .start()
            .await?;
        Ok(tx)
    }

    pub async fn execute_non_query(&self, sql: &str) -> Result {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| PgStructureError::PostgresErrorWithQuery {
                source: e,
                query: sql.to_string(),
            })?;

        Ok(())
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Major server version, e.g. 15 for 15.4.
    pub fn version(&self) -> i32 {
        self.version
    }
}

impl Drop for PostgresConnection {
    fn drop(&mut self) {
        self.join_handle.abort();
    }
}

/// Runs a parameterized catalog query against anything query-capable (a bare
/// client or an open transaction) and maps each row through [`FromRow`].
/// Failures carry the query text, since a plain postgres error is useless
/// for diagnosing which catalog read broke.
pub(crate) async fn query_rows<T, C>(
    client: &C,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> Result<Vec<T>>
where
    T: FromRow,
    C: GenericClient + Sync,
{
    let query_results =
        client
            .query(sql, params)
            .await
            .map_err(|e| PgStructureError::PostgresErrorWithQuery {
                source: e,
                query: sql.to_string(),
            })?;

    let mut output = Vec::with_capacity(query_results.len());

    for row in query_results.into_iter() {
        output.push(T::from_row(row)?);
    }

    Ok(output)
}

pub(crate) trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self>;
}

impl<T1: FromSqlOwned> FromRow for (T1,) {
    fn from_row(row: Row) -> Result<Self> {
        Ok((row.try_get(0)?,))
    }
}

/// Decodes a single-byte `"char"` catalog flag (attgenerated, relreplident)
/// into a typed enum.
pub(crate) trait FromPgChar: Sized {
    fn from_pg_char(c: char) -> Result<Self>;
}

pub(crate) trait RowEnumExt {
    fn try_get_enum_value<T: FromPgChar, I: RowIndex + Display>(&self, idx: I) -> Result<T>;
}

impl RowEnumExt for Row {
    fn try_get_enum_value<T: FromPgChar, I: RowIndex + Display>(&self, idx: I) -> Result<T> {
        let value: i8 = self.try_get(idx)?;
        let c = value as u8 as char;
        T::from_pg_char(c)
    }
}
