use thiserror::Error;

#[derive(Error, Debug)]
pub enum PgStructureError {
    #[error("Error from postgres: `{0}`")]
    PostgresError(#[from] tokio_postgres::Error),

    #[error("Error from postgres: `{source}` when executing query: `{query}`")]
    PostgresErrorWithQuery {
        query: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("Table '{schema}.{table}' does not exist")]
    TableNotFound { schema: String, table: String },

    #[error("Column '{column}' of table '{schema}.{table}' has type '{type_name}' which has no portable representation")]
    UnsupportedType {
        type_name: String,
        column: String,
        schema: String,
        table: String,
    },

    #[error("Table '{schema}.{table}' has replica identity USING INDEX but no index is marked as the replica identity")]
    AmbiguousReplicaIdentity { schema: String, table: String },

    #[error("Inconsistent column set for table '{schema}.{table}': {reason}")]
    CorruptColumnSet {
        schema: String,
        table: String,
        reason: String,
    },

    #[error("Unsupported postgres version: `{0}`. Only version 12 and up is supported")]
    UnsupportedPostgresVersion(i32),

    #[error("Invalid response when checking postgres version")]
    InvalidPostgresVersionResponse,

    #[error("Unknown replica identity policy '{0}'")]
    UnknownReplicaIdentityPolicy(char),

    #[error("Unknown column generation kind '{0}'")]
    UnknownGenerationKind(char),

    #[error("Unknown pg_type.typtype value '{0}'")]
    UnknownTypeKind(char),
}

pub type Result<T = ()> = std::result::Result<T, PgStructureError>;
