use crate::client::FromPgChar;
use crate::models::PortableType;
use crate::{PgStructureError, Result};
use serde::{Deserialize, Serialize};

/// One column of a [`ColumnSet`](crate::ColumnSet), in resolved form.
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct PortableColumn {
    pub name: String,
    pub portable_type: PortableType,
}

/// Raw catalog metadata for one physical column, keyed by column name in
/// [`ColumnSet::attributes`](crate::ColumnSet::attributes). This is the
/// unresolved counterpart of [`PortableColumn`]: the replication engine needs
/// the oid/typmod pair to decode binary row images, and the expressions to
/// know which columns it must not write back.
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct ColumnAttribute {
    /// Oid of the column's type in pg_type.
    pub type_oid: u32,
    /// Type-specific modifier, -1 when the type takes none.
    pub type_modifier: i32,
    /// 1-based position in catalog order. Dropped columns keep their slot in
    /// pg_attribute, so positions are strictly increasing but may have gaps.
    pub ordinal_position: i16,
    pub has_default: bool,
    pub generated: GenerationKind,
    /// Source text of the default or generation expression, empty if the
    /// column has neither.
    pub expression: String,
}

/// Mirror of `pg_attribute.attgenerated`.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Default, Serialize, Deserialize)]
pub enum GenerationKind {
    #[default]
    None,
    Stored,
    Virtual,
}

impl FromPgChar for GenerationKind {
    fn from_pg_char(c: char) -> Result<Self> {
        match c {
            '\0' => Ok(GenerationKind::None),
            's' => Ok(GenerationKind::Stored),
            'v' => Ok(GenerationKind::Virtual),
            _ => Err(PgStructureError::UnknownGenerationKind(c)),
        }
    }
}
