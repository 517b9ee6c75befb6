use crate::models::{ColumnAttribute, ColumnSet, PortableColumn};
use crate::structure_reader::attribute::AttributeRow;
use crate::type_resolver::TypeResolver;
use crate::{PgStructureError, Result};
use itertools::Itertools;
use std::collections::HashMap;

/// Builds a [`ColumnSet`] from attribute rows, resolving each column's type.
///
/// Pure: row order is preserved, so the caller controls whether the set is in
/// catalog order (physical columns) or key order (key subsets). Duplicate
/// names indicate a broken input and fail rather than producing a set that
/// violates the alignment invariant.
pub(crate) fn build_column_set(
    rows: &[AttributeRow],
    resolver: &TypeResolver,
    use_nulls: bool,
    schema: &str,
    table: &str,
) -> Result<ColumnSet> {
    if let Some(duplicate) = rows.iter().map(|r| &r.name).duplicates().next() {
        return Err(PgStructureError::CorruptColumnSet {
            schema: schema.to_string(),
            table: table.to_string(),
            reason: format!("column '{}' appears more than once", duplicate),
        });
    }

    let mut columns = Vec::with_capacity(rows.len());
    let mut attributes = HashMap::with_capacity(rows.len());
    let mut names = Vec::with_capacity(rows.len());

    for row in rows {
        let portable_type = resolver
            .resolve(
                row.type_oid,
                row.type_modifier,
                row.dimensions,
                use_nulls && row.is_nullable,
            )
            .map_err(|unresolved| PgStructureError::UnsupportedType {
                type_name: unresolved.type_name,
                column: row.name.clone(),
                schema: schema.to_string(),
                table: table.to_string(),
            })?;

        columns.push(PortableColumn {
            name: row.name.clone(),
            portable_type,
        });
        attributes.insert(
            row.name.clone(),
            ColumnAttribute {
                type_oid: row.type_oid,
                type_modifier: row.type_modifier,
                ordinal_position: row.ordinal_position,
                has_default: row.has_default,
                generated: row.generated,
                expression: row.expression.clone(),
            },
        );
        names.push(row.name.clone());
    }

    Ok(ColumnSet {
        columns,
        attributes,
        names,
    })
}

/// Validates that attribute rows arrived in catalog order, with strictly
/// increasing ordinals. Gaps from dropped columns are fine; a repeated or
/// backwards ordinal means the attribute query returned garbage. Key subsets
/// are deliberately not checked, since index order routinely disagrees with
/// catalog order.
pub(crate) fn ensure_catalog_order(rows: &[AttributeRow], schema: &str, table: &str) -> Result {
    for pair in rows.windows(2) {
        if pair[1].ordinal_position <= pair[0].ordinal_position {
            return Err(PgStructureError::CorruptColumnSet {
                schema: schema.to_string(),
                table: table.to_string(),
                reason: format!(
                    "column '{}' (ordinal {}) follows '{}' (ordinal {})",
                    pair[1].name, pair[1].ordinal_position, pair[0].name, pair[0].ordinal_position
                ),
            });
        }
    }

    Ok(())
}

/// Reorders attribute rows into the given key-column order. `None` when a
/// key column is not among the rows, which means the key index and the
/// attribute list disagree.
pub(crate) fn rows_in_key_order(
    rows: &[AttributeRow],
    key_column_names: &[String],
) -> Option<Vec<AttributeRow>> {
    key_column_names
        .iter()
        .map(|name| rows.iter().find(|r| &r.name == name).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenerationKind, PortableType};
    use tokio_postgres::types::Type;

    fn attribute_row(name: &str, ordinal: i16, type_oid: u32, nullable: bool) -> AttributeRow {
        AttributeRow {
            name: name.to_string(),
            type_oid,
            type_modifier: -1,
            ordinal_position: ordinal,
            is_nullable: nullable,
            has_default: false,
            generated: GenerationKind::None,
            expression: String::new(),
            dimensions: 0,
        }
    }

    fn sample_rows() -> Vec<AttributeRow> {
        vec![
            attribute_row("id", 1, Type::INT8.oid(), false),
            attribute_row("name", 2, Type::TEXT.oid(), true),
            attribute_row("created", 4, Type::TIMESTAMPTZ.oid(), true),
        ]
    }

    #[test]
    fn views_are_aligned() {
        let set = build_column_set(
            &sample_rows(),
            &TypeResolver::builtin_only(),
            true,
            "public",
            "people",
        )
        .unwrap();

        assert_eq!(set.names.len(), set.columns.len());
        assert_eq!(set.names.len(), set.attributes.len());
        for (name, column) in set.names.iter().zip(&set.columns) {
            assert_eq!(name, &column.name);
            assert!(set.attributes.contains_key(name));
        }
        assert_eq!(set.names, vec!["id", "name", "created"]);
    }

    #[test]
    fn ordinals_survive_dropped_column_gaps() {
        let set = build_column_set(
            &sample_rows(),
            &TypeResolver::builtin_only(),
            false,
            "public",
            "people",
        )
        .unwrap();

        let ordinals: Vec<i16> = set
            .names
            .iter()
            .map(|n| set.attributes[n].ordinal_position)
            .collect();
        assert_eq!(ordinals, vec![1, 2, 4]);
    }

    #[test]
    fn use_nulls_wraps_only_nullable_columns() {
        let set = build_column_set(
            &sample_rows(),
            &TypeResolver::builtin_only(),
            true,
            "public",
            "people",
        )
        .unwrap();

        assert_eq!(set.columns[0].portable_type, PortableType::Int64);
        assert_eq!(
            set.columns[1].portable_type,
            PortableType::Nullable(Box::new(PortableType::Text { max_length: None }))
        );

        let without_nulls = build_column_set(
            &sample_rows(),
            &TypeResolver::builtin_only(),
            false,
            "public",
            "people",
        )
        .unwrap();
        assert!(without_nulls
            .columns
            .iter()
            .all(|c| !c.portable_type.is_nullable()));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut rows = sample_rows();
        rows.push(attribute_row("id", 5, Type::INT4.oid(), false));

        let err = build_column_set(
            &rows,
            &TypeResolver::builtin_only(),
            false,
            "public",
            "people",
        )
        .unwrap_err();

        assert!(matches!(
            err,
            PgStructureError::CorruptColumnSet { ref reason, .. } if reason.contains("'id'")
        ));
    }

    #[test]
    fn unresolved_type_names_column_and_table() {
        let mut rows = sample_rows();
        rows.push(attribute_row("payload", 5, Type::JSONB.oid(), true));

        let err = build_column_set(
            &rows,
            &TypeResolver::builtin_only(),
            true,
            "public",
            "people",
        )
        .unwrap_err();

        match err {
            PgStructureError::UnsupportedType {
                type_name,
                column,
                schema,
                table,
            } => {
                assert_eq!(type_name, "jsonb");
                assert_eq!(column, "payload");
                assert_eq!(schema, "public");
                assert_eq!(table, "people");
            }
            other => panic!("expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn non_increasing_ordinals_are_rejected() {
        let rows = vec![
            attribute_row("b", 3, Type::INT4.oid(), false),
            attribute_row("a", 1, Type::INT4.oid(), false),
        ];

        let err = ensure_catalog_order(&rows, "public", "people").unwrap_err();

        assert!(matches!(
            err,
            PgStructureError::CorruptColumnSet { ref reason, .. }
                if reason.contains("'a'") && reason.contains("'b'")
        ));
    }

    #[test]
    fn ordinal_gaps_pass_the_catalog_order_check() {
        // Dropped columns leave gaps; only going backwards is corrupt.
        assert!(ensure_catalog_order(&sample_rows(), "public", "people").is_ok());
        assert!(ensure_catalog_order(&[], "public", "people").is_ok());
    }

    #[test]
    fn key_order_wins_over_catalog_order() {
        let rows = sample_rows();
        let key_names = vec!["name".to_string(), "id".to_string()];

        let reordered = rows_in_key_order(&rows, &key_names).unwrap();
        let set = build_column_set(
            &reordered,
            &TypeResolver::builtin_only(),
            false,
            "public",
            "people",
        )
        .unwrap();

        assert_eq!(set.names, vec!["name", "id"]);
    }

    #[test]
    fn missing_key_column_is_detected() {
        let rows = sample_rows();
        let key_names = vec!["does_not_exist".to_string()];

        assert!(rows_in_key_order(&rows, &key_names).is_none());
    }
}
