use crate::client::FromPgChar;
use crate::models::PortableType;
use crate::{PgStructureError, Result};
use std::collections::HashMap;
use tokio_postgres::types::{Kind, Type};

/// Domains can be declared over other domains. Chains deeper than this are
/// rejected instead of recursing further, which turns a pathological catalog
/// into a reported error rather than a stack overflow.
const MAX_DOMAIN_DEPTH: usize = 8;

/// Varlena types reserve a 4-byte header inside their type modifier.
const VARHDRSZ: i32 = 4;

/// A type resolution failure, naming the type that has no portable
/// representation. The column-set builder attaches the column and table
/// context before surfacing it as [`PgStructureError::UnsupportedType`].
#[derive(Debug, Eq, PartialEq)]
pub struct UnresolvedType {
    pub type_name: String,
}

/// Catalog row for one non-builtin type, from the pg_type closure loaded at
/// fetch time.
#[derive(Debug, Clone)]
pub struct PgTypeEntry {
    pub name: String,
    pub kind: PgTypeKind,
    /// `typcategory = 'A'`: the type is the array companion of `element_oid`.
    pub is_array: bool,
    /// `typbasetype`, non-zero for domains.
    pub base_oid: u32,
    /// `typelem`, non-zero for array types.
    pub element_oid: u32,
    /// `typtypmod`: the modifier a domain imposes on its base type.
    pub modifier: i32,
}

/// Mirror of `pg_type.typtype`.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum PgTypeKind {
    Base,
    Composite,
    Domain,
    Enum,
    Pseudo,
    Range,
    Multirange,
}

impl FromPgChar for PgTypeKind {
    fn from_pg_char(c: char) -> Result<Self> {
        match c {
            'b' => Ok(PgTypeKind::Base),
            'c' => Ok(PgTypeKind::Composite),
            'd' => Ok(PgTypeKind::Domain),
            'e' => Ok(PgTypeKind::Enum),
            'p' => Ok(PgTypeKind::Pseudo),
            'r' => Ok(PgTypeKind::Range),
            'm' => Ok(PgTypeKind::Multirange),
            _ => Err(PgStructureError::UnknownTypeKind(c)),
        }
    }
}

/// Maps a postgres type oid plus its modifier to a [`PortableType`].
///
/// Pure: all catalog knowledge is captured up front, either in the builtin
/// scalar table or in the pg_type closure the resolver is constructed with,
/// so resolution itself performs no I/O and two resolvers built from the
/// same snapshot always agree.
pub struct TypeResolver {
    types: HashMap<u32, PgTypeEntry>,
}

impl TypeResolver {
    pub fn new(types: HashMap<u32, PgTypeEntry>) -> Self {
        TypeResolver { types }
    }

    /// Resolver with no user-defined types; only builtins resolve.
    pub fn builtin_only() -> Self {
        TypeResolver {
            types: HashMap::new(),
        }
    }

    /// Resolves a column's type. `dimensions` is `pg_attribute.attndims`:
    /// the declared array type contributes one `Array` wrap, declarations
    /// like `int[][]` contribute the rest. `nullable` requests a
    /// `Nullable` wrap, which is applied only where the representation has a
    /// null channel.
    pub fn resolve(
        &self,
        type_oid: u32,
        type_modifier: i32,
        dimensions: i32,
        nullable: bool,
    ) -> std::result::Result<PortableType, UnresolvedType> {
        let mut resolved = self.resolve_oid(type_oid, type_modifier, 0)?;

        if matches!(resolved, PortableType::Array(_)) {
            for _ in 1..dimensions.max(1) {
                resolved = PortableType::Array(Box::new(resolved));
            }
        }

        if nullable {
            resolved = resolved.into_nullable();
        }

        Ok(resolved)
    }

    fn resolve_oid(
        &self,
        type_oid: u32,
        type_modifier: i32,
        depth: usize,
    ) -> std::result::Result<PortableType, UnresolvedType> {
        if depth > MAX_DOMAIN_DEPTH {
            return Err(UnresolvedType {
                type_name: format!("oid {} (type nesting too deep)", type_oid),
            });
        }

        if let Some(ty) = Type::from_oid(type_oid) {
            // The array's modifier applies to its element, e.g. varchar(10)[]
            // stores the length bound on the array attribute.
            if let Kind::Array(element) = ty.kind() {
                let inner = self.resolve_oid(element.oid(), type_modifier, depth + 1)?;
                return Ok(PortableType::Array(Box::new(inner)));
            }

            return resolve_builtin(&ty, type_modifier).ok_or_else(|| UnresolvedType {
                type_name: ty.name().to_string(),
            });
        }

        let Some(entry) = self.types.get(&type_oid) else {
            return Err(UnresolvedType {
                type_name: format!("oid {}", type_oid),
            });
        };

        if entry.kind == PgTypeKind::Domain && entry.base_oid != 0 {
            // A domain carries its own modifier for the base type; the
            // column's modifier only applies when the domain declares none.
            let inner_modifier = if entry.modifier != -1 {
                entry.modifier
            } else {
                type_modifier
            };
            return self.resolve_oid(entry.base_oid, inner_modifier, depth + 1);
        }

        if entry.is_array && entry.element_oid != 0 {
            let inner = self.resolve_oid(entry.element_oid, type_modifier, depth + 1)?;
            return Ok(PortableType::Array(Box::new(inner)));
        }

        Err(UnresolvedType {
            type_name: entry.name.clone(),
        })
    }
}

fn resolve_builtin(ty: &Type, type_modifier: i32) -> Option<PortableType> {
    let resolved = match ty.name() {
        "bool" => PortableType::UInt8,
        "int2" => PortableType::Int16,
        "int4" => PortableType::Int32,
        "int8" => PortableType::Int64,
        "float4" => PortableType::Float32,
        "float8" => PortableType::Float64,
        "text" | "name" => PortableType::Text { max_length: None },
        "varchar" => PortableType::Text {
            max_length: varlena_length(type_modifier),
        },
        "bpchar" => match varlena_length(type_modifier) {
            Some(length) => PortableType::FixedText { length },
            // Bare `character` defaults to length 1.
            None => PortableType::FixedText { length: 1 },
        },
        "bit" => PortableType::FixedText {
            length: if type_modifier > 0 { type_modifier } else { 1 },
        },
        "varbit" => PortableType::Text {
            max_length: (type_modifier > 0).then_some(type_modifier),
        },
        "bytea" => PortableType::Binary,
        "date" => PortableType::Date,
        "timestamp" | "timestamptz" | "time" | "timetz" => PortableType::DateTime {
            precision: time_precision(type_modifier),
        },
        "uuid" => PortableType::Uuid,
        // inet can carry either address family; the wider representation
        // holds both.
        "inet" => PortableType::Ipv6,
        "numeric" => match numeric_precision_scale(type_modifier) {
            Some((precision, scale)) => PortableType::Decimal { precision, scale },
            // Unconstrained numeric: widest portable decimal.
            None => PortableType::Decimal {
                precision: 38,
                scale: 16,
            },
        },
        _ => return None,
    };

    Some(resolved)
}

/// Declared length bound of varchar/bpchar, `None` when unconstrained.
fn varlena_length(type_modifier: i32) -> Option<i32> {
    (type_modifier >= VARHDRSZ).then(|| type_modifier - VARHDRSZ)
}

/// (precision, scale) of a constrained numeric, packed as
/// `((precision << 16) | scale) + VARHDRSZ`.
fn numeric_precision_scale(type_modifier: i32) -> Option<(u16, u16)> {
    if type_modifier < VARHDRSZ {
        return None;
    }
    let packed = type_modifier - VARHDRSZ;
    Some((((packed >> 16) & 0xffff) as u16, (packed & 0xffff) as u16))
}

/// Fractional-second precision of timestamp/time; unconstrained means
/// microseconds.
fn time_precision(type_modifier: i32) -> i32 {
    if type_modifier >= 0 {
        type_modifier
    } else {
        6
    }
}
