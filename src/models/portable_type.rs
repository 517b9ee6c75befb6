use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A column type resolved away from postgres oids into the closed set of
/// representations the replication target supports. This is what schema
/// drift detection compares between polls, so two fetches of an unchanged
/// table must yield equal values.
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub enum PortableType {
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Variable-length text; `max_length` is the declared bound for
    /// `varchar(n)`, `None` for unconstrained `text`/`varchar`.
    Text { max_length: Option<i32> },
    /// Blank-padded or bit-string types with a fixed declared length.
    FixedText { length: i32 },
    Binary,
    Date,
    /// Timestamp or time-of-day with a fractional-second precision of 0..=6.
    DateTime { precision: i32 },
    Uuid,
    Ipv4,
    Ipv6,
    Decimal { precision: u16, scale: u16 },
    Array(Box<PortableType>),
    Nullable(Box<PortableType>),
}

impl PortableType {
    /// Whether the representation has a null channel. Arrays do not: the
    /// target stores array columns densely, so a nullable array cannot be
    /// expressed and the nullability preference is dropped for them.
    pub fn supports_null_channel(&self) -> bool {
        !matches!(self, PortableType::Array(_))
    }

    /// Wraps in [`PortableType::Nullable`] if the representation allows it.
    /// Already-nullable types are not wrapped twice.
    pub fn into_nullable(self) -> PortableType {
        if !self.supports_null_channel() || matches!(self, PortableType::Nullable(_)) {
            self
        } else {
            PortableType::Nullable(Box::new(self))
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, PortableType::Nullable(_))
    }
}

impl Display for PortableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PortableType::Int16 => write!(f, "Int16"),
            PortableType::Int32 => write!(f, "Int32"),
            PortableType::Int64 => write!(f, "Int64"),
            PortableType::UInt8 => write!(f, "UInt8"),
            PortableType::UInt16 => write!(f, "UInt16"),
            PortableType::UInt32 => write!(f, "UInt32"),
            PortableType::UInt64 => write!(f, "UInt64"),
            PortableType::Float32 => write!(f, "Float32"),
            PortableType::Float64 => write!(f, "Float64"),
            PortableType::Text { max_length: None } => write!(f, "Text"),
            PortableType::Text {
                max_length: Some(n),
            } => write!(f, "Text({})", n),
            PortableType::FixedText { length } => write!(f, "FixedText({})", length),
            PortableType::Binary => write!(f, "Binary"),
            PortableType::Date => write!(f, "Date"),
            PortableType::DateTime { precision } => write!(f, "DateTime({})", precision),
            PortableType::Uuid => write!(f, "Uuid"),
            PortableType::Ipv4 => write!(f, "IPv4"),
            PortableType::Ipv6 => write!(f, "IPv6"),
            PortableType::Decimal { precision, scale } => {
                write!(f, "Decimal({}, {})", precision, scale)
            }
            PortableType::Array(inner) => write!(f, "Array({})", inner),
            PortableType::Nullable(inner) => write!(f, "Nullable({})", inner),
        }
    }
}
