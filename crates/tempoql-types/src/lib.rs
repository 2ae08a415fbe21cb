//! Core type definitions shared across the TempoQL front end.
//!
//! Identifier length limits, id aliases, time units with their SQL literal
//! suffixes, and the SQL data-type catalog. This crate sits at the bottom of
//! the workspace dependency graph and stays dependency-light on purpose.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifier limits
// ---------------------------------------------------------------------------

/// Maximum byte length of a database name. A name of exactly this length is
/// rejected; the longest accepted name is one byte shorter.
pub const DB_NAME_LEN: usize = 65;
/// Maximum byte length of a table name (same rejection rule as above).
pub const TABLE_NAME_LEN: usize = 193;
/// Maximum byte length of a column name or output alias.
pub const COL_NAME_LEN: usize = 65;
/// Maximum byte length of a function name.
pub const FUNC_NAME_LEN: usize = 65;
/// Maximum byte length of a rollup index name.
pub const INDEX_NAME_LEN: usize = 129;
/// Maximum byte length of a timezone string.
pub const TIMEZONE_LEN: usize = 96;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Column id within one table schema. Id 1 is reserved for the primary
/// timestamp column.
pub type ColId = i16;
/// Aggregate function id as registered in the function catalog.
pub type FuncId = u16;
/// Globally unique table identifier.
pub type TableUid = i64;
/// Virtual-node group id, assigned by the catalog at table creation.
pub type VgroupId = i32;

/// Column id of the primary timestamp column every table starts with.
pub const PRIMARY_TS_COL_ID: ColId = 1;

// ---------------------------------------------------------------------------
// Time units
// ---------------------------------------------------------------------------

/// Time unit of a duration literal or a window interval/sliding length.
///
/// The one-letter suffixes are those accepted in SQL duration literals
/// (`10m`, `1h`, `500a`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    /// Parse a duration-literal suffix character.
    #[must_use]
    pub fn from_suffix(suffix: char) -> Option<Self> {
        match suffix {
            'b' => Some(Self::Nanosecond),
            'u' => Some(Self::Microsecond),
            'a' => Some(Self::Millisecond),
            's' => Some(Self::Second),
            'm' => Some(Self::Minute),
            'h' => Some(Self::Hour),
            'd' => Some(Self::Day),
            'w' => Some(Self::Week),
            'n' => Some(Self::Month),
            'y' => Some(Self::Year),
            _ => None,
        }
    }

    /// The suffix character used in SQL duration literals.
    #[must_use]
    pub fn suffix(self) -> char {
        match self {
            Self::Nanosecond => 'b',
            Self::Microsecond => 'u',
            Self::Millisecond => 'a',
            Self::Second => 's',
            Self::Minute => 'm',
            Self::Hour => 'h',
            Self::Day => 'd',
            Self::Week => 'w',
            Self::Month => 'n',
            Self::Year => 'y',
        }
    }

    /// Stable one-byte wire code for the binary metadata encodings.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Nanosecond => 0,
            Self::Microsecond => 1,
            Self::Millisecond => 2,
            Self::Second => 3,
            Self::Minute => 4,
            Self::Hour => 5,
            Self::Day => 6,
            Self::Week => 7,
            Self::Month => 8,
            Self::Year => 9,
        }
    }

    /// Inverse of [`TimeUnit::code`].
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Nanosecond),
            1 => Some(Self::Microsecond),
            2 => Some(Self::Millisecond),
            3 => Some(Self::Second),
            4 => Some(Self::Minute),
            5 => Some(Self::Hour),
            6 => Some(Self::Day),
            7 => Some(Self::Week),
            8 => Some(Self::Month),
            9 => Some(Self::Year),
            _ => None,
        }
    }
}

/// Timestamp precision of a database, fixed at creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    #[default]
    Millisecond,
    Microsecond,
    Nanosecond,
}

// ---------------------------------------------------------------------------
// SQL data types
// ---------------------------------------------------------------------------

/// SQL column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Timestamp,
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    /// Variable-length byte string; the schema carries the declared width.
    Binary,
    /// Variable-length UCS-4 string; the schema carries the declared width.
    Nchar,
}

impl DataType {
    /// Storage width in bytes for fixed-size types, `None` for the
    /// variable-length ones.
    #[must_use]
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Bool | Self::TinyInt => Some(1),
            Self::SmallInt => Some(2),
            Self::Int | Self::Float => Some(4),
            Self::Timestamp | Self::BigInt | Self::Double => Some(8),
            Self::Binary | Self::Nchar => None,
        }
    }

    /// True for the numeric types (including the timestamp).
    #[must_use]
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Binary | Self::Nchar)
    }
}
