//! Raw column metadata as reported by the native describe call.
//!
//! For the user-facing description, use `Column`.

/// Column metadata from a native describe.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// Oracle data type number.
    pub oracle_type: u8,
    /// Numeric precision (NUMBER) or 0.
    pub precision: i8,
    /// Numeric scale (NUMBER), fractional second precision (TIMESTAMP) or 0.
    pub scale: i8,
    /// Declared maximum size in bytes.
    pub max_size: u32,
    /// Whether NULL values are allowed.
    pub nullable: bool,
}

impl ColumnMetadata {
    /// Create metadata for a nullable column with no size information.
    pub fn new(name: impl Into<String>, oracle_type: u8) -> Self {
        Self {
            name: name.into(),
            oracle_type,
            precision: 0,
            scale: 0,
            max_size: 0,
            nullable: true,
        }
    }

    /// Set the declared maximum size.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set precision and scale.
    pub fn with_precision(mut self, precision: i8, scale: i8) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}
