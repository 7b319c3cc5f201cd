//! Error types for the scat-described crate.

/// Error type for all fallible operations in the scat-described crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescribedError {
    /// Returned when a coefficient type name is not recognized.
    #[error("unknown coefficient type: {0}")]
    UnknownCoeffType(String),

    /// Returned when a filter names a descriptor column that does not exist.
    #[error("unknown descriptor field: {0}")]
    UnknownField(String),

    /// Returned when a filter value cannot be parsed for its column.
    #[error("invalid value '{value}' for descriptor field '{field}'")]
    InvalidValue {
        /// Descriptor column name.
        field: String,
        /// Raw value that failed to parse.
        value: String,
    },

    /// Returned when a filter string is not of the form `field=v1,v2`.
    #[error("malformed filter '{0}', expected field=v1,v2")]
    MalformedFilter(String),

    /// Returned when the descriptor table and the value array disagree on the row count.
    #[error("descriptor table has {rows} rows but values have {columns} coefficients")]
    RowCountMismatch {
        /// Number of descriptor rows.
        rows: usize,
        /// Size of the coefficient axis of the value array.
        columns: usize,
    },

    /// Returned when a deserialized descriptor column is shorter or longer than the others.
    #[error("descriptor column '{column}' has {found} entries but the table has {rows} rows")]
    ColumnLengthMismatch {
        /// Column name.
        column: &'static str,
        /// Length of the `coeff_type` column.
        rows: usize,
        /// Length of the offending column.
        found: usize,
    },
}
