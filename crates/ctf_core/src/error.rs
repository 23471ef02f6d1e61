//! Error types for map and configuration handling.
//!
//! The decision engine itself never fails: missing routes, empty ray casts and
//! firing on cooldown are ordinary outcomes. Errors only arise when external
//! data (maps, configuration) is handed to the core.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the core crate.
#[derive(Debug, Error)]
pub enum GameError {
    /// Map has a zero dimension.
    #[error("Map '{name}' has invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Map name.
        name: String,
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// Box layer does not match the declared dimensions.
    #[error("Map '{name}' row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Map name.
        name: String,
        /// Offending row index.
        row: usize,
        /// Cells found in the row.
        found: usize,
        /// Cells expected per row.
        expected: usize,
    },

    /// Box layer row count does not match the declared height.
    #[error("Map '{name}' has {found} rows, expected {expected}")]
    RowCount {
        /// Map name.
        name: String,
        /// Rows found.
        found: usize,
        /// Rows expected.
        expected: usize,
    },

    /// Unknown obstacle code in the box layer.
    #[error("Unknown obstacle code {code} at ({x}, {y})")]
    UnknownObstacle {
        /// Raw code.
        code: u8,
        /// Cell column.
        x: usize,
        /// Cell row.
        y: usize,
    },

    /// Unsupported number of tanks.
    #[error("Map '{name}' has {count} start positions, expected 2 to 6")]
    StartPositionCount {
        /// Map name.
        name: String,
        /// Number of start positions declared.
        count: usize,
    },

    /// A position lies outside the map.
    #[error("{what} ({x}, {y}) lies outside the map")]
    OutOfBounds {
        /// What was being placed.
        what: String,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },

    /// Configuration parse failure.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}
