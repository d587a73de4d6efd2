//! Error codes for all compiler diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E2001`) with the first digit
//! indicating the compiler phase. Used for `--explain` lookups and documentation.

use std::fmt;
use std::str::FromStr;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E1xxx: Model validation (names, signatures, parameter lists)
/// - E2xxx: Hierarchy resolution and method overriding
/// - E3xxx: Generator consistency checks
/// - E5xxx: Driver, declaration loading and artifact IO
/// - E9xxx: Internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Model Validation Errors (E1xxx)
    /// Invalid dispatch name casing
    E1001,
    /// Missing leading `self` parameter
    E1002,
    /// `self` parameter type does not match the owning class
    E1003,
    /// Invalid class name or nickname
    E1004,
    /// Invalid parcel name or nickname
    E1005,
    /// Required parameter after an optional one
    E1006,
    /// Malformed version string
    E1007,
    /// Illegal host alias or host exclusion
    E1008,
    /// Method declared twice in one class
    E1009,
    /// Invalid variable or function name
    E1010,
    /// Unsupported primitive width
    E1011,
    /// Missing or invalid constructor initializer
    E1012,

    // Hierarchy Errors (E2xxx)
    /// Override of a final method
    E2001,
    /// Override with an incompatible signature
    E2002,
    /// Parent class not defined
    E2003,
    /// Inheritance from a final class
    E2004,
    /// Class declared twice
    E2005,
    /// Parcel registered twice
    E2006,
    /// Parcel not registered
    E2007,
    /// Object type names no known class
    E2008,
    /// Inheritance cycle
    E2009,
    /// Session used outside its lifecycle
    E2010,

    // Generator Errors (E3xxx)
    /// Dispatch slot or offset disagrees with the parent class
    E3001,
    /// Member variables are not a prefix extension of the parent's
    E3002,
    /// Two artifacts claim the same output path
    E3003,

    // Driver Errors (E5xxx)
    /// Artifact could not be written
    E5001,
    /// Declaration file unreadable or malformed
    E5002,
    /// Bad command line
    E5003,
    /// Source or include directory missing
    E5004,

    // Internal Errors (E9xxx)
    /// Internal compiler error
    E9001,
}

impl ErrorCode {
    /// Every error code, in numeric order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E1006,
        ErrorCode::E1007,
        ErrorCode::E1008,
        ErrorCode::E1009,
        ErrorCode::E1010,
        ErrorCode::E1011,
        ErrorCode::E1012,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2007,
        ErrorCode::E2008,
        ErrorCode::E2009,
        ErrorCode::E2010,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E3003,
        ErrorCode::E5001,
        ErrorCode::E5002,
        ErrorCode::E5003,
        ErrorCode::E5004,
        ErrorCode::E9001,
    ];

    /// Get the numeric code as a string (e.g., "E1001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Model
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E1007 => "E1007",
            ErrorCode::E1008 => "E1008",
            ErrorCode::E1009 => "E1009",
            ErrorCode::E1010 => "E1010",
            ErrorCode::E1011 => "E1011",
            ErrorCode::E1012 => "E1012",
            // Hierarchy
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E2010 => "E2010",
            // Generator
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            // Driver
            ErrorCode::E5001 => "E5001",
            ErrorCode::E5002 => "E5002",
            ErrorCode::E5003 => "E5003",
            ErrorCode::E5004 => "E5004",
            // Internal
            ErrorCode::E9001 => "E9001",
        }
    }

    /// Check if this is a model validation error (E1xxx range).
    pub fn is_model_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    /// Check if this is a hierarchy or override error (E2xxx range).
    pub fn is_hierarchy_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    /// Check if this is a generator consistency error (E3xxx range).
    pub fn is_generator_error(&self) -> bool {
        self.as_str().starts_with("E3")
    }

    /// Check if this is a driver or IO error (E5xxx range).
    pub fn is_driver_error(&self) -> bool {
        self.as_str().starts_with("E5")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string does not name a known error code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownErrorCode(pub String);

impl fmt::Display for UnknownErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error code `{}`", self.0)
    }
}

impl std::error::Error for UnknownErrorCode {}

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == wanted)
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}
