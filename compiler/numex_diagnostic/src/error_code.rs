use std::fmt;

/// Stable error codes.
///
/// Format: E#### where the first digit indicates the phase:
/// - E0xxx: Expression syntax errors
/// - E1xxx: Compile errors
/// - E2xxx: DSL syntax errors
/// - E3xxx: Evaluation errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Syntax Errors (E0xxx)
    /// Malformed expression text or leftover input
    E0001,

    // Compile Errors (E1xxx)
    /// Invalid argument (bad dtype, geometry, too many variables)
    E1001,
    /// Operation not defined for its operand types
    E1002,
    /// Out of memory while compiling
    E1003,
    /// `auto` requested with an `auto` variable
    E1004,
    /// Mixed `auto` and explicit variable dtypes
    E1005,
    /// Nested reduction, or min/max over complex
    E1006,
    /// Complex values on a target without complex support
    E1007,

    // DSL Errors (E2xxx)
    /// DSL syntax or semantic error
    E2001,

    // Evaluation Errors (E3xxx)
    /// Input count does not match the compiled variables
    E3001,
    /// No compiled kernel
    E3002,
    /// Invalid evaluation argument (buffer size, block index)
    E3003,
    /// Out of memory while evaluating
    E3004,
    /// More inputs than the evaluator supports
    E3005,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E1007 => "E1007",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::E3005 => "E3005",
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        self.as_str().starts_with("E0")
    }

    pub fn is_compile_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    pub fn is_dsl_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    pub fn is_eval_error(&self) -> bool {
        self.as_str().starts_with("E3")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
