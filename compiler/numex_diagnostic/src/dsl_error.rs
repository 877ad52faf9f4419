use std::fmt;

/// A DSL syntax or semantic error at a 1-based line and column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DslError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl DslError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        DslError {
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for DslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for DslError {}
