//! Compile-time errors.

use std::fmt;

use numex_ir::GeometryError;

use crate::{DslError, ErrorCode};

/// Typed compile failure category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    InvalidArg,
    InvalidArgType,
    Oom,
    VarUnspecified,
    VarMixed,
    ReductionInvalid,
    ComplexUnsupported,
    /// Expression syntax error at a 1-based byte offset.
    Parse {
        offset: usize,
    },
    /// DSL error at a 1-based line and column.
    Dsl {
        line: u32,
        column: u32,
    },
}

impl CompileErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } => ErrorCode::E0001,
            Self::InvalidArg => ErrorCode::E1001,
            Self::InvalidArgType => ErrorCode::E1002,
            Self::Oom => ErrorCode::E1003,
            Self::VarUnspecified => ErrorCode::E1004,
            Self::VarMixed => ErrorCode::E1005,
            Self::ReductionInvalid => ErrorCode::E1006,
            Self::ComplexUnsupported => ErrorCode::E1007,
            Self::Dsl { .. } => ErrorCode::E2001,
        }
    }
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArg => write!(f, "invalid argument"),
            Self::InvalidArgType => write!(f, "invalid argument type"),
            Self::Oom => write!(f, "out of memory"),
            Self::VarUnspecified => write!(f, "variable dtype unspecified"),
            Self::VarMixed => write!(f, "mixed auto and explicit variable dtypes"),
            Self::ReductionInvalid => write!(f, "invalid reduction"),
            Self::ComplexUnsupported => write!(f, "complex values unsupported on this target"),
            Self::Parse { offset } => write!(f, "parse error at offset {offset}"),
            Self::Dsl { line, column } => write!(f, "error at {line}:{column}"),
        }
    }
}

/// A compile error: kind plus detail message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, message: impl Into<String>) -> Self {
        CompileError {
            kind,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    /// Byte offset of a parse error.
    pub fn offset(&self) -> Option<usize> {
        match self.kind {
            CompileErrorKind::Parse { offset } => Some(offset),
            _ => None,
        }
    }

    pub fn invalid_arg(message: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::InvalidArg, message)
    }

    pub fn invalid_arg_type(message: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::InvalidArgType, message)
    }

    pub fn oom() -> Self {
        Self::new(CompileErrorKind::Oom, "allocation failed")
    }

    pub fn var_unspecified(name: &str) -> Self {
        Self::new(
            CompileErrorKind::VarUnspecified,
            format!("variable `{name}` has dtype auto and no output dtype was requested"),
        )
    }

    pub fn var_mixed() -> Self {
        Self::new(
            CompileErrorKind::VarMixed,
            "variables must be all auto or all explicit when an output dtype is requested",
        )
    }

    pub fn reduction_invalid(message: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::ReductionInvalid, message)
    }

    pub fn complex_unsupported() -> Self {
        Self::new(
            CompileErrorKind::ComplexUnsupported,
            "complex dtypes require a native complex calling convention",
        )
    }

    /// Syntax error. `offset` is 1-based and clamped to at least 1.
    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::new(
            CompileErrorKind::Parse {
                offset: offset.max(1),
            },
            message,
        )
    }

    pub fn dsl(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::Dsl { line, column }, message)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for CompileError {}

impl From<DslError> for CompileError {
    fn from(err: DslError) -> Self {
        CompileError::dsl(err.line, err.column, err.message)
    }
}

impl From<GeometryError> for CompileError {
    fn from(err: GeometryError) -> Self {
        CompileError::invalid_arg(err.to_string())
    }
}
