//! Evaluation errors.
//!
//! When evaluation fails the output buffer contents are undefined; callers
//! must discard the whole result.

use std::fmt;

use crate::ErrorCode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    VarMismatch { expected: usize, got: usize },
    NullExpr,
    InvalidArg,
    Oom,
    TooManyVars { count: usize },
}

impl EvalErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::VarMismatch { .. } => ErrorCode::E3001,
            Self::NullExpr => ErrorCode::E3002,
            Self::InvalidArg => ErrorCode::E3003,
            Self::Oom => ErrorCode::E3004,
            Self::TooManyVars { .. } => ErrorCode::E3005,
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VarMismatch { expected, got } => {
                write!(f, "expected {expected} input buffers, got {got}")
            }
            Self::NullExpr => write!(f, "no compiled expression"),
            Self::InvalidArg => write!(f, "invalid argument"),
            Self::Oom => write!(f, "out of memory"),
            Self::TooManyVars { count } => write!(f, "too many variables ({count})"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    pub fn var_mismatch(expected: usize, got: usize) -> Self {
        Self::new(EvalErrorKind::VarMismatch { expected, got }, String::new())
    }

    pub fn null_expr() -> Self {
        Self::new(EvalErrorKind::NullExpr, String::new())
    }

    pub fn invalid_arg(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::InvalidArg, message)
    }

    pub fn oom() -> Self {
        Self::new(EvalErrorKind::Oom, "allocation failed")
    }

    pub fn too_many_vars(count: usize) -> Self {
        Self::new(EvalErrorKind::TooManyVars { count }, String::new())
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for EvalError {}

impl From<std::collections::TryReserveError> for EvalError {
    fn from(_: std::collections::TryReserveError) -> Self {
        EvalError::oom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_mismatch_message() {
        let err = EvalError::var_mismatch(2, 1);
        assert_eq!(err.to_string(), "expected 2 input buffers, got 1");
        assert_eq!(err.code(), ErrorCode::E3001);
    }

    #[test]
    fn allocation_failure_maps_to_oom() {
        let mut v: Vec<u8> = Vec::new();
        let err: EvalError = v.try_reserve(usize::MAX).unwrap_err().into();
        assert_eq!(err.kind, EvalErrorKind::Oom);
    }
}
