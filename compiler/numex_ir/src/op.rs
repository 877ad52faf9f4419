//! Operators, builtin functions and reductions.

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    BitNot,
    Not,
}

impl UnaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::Not => "not",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    #[inline]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    #[inline]
    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Bitwise and shift operators: integral operands only.
    #[inline]
    pub const fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr
        )
    }

    /// The comparison with operands swapped (`a < b` is `b > a`).
    pub const fn flipped(self) -> BinaryOp {
        match self {
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::Le => BinaryOp::Ge,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::Ge => BinaryOp::Le,
            other => other,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// Reductions collapse an array-valued argument to one value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ReduceOp {
    Sum,
    Prod,
    Mean,
    Min,
    Max,
    Any,
    All,
}

impl ReduceOp {
    pub const fn name(self) -> &'static str {
        match self {
            ReduceOp::Sum => "sum",
            ReduceOp::Prod => "prod",
            ReduceOp::Mean => "mean",
            ReduceOp::Min => "min",
            ReduceOp::Max => "max",
            ReduceOp::Any => "any",
            ReduceOp::All => "all",
        }
    }

    /// Partial results over disjoint runs can be combined with the same reduction.
    pub const fn combines_partials(self) -> bool {
        matches!(
            self,
            ReduceOp::Sum | ReduceOp::Min | ReduceOp::Max | ReduceOp::Any | ReduceOp::All
        )
    }
}

/// Builtin elementwise functions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Builtin {
    // Unary float math
    Acos,
    Acosh,
    Asin,
    Asinh,
    Atan,
    Atanh,
    Cbrt,
    Cos,
    Cosh,
    Cospi,
    Erf,
    Erfc,
    Exp,
    Exp10,
    Exp2,
    Expm1,
    Lgamma,
    Log,
    Log10,
    Log1p,
    Log2,
    Sin,
    Sinh,
    Sinpi,
    Sqrt,
    Tan,
    Tanh,
    Tgamma,
    Fac,

    // Unary, dtype preserving
    Abs,
    Ceil,
    Floor,
    Round,
    Rint,
    Trunc,
    Sign,
    Square,
    Conj,
    Real,
    Imag,

    // Binary float math
    Atan2,
    Copysign,
    Fdim,
    Fmax,
    Fmin,
    Fmod,
    Hypot,
    Ldexp,
    Logaddexp,
    Nextafter,
    Remainder,
    Ncr,
    Npr,

    // Ternary
    Fma,
    Where,

    // Strings
    StartsWith,
    EndsWith,
    Contains,

    // Casts
    CastInt,
    CastFloat,
    CastBool,
}

impl Builtin {
    pub const fn arity(self) -> usize {
        match self {
            Builtin::Atan2
            | Builtin::Copysign
            | Builtin::Fdim
            | Builtin::Fmax
            | Builtin::Fmin
            | Builtin::Fmod
            | Builtin::Hypot
            | Builtin::Ldexp
            | Builtin::Logaddexp
            | Builtin::Nextafter
            | Builtin::Remainder
            | Builtin::Ncr
            | Builtin::Npr
            | Builtin::StartsWith
            | Builtin::EndsWith
            | Builtin::Contains => 2,
            Builtin::Fma | Builtin::Where => 3,
            _ => 1,
        }
    }

    /// Functions whose integral and bool operands compute in `float64`.
    pub const fn is_float_math(self) -> bool {
        matches!(
            self,
            Builtin::Acos
                | Builtin::Acosh
                | Builtin::Asin
                | Builtin::Asinh
                | Builtin::Atan
                | Builtin::Atanh
                | Builtin::Cbrt
                | Builtin::Cos
                | Builtin::Cosh
                | Builtin::Cospi
                | Builtin::Erf
                | Builtin::Erfc
                | Builtin::Exp
                | Builtin::Exp10
                | Builtin::Exp2
                | Builtin::Expm1
                | Builtin::Lgamma
                | Builtin::Log
                | Builtin::Log10
                | Builtin::Log1p
                | Builtin::Log2
                | Builtin::Sin
                | Builtin::Sinh
                | Builtin::Sinpi
                | Builtin::Sqrt
                | Builtin::Tan
                | Builtin::Tanh
                | Builtin::Tgamma
                | Builtin::Fac
                | Builtin::Atan2
                | Builtin::Copysign
                | Builtin::Fdim
                | Builtin::Fmax
                | Builtin::Fmin
                | Builtin::Fmod
                | Builtin::Hypot
                | Builtin::Ldexp
                | Builtin::Logaddexp
                | Builtin::Nextafter
                | Builtin::Remainder
                | Builtin::Ncr
                | Builtin::Npr
                | Builtin::Fma
        )
    }

    pub const fn is_string_fn(self) -> bool {
        matches!(
            self,
            Builtin::StartsWith | Builtin::EndsWith | Builtin::Contains
        )
    }

    /// Builtins that accept complex operands.
    pub const fn supports_complex(self) -> bool {
        matches!(
            self,
            Builtin::Sqrt | Builtin::Conj | Builtin::Real | Builtin::Imag | Builtin::Abs
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Builtin::Acos => "acos",
            Builtin::Acosh => "acosh",
            Builtin::Asin => "asin",
            Builtin::Asinh => "asinh",
            Builtin::Atan => "atan",
            Builtin::Atanh => "atanh",
            Builtin::Cbrt => "cbrt",
            Builtin::Cos => "cos",
            Builtin::Cosh => "cosh",
            Builtin::Cospi => "cospi",
            Builtin::Erf => "erf",
            Builtin::Erfc => "erfc",
            Builtin::Exp => "exp",
            Builtin::Exp10 => "exp10",
            Builtin::Exp2 => "exp2",
            Builtin::Expm1 => "expm1",
            Builtin::Lgamma => "lgamma",
            Builtin::Log => "log",
            Builtin::Log10 => "log10",
            Builtin::Log1p => "log1p",
            Builtin::Log2 => "log2",
            Builtin::Sin => "sin",
            Builtin::Sinh => "sinh",
            Builtin::Sinpi => "sinpi",
            Builtin::Sqrt => "sqrt",
            Builtin::Tan => "tan",
            Builtin::Tanh => "tanh",
            Builtin::Tgamma => "tgamma",
            Builtin::Fac => "fac",
            Builtin::Abs => "abs",
            Builtin::Ceil => "ceil",
            Builtin::Floor => "floor",
            Builtin::Round => "round",
            Builtin::Rint => "rint",
            Builtin::Trunc => "trunc",
            Builtin::Sign => "sign",
            Builtin::Square => "square",
            Builtin::Conj => "conj",
            Builtin::Real => "real",
            Builtin::Imag => "imag",
            Builtin::Atan2 => "atan2",
            Builtin::Copysign => "copysign",
            Builtin::Fdim => "fdim",
            Builtin::Fmax => "fmax",
            Builtin::Fmin => "fmin",
            Builtin::Fmod => "fmod",
            Builtin::Hypot => "hypot",
            Builtin::Ldexp => "ldexp",
            Builtin::Logaddexp => "logaddexp",
            Builtin::Nextafter => "nextafter",
            Builtin::Remainder => "remainder",
            Builtin::Ncr => "ncr",
            Builtin::Npr => "npr",
            Builtin::Fma => "fma",
            Builtin::Where => "where",
            Builtin::StartsWith => "startswith",
            Builtin::EndsWith => "endswith",
            Builtin::Contains => "contains",
            Builtin::CastInt => "int",
            Builtin::CastFloat => "float",
            Builtin::CastBool => "bool",
        }
    }
}

/// What a function-call name resolves to.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Callee {
    Builtin(Builtin),
    /// `pow(a, b)` is the `**` operator.
    Binary(BinaryOp),
    Reduce(ReduceOp),
    /// Named constants (`pi`, `e`), callable with or without parentheses.
    Constant(f64),
}

impl Callee {
    pub const fn arity(self) -> usize {
        match self {
            Callee::Builtin(b) => b.arity(),
            Callee::Binary(_) => 2,
            Callee::Reduce(_) => 1,
            Callee::Constant(_) => 0,
        }
    }
}

/// Resolve a function name, including the NumPy-style `arc*` aliases.
pub fn lookup_callee(name: &str) -> Option<Callee> {
    let builtin = match name {
        "acos" | "arccos" => Builtin::Acos,
        "acosh" | "arccosh" => Builtin::Acosh,
        "asin" | "arcsin" => Builtin::Asin,
        "asinh" | "arcsinh" => Builtin::Asinh,
        "atan" | "arctan" => Builtin::Atan,
        "atanh" | "arctanh" => Builtin::Atanh,
        "atan2" | "arctan2" => Builtin::Atan2,
        "cbrt" => Builtin::Cbrt,
        "cos" => Builtin::Cos,
        "cosh" => Builtin::Cosh,
        "cospi" => Builtin::Cospi,
        "erf" => Builtin::Erf,
        "erfc" => Builtin::Erfc,
        "exp" => Builtin::Exp,
        "exp10" => Builtin::Exp10,
        "exp2" => Builtin::Exp2,
        "expm1" => Builtin::Expm1,
        "lgamma" => Builtin::Lgamma,
        "log" | "ln" => Builtin::Log,
        "log10" => Builtin::Log10,
        "log1p" => Builtin::Log1p,
        "log2" => Builtin::Log2,
        "sin" => Builtin::Sin,
        "sinh" => Builtin::Sinh,
        "sinpi" => Builtin::Sinpi,
        "sqrt" => Builtin::Sqrt,
        "tan" => Builtin::Tan,
        "tanh" => Builtin::Tanh,
        "tgamma" => Builtin::Tgamma,
        "fac" => Builtin::Fac,
        "abs" => Builtin::Abs,
        "ceil" => Builtin::Ceil,
        "floor" => Builtin::Floor,
        "round" => Builtin::Round,
        "rint" => Builtin::Rint,
        "trunc" => Builtin::Trunc,
        "sign" => Builtin::Sign,
        "square" => Builtin::Square,
        "conj" => Builtin::Conj,
        "real" => Builtin::Real,
        "imag" => Builtin::Imag,
        "copysign" => Builtin::Copysign,
        "fdim" => Builtin::Fdim,
        "fmax" => Builtin::Fmax,
        "fmin" => Builtin::Fmin,
        "fmod" => Builtin::Fmod,
        "hypot" => Builtin::Hypot,
        "ldexp" => Builtin::Ldexp,
        "logaddexp" => Builtin::Logaddexp,
        "nextafter" => Builtin::Nextafter,
        "remainder" => Builtin::Remainder,
        "ncr" => Builtin::Ncr,
        "npr" => Builtin::Npr,
        "fma" => Builtin::Fma,
        "where" => Builtin::Where,
        "startswith" => Builtin::StartsWith,
        "endswith" => Builtin::EndsWith,
        "contains" => Builtin::Contains,
        "int" => Builtin::CastInt,
        "float" => Builtin::CastFloat,
        "bool" => Builtin::CastBool,
        "pow" => return Some(Callee::Binary(BinaryOp::Pow)),
        "sum" => return Some(Callee::Reduce(ReduceOp::Sum)),
        "prod" => return Some(Callee::Reduce(ReduceOp::Prod)),
        "mean" => return Some(Callee::Reduce(ReduceOp::Mean)),
        "min" => return Some(Callee::Reduce(ReduceOp::Min)),
        "max" => return Some(Callee::Reduce(ReduceOp::Max)),
        "any" => return Some(Callee::Reduce(ReduceOp::Any)),
        "all" => return Some(Callee::Reduce(ReduceOp::All)),
        "pi" => return Some(Callee::Constant(std::f64::consts::PI)),
        "e" => return Some(Callee::Constant(std::f64::consts::E)),
        _ => return None,
    };
    Some(Callee::Builtin(builtin))
}

/// The operation carried by a tree `Operation` node.
///
/// `Convert` is the conversion node: arity 1, no operator, distinct input
/// and output dtypes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OpKind {
    Unary(UnaryOp),
    Binary(BinaryOp),
    Call(Builtin),
    Reduce(ReduceOp),
    Convert,
}

impl OpKind {
    /// Operations that accept complex operands.
    pub const fn supports_complex(self) -> bool {
        match self {
            OpKind::Unary(op) => matches!(op, UnaryOp::Neg),
            OpKind::Binary(op) => matches!(
                op,
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow
            ),
            OpKind::Call(b) => b.supports_complex(),
            OpKind::Reduce(op) => !matches!(op, ReduceOp::Min | ReduceOp::Max),
            OpKind::Convert => true,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Unary(op) => f.write_str(op.symbol()),
            OpKind::Binary(op) => f.write_str(op.symbol()),
            OpKind::Call(b) => f.write_str(b.name()),
            OpKind::Reduce(op) => f.write_str(op.name()),
            OpKind::Convert => f.write_str("convert"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_the_same_builtin() {
        assert_eq!(lookup_callee("arccos"), lookup_callee("acos"));
        assert_eq!(lookup_callee("ln"), Some(Callee::Builtin(Builtin::Log)));
        assert_eq!(lookup_callee("pow"), Some(Callee::Binary(BinaryOp::Pow)));
        assert_eq!(lookup_callee("nope"), None);
    }

    #[test]
    fn arities() {
        assert_eq!(Callee::Builtin(Builtin::Where).arity(), 3);
        assert_eq!(Callee::Builtin(Builtin::Hypot).arity(), 2);
        assert_eq!(Callee::Reduce(ReduceOp::Sum).arity(), 1);
        assert_eq!(Callee::Constant(1.0).arity(), 0);
    }

    #[test]
    fn complex_support_excludes_comparisons_and_min_max() {
        assert!(OpKind::Binary(BinaryOp::Pow).supports_complex());
        assert!(!OpKind::Binary(BinaryOp::Lt).supports_complex());
        assert!(!OpKind::Reduce(ReduceOp::Max).supports_complex());
        assert!(OpKind::Reduce(ReduceOp::Mean).supports_complex());
        assert!(OpKind::Convert.supports_complex());
    }
}
