//! Operator symbol sets produced by the parser.
//!
//! The set is fixed (not user-extensible), so every consumer matches on
//! these enums exhaustively rather than going through trait objects.

/// Binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,

    // Elementwise ("dot") operators, matrix only
    DotAdd,
    DotSub,
    DotMul,
    DotDiv,
    DotPow,
    DotEq,
    DotNotEq,
    DotLt,
    DotLtEq,
    DotGt,
    DotGtEq,

    // Collection / matrix structure
    /// `**`: Kronecker product.
    Kron,
    /// `~`: horizontal concatenation, string concatenation.
    Concat,
    /// `|`: vertical concatenation, list/array union.
    Union,
    /// `&`: list/array intersection.
    Intersect,
    /// `\`: matrix left division.
    LDiv,
}

impl BinaryOp {
    /// Returns the source-level symbol for this operator.
    ///
    /// Used in error messages to show the exact operator that failed.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::DotAdd => ".+",
            Self::DotSub => ".-",
            Self::DotMul => ".*",
            Self::DotDiv => "./",
            Self::DotPow => ".^",
            Self::DotEq => ".=",
            Self::DotNotEq => ".!=",
            Self::DotLt => ".<",
            Self::DotLtEq => ".<=",
            Self::DotGt => ".>",
            Self::DotGtEq => ".>=",
            Self::Kron => "**",
            Self::Concat => "~",
            Self::Union => "|",
            Self::Intersect => "&",
            Self::LDiv => "\\",
        }
    }

    /// Whether this is one of the elementwise `.op` operators.
    pub const fn is_dot(self) -> bool {
        matches!(
            self,
            Self::DotAdd
                | Self::DotSub
                | Self::DotMul
                | Self::DotDiv
                | Self::DotPow
                | Self::DotEq
                | Self::DotNotEq
                | Self::DotLt
                | Self::DotLtEq
                | Self::DotGt
                | Self::DotGtEq
        )
    }

    /// Whether this is a plain comparison operator.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }

    /// Whether this is `&&` or `||`.
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// The scalar operator applied per element by a dot operator.
    ///
    /// Non-dot operators map to themselves.
    pub const fn elementwise(self) -> Self {
        match self {
            Self::DotAdd => Self::Add,
            Self::DotSub => Self::Sub,
            Self::DotMul => Self::Mul,
            Self::DotDiv => Self::Div,
            Self::DotPow => Self::Pow,
            Self::DotEq => Self::Eq,
            Self::DotNotEq => Self::NotEq,
            Self::DotLt => Self::Lt,
            Self::DotLtEq => Self::LtEq,
            Self::DotGt => Self::Gt,
            Self::DotGtEq => Self::GtEq,
            other => other,
        }
    }
}

/// Unary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    /// Postfix `'`: (conjugate) transpose.
    Transpose,
}

impl UnaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Plus => "+",
            Self::Not => "!",
            Self::Transpose => "'",
        }
    }
}

/// Assignment operators.
///
/// Everything except [`AssignOp::Assign`] is "inflected": the new value is
/// computed from the existing one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    /// `~=`
    Concat,
    /// `|=`
    Union,
    /// `.=`: fill every element of a matrix with a scalar.
    Fill,
    /// `++`
    Inc,
    /// `--`
    Dec,
}

impl AssignOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Mod => "%=",
            Self::Pow => "^=",
            Self::Concat => "~=",
            Self::Union => "|=",
            Self::Fill => ".=",
            Self::Inc => "++",
            Self::Dec => "--",
        }
    }

    /// Whether the operator combines the existing value with the right-hand side.
    pub const fn is_inflected(self) -> bool {
        !matches!(self, Self::Assign)
    }

    /// Whether the operator takes no right-hand side.
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Inc | Self::Dec)
    }

    /// Binary operator applied by an inflected assignment.
    ///
    /// `++`/`--` map to `+`/`-` with an implicit right operand of one;
    /// plain assignment and fill have no binary counterpart.
    pub const fn binary(self) -> Option<BinaryOp> {
        match self {
            Self::Add | Self::Inc => Some(BinaryOp::Add),
            Self::Sub | Self::Dec => Some(BinaryOp::Sub),
            Self::Mul => Some(BinaryOp::Mul),
            Self::Div => Some(BinaryOp::Div),
            Self::Mod => Some(BinaryOp::Mod),
            Self::Pow => Some(BinaryOp::Pow),
            Self::Concat => Some(BinaryOp::Concat),
            Self::Union => Some(BinaryOp::Union),
            Self::Assign | Self::Fill => None,
        }
    }
}

/// Dummy subscript selectors for matrices (`M[diag]`, `M[upper]`, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dummy {
    Diag,
    Upper,
    Lower,
    Real,
    Imag,
}

impl Dummy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diag => "diag",
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Real => "real",
            Self::Imag => "imag",
        }
    }
}
