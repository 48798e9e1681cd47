//! Abstract syntax tree for the restricted expression grammar (§4.2).

/// A parsed expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Str(String),
    /// Constant (`pi`, `e`) or a dotted path to resolve against the
    /// evaluation scope (e.g. `$json.x`).
    Path(String),
    /// Unary minus.
    Neg(Box<Expr>),
    /// Logical negation.
    Not(Box<Expr>),
    /// Binary operator application.
    Binary {
        /// Left-hand operand.
        left: Box<Expr>,
        /// Operator.
        op: BinOp,
        /// Right-hand operand.
        right: Box<Expr>,
    },
    /// Built-in function call.
    Call {
        /// Function name.
        name: String,
        /// Argument expressions.
        args: Vec<Expr>,
    },
}

/// Binary operators, grouped by the precedence tier they belong to
/// (§4.2: unary minus, `^`, `* /`, `+ -`, comparisons, `&&`, `||`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}
