/// Arithmetic operators allowed inside a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    /// Engine spelling; division is `%` there.
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "%",
        }
    }
}

/// Comparison operators, already normalized (`==` and `=` are the same).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Greater,
    Lower,
    GreaterEqual,
    LowerEqual,
    Equal,
    NotEqual,
    Like,
    Match,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Greater => ">",
            CompareOp::Lower => "<",
            CompareOp::GreaterEqual => ">=",
            CompareOp::LowerEqual => "<=",
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "<>",
            CompareOp::Like => "like",
            CompareOp::Match => "~",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(String),
    /// Numeric literal as written, sign included.
    Number(String),
    Binary {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Bare operands render without parentheses.
    pub fn is_simple(&self) -> bool {
        !matches!(self, Expr::Binary { .. })
    }

    pub fn as_column(&self) -> Option<&str> {
        match self {
            Expr::Column(name) => Some(name),
            _ => None,
        }
    }
}

/// One `lhs OP rhs` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub lhs: Expr,
    pub op: CompareOp,
    pub rhs: Expr,
}
