//! Expression Abstract Syntax Tree types

use std::collections::BTreeSet;

/// Expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),

    // === References ===
    /// Variable looked up in the evaluation context
    Name(String),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },

    // === Function call ===
    Function { name: String, args: Vec<Expr> },

    // === List ===
    List(Vec<Expr>),
}

impl Expr {
    /// Collect the variable names this expression reads
    pub fn names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut BTreeSet<String>) {
        match self {
            Expr::Name(name) => {
                names.insert(name.clone());
            }
            Expr::BinaryOp { left, right, .. } => {
                left.collect_names(names);
                right.collect_names(names);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_names(names),
            Expr::Function { args, .. } | Expr::List(args) => {
                for arg in args {
                    arg.collect_names(names);
                }
            }
            Expr::Number(_) | Expr::String(_) | Expr::Boolean(_) => {}
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Percent,
}
