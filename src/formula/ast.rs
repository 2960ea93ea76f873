//! Abstract syntax tree for metric calculation formulas.

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Neq,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Gt => ">",
            BinaryOp::Lt => "<",
            BinaryOp::Gte => ">=",
            BinaryOp::Lte => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
        }
    }
}

/// Expression nodes in the AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Variable reference (e.g., `WEIGHT`)
    Variable(String),
    /// Binary operation (e.g., `a + b`)
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Negation (e.g., `-x`)
    Neg(Box<Expr>),
    /// Function call (e.g., `pow(x, 2)`)
    FunctionCall { name: String, args: Vec<Expr> },
    /// Conditional (e.g., `cond ? a : b`)
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
}

impl Expr {
    pub fn number(n: f64) -> Self {
        Expr::Number(n)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn neg(expr: Expr) -> Self {
        Expr::Neg(Box::new(expr))
    }

    pub fn function_call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::FunctionCall {
            name: name.into(),
            args,
        }
    }

    pub fn ternary(condition: Expr, then_expr: Expr, else_expr: Expr) -> Self {
        Expr::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }
    }

    /// Collect the names of all variables referenced by this expression
    pub fn collect_variables<'a>(&'a self, out: &mut std::collections::BTreeSet<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                out.insert(name.as_str());
            }
            Expr::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Expr::Neg(expr) => expr.collect_variables(out),
            Expr::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                condition.collect_variables(out);
                then_expr.collect_variables(out);
                else_expr.collect_variables(out);
            }
        }
    }
}
