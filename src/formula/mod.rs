//! Formula parsing and evaluation for calculated metrics.
//!
//! Calculated metrics in the catalog carry an expression string such as
//! `WEIGHT / pow(HEIGHT / 100, 2)`. This module parses those expressions
//! into an AST and evaluates them against a set of variable bindings.

pub mod ast;
pub mod evaluator;
pub mod parser;

pub use ast::{BinaryOp, Expr};
pub use evaluator::{evaluate, VariableProvider};

use std::collections::BTreeSet;

use thiserror::Error;

/// Formula error types
#[derive(Debug, Error)]
pub enum FormulaError {
    #[error("Formula is empty")]
    EmptyExpression,

    #[error("Parse error at position {position}: {message}")]
    ParseError { position: usize, message: String },

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Function '{function}' expects {expected} argument(s), got {got}")]
    InvalidArgCount {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,
}

/// Result type for formula operations
pub type FormulaResult<T> = Result<T, FormulaError>;

/// A parsed formula, ready for repeated evaluation.
#[derive(Debug, Clone)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse a formula expression string.
    pub fn parse(source: &str) -> FormulaResult<Self> {
        let expr = parser::parse(source)?;
        Ok(Self {
            source: source.trim().to_string(),
            expr,
        })
    }

    /// The original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed expression tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Names of all variables the formula references, sorted.
    pub fn variables(&self) -> Vec<String> {
        let mut vars = BTreeSet::new();
        self.expr.collect_variables(&mut vars);
        vars.into_iter().map(|s| s.to_string()).collect()
    }

    /// Evaluate the formula against the given variable bindings.
    pub fn evaluate<P: VariableProvider>(&self, provider: &P) -> FormulaResult<f64> {
        evaluator::evaluate(&self.expr, provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_formula_variables() {
        let formula = Formula::parse("WEIGHT / pow(HEIGHT / 100, 2)").unwrap();
        assert_eq!(formula.variables(), vec!["HEIGHT", "WEIGHT"]);
    }

    #[test]
    fn test_formula_evaluate() {
        let formula = Formula::parse("WEIGHT * (1 - BF_PCT / 100)").unwrap();
        let mut vars = HashMap::new();
        vars.insert("WEIGHT".to_string(), 80.0);
        vars.insert("BF_PCT".to_string(), 25.0);
        let result = formula.evaluate(&vars).unwrap();
        assert!((result - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_formula_source_trimmed() {
        let formula = Formula::parse("  1 + 2  ").unwrap();
        assert_eq!(formula.source(), "1 + 2");
    }
}
