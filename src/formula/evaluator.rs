//! AST evaluation against variable bindings.

use std::collections::HashMap;

use crate::formula::ast::{BinaryOp, Expr};
use crate::formula::{FormulaError, FormulaResult};

/// Tolerance for equality comparisons and truthiness checks.
const EPSILON: f64 = 1e-9;

/// Source of variable values during evaluation.
pub trait VariableProvider {
    /// Look up a variable by name, returning None if unavailable.
    fn get(&self, name: &str) -> Option<f64>;
}

impl VariableProvider for HashMap<String, f64> {
    fn get(&self, name: &str) -> Option<f64> {
        HashMap::get(self, name).copied()
    }
}

impl VariableProvider for HashMap<&str, f64> {
    fn get(&self, name: &str) -> Option<f64> {
        HashMap::get(self, name).copied()
    }
}

/// Evaluate an expression tree to a numeric value.
pub fn evaluate<P: VariableProvider>(expr: &Expr, provider: &P) -> FormulaResult<f64> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Variable(name) => provider
            .get(name)
            .ok_or_else(|| FormulaError::UnknownVariable(name.clone())),
        Expr::Binary { op, left, right } => {
            let l = evaluate(left, provider)?;
            let r = evaluate(right, provider)?;
            evaluate_binary(*op, l, r)
        }
        Expr::Neg(inner) => Ok(-evaluate(inner, provider)?),
        Expr::FunctionCall { name, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, provider)?);
            }
            evaluate_function(name, &values)
        }
        Expr::Ternary {
            condition,
            then_expr,
            else_expr,
        } => {
            let cond = evaluate(condition, provider)?;
            if cond.abs() > EPSILON {
                evaluate(then_expr, provider)
            } else {
                evaluate(else_expr, provider)
            }
        }
    }
}

fn evaluate_binary(op: BinaryOp, left: f64, right: f64) -> FormulaResult<f64> {
    match op {
        BinaryOp::Add => Ok(left + right),
        BinaryOp::Sub => Ok(left - right),
        BinaryOp::Mul => Ok(left * right),
        BinaryOp::Div => {
            if right.abs() < EPSILON {
                Err(FormulaError::DivisionByZero)
            } else {
                Ok(left / right)
            }
        }
        BinaryOp::Gt => Ok(bool_to_f64(left > right)),
        BinaryOp::Lt => Ok(bool_to_f64(left < right)),
        BinaryOp::Gte => Ok(bool_to_f64(left >= right)),
        BinaryOp::Lte => Ok(bool_to_f64(left <= right)),
        BinaryOp::Eq => Ok(bool_to_f64((left - right).abs() < EPSILON)),
        BinaryOp::Neq => Ok(bool_to_f64((left - right).abs() >= EPSILON)),
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn evaluate_function(name: &str, args: &[f64]) -> FormulaResult<f64> {
    match name {
        "min" => {
            check_arg_count(name, 2, args)?;
            Ok(args[0].min(args[1]))
        }
        "max" => {
            check_arg_count(name, 2, args)?;
            Ok(args[0].max(args[1]))
        }
        "pow" => {
            check_arg_count(name, 2, args)?;
            Ok(args[0].powf(args[1]))
        }
        "round" => {
            check_arg_count(name, 1, args)?;
            Ok(args[0].round())
        }
        "abs" => {
            check_arg_count(name, 1, args)?;
            Ok(args[0].abs())
        }
        "sqrt" => {
            check_arg_count(name, 1, args)?;
            Ok(args[0].sqrt())
        }
        "floor" => {
            check_arg_count(name, 1, args)?;
            Ok(args[0].floor())
        }
        "ceil" => {
            check_arg_count(name, 1, args)?;
            Ok(args[0].ceil())
        }
        _ => Err(FormulaError::UnknownFunction(name.to_string())),
    }
}

fn check_arg_count(name: &str, expected: usize, args: &[f64]) -> FormulaResult<()> {
    if args.len() != expected {
        return Err(FormulaError::InvalidArgCount {
            function: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parser;

    fn eval(input: &str, vars: &[(&str, f64)]) -> FormulaResult<f64> {
        let expr = parser::parse(input).unwrap();
        let map: HashMap<&str, f64> = vars.iter().copied().collect();
        evaluate(&expr, &map)
    }

    #[test]
    fn test_arithmetic() {
        assert!((eval("1 + 2 * 3", &[]).unwrap() - 7.0).abs() < EPSILON);
        assert!((eval("(1 + 2) * 3", &[]).unwrap() - 9.0).abs() < EPSILON);
        assert!((eval("10 / 4", &[]).unwrap() - 2.5).abs() < EPSILON);
        assert!((eval("-5 + 3", &[]).unwrap() - -2.0).abs() < EPSILON);
    }

    #[test]
    fn test_division_by_zero() {
        let result = eval("1 / 0", &[]);
        assert!(matches!(result, Err(FormulaError::DivisionByZero)));

        let result = eval("1 / (2 - 2)", &[]);
        assert!(matches!(result, Err(FormulaError::DivisionByZero)));
    }

    #[test]
    fn test_comparisons() {
        assert!((eval("3 > 2", &[]).unwrap() - 1.0).abs() < EPSILON);
        assert!((eval("2 > 3", &[]).unwrap() - 0.0).abs() < EPSILON);
        assert!((eval("2 >= 2", &[]).unwrap() - 1.0).abs() < EPSILON);
        assert!((eval("1 == 1", &[]).unwrap() - 1.0).abs() < EPSILON);
        assert!((eval("1 != 1", &[]).unwrap() - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_ternary() {
        assert!((eval("1 > 0 ? 10 : 20", &[]).unwrap() - 10.0).abs() < EPSILON);
        assert!((eval("0 > 1 ? 10 : 20", &[]).unwrap() - 20.0).abs() < EPSILON);

        let result = eval("GENDER == 1 ? 5 : -161", &[("GENDER", 1.0)]).unwrap();
        assert!((result - 5.0).abs() < EPSILON);

        let result = eval("GENDER == 1 ? 5 : -161", &[("GENDER", 0.0)]).unwrap();
        assert!((result - -161.0).abs() < EPSILON);
    }

    #[test]
    fn test_functions() {
        assert!((eval("min(3, 5)", &[]).unwrap() - 3.0).abs() < EPSILON);
        assert!((eval("max(3, 5)", &[]).unwrap() - 5.0).abs() < EPSILON);
        assert!((eval("pow(2, 10)", &[]).unwrap() - 1024.0).abs() < EPSILON);
        assert!((eval("round(2.4)", &[]).unwrap() - 2.0).abs() < EPSILON);
        assert!((eval("abs(-3)", &[]).unwrap() - 3.0).abs() < EPSILON);
        assert!((eval("sqrt(16)", &[]).unwrap() - 4.0).abs() < EPSILON);
        assert!((eval("floor(2.9)", &[]).unwrap() - 2.0).abs() < EPSILON);
        assert!((eval("ceil(2.1)", &[]).unwrap() - 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_unknown_variable() {
        let result = eval("WEIGHT + 1", &[]);
        assert!(matches!(result, Err(FormulaError::UnknownVariable(ref s)) if s == "WEIGHT"));
    }

    #[test]
    fn test_unknown_function() {
        let result = eval("frobnicate(1)", &[]);
        assert!(matches!(result, Err(FormulaError::UnknownFunction(_))));
    }

    #[test]
    fn test_wrong_arg_count() {
        let result = eval("pow(2)", &[]);
        assert!(matches!(
            result,
            Err(FormulaError::InvalidArgCount {
                expected: 2,
                got: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_bmi_formula() {
        let result = eval(
            "WEIGHT / pow(HEIGHT / 100, 2)",
            &[("WEIGHT", 70.0), ("HEIGHT", 170.0)],
        )
        .unwrap();
        assert!((result - 24.221453287197235).abs() < 1e-6);
    }

    #[test]
    fn test_bmr_formula() {
        let formula = "10 * WEIGHT + 6.25 * HEIGHT - 5 * AGE + (GENDER == 1 ? 5 : -161)";

        let male = eval(
            formula,
            &[
                ("WEIGHT", 70.0),
                ("HEIGHT", 170.0),
                ("AGE", 30.0),
                ("GENDER", 1.0),
            ],
        )
        .unwrap();
        assert!((male - 1617.5).abs() < EPSILON);

        let female = eval(
            formula,
            &[
                ("WEIGHT", 70.0),
                ("HEIGHT", 170.0),
                ("AGE", 30.0),
                ("GENDER", 0.0),
            ],
        )
        .unwrap();
        assert!((female - 1451.5).abs() < EPSILON);
    }
}
