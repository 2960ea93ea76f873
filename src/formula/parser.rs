//! Recursive-descent grammar for metric calculation formulas.
//!
//! Grammar (loosest binding first):
//!   expr       := ternary
//!   ternary    := comparison ('?' expr ':' expr)?
//!   comparison := additive (('>=' | '<=' | '==' | '!=' | '>' | '<') additive)*
//!   additive   := multiplicative (('+' | '-') multiplicative)*
//!   multiplicative := unary (('*' | '/') unary)*
//!   unary      := '-' unary | primary
//!   primary    := '(' expr ')' | function '(' args ')' | number | variable

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, recognize, value},
    multi::separated_list0,
    number::complete::recognize_float,
    sequence::{delimited, pair},
    IResult, Parser,
};

use crate::formula::ast::{BinaryOp, Expr};
use crate::formula::FormulaError;

/// Parse a formula expression string into an AST.
pub fn parse(input: &str) -> Result<Expr, FormulaError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FormulaError::EmptyExpression);
    }

    match parse_expr(input) {
        Ok((remaining, expr)) => {
            let remaining = remaining.trim();
            if remaining.is_empty() {
                Ok(expr)
            } else {
                Err(FormulaError::ParseError {
                    position: input.len() - remaining.len(),
                    message: format!("unexpected characters: '{}'", remaining),
                })
            }
        }
        Err(e) => Err(FormulaError::ParseError {
            position: 0,
            message: format!("parse error: {:?}", e),
        }),
    }
}

fn ws<'a, F>(
    inner: F,
) -> impl Parser<&'a str, Output = F::Output, Error = nom::error::Error<&'a str>>
where
    F: Parser<&'a str, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn parse_expr(input: &str) -> IResult<&str, Expr> {
    parse_ternary(input)
}

fn parse_ternary(input: &str) -> IResult<&str, Expr> {
    let (input, condition) = parse_comparison(input)?;
    let (input, _) = multispace0(input)?;

    if let Ok((input, _)) = char::<&str, nom::error::Error<&str>>('?').parse(input) {
        let (input, _) = multispace0(input)?;
        let (input, then_expr) = parse_expr(input)?;
        let (input, _) = multispace0(input)?;
        let (input, _) = char(':').parse(input)?;
        let (input, _) = multispace0(input)?;
        let (input, else_expr) = parse_expr(input)?;
        Ok((input, Expr::ternary(condition, then_expr, else_expr)))
    } else {
        Ok((input, condition))
    }
}

fn parse_comparison(input: &str) -> IResult<&str, Expr> {
    let (input, left) = parse_additive(input)?;
    parse_binary_chain(input, left, parse_comparison_op, parse_additive)
}

fn parse_comparison_op(input: &str) -> IResult<&str, BinaryOp> {
    ws(alt((
        value(BinaryOp::Gte, tag(">=")),
        value(BinaryOp::Lte, tag("<=")),
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Neq, tag("!=")),
        value(BinaryOp::Gt, tag(">")),
        value(BinaryOp::Lt, tag("<")),
    )))
    .parse(input)
}

fn parse_additive(input: &str) -> IResult<&str, Expr> {
    let (input, left) = parse_multiplicative(input)?;
    parse_binary_chain(input, left, parse_additive_op, parse_multiplicative)
}

fn parse_additive_op(input: &str) -> IResult<&str, BinaryOp> {
    ws(alt((
        value(BinaryOp::Add, char('+')),
        value(BinaryOp::Sub, char('-')),
    )))
    .parse(input)
}

fn parse_multiplicative(input: &str) -> IResult<&str, Expr> {
    let (input, left) = parse_unary(input)?;
    parse_binary_chain(input, left, parse_multiplicative_op, parse_unary)
}

fn parse_multiplicative_op(input: &str) -> IResult<&str, BinaryOp> {
    ws(alt((
        value(BinaryOp::Mul, char('*')),
        value(BinaryOp::Div, char('/')),
    )))
    .parse(input)
}

fn parse_binary_chain<'a, F, G>(
    mut input: &'a str,
    mut left: Expr,
    mut op_parser: F,
    mut expr_parser: G,
) -> IResult<&'a str, Expr>
where
    F: FnMut(&'a str) -> IResult<&'a str, BinaryOp>,
    G: FnMut(&'a str) -> IResult<&'a str, Expr>,
{
    loop {
        match op_parser(input) {
            Ok((remaining, op)) => {
                let (remaining, right) = expr_parser(remaining)?;
                left = Expr::binary(op, left, right);
                input = remaining;
            }
            Err(_) => return Ok((input, left)),
        }
    }
}

fn parse_unary(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;

    if let Ok((input, _)) = char::<&str, nom::error::Error<&str>>('-').parse(input) {
        let (input, _) = multispace0(input)?;
        let (input, expr) = parse_unary(input)?;
        return Ok((input, Expr::neg(expr)));
    }

    parse_primary(input)
}

fn parse_primary(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;

    alt((
        parse_parenthesized,
        parse_function_call,
        parse_number,
        parse_variable,
    ))
    .parse(input)
}

fn parse_parenthesized(input: &str) -> IResult<&str, Expr> {
    delimited(
        pair(char('('), multispace0),
        parse_expr,
        pair(multispace0, char(')')),
    )
    .parse(input)
}

fn parse_number(input: &str) -> IResult<&str, Expr> {
    map(recognize_float, |s: &str| {
        Expr::Number(s.parse().unwrap_or(0.0))
    })
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        opt(take_while1(|c: char| c.is_alphanumeric() || c == '_')),
    ))
    .parse(input)
}

fn parse_variable(input: &str) -> IResult<&str, Expr> {
    map(identifier, |s: &str| Expr::Variable(s.to_string())).parse(input)
}

fn parse_function_call(input: &str) -> IResult<&str, Expr> {
    let (input, name) = identifier(input)?;

    // Must have opening parenthesis after the name (with optional whitespace)
    let (input, _) = multispace0(input)?;
    let (input, _) = char('(').parse(input)?;
    let (input, _) = multispace0(input)?;

    let (input, args) =
        separated_list0((multispace0, char(','), multispace0), parse_expr).parse(input)?;

    let (input, _) = multispace0(input)?;
    let (input, _) = char(')').parse(input)?;

    Ok((input, Expr::function_call(name, args)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        let expr = parse("42").unwrap();
        assert!(matches!(expr, Expr::Number(n) if (n - 42.0).abs() < f64::EPSILON));

        let expr = parse("6.25").unwrap();
        assert!(matches!(expr, Expr::Number(n) if (n - 6.25).abs() < f64::EPSILON));

        let expr = parse("-5").unwrap();
        assert!(matches!(expr, Expr::Neg(_)));
    }

    #[test]
    fn test_parse_variable() {
        let expr = parse("WEIGHT").unwrap();
        assert!(matches!(expr, Expr::Variable(ref s) if s == "WEIGHT"));

        let expr = parse("BF_PCT").unwrap();
        assert!(matches!(expr, Expr::Variable(ref s) if s == "BF_PCT"));
    }

    #[test]
    fn test_parse_binary_ops() {
        let expr = parse("1 + 2").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));

        let expr = parse("a - b").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Sub,
                ..
            }
        ));

        let expr = parse("x * y").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));

        let expr = parse("a / b").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Div,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_comparison_ops() {
        let expr = parse("a > b").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Gt,
                ..
            }
        ));

        let expr = parse("a >= b").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Gte,
                ..
            }
        ));

        let expr = parse("GENDER == 1").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Eq,
                ..
            }
        ));

        let expr = parse("a != b").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Neq,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_precedence() {
        // Multiplication binds tighter than addition
        let expr = parse("1 + 2 * 3").unwrap();
        if let Expr::Binary { op, left, right } = expr {
            assert_eq!(op, BinaryOp::Add);
            assert!(matches!(*left, Expr::Number(_)));
            assert!(matches!(
                *right,
                Expr::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            ));
        } else {
            panic!("Expected binary expression");
        }
    }

    #[test]
    fn test_parse_parentheses() {
        let expr = parse("(1 + 2) * 3").unwrap();
        if let Expr::Binary { op, left, .. } = expr {
            assert_eq!(op, BinaryOp::Mul);
            assert!(matches!(
                *left,
                Expr::Binary {
                    op: BinaryOp::Add,
                    ..
                }
            ));
        } else {
            panic!("Expected binary expression");
        }
    }

    #[test]
    fn test_parse_function_call() {
        let expr = parse("pow(HEIGHT / 100, 2)").unwrap();
        if let Expr::FunctionCall { name, args } = expr {
            assert_eq!(name, "pow");
            assert_eq!(args.len(), 2);
        } else {
            panic!("Expected function call");
        }

        let expr = parse("min(a, b)").unwrap();
        assert!(matches!(expr, Expr::FunctionCall { ref name, .. } if name == "min"));
    }

    #[test]
    fn test_parse_ternary() {
        let expr = parse("GENDER == 1 ? 5 : -161").unwrap();
        assert!(matches!(expr, Expr::Ternary { .. }));
    }

    #[test]
    fn test_parse_bmi_formula() {
        let expr = parse("WEIGHT / pow(HEIGHT / 100, 2)").unwrap();
        if let Expr::Binary { op, left, right } = expr {
            assert_eq!(op, BinaryOp::Div);
            assert!(matches!(*left, Expr::Variable(ref s) if s == "WEIGHT"));
            assert!(matches!(*right, Expr::FunctionCall { .. }));
        } else {
            panic!("Expected binary expression");
        }
    }

    #[test]
    fn test_parse_bmr_formula() {
        let expr =
            parse("10 * WEIGHT + 6.25 * HEIGHT - 5 * AGE + (GENDER == 1 ? 5 : -161)").unwrap();
        // Loosest binding at the top is the additive chain
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_empty() {
        let result = parse("");
        assert!(matches!(result, Err(FormulaError::EmptyExpression)));

        let result = parse("   ");
        assert!(matches!(result, Err(FormulaError::EmptyExpression)));
    }

    #[test]
    fn test_parse_error() {
        let result = parse("1 +");
        assert!(result.is_err());

        let result = parse("1 + 2 @");
        assert!(result.is_err());
    }
}
