//! Formula grammar built from `nom` combinators.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?
//! primary := NUMBER | IDENT | IDENT '(' args ')' | '(' expr ')'
//! ```
//!
//! `^` binds tighter than unary minus and is right associative, so `-2^2` is
//! `-4` and `2^3^2` is `2^9`.
//!
//! Names are resolved while parsing, so anything outside the closed variable
//! and function sets is rejected before a [`super::Program`] is built. Every
//! recursive rule counts its depth and stops at [`MAX_DEPTH`].

use std::f64::consts::E;

use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{take_while, take_while1};
use nom::character::complete::{char, digit1, multispace0, one_of, satisfy};
use nom::combinator::{cut, map, opt, recognize, value};
use nom::error::{ErrorKind, ParseError};
use nom::multi::{many0, separated_list1};
use nom::sequence::{pair, preceded, terminated, tuple};

use super::FormulaError;
use super::ast::{BinaryOp, Expr, Function, UnaryOp, Variable};

/// Longest accepted formula source, in bytes
pub const MAX_SOURCE_LEN: usize = 1024;

/// Deepest accepted nesting of sub-expressions
pub const MAX_DEPTH: usize = 64;

const EXPECTED_OPERAND: &str = "a number, variable, function or '('";

/// Why the grammar stopped, anchored at the remaining input.
#[derive(Debug)]
enum Reason<'a> {
    Expected(&'static str),
    InvalidNumber(&'a str),
    UnknownVariable(&'a str),
    UnknownFunction(&'a str),
    WrongArity {
        name: &'a str,
        expected: usize,
        found: usize,
    },
    TooDeep,
}

#[derive(Debug)]
struct GrammarError<'a> {
    at: &'a str,
    reason: Reason<'a>,
}

impl<'a> GrammarError<'a> {
    fn new(at: &'a str, reason: Reason<'a>) -> Self {
        Self { at, reason }
    }

    fn expected(at: &'a str, expected: &'static str) -> Self {
        Self::new(at, Reason::Expected(expected))
    }

    fn into_formula_error(self, source: &str) -> FormulaError {
        let offset = source.len() - self.at.len();
        match self.reason {
            Reason::Expected(expected) => unexpected(self.at, offset, expected),
            Reason::InvalidNumber(text) => FormulaError::InvalidNumber {
                text: text.to_string(),
                offset,
            },
            Reason::UnknownVariable(name) => FormulaError::UnknownVariable {
                name: name.to_string(),
                offset,
            },
            Reason::UnknownFunction(name) => FormulaError::UnknownFunction {
                name: name.to_string(),
                offset,
            },
            Reason::WrongArity {
                name,
                expected,
                found,
            } => FormulaError::WrongArity {
                name: name.to_string(),
                expected,
                found,
            },
            Reason::TooDeep => FormulaError::TooDeep { max: MAX_DEPTH },
        }
    }
}

impl<'a> ParseError<&'a str> for GrammarError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Self::expected(input, EXPECTED_OPERAND)
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, O> = IResult<&'a str, O, GrammarError<'a>>;

/// Describe what sits at `rest` for an "unexpected ..." error.
fn unexpected(rest: &str, offset: usize, expected: &'static str) -> FormulaError {
    let Some(ch) = rest.chars().next() else {
        return FormulaError::UnexpectedToken {
            found: "end of formula".to_string(),
            expected,
            offset,
        };
    };

    let found = if ch.is_ascii_digit() || ch == '.' {
        let end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        format!("number {}", &rest[..end])
    } else if ch.is_ascii_alphabetic() || ch == '_' {
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        format!("'{}'", &rest[..end])
    } else if "+-*/%^(),".contains(ch) {
        format!("'{}'", ch)
    } else {
        return FormulaError::UnexpectedChar { ch, offset };
    };

    FormulaError::UnexpectedToken {
        found,
        expected,
        offset,
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    preceded(multispace0, inner)
}

fn symbol<'a>(c: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    ws(char(c))
}

/// Require `c`, failing with `expected` when it is missing.
fn closing<'a>(c: char, expected: &'static str) -> impl FnMut(&'a str) -> PResult<'a, char> {
    move |input: &'a str| {
        let (input, _) = multispace0::<&'a str, GrammarError<'a>>(input)?;
        char::<&'a str, GrammarError<'a>>(c)(input)
            .map_err(|_| nom::Err::Failure(GrammarError::expected(input, expected)))
    }
}

fn enter<'a>(input: &'a str, depth: usize) -> Result<usize, nom::Err<GrammarError<'a>>> {
    let depth = depth + 1;
    if depth > MAX_DEPTH {
        return Err(nom::Err::Failure(GrammarError::new(input, Reason::TooDeep)));
    }
    Ok(depth)
}

fn fold_binary(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn additive_op<'a>(input: &'a str) -> PResult<'a, BinaryOp> {
    ws(alt((
        value(BinaryOp::Add, char('+')),
        value(BinaryOp::Sub, char('-')),
    )))(input)
}

fn multiplicative_op<'a>(input: &'a str) -> PResult<'a, BinaryOp> {
    ws(alt((
        value(BinaryOp::Mul, char('*')),
        value(BinaryOp::Div, char('/')),
        value(BinaryOp::Rem, char('%')),
    )))(input)
}

fn expr<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let depth = enter(input, depth)?;
    let (input, first) = term(input, depth)?;
    let (input, rest) = many0(pair(additive_op, cut(move |i| term(i, depth))))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn term<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, first) = unary(input, depth)?;
    let (input, rest) = many0(pair(multiplicative_op, cut(move |i| unary(i, depth))))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn unary<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (rest, sign) = opt(ws(one_of("+-")))(input)?;
    let Some(sign) = sign else {
        return power(input, depth);
    };

    let depth = enter(rest, depth)?;
    let (rest, operand) = cut(move |i| unary(i, depth))(rest)?;
    let expr = if sign == '-' {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        }
    } else {
        operand
    };
    Ok((rest, expr))
}

fn power<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, base) = primary(input, depth)?;
    let (input, caret) = opt(symbol('^'))(input)?;
    if caret.is_none() {
        return Ok((input, base));
    }

    let depth = enter(input, depth)?;
    let (input, exponent) = cut(move |i| unary(i, depth))(input)?;
    Ok((
        input,
        Expr::Binary {
            op: BinaryOp::Pow,
            lhs: Box::new(base),
            rhs: Box::new(exponent),
        },
    ))
}

fn primary<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, _) = multispace0(input)?;
    alt((number, move |i| group(i, depth), move |i| name(i, depth)))(input).map_err(|e| match e {
        nom::Err::Error(_) => nom::Err::Failure(GrammarError::expected(input, EXPECTED_OPERAND)),
        other => other,
    })
}

/// Decimal literal with an optional exponent: `3`, `.5`, `2.5e-4`.
fn number<'a>(input: &'a str) -> PResult<'a, Expr> {
    let (rest, text) = recognize(pair(
        take_while1(|c: char| c.is_ascii_digit() || c == '.'),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    ))(input)?;
    match text.parse::<f64>() {
        Ok(value) => Ok((rest, Expr::Number(value))),
        Err(_) => Err(nom::Err::Failure(GrammarError::new(
            input,
            Reason::InvalidNumber(text),
        ))),
    }
}

fn group<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, _) = char('(')(input)?;
    cut(terminated(move |i| expr(i, depth), closing(')', "')'")))(input)
}

fn identifier<'a>(input: &'a str) -> PResult<'a, &'a str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn name<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (rest, ident) = identifier(input)?;
    let (rest, open) = opt(symbol('('))(rest)?;
    if open.is_some() {
        return call(input, ident, rest, depth);
    }

    if let Some(var) = Variable::from_name(ident) {
        return Ok((rest, Expr::Variable(var)));
    }
    if ident == "e" {
        return Ok((rest, Expr::Number(E)));
    }
    Err(nom::Err::Failure(GrammarError::new(
        input,
        Reason::UnknownVariable(ident),
    )))
}

/// Arguments of a call whose name starts at `start` and whose `(` is consumed.
fn call<'a>(start: &'a str, ident: &'a str, input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let func = Function::from_name(ident).ok_or_else(|| {
        nom::Err::Failure(GrammarError::new(start, Reason::UnknownFunction(ident)))
    })?;

    let (input, args) = alt((
        map(symbol(')'), |_| Vec::new()),
        terminated(
            separated_list1(symbol(','), move |i| expr(i, depth)),
            closing(')', "',' or ')'"),
        ),
    ))(input)?;

    if args.len() != func.arity() {
        return Err(nom::Err::Failure(GrammarError::new(
            start,
            Reason::WrongArity {
                name: ident,
                expected: func.arity(),
                found: args.len(),
            },
        )));
    }
    Ok((input, Expr::Call { func, args }))
}

/// Parse a formula source into an expression tree.
pub fn parse(source: &str) -> Result<Expr, FormulaError> {
    if source.len() > MAX_SOURCE_LEN {
        return Err(FormulaError::TooLong {
            len: source.len(),
            max: MAX_SOURCE_LEN,
        });
    }
    if source.trim().is_empty() {
        return Err(FormulaError::Empty);
    }

    let (rest, expr) = match expr(source, 0) {
        Ok(parsed) => parsed,
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            return Err(e.into_formula_error(source));
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(unexpected("", source.len(), EXPECTED_OPERAND));
        }
    };

    let trailing = rest.trim_start();
    if !trailing.is_empty() {
        let offset = source.len() - trailing.len();
        return Err(unexpected(trailing, offset, "an operator or end of formula"));
    }
    Ok(expr)
}
