//! Flat postfix program compiled from an expression tree.

use super::ast::{BinaryOp, Expr, Function, UnaryOp, Variable};
use super::{EvalError, FormulaError, SurfaceSample};

/// Largest operand stack a program may need
pub const STACK_LIMIT: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Instr {
    Const(f64),
    Load(Variable),
    Neg,
    Binary(BinaryOp),
    Call(Function),
}

/// Executable form of a formula.
///
/// Evaluation walks the instruction list once over a fixed-size stack, so
/// its cost is linear in the formula length and it never allocates.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    code: Vec<Instr>,
}

impl Program {
    /// Compile an expression tree, folding constant sub-expressions.
    pub fn compile(expr: &Expr) -> Result<Self, FormulaError> {
        let mut code = Vec::new();
        emit(&fold(expr), &mut code);

        let max_stack = stack_depth(&code);
        if max_stack > STACK_LIMIT {
            return Err(FormulaError::TooComplex {
                needed: max_stack,
                max: STACK_LIMIT,
            });
        }
        Ok(Self { code })
    }

    /// Program that returns a single scope variable unchanged.
    pub fn identity(var: Variable) -> Self {
        Self {
            code: vec![Instr::Load(var)],
        }
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Evaluate against one surface sample.
    ///
    /// Fails on division or modulo by zero and on a non-finite result.
    pub fn evaluate(&self, scope: &SurfaceSample) -> Result<f64, EvalError> {
        let mut stack = [0.0f64; STACK_LIMIT];
        let mut sp = 0usize;

        for instr in &self.code {
            match *instr {
                Instr::Const(value) => {
                    stack[sp] = value;
                    sp += 1;
                }
                Instr::Load(var) => {
                    stack[sp] = scope.get(var);
                    sp += 1;
                }
                Instr::Neg => {
                    stack[sp - 1] = -stack[sp - 1];
                }
                Instr::Binary(op) => {
                    let rhs = stack[sp - 1];
                    let lhs = stack[sp - 2];
                    sp -= 1;
                    stack[sp - 1] = binary(op, lhs, rhs)?;
                }
                Instr::Call(func) => {
                    let arity = func.arity();
                    let result = func.apply(&stack[sp - arity..sp]);
                    sp -= arity;
                    stack[sp] = result;
                    sp += 1;
                }
            }
        }

        let result = if sp == 1 { stack[0] } else { f64::NAN };
        if result.is_finite() {
            Ok(result)
        } else {
            Err(EvalError::NonFinite(result))
        }
    }
}

fn binary(op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    match op {
        BinaryOp::Add => Ok(lhs + rhs),
        BinaryOp::Sub => Ok(lhs - rhs),
        BinaryOp::Mul => Ok(lhs * rhs),
        BinaryOp::Div if rhs == 0.0 => Err(EvalError::DivisionByZero),
        BinaryOp::Div => Ok(lhs / rhs),
        BinaryOp::Rem if rhs == 0.0 => Err(EvalError::DivisionByZero),
        BinaryOp::Rem => Ok(lhs % rhs),
        BinaryOp::Pow => Ok(lhs.powf(rhs)),
    }
}

/// Fold sub-trees that reference no variables into constants.
///
/// A sub-tree whose evaluation fails (such as `1/0`) is left unfolded so the
/// failure surfaces at evaluation time like any other.
fn fold(expr: &Expr) -> Expr {
    match expr {
        Expr::Number(_) | Expr::Variable(_) => expr.clone(),
        Expr::Unary { op, operand } => match (op, fold(operand)) {
            (UnaryOp::Neg, Expr::Number(v)) => Expr::Number(-v),
            (op, operand) => Expr::Unary {
                op: *op,
                operand: Box::new(operand),
            },
        },
        Expr::Binary { op, lhs, rhs } => match (fold(lhs), fold(rhs)) {
            (Expr::Number(a), Expr::Number(b)) => match binary(*op, a, b) {
                Ok(v) if v.is_finite() => Expr::Number(v),
                _ => Expr::Binary {
                    op: *op,
                    lhs: Box::new(Expr::Number(a)),
                    rhs: Box::new(Expr::Number(b)),
                },
            },
            (lhs, rhs) => Expr::Binary {
                op: *op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        },
        Expr::Call { func, args } => {
            let args: Vec<Expr> = args.iter().map(fold).collect();
            let constants: Option<Vec<f64>> = args
                .iter()
                .map(|arg| match arg {
                    Expr::Number(v) => Some(*v),
                    _ => None,
                })
                .collect();
            match constants {
                Some(values) => {
                    let v = func.apply(&values);
                    if v.is_finite() {
                        Expr::Number(v)
                    } else {
                        Expr::Call { func: *func, args }
                    }
                }
                None => Expr::Call { func: *func, args },
            }
        }
    }
}

fn emit(expr: &Expr, code: &mut Vec<Instr>) {
    match expr {
        Expr::Number(v) => code.push(Instr::Const(*v)),
        Expr::Variable(var) => code.push(Instr::Load(*var)),
        Expr::Unary { op: UnaryOp::Neg, operand } => {
            emit(operand, code);
            code.push(Instr::Neg);
        }
        Expr::Binary { op, lhs, rhs } => {
            emit(lhs, code);
            emit(rhs, code);
            code.push(Instr::Binary(*op));
        }
        Expr::Call { func, args } => {
            for arg in args {
                emit(arg, code);
            }
            code.push(Instr::Call(*func));
        }
    }
}

fn stack_depth(code: &[Instr]) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    for instr in code {
        match instr {
            Instr::Const(_) | Instr::Load(_) => depth += 1,
            Instr::Neg => {}
            Instr::Binary(_) => depth -= 1,
            Instr::Call(func) => depth = depth + 1 - func.arity(),
        }
        max = max.max(depth);
    }
    max
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;

    fn run(source: &str, scope: &SurfaceSample) -> Result<f64, EvalError> {
        Program::compile(&parse(source).unwrap())
            .unwrap()
            .evaluate(scope)
    }

    fn scope() -> SurfaceSample {
        SurfaceSample::new(2.0, 3.0, 10.0, 0.5)
    }

    #[test]
    fn test_arithmetic() {
        let s = scope();
        assert_eq!(run("r + y * 2", &s).unwrap(), 8.0);
        assert_eq!(run("(r + y) * 2", &s).unwrap(), 10.0);
        assert_eq!(run("height / 4", &s).unwrap(), 2.5);
        assert_eq!(run("7 % 4", &s).unwrap(), 3.0);
        assert_eq!(run("2 ^ 3 ^ 2", &s).unwrap(), 512.0);
        assert_eq!(run("-2 ^ 2", &s).unwrap(), -4.0);
        assert_eq!(run("--r", &s).unwrap(), 2.0);
    }

    #[test]
    fn test_functions_and_constants() {
        let s = scope();
        assert!((run("sin(angle)", &s).unwrap() - 0.5f64.sin()).abs() < 1e-12);
        assert!((run("pi", &s).unwrap() - std::f64::consts::PI).abs() < 1e-12);
        assert!((run("e", &s).unwrap() - std::f64::consts::E).abs() < 1e-12);
        assert_eq!(run("max(r, y)", &s).unwrap(), 3.0);
        assert_eq!(run("clamp(height, 0, 5)", &s).unwrap(), 5.0);
        assert_eq!(run("clamp(1, 5, 0)", &s).unwrap(), 0.0);
        assert_eq!(run("sign(-r)", &s).unwrap(), -1.0);
        assert_eq!(run("pow(r, 3)", &s).unwrap(), 8.0);
    }

    #[test]
    fn test_division_by_zero_fails() {
        let s = SurfaceSample::new(1.0, 1.0, 1.0, 0.0);
        assert_eq!(run("r / angle", &s), Err(EvalError::DivisionByZero));
        assert_eq!(run("r % angle", &s), Err(EvalError::DivisionByZero));
        assert_eq!(run("1 / 0", &s), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_domain_error_is_non_finite() {
        let s = scope();
        assert!(matches!(run("sqrt(-r)", &s), Err(EvalError::NonFinite(_))));
        assert!(matches!(run("ln(0)", &s), Err(EvalError::NonFinite(_))));
    }

    #[test]
    fn test_constant_folding() {
        let program = Program::compile(&parse("r * (2 + 3 * sin(0))").unwrap()).unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(program.evaluate(&scope()).unwrap(), 4.0);
    }

    #[test]
    fn test_identity_program() {
        let program = Program::identity(Variable::Y);
        assert_eq!(program.evaluate(&scope()).unwrap(), 3.0);
        assert_eq!(program, Program::compile(&parse("y").unwrap()).unwrap());
    }

    #[test]
    fn test_stack_limit() {
        // Right-nested sums keep every left operand on the stack
        let mut source = String::new();
        for _ in 0..60 {
            source.push_str("r+(");
        }
        source.push('r');
        source.push_str(&")".repeat(60));
        let program = Program::compile(&parse(&source).unwrap()).unwrap();
        assert_eq!(program.evaluate(&scope()).unwrap(), 122.0);
    }
}
