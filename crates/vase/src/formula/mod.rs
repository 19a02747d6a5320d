//! Sandboxed formula language for radius and height overrides.
//!
//! Users type small numeric expressions that are evaluated once per surface
//! point. The language has no statements, no assignment and no access to
//! anything outside the five scope variables, so evaluation is a pure
//! function of the [`SurfaceSample`].
//!
//! # Expression Language
//!
//! - Variables: `r`, `y`, `height`, `angle`, `pi`
//! - Constants: `e`
//! - Operators: `+ - * / %`, `^` (power), unary `-` and `+`
//! - Functions: `sin cos tan asin acos atan atan2 sinh cosh tanh sqrt abs exp
//!   ln log log10 log2 floor ceil round sign min max pow clamp`
//!
//! # Lifecycle
//!
//! A source string is parsed, compiled into a [`Program`] and then validated
//! by evaluating it once against [`SurfaceSample::VALIDATION`]. A formula that
//! fails any of these steps is replaced by its fallback and the failure is
//! logged, so compilation itself never fails for the caller.

pub mod ast;
mod parser;
mod program;

use std::f64::consts::PI;

use tracing::warn;
use vase_config::{DEFAULT_RADIUS_FORMULA, DEFAULT_VERTICAL_FORMULA};

pub use ast::Variable;
pub use parser::{MAX_DEPTH, MAX_SOURCE_LEN, parse};
pub use program::{Program, STACK_LIMIT};

/// Reasons a formula cannot be compiled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("Formula is empty")]
    Empty,

    #[error("Formula is {len} bytes long, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("Formula nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("Formula needs a stack of {needed}, limit is {max}")]
    TooComplex { needed: usize, max: usize },

    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("Invalid number '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("Unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        offset: usize,
    },

    #[error("Unknown variable '{name}' at offset {offset}")]
    UnknownVariable { name: String, offset: usize },

    #[error("Unknown function '{name}' at offset {offset}")]
    UnknownFunction { name: String, offset: usize },

    #[error("Function '{name}' takes {expected} argument(s), got {found}")]
    WrongArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Formula failed validation: {0}")]
    Validation(#[from] EvalError),
}

/// Reasons a compiled formula fails at one surface point.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Result is not finite ({0})")]
    NonFinite(f64),
}

/// Scope exposed to formulas at one grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    /// Radius before the formula override
    pub r: f64,
    /// Height before the formula override
    pub y: f64,
    /// Full height of the vase
    pub height: f64,
    /// Twist-adjusted angle in radians
    pub angle: f64,
    pub pi: f64,
}

impl SurfaceSample {
    /// Scope used to validate freshly compiled formulas.
    pub const VALIDATION: SurfaceSample = SurfaceSample {
        r: 1.0,
        y: 1.0,
        height: 1.0,
        angle: 1.0,
        pi: PI,
    };

    pub fn new(r: f64, y: f64, height: f64, angle: f64) -> Self {
        Self {
            r,
            y,
            height,
            angle,
            pi: PI,
        }
    }

    pub fn get(&self, var: Variable) -> f64 {
        match var {
            Variable::R => self.r,
            Variable::Y => self.y,
            Variable::Height => self.height,
            Variable::Angle => self.angle,
            Variable::Pi => self.pi,
        }
    }
}

/// Parse, compile and validate a source string.
pub fn compile(source: &str) -> Result<Program, FormulaError> {
    let program = Program::compile(&parse(source)?)?;
    program.evaluate(&SurfaceSample::VALIDATION)?;
    Ok(program)
}

/// A user formula together with the fallback used when it does not compile.
#[derive(Debug, Clone)]
pub struct CompiledFormula {
    source: String,
    program: Program,
    fallback_source: String,
    compile_error: Option<FormulaError>,
}

impl CompiledFormula {
    /// Compile `source`, substituting `fallback_source` when it is invalid.
    ///
    /// Errors only when the fallback itself does not compile.
    pub fn compile(source: &str, fallback_source: &str) -> Result<Self, FormulaError> {
        let fallback = compile(fallback_source)?;
        Ok(Self::with_fallback(source, fallback_source, fallback))
    }

    /// Radius formula falling back to the identity `r`.
    pub fn radius(source: &str) -> Self {
        Self::with_fallback(
            source,
            DEFAULT_RADIUS_FORMULA,
            Program::identity(Variable::R),
        )
    }

    /// Vertical formula falling back to the identity `y`.
    pub fn vertical(source: &str) -> Self {
        Self::with_fallback(
            source,
            DEFAULT_VERTICAL_FORMULA,
            Program::identity(Variable::Y),
        )
    }

    fn with_fallback(source: &str, fallback_source: &str, fallback: Program) -> Self {
        let (program, compile_error) = match compile(source) {
            Ok(program) => (program, None),
            Err(e) => {
                warn!(
                    "Formula '{}' rejected ({}), using fallback '{}'",
                    source, e, fallback_source
                );
                (fallback, Some(e))
            }
        };

        Self {
            source: source.to_string(),
            program,
            fallback_source: fallback_source.to_string(),
            compile_error,
        }
    }

    /// Source string as typed by the user
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn fallback_source(&self) -> &str {
        &self.fallback_source
    }

    /// Whether the user source was replaced by the fallback
    pub fn used_fallback(&self) -> bool {
        self.compile_error.is_some()
    }

    /// Why the user source was rejected, if it was
    pub fn compile_error(&self) -> Option<&FormulaError> {
        self.compile_error.as_ref()
    }

    /// Evaluate the active program at one surface point.
    pub fn evaluate(&self, scope: &SurfaceSample) -> Result<f64, EvalError> {
        self.program.evaluate(scope)
    }
}
