//! Error types reported by the formula compiler and the trace evaluation engine.

use thiserror::Error;

/// Errors raised while compiling a STREL formula into an automaton.
///
/// Compilation is all-or-nothing: on error, no partially built automaton is
/// handed to the caller.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CompileError {
    /// The formula contains an operator the automaton construction does not
    /// support (currently only `escape`).
    #[error("the `{0}` operator is not supported by the automaton construction")]
    UnsupportedOperator(String),
    /// A structural parameter is out of range: zero locations, a `next` with
    /// zero steps, or an interval with inverted or negative bounds.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors raised while evaluating a compiled automaton over a trace.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EvalError {
    /// A free variable of the state polynomial has no assigned value. This
    /// indicates a broken table invariant and is fatal.
    #[error("state variable `{0}` has no assigned value")]
    UnknownVariable(String),
    /// The requested ego location is outside of the compiled location range.
    #[error("location {location} is outside of the automaton range 0..{max_locs}")]
    LocationOutOfRange { location: usize, max_locs: usize },
}

/// Any error the one-shot monitoring helpers can produce.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MonitorError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}
