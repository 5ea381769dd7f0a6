//! Algebraic carriers for the symbolic transition engine.
//!
//! The automaton is generic over a [PolynomialManager]: an owner of named
//! variables over some semiring that can build, combine, substitute into and
//! ground-evaluate polynomials. The Boolean (qualitative) manager lives in
//! [boolean]; quantitative semirings can be plugged in by implementing the
//! trait.

pub mod boolean;

use crate::errors::EvalError;
use std::collections::{BTreeSet, HashMap};

/// A manager of polynomials over a fixed set of named variables with semiring
/// coefficients.
///
/// The variable set is fixed at construction: the compiler knows every
/// automaton state before any polynomial is built, so managers do not need to
/// support late declarations. All operations that look up a variable by name
/// report [EvalError::UnknownVariable] for names outside the declared set.
pub trait PolynomialManager: Sized {
    /// The semiring carrier (`bool` for the qualitative fragment).
    type Value: Clone;
    /// The polynomial representation.
    type Poly: Clone;

    /// Create a manager owning one variable per (distinct) name.
    fn with_variables(names: &[String]) -> Self;

    /// The ⊕/⊗ identities as constant polynomials.
    fn top(&self) -> Self::Poly;
    fn bottom(&self) -> Self::Poly;

    /// A constant polynomial for an arbitrary carrier value.
    fn constant(&self, value: Self::Value) -> Self::Poly;

    /// The carrier values of ⊤ and ⊥ (used to assemble final mappings).
    fn top_value(&self) -> Self::Value;
    fn bottom_value(&self) -> Self::Value;

    /// The polynomial consisting of a single declared variable.
    fn var(&self, name: &str) -> Result<Self::Poly, EvalError>;

    /// Semiring sum of two polynomials.
    fn add(&self, left: &Self::Poly, right: &Self::Poly) -> Self::Poly;

    /// Semiring product of two polynomials.
    fn mul(&self, left: &Self::Poly, right: &Self::Poly) -> Self::Poly;

    /// Negation; defined for the Boolean carrier and for any carrier
    /// supporting it.
    fn negate(&self, poly: &Self::Poly) -> Self::Poly;

    /// True iff the polynomial is the constant ⊤.
    fn is_top(&self, poly: &Self::Poly) -> bool;

    /// Names of the free variables of the polynomial.
    fn support(&self, poly: &Self::Poly) -> BTreeSet<String>;

    /// Simultaneous substitution of polynomials for variables. Variables not
    /// mentioned in `map` are left untouched; names in `map` that are not
    /// declared are an error.
    fn substitute(
        &self,
        poly: &Self::Poly,
        map: &HashMap<String, Self::Poly>,
    ) -> Result<Self::Poly, EvalError>;

    /// Grounded evaluation. Every free variable of `poly` must be assigned a
    /// carrier value by `map`.
    fn eval(
        &self,
        poly: &Self::Poly,
        map: &HashMap<String, Self::Value>,
    ) -> Result<Self::Value, EvalError>;
}
