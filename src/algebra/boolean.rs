//! The Boolean polynomial manager, a thin facade over reduced ordered BDDs.
//! This is a place to look for when you need to touch underlying BDDs directly.

use crate::algebra::PolynomialManager;
use crate::errors::EvalError;

use biodivine_lib_bdd::{Bdd, BddVariable, BddVariableSet, BddVariableSetBuilder};

use std::collections::{BTreeSet, HashMap};

/// Boolean polynomials are BDDs over one variable per automaton state.
///
/// Each declared variable gets a hidden "staging" twin. Simultaneous
/// substitution shifts the substituted variables onto their twins with an
/// iff-comparator and an existential projection, then binds each twin to its
/// replacement polynomial the same way. Sequential variable-by-variable
/// substitution would capture occurrences of a variable inside its own
/// replacement (self-referential fixed-point transitions do exactly that).
pub struct BddPolynomialManager {
    variables: BddVariableSet,
    state_vars: HashMap<String, BddVariable>,
    staging_vars: HashMap<String, BddVariable>,
    names: HashMap<BddVariable, String>,
}

impl PolynomialManager for BddPolynomialManager {
    type Value = bool;
    type Poly = Bdd;

    fn with_variables(names: &[String]) -> Self {
        let mut builder = BddVariableSetBuilder::new();
        let mut state_vars = HashMap::new();
        let mut staging_vars = HashMap::new();
        let mut reverse = HashMap::new();
        for name in names {
            if state_vars.contains_key(name) {
                continue;
            }
            let var = builder.make_variable(name.as_str());
            let staging = builder.make_variable(format!("{name}_staging").as_str());
            state_vars.insert(name.clone(), var);
            staging_vars.insert(name.clone(), staging);
            reverse.insert(var, name.clone());
        }
        BddPolynomialManager {
            variables: builder.build(),
            state_vars,
            staging_vars,
            names: reverse,
        }
    }

    fn top(&self) -> Bdd {
        self.variables.mk_true()
    }

    fn bottom(&self) -> Bdd {
        self.variables.mk_false()
    }

    fn constant(&self, value: bool) -> Bdd {
        if value { self.top() } else { self.bottom() }
    }

    fn top_value(&self) -> bool {
        true
    }

    fn bottom_value(&self) -> bool {
        false
    }

    fn var(&self, name: &str) -> Result<Bdd, EvalError> {
        self.state_vars
            .get(name)
            .map(|var| self.variables.mk_var(*var))
            .ok_or_else(|| EvalError::UnknownVariable(name.to_string()))
    }

    fn add(&self, left: &Bdd, right: &Bdd) -> Bdd {
        left.or(right)
    }

    fn mul(&self, left: &Bdd, right: &Bdd) -> Bdd {
        left.and(right)
    }

    fn negate(&self, poly: &Bdd) -> Bdd {
        poly.not()
    }

    fn is_top(&self, poly: &Bdd) -> bool {
        poly.is_true()
    }

    fn support(&self, poly: &Bdd) -> BTreeSet<String> {
        poly.support_set()
            .into_iter()
            .filter_map(|var| self.names.get(&var).cloned())
            .collect()
    }

    fn substitute(&self, poly: &Bdd, map: &HashMap<String, Bdd>) -> Result<Bdd, EvalError> {
        // only variables actually free in `poly` take part
        let support = poly.support_set();
        let mut pending: Vec<(BddVariable, BddVariable, &Bdd)> = Vec::new();
        for (name, replacement) in map {
            let var = self
                .state_vars
                .get(name)
                .ok_or_else(|| EvalError::UnknownVariable(name.clone()))?;
            if support.contains(var) {
                pending.push((*var, self.staging_vars[name], replacement));
            }
        }
        if pending.is_empty() {
            return Ok(poly.clone());
        }

        // shift the substituted variables onto their staging twins:
        // exists v. (poly & (v <=> v_staging))
        let mut comparator = self.variables.mk_true();
        for (var, staging, _) in &pending {
            comparator = comparator.and(
                &self
                    .variables
                    .mk_var(*var)
                    .iff(&self.variables.mk_var(*staging)),
            );
        }
        let originals: Vec<BddVariable> = pending.iter().map(|(var, _, _)| *var).collect();
        let shifted = poly.and(&comparator).exists(&originals);

        // bind each staging twin to its replacement and project it away:
        // exists v_staging. (shifted & (v_staging <=> replacement))
        let mut comparator = self.variables.mk_true();
        for (_, staging, replacement) in &pending {
            comparator = comparator.and(&self.variables.mk_var(*staging).iff(replacement));
        }
        let stagings: Vec<BddVariable> = pending.iter().map(|(_, staging, _)| *staging).collect();
        Ok(shifted.and(&comparator).exists(&stagings))
    }

    fn eval(&self, poly: &Bdd, map: &HashMap<String, bool>) -> Result<bool, EvalError> {
        let mut valuation: Vec<(BddVariable, bool)> = Vec::new();
        for var in poly.support_set() {
            let name = self
                .names
                .get(&var)
                .ok_or_else(|| EvalError::UnknownVariable(format!("{var:?}")))?;
            match map.get(name) {
                Some(value) => valuation.push((var, *value)),
                None => return Err(EvalError::UnknownVariable(name.clone())),
            }
        }
        let grounded = poly.restrict(&valuation);
        if grounded.is_true() {
            Ok(true)
        } else if grounded.is_false() {
            Ok(false)
        } else {
            // cannot happen once the whole support is restricted
            Err(EvalError::UnknownVariable(
                self.support(&grounded)
                    .into_iter()
                    .next()
                    .unwrap_or_default(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> BddPolynomialManager {
        BddPolynomialManager::with_variables(&[
            "x".to_string(),
            "y".to_string(),
            "z".to_string(),
        ])
    }

    #[test]
    /// Test the basic semiring operations on the Boolean carrier.
    fn basic_operations() {
        let m = manager();
        assert!(m.is_top(&m.top()));
        assert!(!m.is_top(&m.bottom()));
        assert_eq!(m.constant(true), m.top());
        assert_eq!(m.constant(false), m.bottom());

        let x = m.var("x").unwrap();
        assert!(m.is_top(&m.add(&x, &m.negate(&x))));
        assert_eq!(m.mul(&x, &m.bottom()), m.bottom());
        assert_eq!(m.add(&x, &m.bottom()), x);

        assert!(m.var("unknown").is_err());
    }

    #[test]
    /// Support only reports declared state variables.
    fn support_reports_free_variables() {
        let m = manager();
        let x = m.var("x").unwrap();
        let y = m.var("y").unwrap();
        let p = m.mul(&x, &m.negate(&y));
        let support: Vec<String> = m.support(&p).into_iter().collect();
        assert_eq!(support, vec!["x".to_string(), "y".to_string()]);
        assert!(m.support(&m.top()).is_empty());
    }

    #[test]
    /// Substitution must be simultaneous: swapping two variables through a map
    /// that mentions both must not cascade.
    fn substitution_is_simultaneous() {
        let m = manager();
        let x = m.var("x").unwrap();
        let y = m.var("y").unwrap();
        let p = m.mul(&x, &m.negate(&y));

        let map = HashMap::from([("x".to_string(), y.clone()), ("y".to_string(), x.clone())]);
        let swapped = m.substitute(&p, &map).unwrap();
        assert_eq!(swapped, m.mul(&y, &m.negate(&x)));
    }

    #[test]
    /// A variable may be replaced by a polynomial mentioning itself.
    fn self_referential_substitution() {
        let m = manager();
        let x = m.var("x").unwrap();
        let y = m.var("y").unwrap();

        // x := x | y applied to x
        let map = HashMap::from([("x".to_string(), m.add(&x, &y))]);
        let result = m.substitute(&x, &map).unwrap();
        assert_eq!(result, m.add(&x, &y));
    }

    #[test]
    /// Variables missing from the map stay free; unknown map keys are errors.
    fn substitution_edge_cases() {
        let m = manager();
        let x = m.var("x").unwrap();
        let y = m.var("y").unwrap();
        let p = m.add(&x, &y);

        let map = HashMap::from([("x".to_string(), m.top())]);
        assert!(m.is_top(&m.substitute(&p, &map).unwrap()));

        let map = HashMap::from([("x".to_string(), m.bottom())]);
        assert_eq!(m.substitute(&p, &map).unwrap(), y);

        let bad = HashMap::from([("nope".to_string(), m.top())]);
        assert_eq!(
            m.substitute(&p, &bad),
            Err(EvalError::UnknownVariable("nope".to_string()))
        );
    }

    #[test]
    /// Grounded evaluation requires the whole support to be mapped.
    fn grounded_evaluation() {
        let m = manager();
        let x = m.var("x").unwrap();
        let y = m.var("y").unwrap();
        let p = m.mul(&x, &m.negate(&y));

        let map = HashMap::from([("x".to_string(), true), ("y".to_string(), false)]);
        assert!(m.eval(&p, &map).unwrap());

        let map = HashMap::from([("x".to_string(), true), ("y".to_string(), true)]);
        assert!(!m.eval(&p, &map).unwrap());

        let partial = HashMap::from([("x".to_string(), true)]);
        assert_eq!(
            m.eval(&p, &partial),
            Err(EvalError::UnknownVariable("y".to_string()))
        );

        // constants evaluate under the empty mapping
        assert!(m.eval(&m.top(), &HashMap::new()).unwrap());
    }
}
