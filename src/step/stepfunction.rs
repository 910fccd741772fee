use std::f64::NEG_INFINITY;
use std::fmt;
use std::iter::once;
use std::ops::{
    Add,
    BitAnd,
    BitOr,
    Div,
    Mul,
    Neg,
    Rem,
    Sub
};
use std::sync::LazyLock;

use serde::{
    Deserialize,
    Serialize
};

use crate::configuration::ApproxConfiguration;
use crate::step::intervalset::IntervalSet;
use crate::steperror::StepError;
use crate::terms::merge::{
    approx,
    pointwise_unary
};
use crate::terms::term::{
    StepValue,
    Term
};
use crate::terms::termscodec::{
    check_increasing,
    write_triples
};
use crate::terms::terms::{
    indicator,
    Terms,
    TermsAlgebra,
    TermsLattice
};

/// Lebesgue measure, as the density one everywhere.
pub static LEB: LazyLock<StepFunction> = LazyLock::new(StepFunction::one);

pub static ONE: LazyLock<StepFunction> = LazyLock::new(StepFunction::one);

pub static ZERO: LazyLock<StepFunction> = LazyLock::new(StepFunction::zero);

// ─────────────────────────────────────────────────────────────────────────────
// StepFunction
// ─────────────────────────────────────────────────────────────────────────────

/// A piecewise-constant function on the real line.
///
/// `baseline` holds below the first breakpoint; `values[i]` holds on
/// `[breakpoints[i], breakpoints[i + 1])`, the last one up to `+inf`.
/// Breakpoints are finite and strictly increasing, and no value repeats its
/// predecessor (the baseline counts as the predecessor of `values[0]`), so
/// structural equality is pointwise equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StepFunctionRepr<V>", into = "StepFunctionRepr<V>")]
#[serde(bound(
    serialize = "V: StepValue + Serialize",
    deserialize = "V: StepValue + Deserialize<'de>"
))]
pub struct StepFunction<V = f64> {
    baseline: V,
    values: Vec<V>,
    breakpoints: Vec<f64>
}

impl<V: StepValue> StepFunction<V> {
    pub fn constant(value: V) -> StepFunction<V> {
        StepFunction {
            baseline: value,
            values: Vec::new(),
            breakpoints: Vec::new(),
        }
    }

    pub fn zero() -> StepFunction<V> {
        Self::constant(V::zero())
    }

    /// Builds from a baseline plus aligned value/breakpoint sequences.
    pub fn from_sequences(baseline: V, values: Vec<V>, breakpoints: Vec<f64>) -> Result<StepFunction<V>, StepError> {
        if values.len() != breakpoints.len() {
            return Err(StepError::DimensionMismatch {
                expected: breakpoints.len(),
                actual: values.len(),
            });
        }
        check_increasing(once(NEG_INFINITY).chain(breakpoints.iter().copied()))?;
        Ok(Self::from_sorted_terms(
            once(Term::new(baseline, NEG_INFINITY))
                .chain(values.into_iter().zip(breakpoints).map(|(value, left)| Term::new(value, left))),
        ))
    }

    pub fn baseline(&self) -> V {
        self.baseline
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn num_breakpoints(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_constant(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Applies `op` to every value, keeping the breakpoints.
    pub fn map<W, F>(&self, op: F) -> StepFunction<W>
    where
        W: StepValue,
        F: FnMut(V) -> W,
    {
        StepFunction::from_sorted_terms(pointwise_unary(op, self.iter_terms()))
    }
}

impl StepFunction<f64> {
    pub fn one() -> StepFunction<f64> {
        Self::constant(1.0)
    }

    /// Samples `fun` at `num_steps` evenly spaced points of `[start, stop)`.
    /// The result is zero outside the window.
    pub fn from_function<F>(fun: F, start: f64, stop: f64, num_steps: usize) -> Result<StepFunction<f64>, StepError>
    where
        F: FnMut(f64) -> f64,
    {
        if !(start.is_finite() && stop.is_finite() && start < stop) {
            tracing::debug!(start, stop, "rejecting sampling window");
            return Err(StepError::InvalidWindow { start, stop });
        }
        tracing::trace!(start, stop, num_steps, "sampling function");
        Ok(Self::from_sorted_terms(approx(fun, start, stop, num_steps)))
    }

    pub fn from_function_with<F>(fun: F, configuration: &ApproxConfiguration) -> Result<StepFunction<f64>, StepError>
    where
        F: FnMut(f64) -> f64,
    {
        Self::from_function(fun, configuration.start(), configuration.stop(), configuration.num_steps())
    }

    /// Indicator function of `set`.
    pub fn from_interval_set(set: &IntervalSet) -> StepFunction<f64> {
        Self::from_sorted_terms(pointwise_unary(indicator, set.iter_terms()))
    }

    /// The set where the function is nonzero.
    pub fn support_set(&self) -> IntervalSet {
        IntervalSet::from_sorted_terms(pointwise_unary(|x: f64| x != 0.0, self.iter_terms()))
    }

    /// Multiplies every value by `c`; scaling by zero gives the zero function.
    pub fn scale(&self, c: f64) -> StepFunction<f64> {
        if c == 0.0 {
            Self::zero()
        } else {
            self.map_values(|x| x * c)
        }
    }

    /// Divides every value by `c`; dividing by zero gives the zero function.
    pub fn divide_scalar(&self, c: f64) -> StepFunction<f64> {
        if c == 0.0 {
            Self::zero()
        } else {
            self.map_values(|x| x / c)
        }
    }
}

impl<V: StepValue> Terms for StepFunction<V> {
    type Value = V;

    fn iter_terms(&self) -> impl Iterator<Item = Term<V>> + '_ {
        once(Term::new(self.baseline, NEG_INFINITY)).chain(
            self.values
                .iter()
                .zip(self.breakpoints.iter())
                .map(|(&value, &left)| Term::new(value, left)),
        )
    }

    fn from_sorted_terms<I>(terms: I) -> StepFunction<V>
    where
        I: IntoIterator<Item = Term<V>>,
    {
        let mut baseline = V::zero();
        let mut values: Vec<V> = Vec::new();
        let mut breakpoints: Vec<f64> = Vec::new();
        for term in terms {
            if term.left() == NEG_INFINITY {
                baseline = term.value();
                continue;
            }
            let previous = values.last().copied().unwrap_or(baseline);
            if term.value() != previous {
                values.push(term.value());
                breakpoints.push(term.left());
            }
        }
        StepFunction {
            baseline,
            values,
            breakpoints,
        }
    }

    /// Binary search for the last breakpoint `<= x`.
    fn evaluate(&self, x: f64) -> V {
        match self.breakpoints.partition_point(|&left| left <= x) {
            0 => self.baseline,
            count => self.values[count - 1],
        }
    }
}

impl<V: StepValue> TermsLattice for StepFunction<V> {}

impl TermsAlgebra for StepFunction<f64> {}

impl<V: StepValue> fmt::Display for StepFunction<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_triples(f, "StepFunction", " + ", self.iter_triples(), |triple| {
            format!("{}[{}, {})", triple.value(), triple.left(), triple.right())
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serialization
// ─────────────────────────────────────────────────────────────────────────────

/// Wire form: every field finite, so it survives JSON.
#[derive(Serialize, Deserialize)]
struct StepFunctionRepr<V> {
    baseline: V,
    breakpoints: Vec<f64>,
    values: Vec<V>
}

impl<V: StepValue> From<StepFunction<V>> for StepFunctionRepr<V> {
    fn from(step: StepFunction<V>) -> StepFunctionRepr<V> {
        StepFunctionRepr {
            baseline: step.baseline,
            breakpoints: step.breakpoints,
            values: step.values,
        }
    }
}

impl<V: StepValue> TryFrom<StepFunctionRepr<V>> for StepFunction<V> {
    type Error = StepError;

    fn try_from(repr: StepFunctionRepr<V>) -> Result<StepFunction<V>, StepError> {
        StepFunction::from_sequences(repr.baseline, repr.values, repr.breakpoints)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

impl Add for &StepFunction<f64> {
    type Output = StepFunction<f64>;

    fn add(self, rhs: &StepFunction<f64>) -> StepFunction<f64> {
        TermsAlgebra::add(self, rhs)
    }
}

impl Sub for &StepFunction<f64> {
    type Output = StepFunction<f64>;

    fn sub(self, rhs: &StepFunction<f64>) -> StepFunction<f64> {
        self.subtract(rhs)
    }
}

impl Mul for &StepFunction<f64> {
    type Output = StepFunction<f64>;

    fn mul(self, rhs: &StepFunction<f64>) -> StepFunction<f64> {
        self.multiply(rhs)
    }
}

impl Mul<f64> for &StepFunction<f64> {
    type Output = StepFunction<f64>;

    fn mul(self, rhs: f64) -> StepFunction<f64> {
        self.scale(rhs)
    }
}

impl Div for &StepFunction<f64> {
    type Output = StepFunction<f64>;

    fn div(self, rhs: &StepFunction<f64>) -> StepFunction<f64> {
        self.divide(rhs)
    }
}

impl Rem for &StepFunction<f64> {
    type Output = StepFunction<f64>;

    fn rem(self, rhs: &StepFunction<f64>) -> StepFunction<f64> {
        self.remainder(rhs)
    }
}

impl Neg for &StepFunction<f64> {
    type Output = StepFunction<f64>;

    fn neg(self) -> StepFunction<f64> {
        self.negate()
    }
}

impl BitAnd for &StepFunction<f64> {
    type Output = StepFunction<f64>;

    fn bitand(self, rhs: &StepFunction<f64>) -> StepFunction<f64> {
        self.meet(rhs)
    }
}

impl BitOr for &StepFunction<f64> {
    type Output = StepFunction<f64>;

    fn bitor(self, rhs: &StepFunction<f64>) -> StepFunction<f64> {
        self.join(rhs)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::INFINITY;

    use super::*;
    use crate::terms::term::Triple;

    fn step(pairs: &[(f64, f64)]) -> StepFunction {
        StepFunction::from_terms(pairs.iter().map(|&pair| Term::from(pair))).unwrap()
    }

    fn box_on(left: f64, right: f64, value: f64) -> StepFunction {
        StepFunction::from_triples(vec![Triple::new(value, left, right)]).unwrap()
    }

    #[test]
    fn evaluation_is_half_open() {
        let f = box_on(0.0, 1.0, 2.0);
        assert_eq!(f.evaluate(-0.5), 0.0);
        assert_eq!(f.evaluate(0.0), 2.0);
        assert_eq!(f.evaluate(0.999), 2.0);
        assert_eq!(f.evaluate(1.0), 0.0);
    }

    #[test]
    fn finite_first_endpoint_gets_zero_baseline() {
        let f = step(&[(3.0, 1.0), (0.0, 2.0)]);
        assert_eq!(f.baseline(), 0.0);
        assert_eq!(f.breakpoints(), &[1.0, 2.0]);
        assert_eq!(f.values(), &[3.0, 0.0]);
    }

    #[test]
    fn leading_zero_term_is_dropped() {
        let f = step(&[(0.0, 1.0), (3.0, 2.0)]);
        assert_eq!(f.breakpoints(), &[2.0]);
    }

    #[test]
    fn empty_terms_give_zero() {
        let f = StepFunction::from_terms(Vec::<Term<f64>>::new()).unwrap();
        assert_eq!(f, StepFunction::zero());
    }

    #[test]
    fn non_increasing_terms_are_rejected() {
        let result = StepFunction::from_terms(vec![Term::new(1.0, 2.0), Term::new(2.0, 1.0)]);
        assert_eq!(
            result,
            Err(StepError::MalformedSequence {
                position: 1,
                previous: 2.0,
                endpoint: 1.0,
            })
        );
    }

    #[test]
    fn infinite_breakpoints_are_rejected() {
        let from_terms = StepFunction::from_terms(vec![Term::new(1.0, 0.0), Term::new(2.0, INFINITY)]);
        assert_eq!(from_terms, Err(StepError::malformed(1, 0.0, INFINITY)));
        assert!(StepFunction::from_sequences(0.0, vec![1.0], vec![INFINITY]).is_err());
        assert!(StepFunction::from_sequences(0.0, vec![1.0], vec![NEG_INFINITY]).is_err());
        assert!(StepFunction::from_terms(vec![Term::new(1.0, NEG_INFINITY), Term::new(2.0, NEG_INFINITY)]).is_err());
    }

    #[test]
    fn construction_collapses_runs() {
        let f = step(&[(1.0, NEG_INFINITY), (1.0, 0.0), (2.0, 1.0), (2.0, 2.0)]);
        assert_eq!(f.baseline(), 1.0);
        assert_eq!(f.breakpoints(), &[1.0]);
    }

    #[test]
    fn triples_round_trip() {
        let triples = vec![Triple::new(1.0, 0.0, 1.0), Triple::new(-2.0, 3.0, 4.5)];
        let f = StepFunction::from_triples(triples.clone()).unwrap();
        let back: Vec<_> = f.iter_triples().collect();
        assert_eq!(back, triples);
    }

    #[test]
    fn arithmetic() {
        let f = box_on(0.0, 2.0, 3.0);
        let g = box_on(1.0, 3.0, 2.0);
        let sum = &f + &g;
        assert_eq!(sum.evaluate(0.5), 3.0);
        assert_eq!(sum.evaluate(1.5), 5.0);
        assert_eq!(sum.evaluate(2.5), 2.0);
        let product = &f * &g;
        assert_eq!(product, box_on(1.0, 2.0, 6.0));
        let difference = &f - &f;
        assert_eq!(difference, StepFunction::zero());
    }

    #[test]
    fn division_by_zero_yields_zero() {
        let f = box_on(0.0, 2.0, 3.0);
        let g = box_on(1.0, 3.0, 2.0);
        let quotient = &f / &g;
        assert_eq!(quotient.evaluate(0.5), 0.0);
        assert_eq!(quotient.evaluate(1.5), 1.5);
        assert_eq!(quotient.evaluate(2.5), 0.0);
        assert!(quotient.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn remainder_restricts_to_kernel_of_divisor() {
        let f = box_on(0.0, 2.0, 3.0);
        let g = box_on(1.0, 3.0, 2.0);
        assert_eq!(&f % &g, box_on(0.0, 1.0, 3.0));
    }

    #[test]
    fn unary_operators() {
        let f = step(&[(0.0, NEG_INFINITY), (-2.0, 0.0), (3.0, 1.0), (0.0, 2.0)]);
        assert_eq!(f.abs(), step(&[(0.0, NEG_INFINITY), (2.0, 0.0), (3.0, 1.0), (0.0, 2.0)]));
        assert_eq!(f.powi(2), step(&[(0.0, NEG_INFINITY), (4.0, 0.0), (9.0, 1.0), (0.0, 2.0)]));
        assert_eq!(f.positive_part(), box_on(1.0, 2.0, 3.0));
        assert_eq!(f.negative_part(), box_on(0.0, 1.0, -2.0));
        assert_eq!(f.support(), box_on(0.0, 2.0, 1.0));
        assert_eq!(f.kernel(), &*ONE - &box_on(0.0, 2.0, 1.0));
        assert_eq!(f.positive_set(), box_on(1.0, 2.0, 1.0));
        assert_eq!(f.negative_set(), box_on(0.0, 1.0, 1.0));
        assert_eq!(f.preimage(3.0), box_on(1.0, 2.0, 1.0));
        assert_eq!(-&f, step(&[(0.0, NEG_INFINITY), (2.0, 0.0), (-3.0, 1.0), (0.0, 2.0)]));
    }

    #[test]
    fn lattice_operations() {
        let f = box_on(0.0, 2.0, 3.0);
        let g = box_on(1.0, 3.0, 2.0);
        let meet = &f & &g;
        assert_eq!(meet, box_on(1.0, 2.0, 2.0));
        let join = &f | &g;
        assert_eq!(join.evaluate(2.5), 2.0);
        assert_eq!(join.evaluate(1.5), 3.0);
        assert!(meet.is_le(&f));
        assert!(meet.is_lt(&f));
        assert!(f.is_le(&f));
        assert!(!f.is_lt(&f));
        assert!(!f.is_le(&g));
    }

    #[test]
    fn integrate_and_inner_product() {
        let f = box_on(0.0, 2.0, 3.0);
        let g = box_on(1.0, 3.0, 2.0);
        assert_eq!(f.integrate(), 6.0);
        assert_eq!(f.inner_product(&g), 6.0);
        assert_eq!(LEB.inner_product(&f), 6.0);
        assert_eq!(ONE.integrate(), INFINITY);
        assert_eq!(ZERO.integrate(), 0.0);
    }

    #[test]
    fn scalar_operations() {
        let f = box_on(0.0, 2.0, 3.0);
        assert_eq!(&f * 2.0, box_on(0.0, 2.0, 6.0));
        assert_eq!(f.scale(0.0), StepFunction::zero());
        assert_eq!(f.divide_scalar(3.0), box_on(0.0, 2.0, 1.0));
        assert_eq!(f.divide_scalar(0.0), StepFunction::zero());
    }

    #[test]
    fn sampled_function() {
        let f = StepFunction::from_function(|x| x * x, 0.0, 1.0, 4).unwrap();
        assert_eq!(f.evaluate(-1.0), 0.0);
        assert_eq!(f.evaluate(0.3), 0.0625);
        assert_eq!(f.evaluate(0.8), 0.5625);
        assert_eq!(f.evaluate(1.0), 0.0);
        assert!(StepFunction::from_function(|x| x, 1.0, 1.0, 4).is_err());
        assert!(StepFunction::from_function(|x| x, 0.0, INFINITY, 4).is_err());
    }

    #[test]
    fn sampled_with_configuration() {
        let configuration = ApproxConfiguration::default();
        let f = StepFunction::from_function_with(|_| 1.0, &configuration).unwrap();
        assert_eq!(f, box_on(-10.0, 10.0, 1.0));
    }

    #[test]
    fn support_set_round_trip() {
        let f = step(&[(0.0, NEG_INFINITY), (-2.0, 0.0), (3.0, 1.0), (0.0, 2.0), (1.0, 5.0)]);
        let set = f.support_set();
        assert!(set.contains(0.5));
        assert!(!set.contains(3.0));
        assert!(set.contains(100.0));
        assert_eq!(StepFunction::from_interval_set(&set), f.support());
    }

    #[test]
    fn display_elides_after_three_triples() {
        let f = step(&[(0.0, NEG_INFINITY), (1.0, 0.0), (2.0, 1.0), (0.0, 2.0)]);
        assert_eq!(f.to_string(), "StepFunction(1[0, 1) + 2[1, 2))");
        let g = step(&[(1.0, 0.0), (2.0, 1.0), (3.0, 2.0), (4.0, 3.0)]);
        assert_eq!(g.to_string(), "StepFunction(1[0, 1) + 2[1, 2) + 3[2, 3) + ...)");
    }

    #[test]
    fn serde_round_trip_validates() {
        let f = step(&[(0.0, NEG_INFINITY), (1.0, 0.0), (2.0, 1.0), (0.0, 2.0)]);
        let json = serde_json::to_string(&f).unwrap();
        let back: StepFunction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
        let malformed = r#"{"baseline":0.0,"breakpoints":[2.0,1.0],"values":[1.0,2.0]}"#;
        assert!(serde_json::from_str::<StepFunction>(malformed).is_err());
    }

    #[test]
    fn map_changes_value_type() {
        let f = step(&[(0.0, NEG_INFINITY), (1.0, 0.0), (2.0, 1.0), (0.0, 2.0)]);
        let positive: StepFunction<bool> = f.map(|x| x > 0.0);
        assert_eq!(positive.breakpoints(), &[0.0, 2.0]);
        assert!(positive.evaluate(1.5));
    }
}
