use crate::steperror::StepError;
use crate::terms::merge::{
    self,
    pointwise_binary,
    pointwise_unary,
    terms_equal
};
use crate::terms::term::{
    StepValue,
    Term,
    Triple
};
use crate::terms::termscodec::{
    check_increasing,
    check_triples,
    terms_of_triples,
    triples_of_terms
};

// ─────────────────────────────────────────────────────────────────────────────
// Terms
// ─────────────────────────────────────────────────────────────────────────────

/// Anything that can be enumerated as a terms sequence opening at `-inf`.
///
/// Every representation (plain step function, interval set, value-factored
/// composite) implements this contract; conversions between them go through
/// `iter_terms` and `from_sorted_terms`.
pub trait Terms: Sized {
    type Value: StepValue;

    /// Dense `(value, left)` sequence, canonical, first endpoint `-inf`.
    fn iter_terms(&self) -> impl Iterator<Item = Term<Self::Value>> + '_;

    /// Builds an instance from terms whose endpoints are strictly increasing.
    /// Runs of equal values are collapsed; a sequence opening at a finite
    /// endpoint has a zero baseline below it.
    fn from_sorted_terms<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = Term<Self::Value>>;

    fn evaluate(&self, x: f64) -> Self::Value;

    /// Validating counterpart of `from_sorted_terms`.
    fn from_terms<I>(terms: I) -> Result<Self, StepError>
    where
        I: IntoIterator<Item = Term<Self::Value>>,
    {
        let terms: Vec<Term<Self::Value>> = terms.into_iter().collect();
        check_increasing(terms.iter().map(|term| term.left()))?;
        Ok(Self::from_sorted_terms(terms))
    }

    /// Builds from `(value, left, right)` triples; gaps between them are zero.
    fn from_triples<I>(triples: I) -> Result<Self, StepError>
    where
        I: IntoIterator<Item = Triple<Self::Value>>,
    {
        let triples: Vec<Triple<Self::Value>> = triples.into_iter().collect();
        check_triples(&triples)?;
        Ok(Self::from_sorted_terms(terms_of_triples(triples)))
    }

    /// Sparse enumeration: zero-valued triples are omitted.
    fn iter_triples(&self) -> impl Iterator<Item = Triple<Self::Value>> + '_ {
        triples_of_terms(self.iter_terms())
    }

    /// Lebesgue integral. Infinite unless the support is bounded.
    fn integrate(&self) -> f64 {
        merge::integrate(self.iter_terms())
    }

    fn inner_product<T: Terms>(&self, other: &T) -> f64 {
        merge::integrate(pointwise_binary(
            |a: Self::Value, b: T::Value| a.to_f64() * b.to_f64(),
            self.iter_terms(),
            other.iter_terms(),
        ))
    }

    fn terms_eq<T>(&self, other: &T) -> bool
    where
        T: Terms<Value = Self::Value>,
    {
        terms_equal(self.iter_terms(), other.iter_terms())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TermsLattice
// ─────────────────────────────────────────────────────────────────────────────

fn lesser<V: PartialOrd>(a: V, b: V) -> V {
    if b < a { b } else { a }
}

fn greater<V: PartialOrd>(a: V, b: V) -> V {
    if b > a { b } else { a }
}

/// Pointwise min/max lattice.
///
/// `meet` and `join` are idempotent, commutative and associative, and absorb
/// each other: `x.meet(&x.join(&y)) == x`.
pub trait TermsLattice: Terms {
    fn meet(&self, other: &Self) -> Self {
        Self::from_sorted_terms(pointwise_binary(lesser, self.iter_terms(), other.iter_terms()))
    }

    fn join(&self, other: &Self) -> Self {
        Self::from_sorted_terms(pointwise_binary(greater, self.iter_terms(), other.iter_terms()))
    }

    /// `self <= other` iff `self == self.meet(other)`.
    fn is_le(&self, other: &Self) -> bool {
        self.terms_eq(&self.meet(other))
    }

    fn is_lt(&self, other: &Self) -> bool {
        self.is_le(other) && !self.terms_eq(other)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TermsAlgebra
// ─────────────────────────────────────────────────────────────────────────────

pub fn indicator(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Pointwise ring operations on real-valued step functions.
///
/// `add` and `multiply` are commutative and associative, `multiply`
/// distributes over `add`, and the everywhere-one function is the unit.
/// Division and remainder never fail: a zero divisor yields zero.
pub trait TermsAlgebra: TermsLattice<Value = f64> {
    fn combine<F>(&self, other: &Self, op: F) -> Self
    where
        F: FnMut(f64, f64) -> f64,
    {
        Self::from_sorted_terms(pointwise_binary(op, self.iter_terms(), other.iter_terms()))
    }

    fn map_values<F>(&self, op: F) -> Self
    where
        F: FnMut(f64) -> f64,
    {
        Self::from_sorted_terms(pointwise_unary(op, self.iter_terms()))
    }

    fn add(&self, other: &Self) -> Self {
        self.combine(other, |x, y| x + y)
    }

    fn subtract(&self, other: &Self) -> Self {
        self.combine(other, |x, y| x - y)
    }

    fn multiply(&self, other: &Self) -> Self {
        self.combine(other, |x, y| x * y)
    }

    /// `x / y` where `y != 0`, zero elsewhere.
    fn divide(&self, other: &Self) -> Self {
        self.combine(other, |x, y| if y != 0.0 { x / y } else { 0.0 })
    }

    /// `x` where `y == 0`, zero elsewhere: `self` restricted to the kernel of `other`.
    fn remainder(&self, other: &Self) -> Self {
        self.combine(other, |x, y| if y == 0.0 { x } else { 0.0 })
    }

    fn negate(&self) -> Self {
        self.map_values(|x| -x)
    }

    fn abs(&self) -> Self {
        self.map_values(f64::abs)
    }

    fn powi(&self, n: i32) -> Self {
        self.map_values(|x| x.powi(n))
    }

    fn positive_part(&self) -> Self {
        self.map_values(|x| if x > 0.0 { x } else { 0.0 })
    }

    fn negative_part(&self) -> Self {
        self.map_values(|x| if x < 0.0 { x } else { 0.0 })
    }

    /// Indicator of `x != 0`.
    fn support(&self) -> Self {
        self.map_values(|x| indicator(x != 0.0))
    }

    /// Indicator of `x == 0`.
    fn kernel(&self) -> Self {
        self.map_values(|x| indicator(x == 0.0))
    }

    fn positive_set(&self) -> Self {
        self.map_values(|x| indicator(x > 0.0))
    }

    fn negative_set(&self) -> Self {
        self.map_values(|x| indicator(x < 0.0))
    }

    /// Indicator of `x == a`.
    fn preimage(&self, a: f64) -> Self {
        self.map_values(|x| indicator(x == a))
    }
}
