use std::collections::HashMap;
use std::hash::Hash;
use std::ops::{
    Add,
    Mul,
    Neg,
    Sub
};

use serde::Serialize;

use crate::step::intervalset::IntervalSet;
use crate::step::stepfunction::StepFunction;
use crate::steperror::StepError;
use crate::terms::merge::{
    pointwise_binary,
    reduce_terms
};
use crate::terms::term::Term;
use crate::terms::terms::Terms;

// ─────────────────────────────────────────────────────────────────────────────
// Factoring
// ─────────────────────────────────────────────────────────────────────────────

/// Hash key of a table value; `-0.0` and `0.0` share a slot.
fn value_key(value: f64) -> u64 {
    if value == 0.0 { 0 } else { value.to_bits() }
}

/// Replaces every term's value by its position in a table of distinct keys,
/// listed in first-seen order.
fn factor<K, I>(terms: I) -> (Vec<K>, StepFunction<usize>)
where
    K: Copy + Eq + Hash,
    I: IntoIterator<Item = Term<K>>,
{
    let mut table: Vec<K> = Vec::new();
    let mut positions: HashMap<K, usize> = HashMap::new();
    let indices: Vec<Term<usize>> = terms
        .into_iter()
        .map(|term| {
            let position = *positions.entry(term.value()).or_insert_with(|| {
                table.push(term.value());
                table.len() - 1
            });
            Term::new(position, term.left())
        })
        .collect();
    (table, StepFunction::from_sorted_terms(indices))
}

// ─────────────────────────────────────────────────────────────────────────────
// CompositeFunction
// ─────────────────────────────────────────────────────────────────────────────

/// A step function factored as `table[index(x)]`.
///
/// `index` is an integer-valued step function selecting into `table`. Ring
/// and lattice operations between composites that share `index` act on the
/// tables alone; otherwise both indices are merged into a finer common
/// partition first.
///
/// Only `from_step` guarantees a table of distinct values, each of them
/// selected somewhere. Table operations may repeat values (`f - f` maps every
/// entry to zero), and `from_sequence` may carry entries no index selects.
/// Equality, ordering and `iter_terms` look only at the represented function.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeFunction {
    table: Vec<f64>,
    index: StepFunction<usize>
}

impl CompositeFunction {
    /// Every index must select an entry of `table`.
    pub fn from_sequence(table: Vec<f64>, index: StepFunction<usize>) -> Result<CompositeFunction, StepError> {
        let largest = index.iter_terms().map(|term| term.value()).max().unwrap_or(0);
        if largest >= table.len() {
            return Err(StepError::DimensionMismatch {
                expected: table.len(),
                actual: largest + 1,
            });
        }
        Ok(CompositeFunction { table, index })
    }

    /// Factors `step` into its distinct values, in first-seen order.
    pub fn from_step(step: &StepFunction<f64>) -> CompositeFunction {
        let (keys, index) = factor(step.iter_terms().map(|term| Term::new(value_key(term.value()), term.left())));
        let table = keys
            .into_iter()
            .map(|key| if key == 0 { 0.0 } else { f64::from_bits(key) })
            .collect();
        CompositeFunction { table, index }
    }

    /// Indicator of `set`, factored.
    pub fn from_interval_set(set: &IntervalSet) -> CompositeFunction {
        Self::from_step(&StepFunction::from_interval_set(set))
    }

    pub fn table(&self) -> &[f64] {
        &self.table
    }

    pub fn index(&self) -> &StepFunction<usize> {
        &self.index
    }

    pub fn num_values(&self) -> usize {
        self.table.len()
    }

    pub fn to_step(&self) -> StepFunction<f64> {
        StepFunction::from_sorted_terms(self.iter_terms())
    }

    /// Pairs the tables over a common index function.
    fn align(&self, other: &CompositeFunction) -> (Vec<(f64, f64)>, StepFunction<usize>) {
        if self.index == other.index {
            let pairs = self.table.iter().copied().zip(other.table.iter().copied()).collect();
            (pairs, self.index.clone())
        } else {
            let (positions, index) = factor(pointwise_binary(
                |i: usize, j: usize| (i, j),
                self.index.iter_terms(),
                other.index.iter_terms(),
            ));
            let pairs = positions
                .into_iter()
                .map(|(i, j)| (self.table[i], other.table[j]))
                .collect();
            (pairs, index)
        }
    }

    pub fn combine<F>(&self, other: &CompositeFunction, mut op: F) -> CompositeFunction
    where
        F: FnMut(f64, f64) -> f64,
    {
        let (pairs, index) = self.align(other);
        let table = pairs.into_iter().map(|(x, y)| op(x, y)).collect();
        CompositeFunction { table, index }
    }

    pub fn map_table<F>(&self, op: F) -> CompositeFunction
    where
        F: FnMut(f64) -> f64,
    {
        CompositeFunction {
            table: self.table.iter().copied().map(op).collect(),
            index: self.index.clone(),
        }
    }

    pub fn add(&self, other: &CompositeFunction) -> CompositeFunction {
        self.combine(other, |x, y| x + y)
    }

    pub fn subtract(&self, other: &CompositeFunction) -> CompositeFunction {
        self.combine(other, |x, y| x - y)
    }

    pub fn multiply(&self, other: &CompositeFunction) -> CompositeFunction {
        self.combine(other, |x, y| x * y)
    }

    pub fn negate(&self) -> CompositeFunction {
        self.map_table(|x| -x)
    }

    pub fn meet(&self, other: &CompositeFunction) -> CompositeFunction {
        self.combine(other, f64::min)
    }

    pub fn join(&self, other: &CompositeFunction) -> CompositeFunction {
        self.combine(other, f64::max)
    }

    /// Value pairs `(self(x), other(x))` over the common partition. Table
    /// entries that no index selects never appear.
    fn taken_pairs<'a>(&'a self, other: &'a CompositeFunction) -> impl Iterator<Item = (f64, f64)> + 'a {
        pointwise_binary(
            |i: usize, j: usize| (self.table[i], other.table[j]),
            self.index.iter_terms(),
            other.index.iter_terms(),
        )
        .map(|term| term.value())
    }

    /// Pointwise `self <= other`.
    pub fn is_le(&self, other: &CompositeFunction) -> bool {
        self.taken_pairs(other).all(|(x, y)| x <= y)
    }

    /// `self <= other` and the two differ somewhere, as for
    /// [`TermsLattice::is_lt`](crate::terms::terms::TermsLattice::is_lt).
    pub fn is_lt(&self, other: &CompositeFunction) -> bool {
        self.is_le(other) && self != other
    }

    /// `self(x) < other(x)` at every `x`.
    pub fn is_strictly_below(&self, other: &CompositeFunction) -> bool {
        self.taken_pairs(other).all(|(x, y)| x < y)
    }
}

impl Terms for CompositeFunction {
    type Value = f64;

    fn iter_terms(&self) -> impl Iterator<Item = Term<f64>> + '_ {
        reduce_terms(
            self.index
                .iter_terms()
                .map(|term| Term::new(self.table[term.value()], term.left())),
        )
    }

    fn from_sorted_terms<I>(terms: I) -> CompositeFunction
    where
        I: IntoIterator<Item = Term<f64>>,
    {
        Self::from_step(&StepFunction::from_sorted_terms(terms))
    }

    fn evaluate(&self, x: f64) -> f64 {
        self.table[self.index.evaluate(x)]
    }
}

/// Pointwise equality of the represented functions.
impl PartialEq for CompositeFunction {
    fn eq(&self, other: &CompositeFunction) -> bool {
        self.terms_eq(other)
    }
}

impl From<&StepFunction<f64>> for CompositeFunction {
    fn from(step: &StepFunction<f64>) -> CompositeFunction {
        CompositeFunction::from_step(step)
    }
}

impl Add for &CompositeFunction {
    type Output = CompositeFunction;

    fn add(self, rhs: &CompositeFunction) -> CompositeFunction {
        CompositeFunction::add(self, rhs)
    }
}

impl Sub for &CompositeFunction {
    type Output = CompositeFunction;

    fn sub(self, rhs: &CompositeFunction) -> CompositeFunction {
        self.subtract(rhs)
    }
}

impl Mul for &CompositeFunction {
    type Output = CompositeFunction;

    fn mul(self, rhs: &CompositeFunction) -> CompositeFunction {
        self.multiply(rhs)
    }
}

impl Neg for &CompositeFunction {
    type Output = CompositeFunction;

    fn neg(self) -> CompositeFunction {
        self.negate()
    }
}
