use std::f64::NEG_INFINITY;
use std::iter::{
    once,
    Peekable
};

use crate::terms::term::{
    StepValue,
    Term
};
use crate::terms::termscodec::dense_triples_of_terms;

// ─────────────────────────────────────────────
// Reduction
// ─────────────────────────────────────────────

/// Drops every term whose value repeats the previously emitted value.
pub struct Reduce<V, I> {
    terms: I,
    previous: Option<V>
}

impl<V, I> Iterator for Reduce<V, I>
where
    V: Copy + PartialEq,
    I: Iterator<Item = Term<V>>,
{
    type Item = Term<V>;

    fn next(&mut self) -> Option<Term<V>> {
        loop {
            let term = self.terms.next()?;
            if self.previous != Some(term.value()) {
                self.previous = Some(term.value());
                return Some(term);
            }
        }
    }
}

pub fn reduce_terms<V, I>(terms: I) -> Reduce<V, I::IntoIter>
where
    V: Copy + PartialEq,
    I: IntoIterator<Item = Term<V>>,
{
    Reduce {
        terms: terms.into_iter(),
        previous: None,
    }
}

// ─────────────────────────────────────────────
// Co-iteration
// ─────────────────────────────────────────────

/// Walks two terms sequences in endpoint order and emits `op(x, y)` at every
/// endpoint of either input, using the last value seen on each side.
///
/// Both inputs must open at the same endpoint (the crate always opens at
/// `-inf`); endpoints seen before both sides have a value are skipped.
/// The output is not reduced.
pub struct PointwiseBinary<X, Y, F, A, B>
where
    X: Iterator<Item = Term<A>>,
    Y: Iterator<Item = Term<B>>,
{
    x: Peekable<X>,
    y: Peekable<Y>,
    last_x: Option<A>,
    last_y: Option<B>,
    op: F
}

impl<X, Y, F, A, B, C> Iterator for PointwiseBinary<X, Y, F, A, B>
where
    A: Copy,
    B: Copy,
    C: Copy,
    X: Iterator<Item = Term<A>>,
    Y: Iterator<Item = Term<B>>,
    F: FnMut(A, B) -> C,
{
    type Item = Term<C>;

    fn next(&mut self) -> Option<Term<C>> {
        loop {
            let (advance_x, advance_y) = match (self.x.peek(), self.y.peek()) {
                (None, None) => return None,
                (Some(_), None) => (true, false),
                (None, Some(_)) => (false, true),
                (Some(i), Some(j)) => {
                    if i.left() < j.left() {
                        (true, false)
                    } else if j.left() < i.left() {
                        (false, true)
                    } else {
                        (true, true)
                    }
                }
            };
            let mut left = NEG_INFINITY;
            if advance_x {
                let term = self.x.next()?;
                self.last_x = Some(term.value());
                left = term.left();
            }
            if advance_y {
                let term = self.y.next()?;
                self.last_y = Some(term.value());
                left = term.left();
            }
            if let (Some(a), Some(b)) = (self.last_x, self.last_y) {
                return Some(Term::new((self.op)(a, b), left));
            }
        }
    }
}

/// Unreduced co-iteration; see [`pointwise_binary`] for the canonical form.
pub fn pointwise_binary_raw<A, B, C, X, Y, F>(op: F, x: X, y: Y) -> PointwiseBinary<X::IntoIter, Y::IntoIter, F, A, B>
where
    A: Copy,
    B: Copy,
    X: IntoIterator<Item = Term<A>>,
    Y: IntoIterator<Item = Term<B>>,
    F: FnMut(A, B) -> C,
{
    PointwiseBinary {
        x: x.into_iter().peekable(),
        y: y.into_iter().peekable(),
        last_x: None,
        last_y: None,
        op,
    }
}

/// Pointwise `op` of two terms sequences, in canonical form.
///
/// Runs in `O(|x| + |y|)`; the result never has more endpoints than the
/// union of both inputs.
pub fn pointwise_binary<A, B, C, X, Y, F>(op: F, x: X, y: Y) -> impl Iterator<Item = Term<C>>
where
    A: Copy,
    B: Copy,
    C: Copy + PartialEq,
    X: IntoIterator<Item = Term<A>>,
    Y: IntoIterator<Item = Term<B>>,
    F: FnMut(A, B) -> C,
{
    reduce_terms(pointwise_binary_raw(op, x, y))
}

pub fn pointwise_unary<A, C, X, F>(mut op: F, x: X) -> impl Iterator<Item = Term<C>>
where
    A: Copy,
    C: Copy + PartialEq,
    X: IntoIterator<Item = Term<A>>,
    F: FnMut(A) -> C,
{
    reduce_terms(x.into_iter().map(move |term| Term::new(op(term.value()), term.left())))
}

// ─────────────────────────────────────────────
// Sampling
// ─────────────────────────────────────────────

/// Samples `fun` at `num_steps` evenly spaced points of `[start, stop)`,
/// holding each sample until the next point. Zero outside the window.
///
/// The caller checks the window; `approx` assumes `start < stop`.
pub fn approx<F>(mut fun: F, start: f64, stop: f64, num_steps: usize) -> impl Iterator<Item = Term<f64>>
where
    F: FnMut(f64) -> f64,
{
    let step = (stop - start) / num_steps.max(1) as f64;
    let samples = (0..num_steps).map(move |k| {
        let x = start + k as f64 * step;
        Term::new(fun(x), x)
    });
    reduce_terms(
        once(Term::new(0.0, NEG_INFINITY))
            .chain(samples)
            .chain(once(Term::new(0.0, stop))),
    )
}

// ─────────────────────────────────────────────
// Integration and equality
// ─────────────────────────────────────────────

/// Lebesgue integral: `Σ value · (right - left)` over the nonzero triples.
///
/// A nonzero value on an unbounded triple gives an infinite (or NaN) result.
pub fn integrate<V, I>(terms: I) -> f64
where
    V: StepValue,
    I: IntoIterator<Item = Term<V>>,
{
    dense_triples_of_terms(terms)
        .filter(|triple| !triple.value().is_zero())
        .map(|triple| triple.value().to_f64() * triple.width())
        .sum()
}

/// Exact term-by-term comparison; sequences of different lengths differ.
pub fn terms_equal<V, X, Y>(x: X, y: Y) -> bool
where
    V: PartialEq,
    X: IntoIterator<Item = Term<V>>,
    Y: IntoIterator<Item = Term<V>>,
{
    let mut x = x.into_iter();
    let mut y = y.into_iter();
    loop {
        match (x.next(), y.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if a == b => continue,
            _ => return false,
        }
    }
}
