use std::f64::{
    INFINITY,
    NEG_INFINITY
};
use std::fmt;
use std::iter::Peekable;

use crate::steperror::StepError;
use crate::terms::term::{
    StepValue,
    Term,
    Triple
};

/// Number of triples rendered by `Display` before eliding the rest.
pub const DISPLAY_TRIPLES: usize = 3;

// ─────────────────────────────────────────────
// terms -> triples
// ─────────────────────────────────────────────

/// Pairs each term with the next term's endpoint. Zero-valued triples are kept.
pub struct DenseTriples<I: Iterator> {
    terms: Peekable<I>
}

impl<V, I> Iterator for DenseTriples<I>
where
    V: Copy,
    I: Iterator<Item = Term<V>>,
{
    type Item = Triple<V>;

    fn next(&mut self) -> Option<Triple<V>> {
        let term = self.terms.next()?;
        let right = self.terms.peek().map_or(INFINITY, |next| next.left());
        Some(Triple::new(term.value(), term.left(), right))
    }
}

pub fn dense_triples_of_terms<V, I>(terms: I) -> DenseTriples<I::IntoIter>
where
    V: Copy,
    I: IntoIterator<Item = Term<V>>,
{
    DenseTriples { terms: terms.into_iter().peekable() }
}

/// Sparse view: zero-valued triples are dropped, so converting a dense
/// sequence to triples and back loses its explicit zero runs.
pub fn triples_of_terms<V, I>(terms: I) -> impl Iterator<Item = Triple<V>>
where
    V: StepValue,
    I: IntoIterator<Item = Term<V>>,
{
    dense_triples_of_terms(terms).filter(|triple| !triple.value().is_zero())
}

// ─────────────────────────────────────────────
// triples -> terms
// ─────────────────────────────────────────────

/// Expands triples into terms: the value at the left endpoint, followed by a
/// zero term at a finite right endpoint unless the next triple starts there.
///
/// The output always opens with a term at `-inf` and is not reduced.
pub struct TermsOfTriples<V, I>
where
    I: Iterator<Item = Triple<V>>,
{
    triples: Peekable<I>,
    pending: Option<Term<V>>,
    started: bool
}

impl<V, I> Iterator for TermsOfTriples<V, I>
where
    V: StepValue,
    I: Iterator<Item = Triple<V>>,
{
    type Item = Term<V>;

    fn next(&mut self) -> Option<Term<V>> {
        if let Some(term) = self.pending.take() {
            return Some(term);
        }
        if !self.started {
            self.started = true;
            let opens_at_neg_inf = self
                .triples
                .peek()
                .is_some_and(|triple| triple.left() == NEG_INFINITY);
            if !opens_at_neg_inf {
                return Some(Term::new(V::zero(), NEG_INFINITY));
            }
        }
        let triple = self.triples.next()?;
        let right = triple.right();
        let contiguous = self
            .triples
            .peek()
            .is_some_and(|next| next.left() == right);
        if right < INFINITY && !contiguous {
            self.pending = Some(Term::new(V::zero(), right));
        }
        Some(Term::new(triple.value(), triple.left()))
    }
}

pub fn terms_of_triples<V, I>(triples: I) -> TermsOfTriples<V, I::IntoIter>
where
    V: StepValue,
    I: IntoIterator<Item = Triple<V>>,
{
    TermsOfTriples {
        triples: triples.into_iter().peekable(),
        pending: None,
        started: false,
    }
}

// ─────────────────────────────────────────────
// validation
// ─────────────────────────────────────────────

/// Fails unless the endpoints are strictly increasing and free of NaN. Only
/// the first endpoint may be `-inf`; none may be `+inf`.
pub fn check_increasing<I>(endpoints: I) -> Result<(), StepError>
where
    I: IntoIterator<Item = f64>,
{
    let mut previous = NEG_INFINITY;
    for (position, endpoint) in endpoints.into_iter().enumerate() {
        let in_order = endpoint < INFINITY && (position == 0 || endpoint > previous);
        if !in_order {
            tracing::debug!(position, previous, endpoint, "rejecting non-increasing endpoints");
            return Err(StepError::malformed(position, previous, endpoint));
        }
        previous = endpoint;
    }
    Ok(())
}

/// Triples must be non-empty, non-overlapping and listed left to right.
pub fn check_triples<V: Copy>(triples: &[Triple<V>]) -> Result<(), StepError> {
    let mut previous_right = NEG_INFINITY;
    for (position, triple) in triples.iter().enumerate() {
        if !(triple.left() < triple.right()) {
            tracing::debug!(position, left = triple.left(), right = triple.right(), "rejecting empty triple");
            return Err(StepError::malformed(position, triple.left(), triple.right()));
        }
        if position > 0 && !(triple.left() >= previous_right) {
            tracing::debug!(position, previous_right, left = triple.left(), "rejecting overlapping triples");
            return Err(StepError::malformed(position, previous_right, triple.left()));
        }
        previous_right = triple.right();
    }
    Ok(())
}

// ─────────────────────────────────────────────
// display
// ─────────────────────────────────────────────

/// Writes `name(a + b + c + ...)`, rendering at most `DISPLAY_TRIPLES` triples.
pub fn write_triples<V, I, R>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    separator: &str,
    triples: I,
    render: R,
) -> fmt::Result
where
    V: Copy,
    I: IntoIterator<Item = Triple<V>>,
    R: Fn(&Triple<V>) -> String,
{
    let mut parts: Vec<String> = Vec::new();
    for (n, triple) in triples.into_iter().enumerate() {
        if n < DISPLAY_TRIPLES {
            parts.push(render(&triple));
        } else {
            parts.push("...".to_owned());
            break;
        }
    }
    write!(f, "{}({})", name, parts.join(separator))
}
