use std::f64::{
    INFINITY,
    NEG_INFINITY
};
use std::fmt;
use std::iter::{
    from_fn,
    once
};
use std::ops::{
    BitAnd,
    BitOr,
    BitXor,
    Not,
    Sub
};

use serde::{
    Deserialize,
    Serialize
};

use crate::step::stepfunction::StepFunction;
use crate::steperror::StepError;
use crate::terms::term::Term;
use crate::terms::termscodec::{
    check_increasing,
    write_triples
};
use crate::terms::terms::{
    Terms,
    TermsLattice
};

/// A finite union of half-open intervals `[a, b)`.
///
/// Stored as the membership of points below the first breakpoint (`parity`)
/// and the finite breakpoints at which membership flips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IntervalSetRepr", into = "IntervalSetRepr")]
pub struct IntervalSet {
    parity: bool,
    breakpoints: Vec<f64>
}

impl IntervalSet {
    /// Breakpoints must be finite and strictly increasing.
    pub fn from_sequence(parity: bool, breakpoints: Vec<f64>) -> Result<IntervalSet, StepError> {
        check_increasing(breakpoints.iter().copied())?;
        check_finite(&breakpoints)?;
        Ok(IntervalSet { parity, breakpoints })
    }

    /// Builds from `(included, breakpoint)` pairs: membership from each
    /// breakpoint on is `included`.
    pub fn from_breakpoints<I>(breakpoints: I) -> Result<IntervalSet, StepError>
    where
        I: IntoIterator<Item = (bool, f64)>,
    {
        Self::from_terms(breakpoints.into_iter().map(Term::from))
    }

    /// Builds from alternating endpoints `a0, b0, a1, b1, ...` of the intervals
    /// `[a0, b0), [a1, b1), ...`. A leading `-inf` opens the set at `-inf`, a
    /// trailing `+inf` leaves the last interval unbounded, and coincident
    /// endpoints cancel (`[0, 1)` and `[1, 2)` make `[0, 2)`).
    pub fn from_endpoints<I>(endpoints: I) -> Result<IntervalSet, StepError>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut endpoints = endpoints.into_iter().peekable();
        let parity = endpoints.next_if_eq(&NEG_INFINITY).is_some();
        let mut breakpoints: Vec<f64> = Vec::new();
        let mut previous = NEG_INFINITY;
        for (position, endpoint) in endpoints.enumerate() {
            if !(endpoint >= previous) {
                tracing::debug!(position, previous, endpoint, "rejecting decreasing endpoints");
                return Err(StepError::malformed(position, previous, endpoint));
            }
            previous = endpoint;
            if endpoint == INFINITY {
                continue;
            }
            if breakpoints.last() == Some(&endpoint) {
                breakpoints.pop();
            } else {
                breakpoints.push(endpoint);
            }
        }
        Self::from_sequence(parity, breakpoints)
    }

    pub fn from_pairs<I>(pairs: I) -> Result<IntervalSet, StepError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::from_endpoints(pairs.into_iter().flat_map(|(left, right)| [left, right]))
    }

    /// Support of a real-valued step function.
    pub fn from_indicator(step: &StepFunction<f64>) -> IntervalSet {
        step.support_set()
    }

    /// The empty set.
    pub fn bottom() -> IntervalSet {
        IntervalSet { parity: false, breakpoints: Vec::new() }
    }

    /// The whole line.
    pub fn top() -> IntervalSet {
        IntervalSet { parity: true, breakpoints: Vec::new() }
    }

    pub fn parity(&self) -> bool {
        self.parity
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn is_empty(&self) -> bool {
        !self.parity && self.breakpoints.is_empty()
    }

    /// `p` is a member iff an even number of breakpoints `<= p` leaves
    /// the parity unchanged.
    pub fn contains(&self, p: f64) -> bool {
        let count = self.breakpoints.partition_point(|&b| b <= p);
        self.parity == (count % 2 == 0)
    }

    /// Included intervals as `(left, right)`, either end possibly infinite.
    pub fn iter_pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let mut endpoints = once(NEG_INFINITY)
            .take(usize::from(self.parity))
            .chain(self.breakpoints.iter().copied());
        from_fn(move || {
            let left = endpoints.next()?;
            Some((left, endpoints.next().unwrap_or(INFINITY)))
        })
    }

    /// Total length. Infinite for unbounded sets.
    pub fn measure(&self) -> f64 {
        self.integrate()
    }

    pub fn complement(&self) -> IntervalSet {
        IntervalSet {
            parity: !self.parity,
            breakpoints: self.breakpoints.clone(),
        }
    }

    pub fn intersection(&self, other: &IntervalSet) -> IntervalSet {
        self.meet(other)
    }

    pub fn union(&self, other: &IntervalSet) -> IntervalSet {
        self.join(other)
    }

    pub fn difference(&self, other: &IntervalSet) -> IntervalSet {
        self.meet(&other.complement())
    }

    pub fn symmetric_difference(&self, other: &IntervalSet) -> IntervalSet {
        self.difference(other).join(&other.difference(self))
    }
}

fn check_finite(breakpoints: &[f64]) -> Result<(), StepError> {
    match breakpoints.iter().position(|b| !b.is_finite()) {
        None => Ok(()),
        Some(position) => {
            let previous = if position == 0 { NEG_INFINITY } else { breakpoints[position - 1] };
            Err(StepError::malformed(position, previous, breakpoints[position]))
        }
    }
}

impl Terms for IntervalSet {
    type Value = bool;

    fn iter_terms(&self) -> impl Iterator<Item = Term<bool>> + '_ {
        let parity = self.parity;
        once(Term::new(parity, NEG_INFINITY)).chain(
            self.breakpoints
                .iter()
                .enumerate()
                .map(move |(k, &left)| Term::new(parity ^ (k % 2 == 0), left)),
        )
    }

    fn from_sorted_terms<I>(terms: I) -> IntervalSet
    where
        I: IntoIterator<Item = Term<bool>>,
    {
        let mut parity = false;
        let mut current = false;
        let mut breakpoints: Vec<f64> = Vec::new();
        for term in terms {
            if term.left() == NEG_INFINITY {
                parity = term.value();
                current = parity;
            } else if term.value() != current {
                current = term.value();
                breakpoints.push(term.left());
            }
        }
        IntervalSet { parity, breakpoints }
    }

    fn evaluate(&self, x: f64) -> bool {
        self.contains(x)
    }
}

impl TermsLattice for IntervalSet {}

impl From<&StepFunction<bool>> for IntervalSet {
    fn from(step: &StepFunction<bool>) -> IntervalSet {
        IntervalSet::from_sorted_terms(step.iter_terms())
    }
}

impl From<&IntervalSet> for StepFunction<bool> {
    fn from(set: &IntervalSet) -> StepFunction<bool> {
        StepFunction::from_sorted_terms(set.iter_terms())
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_triples(f, "IntervalSet", " U ", self.iter_triples(), |triple| {
            format!("[{}, {})", triple.left(), triple.right())
        })
    }
}

#[derive(Serialize, Deserialize)]
struct IntervalSetRepr {
    parity: bool,
    breakpoints: Vec<f64>
}

impl From<IntervalSet> for IntervalSetRepr {
    fn from(set: IntervalSet) -> IntervalSetRepr {
        IntervalSetRepr {
            parity: set.parity,
            breakpoints: set.breakpoints,
        }
    }
}

impl TryFrom<IntervalSetRepr> for IntervalSet {
    type Error = StepError;

    fn try_from(repr: IntervalSetRepr) -> Result<IntervalSet, StepError> {
        IntervalSet::from_sequence(repr.parity, repr.breakpoints)
    }
}

impl BitAnd for &IntervalSet {
    type Output = IntervalSet;

    fn bitand(self, rhs: &IntervalSet) -> IntervalSet {
        self.meet(rhs)
    }
}

impl BitOr for &IntervalSet {
    type Output = IntervalSet;

    fn bitor(self, rhs: &IntervalSet) -> IntervalSet {
        self.join(rhs)
    }
}

impl BitXor for &IntervalSet {
    type Output = IntervalSet;

    fn bitxor(self, rhs: &IntervalSet) -> IntervalSet {
        self.symmetric_difference(rhs)
    }
}

impl Sub for &IntervalSet {
    type Output = IntervalSet;

    fn sub(self, rhs: &IntervalSet) -> IntervalSet {
        self.difference(rhs)
    }
}

impl Not for &IntervalSet {
    type Output = IntervalSet;

    fn not(self) -> IntervalSet {
        self.complement()
    }
}
