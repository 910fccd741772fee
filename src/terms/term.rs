use std::fmt::{
    Debug,
    Display
};

use serde::{
    Deserialize,
    Serialize
};

/// Values a step function may take.
///
/// `zero` is the neutral element: it fills the gaps between triples and is
/// dropped when a function is enumerated as triples. `to_f64` gives the
/// weight a value carries under integration.
pub trait StepValue: Copy + PartialOrd + Debug + Display {
    fn zero() -> Self;

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn to_f64(self) -> f64;
}

impl StepValue for f64 {
    fn zero() -> f64 {
        0.0
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl StepValue for bool {
    fn zero() -> bool {
        false
    }

    fn to_f64(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }
}

impl StepValue for usize {
    fn zero() -> usize {
        0
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// `value` on `[left, next term's left)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Term<V> {
    value: V,
    left: f64
}

impl<V: Copy> Term<V> {
    pub fn new(value: V, left: f64) -> Term<V> {
        Term { value, left }
    }

    pub fn value(&self) -> V {
        self.value
    }

    pub fn left(&self) -> f64 {
        self.left
    }
}

/// `value` on `[left, right)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triple<V> {
    value: V,
    left: f64,
    right: f64
}

impl<V: Copy> Triple<V> {
    pub fn new(value: V, left: f64, right: f64) -> Triple<V> {
        Triple { value, left, right }
    }

    pub fn value(&self) -> V {
        self.value
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

impl<V: Copy> From<(V, f64)> for Term<V> {
    fn from(pair: (V, f64)) -> Term<V> {
        Term::new(pair.0, pair.1)
    }
}

impl<V: Copy> From<(V, f64, f64)> for Triple<V> {
    fn from(triple: (V, f64, f64)) -> Triple<V> {
        Triple::new(triple.0, triple.1, triple.2)
    }
}
