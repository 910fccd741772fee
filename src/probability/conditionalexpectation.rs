use nalgebra::{
    DMatrix,
    DVector
};

use crate::probability::pullback::Pullback;
use crate::step::stepfunction::StepFunction;
use crate::terms::terms::{
    Terms,
    TermsAlgebra
};

/// Scales `row` so that it integrates to one against `measure`. A row with no
/// mass becomes the zero function.
pub fn normalize(measure: &StepFunction<f64>, row: &StepFunction<f64>) -> StepFunction<f64> {
    let mass = measure.inner_product(row);
    if mass != 0.0 {
        row.divide_scalar(mass)
    } else {
        StepFunction::zero()
    }
}

/// Conditional expectation given a discrete variable `X`.
///
/// Row `k` is the preimage `1[X == a_k]` divided by its mass under the
/// reference measure, so integrating `row_k * g` yields `E[g | X = a_k]`.
#[derive(Debug, Clone)]
pub struct ConditionalExpectation {
    measure: StepFunction<f64>,
    values: Vec<f64>,
    rows: Vec<StepFunction<f64>>
}

impl ConditionalExpectation {
    pub fn from_pullback(measure: &StepFunction<f64>, pullback: &Pullback) -> ConditionalExpectation {
        let rows = pullback
            .preimages()
            .iter()
            .map(|preimage| normalize(measure, preimage))
            .collect();
        ConditionalExpectation {
            measure: measure.clone(),
            values: pullback.values().to_vec(),
            rows,
        }
    }

    pub fn measure(&self) -> &StepFunction<f64> {
        &self.measure
    }

    /// Values `a_k` of the conditioning variable, one per row.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn rows(&self) -> &[StepFunction<f64>] {
        &self.rows
    }

    /// `E[g | X = a_k]` for every `k`; zero where `X = a_k` has no mass.
    pub fn apply(&self, g: &StepFunction<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.rows.len(),
            self.rows.iter().map(|row| self.measure.inner_product(&row.multiply(g))),
        )
    }

    /// `P(Y = b_j | X = a_i)` at `(i, j)`, where `other` is the pullback of `Y`.
    pub fn distribution(&self, other: &Pullback) -> DMatrix<f64> {
        DMatrix::from_fn(self.rows.len(), other.num_values(), |i, j| {
            self.measure.inner_product(&self.rows[i].multiply(&other.preimages()[j]))
        })
    }
}

/// `∫ X_i · Y_j d measure` at `(i, j)`.
pub fn joint_distribution(x: &Pullback, y: &Pullback, measure: &StepFunction<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(x.num_values(), y.num_values(), |i, j| {
        measure.inner_product(&x.preimages()[i].multiply(&y.preimages()[j]))
    })
}

/// Joint distribution with every row scaled to sum to one. A row with no mass
/// stays all-zero.
pub fn conditional_distribution(x: &Pullback, y: &Pullback, measure: &StepFunction<f64>) -> DMatrix<f64> {
    let mut joint = joint_distribution(x, y, measure);
    for (i, mut row) in joint.row_iter_mut().enumerate() {
        let total = row.sum();
        if total != 0.0 {
            row /= total;
        } else {
            tracing::debug!(row = i, value = x.values()[i], "conditioning value carries no mass");
        }
    }
    joint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::term::Triple;

    fn uniform() -> StepFunction {
        StepFunction::from_triples(vec![Triple::new(1.0, 0.0, 1.0)]).unwrap()
    }

    #[test]
    fn normalized_rows_integrate_to_one() {
        let row = StepFunction::from_triples(vec![Triple::new(1.0, 0.0, 0.25)]).unwrap();
        let normalized = normalize(&uniform(), &row);
        assert_eq!(uniform().inner_product(&normalized), 1.0);
        let outside = StepFunction::from_triples(vec![Triple::new(1.0, 5.0, 6.0)]).unwrap();
        assert_eq!(normalize(&uniform(), &outside), StepFunction::zero());
    }

    #[test]
    fn conditional_mean() {
        let x = StepFunction::from_triples(vec![Triple::new(1.0, 0.5, 1.0)]).unwrap();
        let g = StepFunction::from_triples(vec![Triple::new(4.0, 0.0, 0.25), Triple::new(8.0, 0.75, 1.0)]).unwrap();
        let expectation = ConditionalExpectation::from_pullback(&uniform(), &Pullback::from_step(&x));
        assert_eq!(expectation.values(), &[0.0, 1.0]);
        let means = expectation.apply(&g);
        assert_eq!(means, DVector::from_column_slice(&[2.0, 4.0]));
    }
}
