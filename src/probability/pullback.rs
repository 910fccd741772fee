use nalgebra::{
    DMatrix,
    DVector
};

use crate::step::compositefunction::CompositeFunction;
use crate::step::stepfunction::StepFunction;
use crate::steperror::StepError;
use crate::terms::term::Term;
use crate::terms::terms::{
    indicator,
    Terms
};

/// Preimage structure of a finite-valued step function `f`.
///
/// For each distinct value `a_k` (first-seen order) it holds the indicator
/// `1[f == a_k]`, both as a step function and as row `k` of a matrix whose
/// columns are the segments of `f`'s partition. Columns sum to one.
#[derive(Debug, Clone)]
pub struct Pullback {
    values: Vec<f64>,
    preimages: Vec<StepFunction<f64>>,
    segments: Vec<f64>,
    matrix: DMatrix<f64>
}

impl Pullback {
    pub fn from_step(step: &StepFunction<f64>) -> Pullback {
        Self::from_composite(&CompositeFunction::from_step(step))
    }

    pub fn from_composite(composite: &CompositeFunction) -> Pullback {
        // Table operations may leave repeated values; refactor so rows are distinct.
        let factored = CompositeFunction::from_step(&composite.to_step());
        let index = factored.index();
        let segments: Vec<f64> = index.iter_terms().map(|term| term.left()).collect();
        let num_values = factored.num_values();

        let mut matrix = DMatrix::<f64>::zeros(num_values, segments.len());
        for (column, term) in index.iter_terms().enumerate() {
            matrix[(term.value(), column)] = 1.0;
        }
        let preimages = (0..num_values)
            .map(|k| index.map(|position| indicator(position == k)))
            .collect();

        tracing::debug!(values = num_values, segments = segments.len(), "built pullback");
        Pullback {
            values: factored.table().to_vec(),
            preimages,
            segments,
            matrix,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    pub fn preimages(&self) -> &[StepFunction<f64>] {
        &self.preimages
    }

    /// `1[f == values[k]]`.
    pub fn preimage(&self, k: usize) -> Option<&StepFunction<f64>> {
        self.preimages.get(k)
    }

    /// Left endpoints of the segments, the first one `-inf`.
    pub fn segments(&self) -> &[f64] {
        &self.segments
    }

    /// Rows are distinct values, columns are segments.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// `g ∘ f`: evaluates `g` on the value space and pulls it back.
    pub fn pullback(&self, g: &StepFunction<f64>) -> StepFunction<f64> {
        let weights = DVector::from_iterator(self.values.len(), self.values.iter().map(|&a| g.evaluate(a)));
        self.assemble(&weights)
    }

    /// The step function equal to `weights[k]` wherever `f == values[k]`.
    pub fn pullback_values(&self, weights: &DVector<f64>) -> Result<StepFunction<f64>, StepError> {
        if weights.len() != self.values.len() {
            return Err(StepError::DimensionMismatch {
                expected: self.values.len(),
                actual: weights.len(),
            });
        }
        Ok(self.assemble(weights))
    }

    fn assemble(&self, weights: &DVector<f64>) -> StepFunction<f64> {
        let segment_values = self.matrix.tr_mul(weights);
        StepFunction::from_sorted_terms(
            segment_values
                .iter()
                .zip(self.segments.iter())
                .map(|(&value, &left)| Term::new(value, left)),
        )
    }

    /// Mass of each preimage under `measure`: the law of `f`.
    pub fn pushforward(&self, measure: &StepFunction<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.preimages.len(),
            self.preimages.iter().map(|preimage| measure.inner_product(preimage)),
        )
    }

    /// `∫ g(f) d measure`, computed on the value space. A value where `g`
    /// vanishes contributes nothing, even when its preimage has infinite mass.
    pub fn expectation(&self, measure: &StepFunction<f64>, g: &StepFunction<f64>) -> f64 {
        self.values
            .iter()
            .zip(self.preimages.iter())
            .map(|(&a, preimage)| (g.evaluate(a), preimage))
            .filter(|(weight, _)| *weight != 0.0)
            .map(|(weight, preimage)| weight * measure.inner_product(preimage))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::NEG_INFINITY;

    use super::*;
    use crate::step::stepfunction::LEB;
    use crate::terms::term::Triple;
    use crate::terms::terms::TermsAlgebra;

    fn step(pairs: &[(f64, f64)]) -> StepFunction {
        StepFunction::from_terms(pairs.iter().map(|&pair| Term::from(pair))).unwrap()
    }

    fn uniform() -> StepFunction {
        StepFunction::from_triples(vec![Triple::new(1.0, 0.0, 1.0)]).unwrap()
    }

    fn variable() -> StepFunction {
        step(&[(0.0, NEG_INFINITY), (2.0, 0.0), (5.0, 0.25), (2.0, 0.75), (0.0, 1.0)])
    }

    #[test]
    fn matrix_rows_are_preimages() {
        let pullback = Pullback::from_step(&variable());
        assert_eq!(pullback.values(), &[0.0, 2.0, 5.0]);
        assert_eq!(pullback.segments(), &[NEG_INFINITY, 0.0, 0.25, 0.75, 1.0]);
        let expected = DMatrix::from_row_slice(3, 5, &[
            1.0, 0.0, 0.0, 0.0, 1.0,
            0.0, 1.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 1.0, 0.0, 0.0,
        ]);
        assert_eq!(pullback.matrix(), &expected);
        assert_eq!(pullback.preimage(2), Some(&variable().preimage(5.0)));
        assert_eq!(pullback.preimage(3), None);
    }

    #[test]
    fn pullback_composes() {
        let f = variable();
        let pullback = Pullback::from_step(&f);
        let g = step(&[(0.0, NEG_INFINITY), (10.0, 1.0), (20.0, 3.0)]);
        let composed = pullback.pullback(&g);
        for x in [-1.0, 0.1, 0.5, 0.8, 2.0] {
            assert_eq!(composed.evaluate(x), g.evaluate(f.evaluate(x)));
        }
    }

    #[test]
    fn pullback_of_identity_weights_rebuilds_the_function() {
        let f = variable();
        let pullback = Pullback::from_step(&f);
        let weights = DVector::from_column_slice(pullback.values());
        assert_eq!(pullback.pullback_values(&weights).unwrap(), f);
        let short = DVector::from_element(2, 1.0);
        assert_eq!(
            pullback.pullback_values(&short),
            Err(StepError::DimensionMismatch { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn pushforward_is_the_law() {
        let pullback = Pullback::from_step(&variable());
        let law = pullback.pushforward(&uniform());
        assert_eq!(law, DVector::from_column_slice(&[0.0, 0.5, 0.5]));
    }

    #[test]
    fn expectation_matches_direct_integration() {
        let f = variable();
        let pullback = Pullback::from_step(&f);
        let identity = step(&[(0.0, NEG_INFINITY), (2.0, 2.0), (5.0, 5.0)]);
        let direct = uniform().inner_product(&f);
        assert_eq!(pullback.expectation(&uniform(), &identity), direct);
        assert_eq!(direct, 3.5);
    }

    #[test]
    fn unbounded_preimage_with_vanishing_weight_contributes_nothing() {
        let f = StepFunction::from_triples(vec![Triple::new(2.0, 0.0, 1.0)]).unwrap();
        let g = StepFunction::from_triples(vec![Triple::new(3.0, 1.5, 2.5)]).unwrap();
        let pullback = Pullback::from_step(&f);
        assert_eq!(pullback.pushforward(&LEB)[0], f64::INFINITY);
        let direct = LEB.inner_product(&pullback.pullback(&g));
        assert_eq!(direct, 3.0);
        assert_eq!(pullback.expectation(&LEB, &g), direct);
    }

    #[test]
    fn repeated_table_values_are_merged() {
        let f = CompositeFunction::from_step(&variable());
        let flattened = f.map_table(|x| if x > 0.0 { 1.0 } else { 0.0 });
        let pullback = Pullback::from_composite(&flattened);
        assert_eq!(pullback.num_values(), 2);
    }
}
