/// Errors raised by constructors that accept caller-supplied sequences.
///
/// Operators built on the merge engine never fail; only the entry points that
/// take raw terms, triples, endpoints or value vectors validate their input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    /// Endpoints are not strictly increasing, or one of them is NaN.
    #[error("malformed sequence: endpoint {endpoint} at position {position} does not follow {previous}")]
    MalformedSequence {
        position: usize,
        previous: f64,
        endpoint: f64,
    },

    /// A sampling window that is empty or not finite.
    #[error("invalid sampling window [{start}, {stop})")]
    InvalidWindow { start: f64, stop: f64 },

    /// A vector does not have one entry per distinct value.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl StepError {
    pub fn malformed(position: usize, previous: f64, endpoint: f64) -> StepError {
        StepError::MalformedSequence {
            position,
            previous,
            endpoint,
        }
    }
}
