//! Boundary of the external scoring model.

use crate::errors::InferenceError;
use crate::sentence::NUM_TAGS;

/// Emission scores of a batch of equal-length sequences.
///
/// Scores are stored row-major: the score of tag `k` at position `t` of sequence `b` is at
/// `(b * seq_len + t) * NUM_TAGS + k`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionMatrix {
    batch_size: usize,
    seq_len: usize,
    scores: Vec<f32>,
}

impl EmissionMatrix {
    /// Creates a new matrix.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - The number of sequences.
    /// * `seq_len` - The length shared by all sequences.
    /// * `scores` - `batch_size * seq_len * NUM_TAGS` scores.
    ///
    /// # Errors
    ///
    /// If the number of scores does not match the shape, an error will be returned.
    pub fn new(
        batch_size: usize,
        seq_len: usize,
        scores: Vec<f32>,
    ) -> Result<Self, InferenceError> {
        let expected = batch_size * seq_len * NUM_TAGS;
        if scores.len() != expected {
            return Err(InferenceError::new(format!(
                "emission shape mismatch: expected {}x{}x{} = {} scores, got {}",
                batch_size,
                seq_len,
                NUM_TAGS,
                expected,
                scores.len()
            )));
        }
        Ok(Self {
            batch_size,
            seq_len,
            scores,
        })
    }

    /// Gets the number of sequences.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Gets the length of each sequence.
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Gets the `seq_len * NUM_TAGS` scores of the `i`-th sequence.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn sequence(&self, i: usize) -> &[f32] {
        assert!(i < self.batch_size, "sequence index out of range: {}", i);
        let width = self.seq_len * NUM_TAGS;
        &self.scores[i * width..(i + 1) * width]
    }

    /// Returns an iterator over the scores of each sequence.
    pub fn sequences(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.batch_size).map(move |i| self.sequence(i))
    }
}

/// Scoring model producing per-character emission scores.
///
/// Implementations receive `batch_size` sequences of `seq_len` ids laid out row by row and must
/// return a [`EmissionMatrix`] of the same shape. The scheduler may call `score` from several
/// threads at once, so implementations wrapping a non-reentrant runtime serialize access
/// internally.
pub trait EmissionProvider: Send + Sync {
    /// Scores a batch of encoded sequences.
    ///
    /// # Errors
    ///
    /// When the underlying model fails, an [`InferenceError`] is returned.
    fn score(
        &self,
        ids: &[i64],
        batch_size: usize,
        seq_len: usize,
    ) -> Result<EmissionMatrix, InferenceError>;
}

impl<P> EmissionProvider for &P
where
    P: EmissionProvider + ?Sized,
{
    fn score(
        &self,
        ids: &[i64],
        batch_size: usize,
        seq_len: usize,
    ) -> Result<EmissionMatrix, InferenceError> {
        (**self).score(ids, batch_size, seq_len)
    }
}

impl<P> EmissionProvider for Box<P>
where
    P: EmissionProvider + ?Sized,
{
    fn score(
        &self,
        ids: &[i64],
        batch_size: usize,
        seq_len: usize,
    ) -> Result<EmissionMatrix, InferenceError> {
        (**self).score(ids, batch_size, seq_len)
    }
}
