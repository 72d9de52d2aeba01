//! Viterbi decoding of the two-tag linear chain.
//!
//! For a sequence of length `L` with emission scores `e[t][j]`, the decoder finds the path
//! maximizing
//!
//! ```text
//! start[y_0] + e[0][y_0] + sum_{t=1}^{L-1} (pairwise[y_{t-1}][y_t] + e[t][y_t]) + end[y_{L-1}]
//! ```
//!
//! Ties are always broken toward the lowest tag index.

use crate::errors::{DksplitError, Result};
use crate::model::TransitionModel;
use crate::sentence::{Tag, NUM_TAGS};

/// Index of the maximum value. The first one wins on ties.
#[inline(always)]
fn argmax(scores: &[f32; NUM_TAGS]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = i;
        }
    }
    best
}

fn check_emissions(emissions: &[f32]) -> Result<usize> {
    if emissions.len() % NUM_TAGS != 0 {
        return Err(DksplitError::invalid_argument(
            "emissions",
            format!(
                "length {} is not a multiple of {}",
                emissions.len(),
                NUM_TAGS
            ),
        ));
    }
    Ok(emissions.len() / NUM_TAGS)
}

/// Viterbi decoder.
///
/// The decoder keeps its backpointer table between calls, so one decoder should be reused for
/// all sequences of a batch. It is not shared between threads; each worker owns one.
#[derive(Debug, Default)]
pub struct ViterbiDecoder {
    backpointers: Vec<[u8; NUM_TAGS]>,
}

impl ViterbiDecoder {
    /// Creates a new decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the best tag path of a sequence.
    ///
    /// # Arguments
    ///
    /// * `model` - Transition scores.
    /// * `emissions` - `L * NUM_TAGS` emission scores of a sequence of length `L`.
    ///
    /// # Returns
    ///
    /// The best path of length `L`. It is empty if `emissions` is empty.
    ///
    /// # Errors
    ///
    /// If the length of `emissions` is not a multiple of [`NUM_TAGS`], an error variant will be
    /// returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use dksplit::{Tag::*, TransitionModel, ViterbiDecoder};
    ///
    /// let model = TransitionModel::new([0., 0.], [0., 0.], [[0., 0.], [0., -1.]]);
    /// let mut decoder = ViterbiDecoder::new();
    ///
    /// let path = decoder.decode(&model, &[0., 1., 1., 0., 0., 0.7]).unwrap();
    /// assert_eq!(vec![Boundary, Continue, Boundary], path);
    /// ```
    pub fn decode(&mut self, model: &TransitionModel, emissions: &[f32]) -> Result<Vec<Tag>> {
        Ok(self.decode_with_score(model, emissions)?.0)
    }

    /// Finds the best tag path of a sequence and its total score.
    ///
    /// The score of an empty sequence is `0.0`.
    ///
    /// # Errors
    ///
    /// If the length of `emissions` is not a multiple of [`NUM_TAGS`], an error variant will be
    /// returned.
    pub fn decode_with_score(
        &mut self,
        model: &TransitionModel,
        emissions: &[f32],
    ) -> Result<(Vec<Tag>, f32)> {
        let seq_len = check_emissions(emissions)?;
        if seq_len == 0 {
            return Ok((vec![], 0.));
        }

        let mut score = [0.; NUM_TAGS];
        for (j, s) in score.iter_mut().enumerate() {
            *s = model.start[j] + emissions[j];
        }

        self.backpointers.clear();
        for e in emissions.chunks_exact(NUM_TAGS).skip(1) {
            let mut next = [0.; NUM_TAGS];
            let mut bp = [0; NUM_TAGS];
            for j in 0..NUM_TAGS {
                let mut cands = [0.; NUM_TAGS];
                for (i, c) in cands.iter_mut().enumerate() {
                    *c = score[i] + model.pairwise[i][j];
                }
                let i = argmax(&cands);
                next[j] = cands[i] + e[j];
                bp[j] = i as u8;
            }
            score = next;
            self.backpointers.push(bp);
        }

        let mut last = [0.; NUM_TAGS];
        for (i, l) in last.iter_mut().enumerate() {
            *l = score[i] + model.end[i];
        }
        let mut tag = argmax(&last);
        let best_score = last[tag];

        let mut path = vec![Tag::Continue; seq_len];
        path[seq_len - 1] = Tag::ALL[tag];
        for (t, bp) in self.backpointers.iter().enumerate().rev() {
            tag = usize::from(bp[tag]);
            path[t] = Tag::ALL[tag];
        }
        Ok((path, best_score))
    }
}

/// Computes the total score of a tag path.
///
/// # Arguments
///
/// * `model` - Transition scores.
/// * `emissions` - `L * NUM_TAGS` emission scores.
/// * `path` - A path of length `L`.
///
/// # Returns
///
/// The sum of the start, transition, emission, and end scores along `path`. It is `0.0` for an
/// empty path.
///
/// # Errors
///
/// If `emissions` and `path` disagree on the sequence length, an error variant will be returned.
pub fn score_path(model: &TransitionModel, emissions: &[f32], path: &[Tag]) -> Result<f32> {
    let seq_len = check_emissions(emissions)?;
    if seq_len != path.len() {
        return Err(DksplitError::invalid_argument(
            "path",
            format!("expected {} tags, got {}", seq_len, path.len()),
        ));
    }
    let (first, last) = match (path.first(), path.last()) {
        (Some(first), Some(last)) => (first.index(), last.index()),
        _ => return Ok(0.),
    };
    let mut score = model.start[first] + emissions[first];
    for (t, w) in path.windows(2).enumerate() {
        let (i, j) = (w[0].index(), w[1].index());
        score += model.pairwise[i][j];
        score += emissions[(t + 1) * NUM_TAGS + j];
    }
    Ok(score + model.end[last])
}
