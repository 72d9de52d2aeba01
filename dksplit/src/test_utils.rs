use std::collections::HashMap;
use std::sync::Mutex;

use crate::emission::{EmissionMatrix, EmissionProvider};
use crate::encoder::encode;
use crate::errors::InferenceError;
use crate::sentence::{Sentence, Tag, NUM_TAGS};

// Copied from https://prng.di.unimi.it/splitmix64.c
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}

/// Shapes of every `score` call.
#[derive(Default)]
pub struct CallLog(Mutex<Vec<(usize, usize)>>);

impl CallLog {
    fn push(&self, batch_size: usize, seq_len: usize) {
        self.0.lock().unwrap().push((batch_size, seq_len));
    }

    pub fn calls(&self) -> Vec<(usize, usize)> {
        self.0.lock().unwrap().clone()
    }
}

/// Emits strong scores for the segmentation of known words and a single word otherwise.
#[derive(Default)]
pub struct LexiconProvider {
    paths: HashMap<Vec<i64>, Vec<Tag>>,
    pub log: CallLog,
}

impl LexiconProvider {
    pub fn new(tokenized: &[&str]) -> Self {
        let mut paths = HashMap::new();
        for line in tokenized {
            let (s, tags) = Sentence::from_tokenized(line, usize::MAX).unwrap();
            paths.insert(encode(s.as_str()), tags);
        }
        Self {
            paths,
            log: CallLog::default(),
        }
    }
}

impl EmissionProvider for LexiconProvider {
    fn score(
        &self,
        ids: &[i64],
        batch_size: usize,
        seq_len: usize,
    ) -> Result<EmissionMatrix, InferenceError> {
        self.log.push(batch_size, seq_len);
        let mut scores = Vec::with_capacity(ids.len() * NUM_TAGS);
        for seq in ids.chunks(seq_len) {
            match self.paths.get(seq) {
                Some(tags) => {
                    for &tag in tags {
                        let pair: [f32; NUM_TAGS] = match tag {
                            Tag::Continue => [4., -4.],
                            Tag::Boundary => [-4., 4.],
                        };
                        scores.extend_from_slice(&pair);
                    }
                }
                None => {
                    for _ in seq {
                        scores.extend_from_slice(&[1., -1.]);
                    }
                }
            }
        }
        EmissionMatrix::new(batch_size, seq_len, scores)
    }
}

/// Emits pseudo-random scores determined by each character and its left neighbor.
#[derive(Default)]
pub struct HashProvider {
    pub log: CallLog,
}

impl EmissionProvider for HashProvider {
    fn score(
        &self,
        ids: &[i64],
        batch_size: usize,
        seq_len: usize,
    ) -> Result<EmissionMatrix, InferenceError> {
        self.log.push(batch_size, seq_len);
        let mut scores = Vec::with_capacity(ids.len() * NUM_TAGS);
        for seq in ids.chunks(seq_len) {
            let mut prev: i64 = 0;
            for &id in seq {
                let h = splitmix64((prev as u64) << 32 | id as u64);
                scores.push((h & 0xffff) as f32 / 8192. - 4.);
                scores.push((h >> 16 & 0xffff) as f32 / 8192. - 4.);
                prev = id;
            }
        }
        EmissionMatrix::new(batch_size, seq_len, scores)
    }
}

/// Fails on sequences of a given length and delegates the rest.
pub struct FailingProvider<P> {
    pub inner: P,
    pub seq_len: usize,
}

impl<P> EmissionProvider for FailingProvider<P>
where
    P: EmissionProvider,
{
    fn score(
        &self,
        ids: &[i64],
        batch_size: usize,
        seq_len: usize,
    ) -> Result<EmissionMatrix, InferenceError> {
        if seq_len == self.seq_len {
            return Err(InferenceError::new(format!(
                "cannot score length {}",
                seq_len
            )));
        }
        self.inner.score(ids, batch_size, seq_len)
    }
}

/// Returns one sequence fewer than requested.
pub struct ShortProvider;

impl EmissionProvider for ShortProvider {
    fn score(
        &self,
        _ids: &[i64],
        batch_size: usize,
        seq_len: usize,
    ) -> Result<EmissionMatrix, InferenceError> {
        let n = batch_size - 1;
        EmissionMatrix::new(n, seq_len, vec![0.; n * seq_len * NUM_TAGS])
    }
}
