use std::collections::BTreeMap;

#[cfg(feature = "multithreading")]
use rayon::prelude::*;

use crate::emission::EmissionProvider;
use crate::encoder::encode_into;
use crate::errors::{DksplitError, InferenceError, Result};
use crate::model::TransitionModel;
use crate::sentence::Sentence;
use crate::viterbi::ViterbiDecoder;

/// Default maximum number of characters of an input.
pub const MAX_LEN: usize = 64;

/// Default maximum number of sequences passed to a single scoring call.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Sentences of the same length scored by one provider call.
struct Chunk {
    seq_len: usize,
    items: Vec<(usize, Sentence)>,
}

/// Word splitter.
pub struct Splitter<P> {
    provider: P,
    model: TransitionModel,
    max_len: usize,
    batch_size: usize,
}

impl<P> Splitter<P>
where
    P: EmissionProvider,
{
    /// Creates a new splitter.
    ///
    /// # Arguments
    ///
    /// * `provider` - A scoring model producing emission scores.
    /// * `model` - Transition scores.
    ///
    /// # Returns
    ///
    /// A new splitter.
    pub fn new(provider: P, model: TransitionModel) -> Self {
        Self {
            provider,
            model,
            max_len: MAX_LEN,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the maximum number of characters of an input. Longer inputs are truncated.
    ///
    /// # Arguments
    ///
    /// * `max_len` - The maximum length.
    ///
    /// # Returns
    ///
    /// A splitter with the specified maximum length.
    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = std::cmp::max(max_len, 1);
        self
    }

    /// Sets the number of sequences scored at once when [`Splitter::split_batch()`] receives 0.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - The batch size.
    ///
    /// # Returns
    ///
    /// A splitter with the specified batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = std::cmp::max(batch_size, 1);
        self
    }

    /// Gets the transition scores.
    pub fn transition_model(&self) -> &TransitionModel {
        &self.model
    }

    /// Gets the emission provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Normalizes inputs and groups them into chunks of equal length.
    ///
    /// Chunks are ordered by length, then by input order.
    fn schedule<S>(&self, texts: &[S], max_sub_batch: usize) -> Vec<Chunk>
    where
        S: AsRef<str>,
    {
        let chunk_size = if max_sub_batch == 0 {
            self.batch_size
        } else {
            max_sub_batch
        };
        let mut groups: BTreeMap<usize, Vec<(usize, Sentence)>> = BTreeMap::new();
        for (i, text) in texts.iter().enumerate() {
            let s = Sentence::from_raw(text, self.max_len);
            if !s.is_empty() {
                groups.entry(s.len()).or_default().push((i, s));
            }
        }
        let n_groups = groups.len();
        let mut chunks = vec![];
        for (seq_len, items) in groups {
            let mut items = items.into_iter();
            loop {
                let items: Vec<_> = items.by_ref().take(chunk_size).collect();
                if items.is_empty() {
                    break;
                }
                chunks.push(Chunk { seq_len, items });
            }
        }
        log::debug!(
            "scheduled {} inputs into {} chunks of {} lengths (chunk size {})",
            texts.len(),
            chunks.len(),
            n_groups,
            chunk_size,
        );
        chunks
    }

    /// Scores and decodes a chunk with a single provider call.
    fn decode_chunk(
        &self,
        chunk: &Chunk,
        decoder: &mut ViterbiDecoder,
    ) -> Result<Vec<Vec<String>>> {
        let batch_size = chunk.items.len();
        let mut ids = Vec::with_capacity(batch_size * chunk.seq_len);
        for (_, s) in &chunk.items {
            encode_into(s.as_str(), &mut ids);
        }
        let emissions = self.provider.score(&ids, batch_size, chunk.seq_len)?;
        if emissions.batch_size() != batch_size || emissions.seq_len() != chunk.seq_len {
            return Err(DksplitError::from(InferenceError::new(format!(
                "provider returned {}x{} emissions for a {}x{} batch",
                emissions.batch_size(),
                emissions.seq_len(),
                batch_size,
                chunk.seq_len,
            ))));
        }
        chunk
            .items
            .iter()
            .zip(emissions.sequences())
            .map(|((_, s), e)| {
                let path = decoder.decode(&self.model, e)?;
                s.to_words(&path)
            })
            .collect()
    }

    /// Splits a text into words.
    ///
    /// The text is lowercased and truncated before prediction, and the returned words
    /// concatenate to the normalized text.
    ///
    /// # Arguments
    ///
    /// * `text` - A raw string.
    ///
    /// # Returns
    ///
    /// A newly allocated vector of words. It is empty if `text` is empty.
    ///
    /// # Errors
    ///
    /// When the provider fails, an [`Inference`](DksplitError::Inference) variant will be
    /// returned.
    pub fn split<S>(&self, text: S) -> Result<Vec<String>>
    where
        S: AsRef<str>,
    {
        let s = Sentence::from_raw(text, self.max_len);
        if s.is_empty() {
            return Ok(vec![]);
        }
        let chunk = Chunk {
            seq_len: s.len(),
            items: vec![(0, s)],
        };
        let mut words = self.decode_chunk(&chunk, &mut ViterbiDecoder::new())?;
        Ok(words.pop().unwrap_or_default())
    }

    /// Splits texts into words.
    ///
    /// Inputs of the same normalized length are scored together, at most `max_sub_batch` at a
    /// time. The result of each input is identical to the result of [`Splitter::split()`].
    ///
    /// # Arguments
    ///
    /// * `texts` - Raw strings.
    /// * `max_sub_batch` - The maximum number of sequences per provider call. If 0, the batch
    ///                     size of the splitter is used.
    ///
    /// # Returns
    ///
    /// Words of each input in the input order.
    ///
    /// # Errors
    ///
    /// When the provider fails on any chunk, an [`Inference`](DksplitError::Inference) variant
    /// will be returned and no result is produced.
    pub fn split_batch<S>(&self, texts: &[S], max_sub_batch: usize) -> Result<Vec<Vec<String>>>
    where
        S: AsRef<str>,
    {
        let mut results = vec![vec![]; texts.len()];
        let mut decoder = ViterbiDecoder::new();
        for chunk in self.schedule(texts, max_sub_batch) {
            let words = self.decode_chunk(&chunk, &mut decoder)?;
            for ((i, _), w) in chunk.items.into_iter().zip(words) {
                results[i] = w;
            }
        }
        Ok(results)
    }

    /// Creates a multithreading splitter.
    ///
    /// # Arguments
    ///
    /// * `n_threads` - The number of threads. If 0, rayon picks the number of CPUs.
    ///
    /// # Returns
    ///
    /// A multithreading splitter.
    ///
    /// # Errors
    ///
    /// If the thread pool cannot be built, an error variant will be returned.
    #[cfg(feature = "multithreading")]
    #[cfg_attr(docsrs, doc(cfg(feature = "multithreading")))]
    pub fn multithreading(self, n_threads: usize) -> Result<MultithreadSplitter<P>> {
        MultithreadSplitter::new(self, n_threads)
    }
}

#[cfg(feature = "onnx")]
impl Splitter<crate::onnx::OnnxEmissionProvider> {
    /// Loads a splitter from a model directory containing
    /// [`ONNX_MODEL_FILE`](crate::onnx::ONNX_MODEL_FILE) and the transition score files.
    ///
    /// # Errors
    ///
    /// If a file is missing or invalid, a [`ResourceLoad`](DksplitError::ResourceLoad) variant
    /// will be returned.
    #[cfg_attr(docsrs, doc(cfg(feature = "onnx")))]
    pub fn from_dir<D>(dir: D) -> Result<Self>
    where
        D: AsRef<std::path::Path>,
    {
        let dir = dir.as_ref();
        let provider =
            crate::onnx::OnnxEmissionProvider::from_file(dir.join(crate::onnx::ONNX_MODEL_FILE))?;
        let model = TransitionModel::from_dir(dir)?;
        Ok(Self::new(provider, model))
    }
}

/// Splitter decoding chunks on a thread pool.
#[cfg(feature = "multithreading")]
#[cfg_attr(docsrs, doc(cfg(feature = "multithreading")))]
pub struct MultithreadSplitter<P> {
    splitter: Splitter<P>,
    pool: rayon::ThreadPool,
}

#[cfg(feature = "multithreading")]
impl<P> MultithreadSplitter<P>
where
    P: EmissionProvider,
{
    /// Creates a multithreading splitter.
    ///
    /// # Arguments
    ///
    /// * `splitter` - A normal splitter.
    /// * `n_threads` - The number of threads. If 0, rayon picks the number of CPUs.
    ///
    /// # Errors
    ///
    /// If the thread pool cannot be built, an error variant will be returned.
    pub fn new(splitter: Splitter<P>, n_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("dksplit-{}", i))
            .build()
            .map_err(|e| DksplitError::invalid_argument("n_threads", e.to_string()))?;
        Ok(Self { splitter, pool })
    }

    /// Splits a text into words. See [`Splitter::split()`].
    ///
    /// # Errors
    ///
    /// When the provider fails, an [`Inference`](DksplitError::Inference) variant will be
    /// returned.
    pub fn split<S>(&self, text: S) -> Result<Vec<String>>
    where
        S: AsRef<str>,
    {
        self.splitter.split(text)
    }

    /// Splits texts into words, decoding chunks in parallel. See [`Splitter::split_batch()`].
    ///
    /// # Errors
    ///
    /// When the provider fails on any chunk, an [`Inference`](DksplitError::Inference) variant
    /// will be returned and no result is produced.
    pub fn split_batch<S>(&self, texts: &[S], max_sub_batch: usize) -> Result<Vec<Vec<String>>>
    where
        S: AsRef<str>,
    {
        let chunks = self.splitter.schedule(texts, max_sub_batch);
        let splitter = &self.splitter;
        let decoded = self.pool.install(|| {
            chunks
                .par_iter()
                .map_init(ViterbiDecoder::new, |decoder, chunk| {
                    splitter.decode_chunk(chunk, decoder)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut results = vec![vec![]; texts.len()];
        for (chunk, words) in chunks.into_iter().zip(decoded) {
            for ((i, _), w) in chunk.items.into_iter().zip(words) {
                results[i] = w;
            }
        }
        Ok(results)
    }

    /// Gets the inner splitter.
    pub fn into_inner(self) -> Splitter<P> {
        self.splitter
    }
}
