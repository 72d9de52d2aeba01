#![cfg_attr(docsrs, feature(doc_cfg))]

//! # dksplit
//!
//! dksplit splits concatenated words, such as domain names and hashtags, into words. Each
//! character is scored by an external model, and the best sequence of word boundaries is
//! decoded with a two-tag linear-chain CRF.
//!
//! ## Examples
//!
//! ```
//! use dksplit::errors::InferenceError;
//! use dksplit::{encoder, EmissionMatrix, EmissionProvider, Splitter, TransitionModel};
//!
//! // Scores a word boundary at every character outside the vocabulary.
//! struct PunctProvider;
//!
//! impl EmissionProvider for PunctProvider {
//!     fn score(
//!         &self,
//!         ids: &[i64],
//!         batch_size: usize,
//!         seq_len: usize,
//!     ) -> Result<EmissionMatrix, InferenceError> {
//!         let scores = ids
//!             .iter()
//!             .flat_map(|&id| if id == encoder::UNK_ID { [0., 1.] } else { [1., 0.] })
//!             .collect();
//!         EmissionMatrix::new(batch_size, seq_len, scores)
//!     }
//! }
//!
//! let model = TransitionModel::new([0.; 2], [0.; 2], [[0.; 2]; 2]);
//! let splitter = Splitter::new(PunctProvider, model);
//!
//! assert_eq!(vec!["hello", ".world"], splitter.split("Hello.World").unwrap());
//! ```
//!
//! With **crate feature** `onnx`, a splitter is loaded from a model directory:
//!
//! ```ignore
//! let splitter = dksplit::Splitter::from_dir("models")?;
//! let words = splitter.split("chatgptlogin")?;
//! ```
//!
//! Parallel decoding of batches requires **crate feature** `multithreading`. For more details,
//! see [`Splitter::split_batch()`].

pub mod emission;
pub mod encoder;
pub mod errors;
mod model;
mod predictor;
mod sentence;
pub mod viterbi;

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(test)]
mod test_utils;

pub use emission::{EmissionMatrix, EmissionProvider};
pub use model::{TransitionModel, END_TRANSITIONS_FILE, START_TRANSITIONS_FILE, TRANSITIONS_FILE};
pub use predictor::{Splitter, DEFAULT_BATCH_SIZE, MAX_LEN};
pub use sentence::{Sentence, Tag, NUM_TAGS};
pub use viterbi::ViterbiDecoder;

#[cfg(feature = "multithreading")]
pub use predictor::MultithreadSplitter;

#[cfg(feature = "onnx")]
pub use onnx::{OnnxEmissionProvider, ONNX_MODEL_FILE};
