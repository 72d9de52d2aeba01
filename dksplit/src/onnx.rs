//! ONNX Runtime emission provider (feature-gated behind `onnx`).
//!
//! The graph takes an `i64` tensor `chars` of shape `[batch, seq_len]` and returns an `f32`
//! tensor `emissions` of shape `[batch, seq_len, 2]`.

use std::path::Path;

use ort::session::Session;
use parking_lot::Mutex;

use crate::emission::{EmissionMatrix, EmissionProvider};
use crate::errors::{DksplitError, InferenceError, Result};
use crate::sentence::NUM_TAGS;

/// File name of the scoring graph in a model directory.
pub const ONNX_MODEL_FILE: &str = "dksplit-int8.onnx";

/// Name of the input tensor.
pub const INPUT_NAME: &str = "chars";

/// Name of the output tensor.
pub const OUTPUT_NAME: &str = "emissions";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Emission provider running an ONNX graph.
///
/// The session is released when the provider is dropped. Calls to
/// [`score`](EmissionProvider::score) are serialized on the session.
pub struct OnnxEmissionProvider {
    session: Mutex<Session>,
}

impl OnnxEmissionProvider {
    /// Loads a graph from a file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to an ONNX file.
    ///
    /// # Errors
    ///
    /// If the session cannot be created, a [`ResourceLoad`](DksplitError::ResourceLoad)
    /// variant will be returned.
    pub fn from_file<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let session = create_session(path)
            .map_err(|e| DksplitError::resource_load(&path.display().to_string(), e.to_string()))?;
        log::info!("loaded scoring graph from {}", path.display());
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

fn create_session(path: &Path) -> std::result::Result<Session, BoxError> {
    let session = Session::builder()?
        .with_intra_threads(1)?
        .with_log_level(ort::logging::LogLevel::Warning)?
        .commit_from_file(path)?;
    Ok(session)
}

fn run_inference(
    session: &mut Session,
    ids: &[i64],
    batch_size: usize,
    seq_len: usize,
) -> std::result::Result<Vec<f32>, BoxError> {
    #[allow(clippy::cast_possible_wrap)]
    let shape = vec![batch_size as i64, seq_len as i64];
    let input = ort::value::Tensor::from_array((shape, ids.to_vec()))?;
    let outputs = session.run(ort::inputs![INPUT_NAME => input])?;

    let (output_shape, data) = outputs[OUTPUT_NAME].try_extract_tensor::<f32>()?;
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let dims: Vec<usize> = output_shape.iter().map(|&d| d as usize).collect();
    if dims != [batch_size, seq_len, NUM_TAGS] {
        return Err(format!("unexpected output shape: {output_shape:?}").into());
    }
    Ok(data.to_vec())
}

impl EmissionProvider for OnnxEmissionProvider {
    fn score(
        &self,
        ids: &[i64],
        batch_size: usize,
        seq_len: usize,
    ) -> std::result::Result<EmissionMatrix, InferenceError> {
        let scores = {
            let mut session = self.session.lock();
            run_inference(&mut session, ids, batch_size, seq_len)
        }
        .map_err(|e| InferenceError::new(e.to_string()))?;
        EmissionMatrix::new(batch_size, seq_len, scores)
    }
}
