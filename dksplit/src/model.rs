use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::errors::{DksplitError, Result};
use crate::sentence::NUM_TAGS;

/// File name of the pairwise transition scores.
pub const TRANSITIONS_FILE: &str = "transitions.bin";

/// File name of the start transition scores.
pub const START_TRANSITIONS_FILE: &str = "start_transitions.bin";

/// File name of the end transition scores.
pub const END_TRANSITIONS_FILE: &str = "end_transitions.bin";

/// Transition scores of the linear-chain CRF.
///
/// The scores are immutable once loaded, so a model can be shared between threads without
/// synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionModel {
    pub(crate) start: [f32; NUM_TAGS],
    pub(crate) end: [f32; NUM_TAGS],
    pub(crate) pairwise: [[f32; NUM_TAGS]; NUM_TAGS],
}

impl TransitionModel {
    /// Creates a model from score tables.
    ///
    /// # Arguments
    ///
    /// * `start` - Scores of starting a sequence with each tag.
    /// * `end` - Scores of ending a sequence with each tag.
    /// * `pairwise` - `pairwise[i][j]` is the score of moving from tag `i` to tag `j`.
    ///
    /// # Returns
    ///
    /// A new model.
    pub const fn new(
        start: [f32; NUM_TAGS],
        end: [f32; NUM_TAGS],
        pairwise: [[f32; NUM_TAGS]; NUM_TAGS],
    ) -> Self {
        Self {
            start,
            end,
            pairwise,
        }
    }

    /// Creates a model from three readers in the persisted layout.
    ///
    /// Each reader yields little-endian IEEE-754 single precision values: `NUM_TAGS` values for
    /// `start` and `end`, and `NUM_TAGS * NUM_TAGS` row-major values for `pairwise`.
    ///
    /// # Errors
    ///
    /// If a reader fails or yields the wrong number of bytes, a
    /// [`ResourceLoad`](DksplitError::ResourceLoad) variant will be returned.
    pub fn from_readers<R1, R2, R3>(start: R1, end: R2, pairwise: R3) -> Result<Self>
    where
        R1: Read,
        R2: Read,
        R3: Read,
    {
        let start = read_f32s(start, START_TRANSITIONS_FILE, NUM_TAGS)?;
        let end = read_f32s(end, END_TRANSITIONS_FILE, NUM_TAGS)?;
        let flat = read_f32s(pairwise, TRANSITIONS_FILE, NUM_TAGS * NUM_TAGS)?;

        let mut model = Self::new([0.; NUM_TAGS], [0.; NUM_TAGS], [[0.; NUM_TAGS]; NUM_TAGS]);
        model.start.copy_from_slice(&start);
        model.end.copy_from_slice(&end);
        for (row, chunk) in model.pairwise.iter_mut().zip(flat.chunks_exact(NUM_TAGS)) {
            row.copy_from_slice(chunk);
        }
        Ok(model)
    }

    /// Loads a model from a directory containing [`START_TRANSITIONS_FILE`],
    /// [`END_TRANSITIONS_FILE`], and [`TRANSITIONS_FILE`].
    ///
    /// # Arguments
    ///
    /// * `dir` - A model directory.
    ///
    /// # Errors
    ///
    /// If a file is missing, unreadable or mis-sized, a
    /// [`ResourceLoad`](DksplitError::ResourceLoad) variant will be returned.
    pub fn from_dir<P>(dir: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        let open = |name: &str| {
            File::open(dir.join(name))
                .map(BufReader::new)
                .map_err(|e| DksplitError::resource_load(name, e.to_string()))
        };
        let model = Self::from_readers(
            open(START_TRANSITIONS_FILE)?,
            open(END_TRANSITIONS_FILE)?,
            open(TRANSITIONS_FILE)?,
        )?;
        log::info!("loaded transition scores from {}", dir.display());
        Ok(model)
    }

    /// Exports the model into a directory in the persisted layout.
    ///
    /// # Arguments
    ///
    /// * `dir` - A directory. It is created if it does not exist.
    ///
    /// # Errors
    ///
    /// When writing a file fails, the error will be returned as is.
    pub fn write_dir<P>(&self, dir: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        write_f32s(dir.join(START_TRANSITIONS_FILE), &self.start)?;
        write_f32s(dir.join(END_TRANSITIONS_FILE), &self.end)?;
        write_f32s(dir.join(TRANSITIONS_FILE), self.pairwise.as_flattened())?;
        Ok(())
    }

    /// Gets the start scores.
    pub fn start(&self) -> &[f32; NUM_TAGS] {
        &self.start
    }

    /// Gets the end scores.
    pub fn end(&self) -> &[f32; NUM_TAGS] {
        &self.end
    }

    /// Gets the pairwise transition scores.
    pub fn pairwise(&self) -> &[[f32; NUM_TAGS]; NUM_TAGS] {
        &self.pairwise
    }
}

fn read_f32s<R>(mut rdr: R, resource: &str, n: usize) -> Result<Vec<f32>>
where
    R: Read,
{
    let mut buf = vec![];
    rdr.read_to_end(&mut buf)
        .map_err(|e| DksplitError::resource_load(resource, e.to_string()))?;
    if buf.len() != n * 4 {
        return Err(DksplitError::resource_load(
            resource,
            format!("expected {} bytes, got {}", n * 4, buf.len()),
        ));
    }
    Ok(buf
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn write_f32s<P>(path: P, values: &[f32]) -> Result<()>
where
    P: AsRef<Path>,
{
    let mut wtr = BufWriter::new(File::create(path)?);
    for v in values {
        wtr.write_all(&v.to_le_bytes())?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_from_readers() {
        let model = TransitionModel::from_readers(
            &to_bytes(&[0.5, -1.0])[..],
            &to_bytes(&[1.5, 2.0])[..],
            &to_bytes(&[0.1, 0.2, 0.3, 0.4])[..],
        )
        .unwrap();

        let expected = TransitionModel::new([0.5, -1.0], [1.5, 2.0], [[0.1, 0.2], [0.3, 0.4]]);
        assert_eq!(expected, model);
    }

    #[test]
    fn test_from_readers_little_endian() {
        let model = TransitionModel::from_readers(
            &[0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0xc0][..],
            &to_bytes(&[0., 0.])[..],
            &to_bytes(&[0.; 4])[..],
        )
        .unwrap();

        assert_eq!(&[1.0, -2.0], model.start());
    }

    #[test]
    fn test_from_readers_truncated() {
        let result = TransitionModel::from_readers(
            &to_bytes(&[0.5, -1.0])[..],
            &to_bytes(&[1.5, 2.0])[..],
            &to_bytes(&[0.1, 0.2, 0.3])[..],
        );

        assert_eq!(
            "ResourceLoadError: transitions.bin: expected 16 bytes, got 12",
            &result.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_from_readers_oversized() {
        let result = TransitionModel::from_readers(
            &to_bytes(&[0.5, -1.0, 3.0])[..],
            &to_bytes(&[1.5, 2.0])[..],
            &to_bytes(&[0.1, 0.2, 0.3, 0.4])[..],
        );

        assert!(matches!(result, Err(DksplitError::ResourceLoad(e)) if e.resource() == START_TRANSITIONS_FILE));
    }

    #[test]
    fn test_dir_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let model = TransitionModel::new([-0.25, 3.5], [1.0, -4.0], [[0.5, -0.5], [2.0, -8.0]]);

        model.write_dir(dir.path()).unwrap();

        assert_eq!(16, fs::read(dir.path().join(TRANSITIONS_FILE)).unwrap().len());
        assert_eq!(model, TransitionModel::from_dir(dir.path()).unwrap());
    }

    #[test]
    fn test_from_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let model = TransitionModel::new([0.; 2], [0.; 2], [[0.; 2]; 2]);
        model.write_dir(dir.path()).unwrap();
        fs::remove_file(dir.path().join(END_TRANSITIONS_FILE)).unwrap();

        let result = TransitionModel::from_dir(dir.path());
        assert!(matches!(result, Err(DksplitError::ResourceLoad(e)) if e.resource() == END_TRANSITIONS_FILE));
    }
}
