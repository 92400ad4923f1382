use crate::error::{BufferError, Result};
use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

// Layout (little-endian): magic, u32 version, (n, L, W) as u64, f32 payload.
const MAGIC: &[u8; 4] = b"TRJB";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 4 + 4 + 3 * 8;

/// Writes `trajectories` (shape `(n, L, W)`) to `path`, replacing any
/// existing file only once the new snapshot is complete.
pub fn save(path: &Path, trajectories: ArrayView3<f32>) -> Result<()> {
    let tmp_path = temp_path(path);
    if let Err(e) = write_snapshot(&tmp_path, trajectories) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path)?;

    tracing::debug!(
        path = %path.display(),
        trajectories = trajectories.dim().0,
        "saved trajectory buffer"
    );
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_snapshot(path: &Path, trajectories: ArrayView3<f32>) -> Result<()> {
    let (n, length, width) = trajectories.dim();
    let mut writer = BufWriter::new(File::create(path)?);

    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(MAGIC);
    header.extend_from_slice(&VERSION.to_le_bytes());
    for dim in [n, length, width] {
        header.extend_from_slice(&(dim as u64).to_le_bytes());
    }
    writer.write_all(&header)?;

    // `iter` walks in logical row-major order regardless of memory layout.
    let values: Vec<f32> = trajectories.iter().copied().collect();
    let payload: Vec<u8> = values.par_iter().flat_map_iter(|v| v.to_le_bytes()).collect();
    writer.write_all(&payload)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Reads the header of `path` and returns the stored trajectories.
///
/// `expected_shape` is the `(trajectory_length, record_width)` the caller
/// was built with; any difference is an `IncompatibleBufferShape`.
pub fn load(path: &Path, expected_shape: (usize, usize)) -> Result<Array3<f32>> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let mut header = [0u8; HEADER_SIZE];
    read_exact_or_corrupt(&mut reader, &mut header, "header")?;
    if &header[0..4] != MAGIC {
        return Err(BufferError::CorruptFile(format!(
            "{} is not a trajectory buffer snapshot",
            path.display()
        )));
    }
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != VERSION {
        return Err(BufferError::CorruptFile(format!(
            "unsupported snapshot version {}",
            version
        )));
    }
    let mut dims = [0usize; 3];
    for (i, dim) in dims.iter_mut().enumerate() {
        let start = 8 + i * 8;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&header[start..start + 8]);
        *dim = usize::try_from(u64::from_le_bytes(bytes)).map_err(|_| {
            BufferError::CorruptFile("shape does not fit in memory".to_string())
        })?;
    }
    let [n, length, width] = dims;

    if (length, width) != expected_shape {
        return Err(BufferError::IncompatibleBufferShape {
            expected: expected_shape,
            actual: (length, width),
        });
    }

    let n_bytes = n
        .checked_mul(length)
        .and_then(|x| x.checked_mul(width))
        .and_then(|x| x.checked_mul(4))
        .ok_or_else(|| BufferError::CorruptFile("shape overflows".to_string()))?;
    let payload_len = file_len.saturating_sub(HEADER_SIZE as u64);
    if payload_len != n_bytes as u64 {
        return Err(BufferError::CorruptFile(format!(
            "payload is {} bytes, header describes {}",
            payload_len, n_bytes
        )));
    }
    let mut payload = vec![0u8; n_bytes];
    read_exact_or_corrupt(&mut reader, &mut payload, "payload")?;

    let values: Vec<f32> = payload
        .par_chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let trajectories = Array3::from_shape_vec((n, length, width), values)
        .map_err(|e| BufferError::CorruptFile(e.to_string()))?;

    tracing::debug!(path = %path.display(), trajectories = n, "loaded trajectory buffer");
    Ok(trajectories)
}

fn read_exact_or_corrupt<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => BufferError::CorruptFile(format!("truncated {}", what)),
        _ => BufferError::Io(e),
    })
}
