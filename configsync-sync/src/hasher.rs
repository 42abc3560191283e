//! XXH64 content hashing for change detection.
//!
//! Not a security primitive: the digest only decides whether a destination
//! needs rewriting.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use xxhash_rust::xxh64::{xxh64, Xxh64};

use crate::error::{io_err, ArtifactError};

/// Hash recorded for a destination that does not exist.
pub const ABSENT: u64 = 0;

const SEED: u64 = 0;
const BUF_SIZE: usize = 64 * 1024;

/// Stream the file at `path` through XXH64.
pub fn hash_file(path: &Path) -> Result<u64, ArtifactError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Xxh64::new(SEED);
    let mut buffer = vec![0u8; BUF_SIZE];

    loop {
        let read = file.read(&mut buffer).map_err(|e| io_err(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.digest())
}

/// Hash an in-memory buffer; equal to [`hash_file`] over the same bytes.
pub fn hash_bytes(data: &[u8]) -> u64 {
    xxh64(data, SEED)
}
