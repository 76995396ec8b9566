//! Content hashing for asset corruption checks.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Compute the hex SHA256 of a file's contents, streaming.
pub fn compute_hash(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();

    let mut buffer = [0u8; 8192];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hex SHA256 of an in-memory buffer.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// First 12 bytes of a full hash, for log lines. Hashes are hex, but
/// untrusted input may not be; anything without a boundary at byte 12
/// is passed through whole rather than sliced mid-character.
pub fn short_hash(full_hash: &str) -> &str {
    full_hash.get(..12).unwrap_or(full_hash)
}
