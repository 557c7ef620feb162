//! SHA-256 digests for run reports
//!
//! Reports record the digest of the program before and after compensation so
//! a machined part can be traced back to the exact file that produced it.

use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}
