// src/hash.rs

//! Content hashing for package archives
//!
//! Hashes are computed over the whole archive byte stream and stored
//! base64-encoded next to the algorithm name, which is what NuGet v2
//! clients expect in the `PackageHash`/`PackageHashAlgorithm` pair.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha512};
use std::fmt;
use std::io::{self, Read};

/// Hash algorithm selection
///
/// SHA-512 is the algorithm the v2 protocol ships; the enum exists so the
/// stored algorithm name always travels with the digest it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha512,
}

impl HashAlgorithm {
    /// Wire-level algorithm name, as rendered into the feed
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Streaming hasher over the selected algorithm
pub struct Hasher {
    algorithm: HashAlgorithm,
    state: Sha512,
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            state: Sha512::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Finalize and return the base64-encoded digest
    pub fn finalize_base64(self) -> String {
        BASE64.encode(self.state.finalize())
    }

    #[inline]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

/// Hash an entire reader, returning the base64 digest and byte count
pub fn hash_reader<R: Read>(
    algorithm: HashAlgorithm,
    reader: &mut R,
) -> io::Result<(String, u64)> {
    let mut hasher = Hasher::new(algorithm);
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((hasher.finalize_base64(), total))
}
