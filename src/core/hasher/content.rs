//! Content hashing for exact duplicate detection.
//!
//! SHA-1 over the raw file bytes, read in bounded chunks so file size never
//! bounds memory. The digest does not depend on the chunk size.

use crate::error::HashError;
use serde::{Serialize, Serializer};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// A 160-bit content digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentDigest([u8; 20]);

impl ContentDigest {
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// The first 64 bits, big-endian
    pub fn leading_u64(&self) -> u64 {
        let mut head = [0u8; 8];
        head.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(head)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Streams files through SHA-1
#[derive(Debug, Clone)]
pub struct ContentHasher {
    chunk_size: usize,
}

impl ContentHasher {
    /// `chunk_size` of zero is bumped to one byte
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Digest of an in-memory buffer
    pub fn digest_bytes(bytes: &[u8]) -> ContentDigest {
        ContentDigest(Sha1::digest(bytes).into())
    }

    /// Digest everything `reader` yields
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<ContentDigest> {
        let mut hasher = Sha1::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(ContentDigest(hasher.finalize().into()))
    }

    /// Digest a file on disk
    pub fn digest_file(&self, path: &Path) -> Result<ContentDigest, HashError> {
        let to_error = |source| HashError::IoError {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(to_error)?;
        self.digest_reader(file).map_err(to_error)
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(1 << 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn known_sha1_vector() {
        let digest = ContentHasher::digest_bytes(b"abc");
        assert_eq!(digest.to_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn chunk_size_does_not_change_digest() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 251) as u8).collect();
        let whole = ContentHasher::digest_bytes(&data);

        for chunk in [1, 3, 64, 4096, 1 << 20] {
            let streamed = ContentHasher::new(chunk)
                .digest_reader(Cursor::new(&data))
                .unwrap();
            assert_eq!(streamed, whole, "chunk size {}", chunk);
        }
    }

    #[test]
    fn identical_files_share_a_digest() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.jpg");
        let b = temp_dir.path().join("b.jpg");
        std::fs::write(&a, b"same bytes").unwrap();
        std::fs::write(&b, b"same bytes").unwrap();

        let hasher = ContentHasher::default();
        assert_eq!(hasher.digest_file(&a).unwrap(), hasher.digest_file(&b).unwrap());
        assert_eq!(hasher.digest_file(&a).unwrap(), hasher.digest_file(&a).unwrap());
    }

    #[test]
    fn one_flipped_byte_changes_digest() {
        let mut data = vec![0u8; 512];
        let before = ContentHasher::digest_bytes(&data);
        data[100] ^= 0x01;
        assert_ne!(ContentHasher::digest_bytes(&data), before);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = ContentHasher::default().digest_file(Path::new("/nonexistent/file.jpg"));
        assert!(matches!(result, Err(HashError::IoError { .. })));
    }

    #[test]
    fn leading_bits_are_big_endian() {
        let digest = ContentHasher::digest_bytes(b"abc");
        assert_eq!(digest.leading_u64(), 0xa999_3e36_4706_816a);
    }
}
