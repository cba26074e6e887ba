//! Node identity resolution and persistence.
//!
//! An identity is a raw 32-byte key. It comes from one of three places, in
//! order: an explicit hex value on the command line, the cache file from a
//! previous run, or fresh randomness persisted for the next run. The cache
//! file holds exactly the raw bytes, no header or encoding, and is never
//! rewritten once it exists.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use alloy_primitives::B256;
use rand::RngCore;
use tracing::debug;

use crate::error::AgentError;

/// How the identity for this run was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Passed on the command line. The cache file is left untouched.
    Explicit,
    /// Read back from the cache file.
    Cached,
    /// Freshly generated and written to the cache file.
    Generated,
}

/// A resolved node identity. Immutable for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    id: B256,
    provenance: Provenance,
    cache_path: Option<PathBuf>,
}

impl NodeIdentity {
    pub fn id(&self) -> B256 {
        self.id
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// The backing file, when the identity is disk-backed.
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.id)
    }
}

/// Resolve the identity for this run.
///
/// Explicit identities are assumed chosen for startup speed, so no disk
/// access happens at all on that path.
pub fn resolve(explicit: Option<&str>, cache_path: &Path) -> Result<NodeIdentity, AgentError> {
    if let Some(raw) = explicit {
        let id = parse_explicit(raw)?;
        return Ok(NodeIdentity {
            id,
            provenance: Provenance::Explicit,
            cache_path: None,
        });
    }

    if cache_path.exists() {
        let id = read_cache(cache_path)?;
        debug!(path = %cache_path.display(), "loaded identity from cache");
        return Ok(NodeIdentity {
            id,
            provenance: Provenance::Cached,
            cache_path: Some(cache_path.to_path_buf()),
        });
    }

    let id = generate_identity();
    write_cache(cache_path, &id)?;
    debug!(path = %cache_path.display(), "generated new identity");
    Ok(NodeIdentity {
        id,
        provenance: Provenance::Generated,
        cache_path: Some(cache_path.to_path_buf()),
    })
}

fn parse_explicit(raw: &str) -> Result<B256, AgentError> {
    let bytes =
        hex::decode(raw.trim()).map_err(|e| AgentError::InvalidIdentity(format!("not hex: {e}")))?;
    if bytes.len() != 32 {
        return Err(AgentError::InvalidIdentity(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(B256::from_slice(&bytes))
}

/// Read exactly the first 32 bytes of the cache file. Extra trailing bytes
/// are tolerated; a short file is corrupt.
fn read_cache(path: &Path) -> Result<B256, AgentError> {
    let mut file = fs::File::open(path).map_err(|source| AgentError::IdentityPersistence {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = [0u8; 32];
    file.read_exact(&mut bytes).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            AgentError::InvalidIdentity(format!(
                "identity cache {} is shorter than 32 bytes",
                path.display()
            ))
        } else {
            AgentError::IdentityPersistence {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    Ok(B256::from(bytes))
}

fn write_cache(path: &Path, id: &B256) -> Result<(), AgentError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| AgentError::IdentityPersistence {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, id.as_slice()).map_err(|source| AgentError::IdentityPersistence {
        path: path.to_path_buf(),
        source,
    })
}

/// Generate 32 bytes of random identity material.
pub fn generate_identity() -> B256 {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    B256::from(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn explicit_identity_bypasses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("id");
        let raw = "42".repeat(32);

        let identity = resolve(Some(&raw), &cache).unwrap();
        assert_eq!(identity.provenance(), Provenance::Explicit);
        assert_eq!(identity.id(), B256::from([0x42u8; 32]));
        assert!(identity.cache_path().is_none());
        assert!(!cache.exists(), "explicit identity must not touch the cache");
    }

    #[test]
    fn malformed_explicit_identity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("id");

        assert_matches!(resolve(Some("zz"), &cache), Err(AgentError::InvalidIdentity(_)));
        assert_matches!(
            resolve(Some("abcd"), &cache),
            Err(AgentError::InvalidIdentity(_))
        );
        assert!(!cache.exists());
    }

    #[test]
    fn generated_identity_is_persisted_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("id");

        let first = resolve(None, &cache).unwrap();
        assert_eq!(first.provenance(), Provenance::Generated);
        assert_eq!(fs::read(&cache).unwrap(), first.id().as_slice());

        // A second run with the same path reads the same identity back and
        // does not rewrite the file.
        let second = resolve(None, &cache).unwrap();
        assert_eq!(second.provenance(), Provenance::Cached);
        assert_eq!(second.id(), first.id());
    }

    #[test]
    fn cached_identity_reads_first_32_bytes_only() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("id");
        let mut contents = vec![7u8; 32];
        contents.extend_from_slice(b"trailing junk");
        fs::write(&cache, &contents).unwrap();

        let identity = resolve(None, &cache).unwrap();
        assert_eq!(identity.id(), B256::from([7u8; 32]));
        // The file keeps its trailing bytes: never rewritten.
        assert_eq!(fs::read(&cache).unwrap(), contents);
    }

    #[test]
    fn short_cache_file_is_a_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("id");
        fs::write(&cache, [1u8; 16]).unwrap();

        assert_matches!(resolve(None, &cache), Err(AgentError::InvalidIdentity(_)));
    }

    #[test]
    fn unwritable_cache_path_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the cache file should be makes the write fail.
        let cache = dir.path().join("id");
        fs::create_dir(&cache).unwrap();

        assert_matches!(
            resolve(None, &cache),
            Err(AgentError::IdentityPersistence { .. })
        );
    }
}
