use crate::git::{
    compression,
    error::{GitError, Result},
    object::{self, ObjectType, Sha},
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// The capability set the rest of the pipeline needs from an object store.
/// Tests substitute [`MemoryObjectStore`] for the filesystem one.
pub trait ObjectStore {
    /// Canonicalizes, digests and persists an object. Idempotent: storing
    /// the same payload twice yields the same id and the same bytes.
    fn put(&self, object_type: ObjectType, payload: &[u8]) -> Result<Sha>;

    /// Retrieves an object's type and payload by id.
    fn get(&self, sha: &Sha) -> Result<(ObjectType, Vec<u8>)>;

    fn exists(&self, sha: &Sha) -> bool;
}

/// Loose-object store rooted at an explicit `.git` directory. Each object
/// lives at `objects/<first-two-hex>/<remaining-38-hex>` as the
/// deflate-compressed canonical serialization.
pub struct FsObjectStore {
    git_dir: PathBuf,
}

impl FsObjectStore {
    pub fn new<P: Into<PathBuf>>(git_dir: P) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    fn object_path(&self, sha: &Sha) -> PathBuf {
        let hex = sha.to_hex();
        self.git_dir.join("objects").join(&hex[..2]).join(&hex[2..])
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, object_type: ObjectType, payload: &[u8]) -> Result<Sha> {
        let canonical = object::canonical(object_type, payload);
        let sha = Sha::digest_object(object_type, payload);

        let path = self.object_path(&sha);
        let parent = path.parent().expect("object path always has a parent");
        fs::create_dir_all(parent)?;
        fs::write(&path, compression::compress(&canonical)?)?;

        tracing::trace!(%sha, %object_type, bytes = payload.len(), "stored object");
        Ok(sha)
    }

    fn get(&self, sha: &Sha) -> Result<(ObjectType, Vec<u8>)> {
        let path = self.object_path(sha);
        let raw = fs::read(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                GitError::NotFound(sha.to_hex())
            } else {
                GitError::Io(err)
            }
        })?;

        parse_canonical(sha, compression::decompress(&raw)?)
    }

    fn exists(&self, sha: &Sha) -> bool {
        self.object_path(sha).exists()
    }
}

/// Splits `type SP len NUL payload` and validates the declared length.
fn parse_canonical(sha: &Sha, canonical: Vec<u8>) -> Result<(ObjectType, Vec<u8>)> {
    let nul = canonical.iter().position(|b| b == &b'\0').ok_or_else(|| {
        GitError::MalformedObject(format!("object {sha} has no NUL after its header"))
    })?;

    let header = std::str::from_utf8(&canonical[..nul])
        .map_err(|_| GitError::MalformedObject(format!("object {sha} header is not ASCII")))?;
    let (type_str, len_str) = header.split_once(' ').ok_or_else(|| {
        GitError::MalformedObject(format!("object {sha} header has no space: {header:?}"))
    })?;

    let object_type = ObjectType::parse(type_str)?;
    let declared: usize = len_str.parse().map_err(|_| {
        GitError::MalformedObject(format!("object {sha} declares a non-numeric length"))
    })?;

    let payload = canonical[nul + 1..].to_vec();
    if payload.len() != declared {
        return Err(GitError::MalformedObject(format!(
            "object {sha} declares {declared} bytes but carries {}",
            payload.len()
        )));
    }

    Ok((object_type, payload))
}

/// In-memory store used as a test double and for dry runs.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<Sha, (ObjectType, Vec<u8>)>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, object_type: ObjectType, payload: &[u8]) -> Result<Sha> {
        let sha = Sha::digest_object(object_type, payload);
        self.objects
            .write()
            .insert(sha, (object_type, payload.to_vec()));
        Ok(sha)
    }

    fn get(&self, sha: &Sha) -> Result<(ObjectType, Vec<u8>)> {
        self.objects
            .read()
            .get(sha)
            .cloned()
            .ok_or_else(|| GitError::NotFound(sha.to_hex()))
    }

    fn exists(&self, sha: &Sha) -> bool {
        self.objects.read().contains_key(sha)
    }
}
