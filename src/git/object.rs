use crate::git::{
    blob::Blob,
    commit::Commit,
    error::{GitError, Result},
    store::ObjectStore,
    tree::Tree,
};
use sha1::{Digest, Sha1};
use strum::EnumTryAs;

/// A 20-byte SHA-1 object identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Sha(pub [u8; 20]);

impl Sha {
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != 40 {
            return Err(GitError::MalformedObject(format!(
                "expected a 40-character object id, got {} characters",
                hex_str.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|err| GitError::MalformedObject(format!("invalid object id: {err}")))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Digest of the canonical serialization `type SP len NUL payload`.
    pub fn digest_object(object_type: ObjectType, payload: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(format!("{} {}\0", object_type.as_str(), payload.len()).as_bytes());
        hasher.update(payload);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }
}

impl From<[u8; 20]> for Sha {
    fn from(value: [u8; 20]) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for Sha {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Sha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for Sha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Sha").field(&hex::encode(self.0)).finish()
    }
}

/// The four whole object types that exist in the store. Delta entries
/// (pack type codes 6 and 7) never leave the pack parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Tag => "tag",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "commit" => Ok(Self::Commit),
            "tree" => Ok(Self::Tree),
            "blob" => Ok(Self::Blob),
            "tag" => Ok(Self::Tag),
            _ => Err(GitError::MalformedObject(format!(
                "unknown object type: {s:?}"
            ))),
        }
    }

    /// Pack type codes for whole objects; 6 (ofs-delta) and 7 (ref-delta)
    /// are handled by the pack parser and deliberately absent here.
    pub fn from_pack_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Commit),
            2 => Some(Self::Tree),
            3 => Some(Self::Blob),
            4 => Some(Self::Tag),
            _ => None,
        }
    }

    pub fn pack_code(&self) -> u8 {
        match self {
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Blob => 3,
            Self::Tag => 4,
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical byte sequence `type SP decimal_len NUL payload` that is
/// hashed for the object id and stored (deflated) on disk.
pub fn canonical(object_type: ObjectType, payload: &[u8]) -> Vec<u8> {
    let mut buf = format!("{} {}\0", object_type.as_str(), payload.len()).into_bytes();
    buf.extend_from_slice(payload);
    buf
}

/// Behavior shared by the typed payload structs.
pub trait GitObject {
    fn object_type() -> ObjectType
    where
        Self: Sized;

    fn encode_body(&self) -> Result<Vec<u8>>;

    fn decode_body(from: Vec<u8>) -> Result<Self>
    where
        Self: Sized;

    fn sha1(&self) -> Result<Sha>
    where
        Self: Sized,
    {
        Ok(Sha::digest_object(Self::object_type(), &self.encode_body()?))
    }
}

/// A decoded object of any of the whole types. Tag payloads are kept
/// opaque; nothing in the pipeline looks inside them.
#[derive(Debug, Clone, EnumTryAs)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Vec<u8>),
}

impl Object {
    /// Loads and decodes an object from the store.
    pub fn read<S: ObjectStore + ?Sized>(store: &S, sha: &Sha) -> Result<Self> {
        let (object_type, payload) = store.get(sha)?;
        Self::decode(object_type, payload)
    }

    pub fn decode(object_type: ObjectType, payload: Vec<u8>) -> Result<Self> {
        Ok(match object_type {
            ObjectType::Blob => Self::Blob(Blob::decode_body(payload)?),
            ObjectType::Tree => Self::Tree(Tree::decode_body(payload)?),
            ObjectType::Commit => Self::Commit(Commit::decode_body(payload)?),
            ObjectType::Tag => Self::Tag(payload),
        })
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Blob(_) => ObjectType::Blob,
            Self::Tree(_) => ObjectType::Tree,
            Self::Commit(_) => ObjectType::Commit,
            Self::Tag(_) => ObjectType::Tag,
        }
    }
}
