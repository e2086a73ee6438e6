use crate::git::{
    error::Result,
    object::{GitObject, ObjectType},
};

/// Raw file contents; the payload is opaque.
#[derive(Clone)]
pub struct Blob(pub Vec<u8>);

impl Blob {
    pub fn new<T: Into<Vec<u8>>>(content: T) -> Self {
        Self(content.into())
    }

    pub fn content(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Blob")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}

impl GitObject for Blob {
    fn object_type() -> ObjectType {
        ObjectType::Blob
    }

    fn encode_body(&self) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }

    fn decode_body(from: Vec<u8>) -> Result<Self> {
        Ok(Self(from))
    }
}
