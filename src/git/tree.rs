use crate::git::{
    error::{GitError, Result},
    object::{GitObject, ObjectType, Sha},
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::str::FromStr;
use strum::{AsRefStr, EnumString};

/// A directory listing: `<octal-mode> SP <name> NUL <20-byte-sha>` entries,
/// sorted byte-wise ascending by name.
#[derive(Debug, Clone)]
pub struct Tree(Vec<TreeEntry>);

#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: String,
    pub sha: Sha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
pub enum FileMode {
    #[strum(serialize = "100644")]
    Regular,
    #[strum(serialize = "100755")]
    Executable,
    #[strum(serialize = "120000")]
    Symbolic,
    #[strum(serialize = "40000")]
    Directory,
}

impl From<&fs::Metadata> for FileMode {
    fn from(metadata: &fs::Metadata) -> Self {
        if metadata.is_dir() {
            Self::Directory
        } else if metadata.is_symlink() {
            Self::Symbolic
        } else if metadata.permissions().mode() & 0o111 != 0 {
            Self::Executable
        } else {
            Self::Regular
        }
    }
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        Self(entries)
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.0
    }
}

impl TreeEntry {
    fn decode<Iter: Iterator<Item = u8>>(iter: &mut Iter) -> Result<Self> {
        let mode_bytes: Vec<u8> = iter.by_ref().take_while(|b| b != &b' ').collect();
        let mode_str = std::str::from_utf8(&mode_bytes)
            .map_err(|_| GitError::MalformedObject("tree entry mode is not ASCII".into()))?;
        let mode = FileMode::from_str(mode_str).map_err(|_| {
            GitError::MalformedObject(format!("unknown tree entry mode: {mode_str:?}"))
        })?;

        let name_bytes: Vec<u8> = iter.by_ref().take_while(|b| b != &b'\0').collect();
        let name = String::from_utf8(name_bytes)
            .map_err(|_| GitError::MalformedObject("tree entry name is not UTF-8".into()))?;

        let sha: [u8; 20] = iter
            .by_ref()
            .take(20)
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| {
                GitError::MalformedObject("tree entry is missing its 20-byte object id".into())
            })?;

        Ok(Self {
            mode,
            name,
            sha: sha.into(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut encoded = Vec::new();
        encoded.extend_from_slice(self.mode.as_ref().as_bytes());
        encoded.push(b' ');
        encoded.extend_from_slice(self.name.as_bytes());
        encoded.push(b'\0');
        encoded.extend_from_slice(self.sha.as_ref());
        encoded
    }
}

impl GitObject for Tree {
    fn object_type() -> ObjectType {
        ObjectType::Tree
    }

    fn encode_body(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for entry in &self.0 {
            buf.extend_from_slice(&entry.encode());
        }
        Ok(buf)
    }

    fn decode_body(from: Vec<u8>) -> Result<Self> {
        let mut iter = from.into_iter().peekable();
        let mut entries = Vec::new();
        while iter.peek().is_some() {
            entries.push(TreeEntry::decode(&mut iter)?);
        }
        Ok(Tree::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mode: FileMode, name: &str, fill: u8) -> TreeEntry {
        TreeEntry {
            mode,
            name: name.to_owned(),
            sha: [fill; 20].into(),
        }
    }

    #[test]
    fn entries_sort_byte_wise_ascending() {
        let tree = Tree::new(vec![
            entry(FileMode::Regular, "zeta", 1),
            entry(FileMode::Directory, "alpha", 2),
            entry(FileMode::Regular, "Zeta", 3),
        ]);
        let names: Vec<_> = tree.entries().iter().map(|e| e.name.as_str()).collect();
        // Upper-case Z (0x5a) sorts before lower-case a (0x61).
        assert_eq!(names, ["Zeta", "alpha", "zeta"]);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let tree = Tree::new(vec![
            entry(FileMode::Regular, "README", 0xaa),
            entry(FileMode::Directory, "src", 0xbb),
            entry(FileMode::Executable, "run.sh", 0xcc),
        ]);
        let decoded = Tree::decode_body(tree.encode_body().unwrap()).unwrap();
        assert_eq!(decoded.entries().len(), 3);
        for (a, b) in tree.entries().iter().zip(decoded.entries()) {
            assert_eq!(a.mode, b.mode);
            assert_eq!(a.name, b.name);
            assert_eq!(a.sha, b.sha);
        }
    }

    #[test]
    fn entry_wire_format_is_bit_exact() {
        let tree = Tree::new(vec![entry(FileMode::Regular, "a", 0x11)]);
        let mut expected = b"100644 a\0".to_vec();
        expected.extend_from_slice(&[0x11; 20]);
        assert_eq!(tree.encode_body().unwrap(), expected);
    }

    #[test]
    fn decode_rejects_unknown_mode() {
        let mut body = b"160000 sub\0".to_vec();
        body.extend_from_slice(&[0u8; 20]);
        assert!(matches!(
            Tree::decode_body(body),
            Err(GitError::MalformedObject(_))
        ));
    }

    #[test]
    fn decode_rejects_truncated_sha() {
        let mut body = b"100644 a\0".to_vec();
        body.extend_from_slice(&[0u8; 7]);
        assert!(matches!(
            Tree::decode_body(body),
            Err(GitError::MalformedObject(_))
        ));
    }

    #[test]
    fn empty_tree_has_empty_body() {
        let tree = Tree::new(Vec::new());
        assert!(tree.encode_body().unwrap().is_empty());
    }
}
