use crate::git::{
    error::{GitError, Result},
    object::{GitObject, ObjectType, Sha},
    store::ObjectStore,
    tree::{FileMode, Tree, TreeEntry},
};
use std::fs;
use std::path::Path;

/// Snapshots a directory into the store: every file becomes a blob, every
/// directory a tree, entries sorted byte-wise. Returns the root tree's id.
/// The metadata directory itself is skipped. Deterministic: an unchanged
/// directory yields the same digest on every run.
pub fn write_tree<S: ObjectStore>(store: &S, dir: &Path) -> Result<Sha> {
    let mut entries = Vec::new();

    let mut dir_entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    // read_dir order is platform-dependent; Tree::new re-sorts anyway, but a
    // stable scan keeps blob writes in a predictable order.
    dir_entries.sort_by_key(|entry| entry.file_name());

    for dir_entry in dir_entries {
        let path = dir_entry.path();
        let name = dir_entry
            .file_name()
            .into_string()
            .map_err(|name| GitError::MalformedObject(format!("non-UTF-8 file name: {name:?}")))?;

        if name == ".git" {
            continue;
        }

        let metadata = dir_entry.metadata()?;
        if metadata.is_dir() {
            let sha = write_tree(store, &path)?;
            entries.push(TreeEntry {
                mode: FileMode::Directory,
                name,
                sha,
            });
        } else if metadata.is_file() {
            let sha = store.put(ObjectType::Blob, &fs::read(&path)?)?;
            entries.push(TreeEntry {
                mode: FileMode::from(&metadata),
                name,
                sha,
            });
        }
        // Sockets, fifos and friends are not representable; skip them.
    }

    let tree = Tree::new(entries);
    store.put(ObjectType::Tree, &tree.encode_body()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::store::MemoryObjectStore;

    #[test]
    fn empty_directory_yields_the_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryObjectStore::new();
        let sha = write_tree(&store, dir.path()).unwrap();
        assert_eq!(sha.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn single_file_tree_lists_the_file_and_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), b"A\n").unwrap();
        let store = MemoryObjectStore::new();

        let first = write_tree(&store, dir.path()).unwrap();
        let (_, payload) = store.get(&first).unwrap();
        let tree = Tree::decode_body(payload).unwrap();
        let names: Vec<_> = tree.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a"]);

        let second = write_tree(&store, dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn nested_directories_become_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), b"pub fn f() {}\n").unwrap();
        fs::write(dir.path().join("README"), b"readme\n").unwrap();
        let store = MemoryObjectStore::new();

        let root = write_tree(&store, dir.path()).unwrap();
        let (_, payload) = store.get(&root).unwrap();
        let tree = Tree::decode_body(payload).unwrap();
        let names: Vec<_> = tree.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["README", "src"]);

        let src = tree
            .entries()
            .iter()
            .find(|entry| entry.name == "src")
            .unwrap();
        assert_eq!(src.mode, FileMode::Directory);
        assert!(store.exists(&src.sha));
    }

    #[test]
    fn the_metadata_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), b"ref: refs/heads/main\n").unwrap();
        let store = MemoryObjectStore::new();

        let sha = write_tree(&store, dir.path()).unwrap();
        assert_eq!(sha.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }
}
