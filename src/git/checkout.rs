use crate::git::{
    error::{GitError, Result},
    object::{GitObject, Object, Sha},
    store::ObjectStore,
    tree::{FileMode, Tree},
};
use std::fs;
use std::path::Path;

/// Materializes the working tree of a commit under `target`. The directory
/// need not be empty; colliding names are overwritten.
pub fn checkout_commit<S: ObjectStore>(store: &S, commit: &Sha, target: &Path) -> Result<()> {
    let commit = Object::read(store, commit)?;
    let commit = commit.try_as_commit_ref().ok_or(GitError::TypeMismatch {
        expected: "commit",
        actual: commit.object_type().as_str(),
    })?;
    checkout_tree(store, &commit.tree, target)
}

fn checkout_tree<S: ObjectStore>(store: &S, sha: &Sha, dir: &Path) -> Result<()> {
    let (object_type, payload) = store.get(sha)?;
    if object_type != Tree::object_type() {
        return Err(GitError::TypeMismatch {
            expected: "tree",
            actual: object_type.as_str(),
        });
    }

    for entry in Tree::decode_body(payload)?.entries() {
        let path = dir.join(&entry.name);
        match entry.mode {
            FileMode::Directory => {
                fs::create_dir_all(&path)?;
                checkout_tree(store, &entry.sha, &path)?;
            }
            FileMode::Regular | FileMode::Executable => {
                let blob = Object::read(store, &entry.sha)?;
                let blob = blob.try_as_blob_ref().ok_or(GitError::TypeMismatch {
                    expected: "blob",
                    actual: blob.object_type().as_str(),
                })?;
                fs::write(&path, blob.content())?;
            }
            // Symlink materialization is out of scope.
            FileMode::Symbolic => {
                tracing::debug!(name = %entry.name, "skipping symlink entry");
            }
        }
    }
    Ok(())
}
