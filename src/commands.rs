use crate::git::{
    commit::{Commit, CommitActor},
    file_tree,
    object::{GitObject, ObjectType, Sha},
    repo,
    store::{FsObjectStore, ObjectStore},
    tree::Tree,
};
use anyhow::{ensure, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn init() -> Result<()> {
    repo::init_repository(Path::new(".")).context("failed to initialize git directory")?;
    println!("Initialized git directory");
    Ok(())
}

pub fn hash_object(write: bool, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("failed to read file {path:?}"))?;

    let sha = if write {
        FsObjectStore::new(".git")
            .put(ObjectType::Blob, &content)
            .with_context(|| format!("failed to store blob for {path:?}"))?
    } else {
        Sha::digest_object(ObjectType::Blob, &content)
    };

    println!("{sha}");
    Ok(())
}

pub fn cat_file(pretty: bool, sha: &str) -> Result<()> {
    ensure!(pretty, "cat-file supports only the -p form");

    let sha = Sha::from_hex(sha).context("invalid object id")?;
    let (_, payload) = FsObjectStore::new(".git")
        .get(&sha)
        .with_context(|| format!("failed to read object {sha}"))?;

    std::io::stdout()
        .write_all(&payload)
        .context("failed to write object payload to stdout")?;
    Ok(())
}

pub fn ls_tree(sha: &str) -> Result<()> {
    let sha = Sha::from_hex(sha).context("invalid object id")?;
    let (object_type, payload) = FsObjectStore::new(".git")
        .get(&sha)
        .with_context(|| format!("failed to read object {sha}"))?;
    ensure!(
        object_type == ObjectType::Tree,
        "object {sha} is a {object_type}, not a tree"
    );

    let tree = Tree::decode_body(payload).context("failed to decode tree object")?;
    for entry in tree.entries() {
        println!("{}", entry.name);
    }
    Ok(())
}

pub fn write_tree() -> Result<()> {
    let store = FsObjectStore::new(".git");
    let sha = file_tree::write_tree(&store, Path::new("."))
        .context("failed to write the working tree")?;
    println!("{sha}");
    Ok(())
}

pub fn commit_tree(tree: &str, parent: Option<&str>, message: &str) -> Result<()> {
    let tree = Sha::from_hex(tree).context("invalid tree id")?;
    let parents = parent
        .map(|parent| Sha::from_hex(parent).context("invalid parent id"))
        .transpose()?
        .into_iter()
        .collect();

    let epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the epoch")?
        .as_secs();
    let actor = CommitActor::synthetic(epoch);

    let commit = Commit::new(
        tree,
        parents,
        actor.clone(),
        actor,
        format!("{message}\n"),
    );
    let sha = FsObjectStore::new(".git")
        .put(
            ObjectType::Commit,
            &commit.encode_body().context("failed to encode commit")?,
        )
        .context("failed to store commit")?;

    println!("{sha}");
    Ok(())
}

pub fn clone(url: &str, dir: &Path) -> Result<()> {
    repo::clone_repository(url, dir)
        .with_context(|| format!("failed to clone {url} into {dir:?}"))?;
    Ok(())
}
