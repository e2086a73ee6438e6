use crate::git::{
    checkout,
    client::{Advertisement, HttpClient},
    error::Result,
    pack,
    store::FsObjectStore,
};
use std::env;
use std::fs;
use std::path::Path;

/// Lays down the repository skeleton: the metadata directory, the object
/// fan-out root, the refs tree and a HEAD pointing at the default branch.
pub fn init_repository(root: &Path) -> Result<()> {
    for dir in [".git", ".git/objects", ".git/refs"] {
        fs::create_dir_all(root.join(dir))?;
    }
    fs::write(root.join(".git/HEAD"), "ref: refs/heads/main\n")?;
    Ok(())
}

/// The full clone pipeline: init, discover, fetch, ingest, checkout. Any
/// step's failure aborts the clone; partially written objects are
/// content-addressed and harmless.
pub fn clone_repository(url: &str, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    // The one process-global mutation: everything after this point runs
    // relative to the clone target.
    env::set_current_dir(dir)?;
    init_repository(Path::new("."))?;

    let client = HttpClient::new(url)?;
    let advertisement = client.discover_head()?;
    tracing::info!(head = %advertisement.head, "discovered remote HEAD");
    if let Some(target) = &advertisement.symref_target {
        tracing::debug!(%target, "HEAD is symbolic");
    }

    let pack_bytes = client.fetch_pack(&advertisement.head)?;
    tracing::debug!(bytes = pack_bytes.len(), "pack received");

    let store = FsObjectStore::new(".git");
    let objects = pack::ingest(&store, &pack_bytes)?;
    tracing::info!(objects, "pack ingested");

    write_head_ref(Path::new(".git"), &advertisement)?;
    checkout::checkout_commit(&store, &advertisement.head, Path::new("."))?;
    tracing::info!("working tree materialized");
    Ok(())
}

/// Records the fetched tip: HEAD keeps (or gains) its symbolic target and
/// the branch ref file receives the digest.
fn write_head_ref(git_dir: &Path, advertisement: &Advertisement) -> Result<()> {
    let target = advertisement
        .symref_target
        .as_deref()
        .unwrap_or("refs/heads/main");
    fs::write(git_dir.join("HEAD"), format!("ref: {target}\n"))?;

    let ref_path = git_dir.join(target);
    fs::create_dir_all(ref_path.parent().expect("ref path always has a parent"))?;
    fs::write(ref_path, format!("{}\n", advertisement.head))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_the_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        init_repository(dir.path()).unwrap();

        assert!(dir.path().join(".git/objects").is_dir());
        assert!(dir.path().join(".git/refs").is_dir());
        assert_eq!(
            fs::read(dir.path().join(".git/HEAD")).unwrap(),
            b"ref: refs/heads/main\n"
        );
    }

    #[test]
    fn init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        init_repository(dir.path()).unwrap();
        init_repository(dir.path()).unwrap();
        assert!(dir.path().join(".git/objects").is_dir());
    }

    #[test]
    fn head_ref_follows_the_advertised_symref() {
        let dir = tempfile::tempdir().unwrap();
        init_repository(dir.path()).unwrap();

        let advertisement = Advertisement {
            head: crate::git::object::Sha([0xab; 20]),
            symref_target: Some("refs/heads/trunk".to_owned()),
        };
        write_head_ref(&dir.path().join(".git"), &advertisement).unwrap();

        assert_eq!(
            fs::read(dir.path().join(".git/HEAD")).unwrap(),
            b"ref: refs/heads/trunk\n"
        );
        assert_eq!(
            fs::read(dir.path().join(".git/refs/heads/trunk")).unwrap(),
            format!("{}\n", "ab".repeat(20)).as_bytes()
        );
    }

    #[test]
    fn ingest_then_checkout_materializes_the_working_tree() {
        use crate::git::{
            client,
            commit::{Commit, CommitActor},
            compression,
            object::{GitObject, ObjectType, Sha},
            pkt_line::PktLine,
            store::{FsObjectStore, ObjectStore},
            tree::{FileMode, Tree, TreeEntry},
        };
        use sha1::{Digest, Sha1};

        // A pack holding one commit -> one tree -> one blob, wrapped the way
        // upload-pack answers a want/done exchange.
        let blob = b"hello\n";
        let blob_sha = Sha::digest_object(ObjectType::Blob, blob);
        let tree = Tree::new(vec![TreeEntry {
            mode: FileMode::Regular,
            name: "README".to_owned(),
            sha: blob_sha,
        }]);
        let tree_body = tree.encode_body().unwrap();
        let tree_sha = Sha::digest_object(ObjectType::Tree, &tree_body);
        let commit = Commit::new(
            tree_sha,
            Vec::new(),
            CommitActor::synthetic(0),
            CommitActor::synthetic(0),
            "initial\n".to_owned(),
        );
        let commit_body = commit.encode_body().unwrap();
        let commit_sha = Sha::digest_object(ObjectType::Commit, &commit_body);

        fn entry_header(type_code: u8, mut size: usize) -> Vec<u8> {
            let mut first = (type_code << 4) | (size & 0b1111) as u8;
            size >>= 4;
            let mut bytes = Vec::new();
            while size > 0 {
                first |= 0x80;
                bytes.push(first);
                first = (size & 0x7f) as u8;
                size >>= 7;
            }
            bytes.push(first);
            bytes
        }

        let mut pack_body = b"PACK".to_vec();
        pack_body.extend_from_slice(&2u32.to_be_bytes());
        pack_body.extend_from_slice(&3u32.to_be_bytes());
        for (code, payload) in [
            (1u8, commit_body.as_slice()),
            (2, tree_body.as_slice()),
            (3, blob.as_slice()),
        ] {
            pack_body.extend_from_slice(&entry_header(code, payload.len()));
            pack_body.extend_from_slice(&compression::compress(payload).unwrap());
        }
        let mut hasher = Sha1::new();
        hasher.update(&pack_body);
        let trailer = hasher.finalize();
        pack_body.extend_from_slice(&trailer);

        let mut response = PktLine::encode(b"NAK\n");
        response.extend_from_slice(&pack_body);

        let dir = tempfile::tempdir().unwrap();
        init_repository(dir.path()).unwrap();
        let store = FsObjectStore::new(dir.path().join(".git"));

        let pack_bytes = client::strip_nak_frame(&response).unwrap();
        assert_eq!(pack::ingest(&store, pack_bytes).unwrap(), 3);
        checkout::checkout_commit(&store, &commit_sha, dir.path()).unwrap();

        assert_eq!(fs::read(dir.path().join("README")).unwrap(), b"hello\n");
        for sha in [commit_sha, tree_sha, blob_sha] {
            assert!(store.exists(&sha));
        }
    }
}
