use crate::git::{
    error::{GitError, Result},
    object::{GitObject, ObjectType, Sha},
};
use bytes::BufMut;
use std::io::Write;
use std::str::FromStr;

/// One `author` / `committer` line: `name <email> epoch timezone`.
#[derive(Debug, Clone)]
pub struct CommitActor {
    pub name: String,
    pub email: String,
    pub epoch: u64,
    pub timezone: String,
}

impl CommitActor {
    /// The synthetic identity used by `commit-tree`.
    pub fn synthetic(epoch: u64) -> Self {
        Self {
            name: "Foo Bar".to_owned(),
            email: "foo@example.com".to_owned(),
            epoch,
            timezone: "+0000".to_owned(),
        }
    }
}

impl std::fmt::Display for CommitActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            self.name, self.email, self.epoch, self.timezone
        )
    }
}

impl FromStr for CommitActor {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(' ').collect();
        if fields.len() < 4 {
            return Err(GitError::MalformedObject(format!(
                "actor line has too few fields: {s:?}"
            )));
        }

        let name = fields[..fields.len() - 3].join(" ");
        let email = fields[fields.len() - 3];
        let epoch = fields[fields.len() - 2];
        let timezone = fields[fields.len() - 1];

        if !email.starts_with('<') || !email.ends_with('>') {
            return Err(GitError::MalformedObject(format!(
                "actor email is not enclosed in angle brackets: {email:?}"
            )));
        }

        Ok(Self {
            name,
            email: email[1..email.len() - 1].to_owned(),
            epoch: epoch.parse().map_err(|_| {
                GitError::MalformedObject(format!("actor epoch is not a number: {epoch:?}"))
            })?,
            timezone: timezone.to_owned(),
        })
    }
}

/// Commit payload: `tree` line, zero-or-more `parent` lines, `author`,
/// `committer`, blank line, message.
#[derive(Debug, Clone)]
pub struct Commit {
    pub tree: Sha,
    pub parents: Vec<Sha>,
    pub author: CommitActor,
    pub committer: CommitActor,
    pub message: String,
}

impl Commit {
    pub fn new(
        tree: Sha,
        parents: Vec<Sha>,
        author: CommitActor,
        committer: CommitActor,
        message: String,
    ) -> Self {
        Self {
            tree,
            parents,
            author,
            committer,
            message,
        }
    }
}

impl GitObject for Commit {
    fn object_type() -> ObjectType {
        ObjectType::Commit
    }

    fn encode_body(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new().writer();

        buf.write_all(format!("tree {}\n", self.tree).as_bytes())?;
        for parent in &self.parents {
            buf.write_all(format!("parent {parent}\n").as_bytes())?;
        }
        buf.write_all(format!("author {}\n", self.author).as_bytes())?;
        buf.write_all(format!("committer {}\n", self.committer).as_bytes())?;
        buf.write_all(format!("\n{}", self.message).as_bytes())?;

        Ok(buf.into_inner())
    }

    fn decode_body(from: Vec<u8>) -> Result<Self> {
        let text = String::from_utf8(from)
            .map_err(|_| GitError::MalformedObject("commit payload is not UTF-8".into()))?;

        let (headers, message) = text.split_once("\n\n").ok_or_else(|| {
            GitError::MalformedObject("commit payload has no blank line before message".into())
        })?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            let (key, value) = line.split_once(' ').ok_or_else(|| {
                GitError::MalformedObject(format!("commit header line has no key: {line:?}"))
            })?;
            match key {
                "tree" => tree = Some(Sha::from_hex(value)?),
                "parent" => parents.push(Sha::from_hex(value)?),
                "author" => author = Some(CommitActor::from_str(value)?),
                "committer" => committer = Some(CommitActor::from_str(value)?),
                // gpgsig and friends are preserved nowhere; signed objects
                // are out of scope.
                _ => {}
            }
        }

        Ok(Self {
            tree: tree.ok_or_else(|| {
                GitError::MalformedObject("commit payload has no tree line".into())
            })?,
            parents,
            author: author.ok_or_else(|| {
                GitError::MalformedObject("commit payload has no author line".into())
            })?,
            committer: committer.ok_or_else(|| {
                GitError::MalformedObject("commit payload has no committer line".into())
            })?,
            message: message.to_owned(),
        })
    }
}
