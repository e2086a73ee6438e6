use crate::git::{
    compression,
    delta,
    error::{GitError, Result},
    object::{ObjectType, Sha},
    store::ObjectStore,
};
use sha1::{Digest, Sha1};
use std::collections::VecDeque;

const MAGIC: &[u8; 4] = b"PACK";
const SUPPORTED_VERSION: u32 = 2;
const HEADER_LEN: usize = 12;
const TRAILER_LEN: usize = 20;

const TYPE_OFS_DELTA: u8 = 6;
const TYPE_REF_DELTA: u8 = 7;

/// A ref-delta entry waiting for its base to appear in the store.
struct QueuedDelta {
    base: Sha,
    instructions: Vec<u8>,
}

/// Ingests a version-2 pack: whole objects are persisted in encounter
/// order, ref-delta entries are queued and resolved afterwards. Returns the
/// number of objects persisted.
pub fn ingest<S: ObjectStore>(store: &S, pack: &[u8]) -> Result<usize> {
    if pack.len() < HEADER_LEN + TRAILER_LEN {
        return Err(GitError::TruncatedObject(format!(
            "pack of {} bytes cannot hold a header and trailer",
            pack.len()
        )));
    }

    let (body, trailer) = pack.split_at(pack.len() - TRAILER_LEN);
    if &body[..4] != MAGIC {
        return Err(GitError::BadMagic);
    }
    let version = read_u32_be(body, 4)?;
    if version != SUPPORTED_VERSION {
        return Err(GitError::UnsupportedPackVersion(version));
    }
    let declared = read_u32_be(body, 8)?;

    let mut hasher = Sha1::new();
    hasher.update(body);
    if hasher.finalize().as_slice() != trailer {
        return Err(GitError::BadPackChecksum);
    }

    let mut offset = HEADER_LEN;
    let mut entries = 0u32;
    let mut pending = VecDeque::new();

    while offset < body.len() {
        let (type_code, size, consumed) = read_entry_header(&body[offset..])?;
        offset += consumed;

        match ObjectType::from_pack_code(type_code) {
            Some(object_type) => {
                let (payload, consumed) = compression::decompress_consumed(&body[offset..])?;
                if payload.len() != size {
                    return Err(GitError::TruncatedObject(format!(
                        "entry declares {size} bytes but inflates to {}",
                        payload.len()
                    )));
                }
                offset += consumed;
                store.put(object_type, &payload)?;
            }
            None if type_code == TYPE_REF_DELTA => {
                let base: [u8; 20] = body
                    .get(offset..offset + 20)
                    .ok_or_else(|| {
                        GitError::TruncatedObject(
                            "ref-delta entry ends inside its base object id".into(),
                        )
                    })?
                    .try_into()
                    .expect("a 20-byte slice always converts");
                offset += 20;

                let (instructions, consumed) =
                    compression::decompress_consumed(&body[offset..])?;
                if instructions.len() != size {
                    return Err(GitError::TruncatedObject(format!(
                        "delta entry declares {size} bytes but inflates to {}",
                        instructions.len()
                    )));
                }
                offset += consumed;
                pending.push_back(QueuedDelta {
                    base: base.into(),
                    instructions,
                });
            }
            None if type_code == TYPE_OFS_DELTA => {
                return Err(GitError::UnsupportedObjectType("ofs-delta"));
            }
            None => return Err(GitError::UnknownObjectType(type_code)),
        }
        entries += 1;
    }

    if entries != declared {
        return Err(GitError::PackCountMismatch {
            expected: declared,
            actual: entries,
        });
    }

    tracing::debug!(
        objects = entries,
        deltas = pending.len(),
        "pack entries parsed"
    );
    resolve_deltas(store, pending)?;
    Ok(entries as usize)
}

/// Resolves queued deltas in arrival order, requeueing entries whose base
/// has not been persisted yet. A delta's base may itself be a delta that an
/// earlier pass restored; a full pass with no progress is unresolvable.
fn resolve_deltas<S: ObjectStore>(store: &S, mut pending: VecDeque<QueuedDelta>) -> Result<()> {
    while !pending.is_empty() {
        let mut progressed = false;

        for _ in 0..pending.len() {
            let entry = pending.pop_front().expect("queue is non-empty");
            if !store.exists(&entry.base) {
                pending.push_back(entry);
                continue;
            }
            let (base_type, base_payload) = store.get(&entry.base)?;
            let restored = delta::apply(&base_payload, &entry.instructions)?;
            let sha = store.put(base_type, &restored)?;
            tracing::trace!(%sha, base = %entry.base, "delta restored");
            progressed = true;
        }

        if !progressed {
            return Err(GitError::UnresolvableDelta(pending.len()));
        }
    }
    Ok(())
}

/// Decodes the per-entry header `[C|TTT|LLLL]` followed by 7-bit
/// continuation groups (shift starts at 4, then grows by 7).
fn read_entry_header(input: &[u8]) -> Result<(u8, usize, usize)> {
    let first = *input.first().ok_or(GitError::MalformedVarint)?;
    let type_code = (first >> 4) & 0b0111;
    let mut size = (first & 0b1111) as usize;
    let mut shift = 4u32;
    let mut consumed = 1usize;

    let mut byte = first;
    while byte & 0x80 != 0 {
        byte = *input.get(consumed).ok_or(GitError::MalformedVarint)?;
        consumed += 1;
        if shift >= usize::BITS {
            return Err(GitError::MalformedVarint);
        }
        size |= ((byte & 0x7f) as usize) << shift;
        shift += 7;
    }

    Ok((type_code, size, consumed))
}

fn read_u32_be(input: &[u8], at: usize) -> Result<u32> {
    let bytes: [u8; 4] = input
        .get(at..at + 4)
        .ok_or_else(|| GitError::TruncatedObject("pack header is short".into()))?
        .try_into()
        .expect("a 4-byte slice always converts");
    Ok(u32::from_be_bytes(bytes))
}
