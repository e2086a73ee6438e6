use crate::git::error::{GitError, Result};
use flate2::write::{ZlibDecoder, ZlibEncoder};
use std::io::{Read, Write};

pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(input)
        .map_err(|err| GitError::Compression(err.to_string()))?;
    encoder
        .finish()
        .map_err(|err| GitError::Compression(err.to_string()))
}

pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(Vec::new());
    decoder
        .write_all(input)
        .map_err(|err| GitError::Compression(err.to_string()))?;
    decoder
        .finish()
        .map_err(|err| GitError::Compression(err.to_string()))
}

/// Inflates the zlib stream at the head of `input` and reports how many
/// compressed bytes it occupied. Pack files concatenate zlib streams with no
/// length prefix, so the caller resumes parsing at the reported offset.
pub fn decompress_consumed(input: &[u8]) -> Result<(Vec<u8>, usize)> {
    let mut decoder = flate2::bufread::ZlibDecoder::new(input);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|err| GitError::Compression(err.to_string()))?;
    let consumed = decoder.total_in() as usize;
    Ok((inflated, consumed))
}
