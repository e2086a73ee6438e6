use crate::git::error::{GitError, Result};

/// git reserves frame lengths 65521 to 65535.
pub const MAX_FRAME_LEN: usize = 65520;

const LEN_PREFIX: usize = 4;

/// One Smart-HTTP frame: a 4-hex-digit length prefix (inclusive of itself)
/// followed by the payload, or the `0000` flush sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    Data(Vec<u8>),
    Flush,
}

impl PktLine {
    /// Decodes the frame at the head of `input`, returning it together with
    /// the number of bytes it occupied.
    pub fn decode(input: &[u8]) -> Result<(Self, usize)> {
        let prefix = input.get(..LEN_PREFIX).ok_or_else(|| {
            GitError::MalformedFrame("input ends inside the length prefix".into())
        })?;
        let prefix = std::str::from_utf8(prefix)
            .map_err(|_| GitError::MalformedFrame("length prefix is not ASCII".into()))?;
        let length = usize::from_str_radix(prefix, 16).map_err(|_| {
            GitError::MalformedFrame(format!("length prefix is not hex: {prefix:?}"))
        })?;

        if length == 0 {
            return Ok((Self::Flush, LEN_PREFIX));
        }
        if length < LEN_PREFIX || length > MAX_FRAME_LEN {
            return Err(GitError::MalformedFrame(format!(
                "frame length {length} outside [{LEN_PREFIX}, {MAX_FRAME_LEN}]"
            )));
        }

        let payload = input.get(LEN_PREFIX..length).ok_or_else(|| {
            GitError::MalformedFrame(format!(
                "frame declares {length} bytes but only {} are available",
                input.len()
            ))
        })?;

        Ok((Self::Data(payload.to_vec()), length))
    }

    /// Yields every frame in `input`, stopping at the first error.
    pub fn iter(input: &[u8]) -> impl Iterator<Item = Result<PktLine>> + '_ {
        let mut offset = 0;
        let mut failed = false;
        std::iter::from_fn(move || {
            if failed || offset >= input.len() {
                return None;
            }
            match Self::decode(&input[offset..]) {
                Ok((line, consumed)) => {
                    offset += consumed;
                    Some(Ok(line))
                }
                Err(err) => {
                    failed = true;
                    Some(Err(err))
                }
            }
        })
    }

    pub fn encode(payload: &[u8]) -> Vec<u8> {
        let mut frame = format!("{:04x}", payload.len() + LEN_PREFIX).into_bytes();
        frame.extend_from_slice(payload);
        frame
    }

    pub fn flush() -> Vec<u8> {
        b"0000".to_vec()
    }

    /// The payload as text with a single trailing newline stripped, or
    /// `None` for flush frames and non-UTF-8 payloads.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Data(payload) => {
                let text = std::str::from_utf8(payload).ok()?;
                Some(text.strip_suffix('\n').unwrap_or(text))
            }
            Self::Flush => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_prefixes_the_inclusive_length() {
        let want = "want 3b18e512dba79e4c8300dd08aeb37f8e728b8dad\n";
        let frame = PktLine::encode(want.as_bytes());
        assert_eq!(&frame[..4], b"0032");
        assert_eq!(&frame[4..], want.as_bytes());
    }

    #[test]
    fn decode_roundtrips_encode() {
        let frame = PktLine::encode(b"done\n");
        let (line, consumed) = PktLine::decode(&frame).unwrap();
        assert_eq!(consumed, frame.len());
        assert_eq!(line.text(), Some("done"));
    }

    #[test]
    fn flush_is_four_zeroes() {
        assert_eq!(PktLine::flush(), b"0000");
        let (line, consumed) = PktLine::decode(b"0000tail").unwrap();
        assert_eq!(line, PktLine::Flush);
        assert_eq!(consumed, 4);
    }

    #[test]
    fn lengths_below_four_are_rejected() {
        for bad in [&b"0001"[..], b"0002", b"0003"] {
            assert!(matches!(
                PktLine::decode(bad),
                Err(GitError::MalformedFrame(_))
            ));
        }
    }

    #[test]
    fn lengths_above_the_reserved_bound_are_rejected() {
        // 0xfff1 == 65521, the first reserved length.
        assert!(matches!(
            PktLine::decode(b"fff1"),
            Err(GitError::MalformedFrame(_))
        ));
    }

    #[test]
    fn non_hex_prefix_is_rejected() {
        assert!(matches!(
            PktLine::decode(b"00g8rest"),
            Err(GitError::MalformedFrame(_))
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        assert!(matches!(
            PktLine::decode(b"0032want "),
            Err(GitError::MalformedFrame(_))
        ));
    }

    #[test]
    fn iter_walks_a_whole_body() {
        let mut body = PktLine::encode(b"# service=git-upload-pack\n");
        body.extend_from_slice(&PktLine::flush());
        body.extend_from_slice(&PktLine::encode(b"line\n"));
        body.extend_from_slice(&PktLine::flush());

        let lines: Vec<_> = PktLine::iter(&body).collect::<Result<_>>().unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].text(), Some("# service=git-upload-pack"));
        assert_eq!(lines[1], PktLine::Flush);
        assert_eq!(lines[2].text(), Some("line"));
        assert_eq!(lines[3], PktLine::Flush);
    }
}
