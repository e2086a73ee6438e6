use crate::git::{
    error::{GitError, Result},
    object::Sha,
    pkt_line::PktLine,
};
use url::Url;

const ADVERTISEMENT_CONTENT_TYPE: &str = "application/x-git-upload-pack-advertisement";
const REQUEST_CONTENT_TYPE: &str = "application/x-git-upload-pack-request";

/// What reference discovery yields: the advertised HEAD digest, plus the
/// symbolic target when the server names one via `symref=HEAD:<ref>`.
#[derive(Debug)]
pub struct Advertisement {
    pub head: Sha,
    pub symref_target: Option<String>,
}

/// Smart-HTTP upload-pack client against a single remote.
pub struct HttpClient {
    base: Url,
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(url: &str) -> Result<Self> {
        let base = Url::parse(&normalize_url(url))
            .map_err(|err| GitError::Protocol(format!("invalid repository URL: {err}")))?;
        Ok(Self {
            base,
            client: reqwest::blocking::Client::new(),
        })
    }

    /// `GET <base>/info/refs?service=git-upload-pack`.
    pub fn discover_head(&self) -> Result<Advertisement> {
        let mut url = self
            .base
            .join("info/refs")
            .map_err(|err| GitError::Protocol(format!("cannot build discovery URL: {err}")))?;
        url.set_query(Some("service=git-upload-pack"));

        let response = self.client.get(url).send()?;
        expect_ok(&response)?;
        expect_content_type(&response, ADVERTISEMENT_CONTENT_TYPE)?;

        let body = response.bytes()?;
        parse_advertisement(&body)
    }

    /// `POST <base>/git-upload-pack` asking for a single commit with no
    /// `have` lines; the server answers `NAK` followed by the pack.
    pub fn fetch_pack(&self, want: &Sha) -> Result<Vec<u8>> {
        let url = self
            .base
            .join("git-upload-pack")
            .map_err(|err| GitError::Protocol(format!("cannot build upload-pack URL: {err}")))?;

        let mut request_body = PktLine::encode(format!("want {want}\n").as_bytes());
        request_body.extend_from_slice(&PktLine::flush());
        request_body.extend_from_slice(&PktLine::encode(b"done\n"));

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, REQUEST_CONTENT_TYPE)
            .body(request_body)
            .send()?;
        expect_ok(&response)?;

        let body = response.bytes()?;
        Ok(strip_nak_frame(&body)?.to_vec())
    }
}

/// The remote path must end in `<repo>.git/` so `Url::join` keeps the
/// repository component.
fn normalize_url(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if url.ends_with(".git") {
        format!("{url}/")
    } else {
        format!("{url}.git/")
    }
}

fn expect_ok(response: &reqwest::blocking::Response) -> Result<()> {
    if response.status() != reqwest::StatusCode::OK {
        return Err(GitError::HttpStatus(response.status()));
    }
    Ok(())
}

fn expect_content_type(response: &reqwest::blocking::Response, expected: &str) -> Result<()> {
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| GitError::Protocol("response has no readable content-type".into()))?;
    if content_type != expected {
        return Err(GitError::Protocol(format!(
            "expected content-type {expected}, got {content_type}"
        )));
    }
    Ok(())
}

/// Scans the advertisement body for the HEAD digest: the first forty
/// characters of the first non-comment, non-flush pkt-line. The line's
/// capability list may carry `symref=HEAD:<ref>`.
pub fn parse_advertisement(body: &[u8]) -> Result<Advertisement> {
    for line in PktLine::iter(body) {
        let line = line?;
        let Some(text) = line.text() else {
            continue;
        };
        if text.starts_with('#') {
            continue;
        }

        let head = text.get(..40).ok_or_else(|| {
            GitError::Protocol(format!("advertisement line is too short: {text:?}"))
        })?;
        let head = Sha::from_hex(head)
            .map_err(|_| GitError::Protocol(format!("advertisement line has no digest: {text:?}")))?;

        let symref_target = text
            .split_once('\0')
            .map(|(_, capabilities)| capabilities)
            .and_then(|capabilities| {
                capabilities
                    .split(' ')
                    .find_map(|capability| capability.strip_prefix("symref=HEAD:"))
            })
            .map(str::to_owned);

        return Ok(Advertisement {
            head,
            symref_target,
        });
    }
    Err(GitError::NoHeadRef)
}

/// The upload-pack response opens with a single `NAK` pkt-line (no `have`s
/// were sent); the pack bytes follow immediately after it.
pub fn strip_nak_frame(body: &[u8]) -> Result<&[u8]> {
    let (line, consumed) = PktLine::decode(body)?;
    match line.text() {
        Some("NAK") => Ok(&body[consumed..]),
        _ => Err(GitError::Protocol(
            "upload-pack response does not open with NAK".into(),
        )),
    }
}
