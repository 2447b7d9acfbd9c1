use crate::forms::control::FileUpload;
use encoding_rs::Encoding;
use url::form_urlencoded::byte_serialize;
use uuid::Uuid;

/// One name/value pair of a form submission.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEntry {
    Text { name: String, value: String },
    File { name: String, upload: FileUpload },
}

impl FormEntry {
    /// A text entry with newlines normalized to CRLF.
    pub fn text(name: &str, value: &str) -> Self {
        FormEntry::Text {
            name: normalize_newlines(name),
            value: normalize_newlines(value),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormEntry::Text { name, .. } | FormEntry::File { name, .. } => name,
        }
    }
}

/// Rewrites lone CR and lone LF as CRLF.
pub fn normalize_newlines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\r\n");
            }
            '\n' => out.push_str("\r\n"),
            _ => out.push(c),
        }
    }
    out
}

/// `application/x-www-form-urlencoded` serialization. File entries submit
/// their filename.
pub fn urlencode(entries: &[FormEntry], encoding: &'static Encoding) -> String {
    entries
        .iter()
        .map(|entry| {
            let value = match entry {
                FormEntry::Text { value, .. } => value.as_str(),
                FormEntry::File { upload, .. } => upload.filename.as_str(),
            };
            format!("{}={}", encode_component(entry.name(), encoding), encode_component(value, encoding))
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(input: &str, encoding: &'static Encoding) -> String {
    let (bytes, _, _) = encoding.encode(input);
    byte_serialize(&bytes).collect()
}

/// A `multipart/form-data` body and the boundary it was built with.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn encode(entries: &[FormEntry], encoding: &'static Encoding) -> Self {
        Self::encode_with(entries, encoding, random_boundary)
    }

    /// Encodes with boundaries drawn from `next_boundary`; a boundary that
    /// occurs anywhere in the payload is discarded and another one drawn.
    pub fn encode_with<F>(entries: &[FormEntry], encoding: &'static Encoding, mut next_boundary: F) -> Self
    where
        F: FnMut() -> String,
    {
        let parts: Vec<(Vec<u8>, Vec<u8>)> = entries.iter().map(|e| encode_part(e, encoding)).collect();

        let boundary = loop {
            let candidate = next_boundary();
            let needle = candidate.as_bytes();
            let collides = parts
                .iter()
                .any(|(headers, content)| contains(headers, needle) || contains(content, needle));
            if !collides && !needle.is_empty() {
                break candidate;
            }
        };

        let mut body = Vec::new();
        for (headers, content) in &parts {
            body.extend_from_slice(b"--");
            body.extend_from_slice(boundary.as_bytes());
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(headers);
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(b"--");
        body.extend_from_slice(boundary.as_bytes());
        body.extend_from_slice(b"--\r\n");

        Self { boundary, body }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

fn random_boundary() -> String {
    format!("----minimech{}", Uuid::new_v4().simple())
}

/// Part headers (each line CRLF-terminated) and content.
fn encode_part(entry: &FormEntry, encoding: &'static Encoding) -> (Vec<u8>, Vec<u8>) {
    match entry {
        FormEntry::Text { name, value } => {
            let headers = format!("Content-Disposition: form-data; name=\"{}\"\r\n", escape_quoted(name));
            (encoding.encode(&headers).0.into_owned(), encoding.encode(value).0.into_owned())
        }
        FormEntry::File { name, upload } => {
            let headers = format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n",
                escape_quoted(name),
                escape_quoted(&upload.filename),
                upload.content_type
            );
            (encoding.encode(&headers).0.into_owned(), upload.content.clone())
        }
    }
}

fn escape_quoted(input: &str) -> String {
    input
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1252};

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\nb\rc\r\nd"), "a\r\nb\r\nc\r\nd");
        assert_eq!(normalize_newlines("\r\r\n"), "\r\n\r\n");
    }

    #[test]
    fn test_urlencode() {
        let entries = vec![
            FormEntry::text("q", "a b"),
            FormEntry::text("x&y", "1=2"),
            FormEntry::text("t", "caf\u{e9}"),
        ];
        assert_eq!(urlencode(&entries, UTF_8), "q=a+b&x%26y=1%3D2&t=caf%C3%A9");
        assert_eq!(urlencode(&entries, WINDOWS_1252), "q=a+b&x%26y=1%3D2&t=caf%E9");
    }

    #[test]
    fn test_urlencode_unmappable_characters() {
        let entries = vec![FormEntry::text("s", "\u{2603}")];
        // encoding_rs substitutes a numeric character reference
        assert_eq!(urlencode(&entries, WINDOWS_1252), "s=%26%239731%3B");
    }

    #[test]
    fn test_urlencode_file_uses_filename() {
        let entries = vec![FormEntry::File {
            name: "f".to_string(),
            upload: FileUpload::new("a b.txt", "text/plain", b"ignored".to_vec()),
        }];
        assert_eq!(urlencode(&entries, UTF_8), "f=a+b.txt");
    }

    #[test]
    fn test_multipart_layout() {
        let entries = vec![
            FormEntry::text("name", "value"),
            FormEntry::File {
                name: "up".to_string(),
                upload: FileUpload::new("x.bin", "application/octet-stream", vec![0, 1, 2]),
            },
        ];
        let body = MultipartBody::encode_with(&entries, UTF_8, || "BOUNDARY".to_string());
        let mut expected = b"--BOUNDARY\r\n\
Content-Disposition: form-data; name=\"name\"\r\n\r\n\
value\r\n\
--BOUNDARY\r\n\
Content-Disposition: form-data; name=\"up\"; filename=\"x.bin\"\r\n\
Content-Type: application/octet-stream\r\n\r\n"
            .to_vec();
        expected.extend_from_slice(&[0, 1, 2]);
        expected.extend_from_slice(b"\r\n--BOUNDARY--\r\n");
        assert_eq!(body.body(), expected.as_slice());
        assert_eq!(body.content_type(), "multipart/form-data; boundary=BOUNDARY");
    }

    #[test]
    fn test_multipart_boundary_collision() {
        let entries = vec![FormEntry::text("a", "contains --first inside")];
        let mut candidates = vec!["second".to_string(), "first".to_string()];
        let body = MultipartBody::encode_with(&entries, UTF_8, || candidates.pop().unwrap_or_default());
        assert_eq!(body.boundary(), "second");
    }

    #[test]
    fn test_multipart_escapes_names() {
        let entries = vec![FormEntry::Text {
            name: "a\"b\r\nc".to_string(),
            value: String::new(),
        }];
        let body = MultipartBody::encode_with(&entries, UTF_8, || "B".to_string());
        let text = String::from_utf8(body.into_bytes()).unwrap();
        assert!(text.contains("name=\"a%22b%0D%0Ac\""));
    }

    #[test]
    fn test_random_boundaries_differ() {
        let entries = vec![FormEntry::text("a", "b")];
        let first = MultipartBody::encode(&entries, UTF_8);
        let second = MultipartBody::encode(&entries, UTF_8);
        assert_ne!(first.boundary(), second.boundary());
        assert!(first.boundary().starts_with("----minimech"));
    }
}
