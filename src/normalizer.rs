use crate::error::AnalysisError;
use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use std::collections::HashMap;

const DEFAULT_SENDER: &str = "unknown@example.com";
const DEFAULT_SUBJECT: &str = "(No Subject)";

/// Canonical plain-text form of one submitted email.
#[derive(Debug, Clone)]
pub struct NormalizedEmail {
    pub sender: String,
    pub subject: String,
    /// Always non-empty; falls back to the raw decoded payload when no
    /// usable MIME part is found.
    pub body_text: String,
}

pub struct EmailNormalizer {
    mime_word_regex: Regex,
}

impl EmailNormalizer {
    pub fn new() -> Self {
        Self {
            mime_word_regex: Regex::new(r"=\?[^?]+\?([BbQq])\?([^?]*)\?=").unwrap(),
        }
    }

    /// Turn raw submitted bytes plus a filename hint into a normalized
    /// email. Only the `.eml` suffix (case-insensitive) triggers structured
    /// parsing; anything else is treated as plain text. Malformed MIME
    /// content falls back to the raw text interpretation rather than
    /// failing the invocation.
    pub fn normalize(&self, bytes: &[u8], filename: &str) -> Result<NormalizedEmail, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::Input("empty submission payload".to_string()));
        }

        let raw = String::from_utf8(bytes.to_vec())
            .map_err(|_| AnalysisError::Input("submission is not valid UTF-8 text".to_string()))?;

        if filename.to_lowercase().ends_with(".eml") {
            if let Some(parsed) = self.parse_structured(&raw) {
                return Ok(parsed);
            }
            log::debug!("Structured parse failed for {filename}, falling back to raw text");
        }

        Ok(NormalizedEmail {
            sender: DEFAULT_SENDER.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            body_text: raw,
        })
    }

    fn parse_structured(&self, raw: &str) -> Option<NormalizedEmail> {
        let (header_block, body) = split_message(raw)?;
        let headers = parse_headers(header_block);

        let sender = headers
            .get("from")
            .map(|v| self.decode_mime_words(v))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SENDER.to_string());
        let subject = headers
            .get("subject")
            .map(|v| self.decode_mime_words(v))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

        // Body priority: decoded text part, then HTML part, then the raw
        // decoded payload.
        let body_text = self
            .extract_body_text(&headers, body)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| raw.to_string());

        Some(NormalizedEmail {
            sender,
            subject,
            body_text,
        })
    }

    fn extract_body_text(&self, headers: &HashMap<String, String>, body: &str) -> Option<String> {
        let content_type = headers
            .get("content-type")
            .map(|v| v.to_lowercase())
            .unwrap_or_else(|| "text/plain".to_string());

        if content_type.starts_with("multipart/") {
            let boundary = boundary_param(headers.get("content-type")?)?;
            let parts = split_parts(body, &boundary);

            for target in ["text/plain", "text/html"] {
                for part in &parts {
                    let (part_headers, part_body) = parse_part(part);
                    let part_type = part_headers
                        .get("content-type")
                        .map(|v| v.to_lowercase())
                        .unwrap_or_else(|| "text/plain".to_string());
                    if part_type.starts_with(target) {
                        let decoded = decode_transfer_encoding(
                            part_body,
                            part_headers.get("content-transfer-encoding"),
                        );
                        if !decoded.trim().is_empty() {
                            return Some(decoded);
                        }
                    }
                }
            }
            return None;
        }

        Some(decode_transfer_encoding(
            body,
            headers.get("content-transfer-encoding"),
        ))
    }

    /// Decode RFC 2047 encoded words in a header value. Unknown charsets
    /// are treated as UTF-8; undecodable tokens are kept verbatim.
    fn decode_mime_words(&self, value: &str) -> String {
        self.mime_word_regex
            .replace_all(value, |caps: &regex::Captures| {
                let payload = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                match caps.get(1).map(|m| m.as_str()) {
                    Some("B") | Some("b") => {
                        let compact: String = payload.split_whitespace().collect();
                        match general_purpose::STANDARD.decode(compact.as_bytes()) {
                            Ok(decoded) => String::from_utf8_lossy(&decoded).into_owned(),
                            Err(_) => caps.get(0).unwrap().as_str().to_string(),
                        }
                    }
                    Some("Q") | Some("q") => q_decode(payload),
                    _ => caps.get(0).unwrap().as_str().to_string(),
                }
            })
            .trim()
            .to_string()
    }
}

impl Default for EmailNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a message at the first blank line into header block and body.
fn split_message(message: &str) -> Option<(&str, &str)> {
    if let Some(pos) = message.find("\r\n\r\n") {
        Some((&message[..pos], &message[pos + 4..]))
    } else {
        message
            .find("\n\n")
            .map(|pos| (&message[..pos], &message[pos + 2..]))
    }
}

/// Parse a header block into a lowercase-keyed map, unfolding continuation
/// lines.
fn parse_headers(block: &str) -> HashMap<String, String> {
    let mut headers: HashMap<String, String> = HashMap::new();
    let mut current_key: Option<String> = None;

    for line in block.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(key) = &current_key {
                if let Some(value) = headers.get_mut(key) {
                    value.push(' ');
                    value.push_str(line.trim());
                }
            }
            continue;
        }
        if let Some(colon_pos) = line.find(':') {
            let key = line[..colon_pos].trim().to_lowercase();
            let value = line[colon_pos + 1..].trim().to_string();
            headers.insert(key.clone(), value);
            current_key = Some(key);
        }
    }

    headers
}

fn boundary_param(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    let idx = lower.find("boundary=")?;
    let rest = content_type[idx + "boundary=".len()..].trim_start();
    let value = if let Some(stripped) = rest.strip_prefix('"') {
        stripped.split('"').next()?
    } else {
        rest.split(|c: char| c == ';' || c.is_whitespace()).next()?
    };
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn split_parts<'a>(body: &'a str, boundary: &str) -> Vec<&'a str> {
    let marker = format!("--{boundary}");
    body.split(marker.as_str())
        .skip(1) // preamble before the first boundary
        .map(|p| p.trim_start_matches(['\r', '\n']))
        .filter(|p| !p.trim().is_empty() && !p.trim_start().starts_with("--"))
        .collect()
}

fn parse_part(part: &str) -> (HashMap<String, String>, &str) {
    match split_message(part) {
        Some((header_block, body)) => (parse_headers(header_block), body),
        None => (HashMap::new(), part),
    }
}

fn decode_transfer_encoding(body: &str, encoding: Option<&String>) -> String {
    match encoding.map(|e| e.trim().to_lowercase()).as_deref() {
        Some("base64") => {
            let compact: String = body.split_whitespace().collect();
            match general_purpose::STANDARD.decode(compact.as_bytes()) {
                Ok(decoded) => String::from_utf8_lossy(&decoded).into_owned(),
                Err(_) => body.to_string(),
            }
        }
        Some("quoted-printable") => {
            match quoted_printable::decode(body.as_bytes(), quoted_printable::ParseMode::Robust) {
                Ok(decoded) => String::from_utf8_lossy(&decoded).into_owned(),
                Err(_) => body.to_string(),
            }
        }
        _ => body.to_string(),
    }
}

/// Decode the Q-encoding used inside RFC 2047 words: underscores are
/// spaces, =HH is a hex-escaped byte.
fn q_decode(payload: &str) -> String {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match decoded {
                    Some(v) => {
                        out.push(v);
                        i += 3;
                    }
                    None => {
                        out.push(b'=');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_eml_parsing() {
        let normalizer = EmailNormalizer::new();
        let raw = "From: alice@example.com\r\nSubject: Quarterly update\r\n\r\nAll numbers are up.";
        let email = normalizer.normalize(raw.as_bytes(), "update.eml").unwrap();
        assert_eq!(email.sender, "alice@example.com");
        assert_eq!(email.subject, "Quarterly update");
        assert_eq!(email.body_text, "All numbers are up.");
    }

    #[test]
    fn test_eml_suffix_is_case_insensitive() {
        let normalizer = EmailNormalizer::new();
        let raw = "From: bob@example.com\nSubject: hi\n\nbody";
        let email = normalizer.normalize(raw.as_bytes(), "MESSAGE.EML").unwrap();
        assert_eq!(email.sender, "bob@example.com");
    }

    #[test]
    fn test_missing_headers_use_placeholders() {
        let normalizer = EmailNormalizer::new();
        let raw = "X-Other: value\r\n\r\nsome body";
        let email = normalizer.normalize(raw.as_bytes(), "x.eml").unwrap();
        assert_eq!(email.sender, "unknown@example.com");
        assert_eq!(email.subject, "(No Subject)");
        assert_eq!(email.body_text, "some body");
    }

    #[test]
    fn test_malformed_eml_falls_back_to_raw_text() {
        let normalizer = EmailNormalizer::new();
        let raw = "this is not a mime message at all";
        let email = normalizer.normalize(raw.as_bytes(), "x.eml").unwrap();
        assert_eq!(email.sender, "unknown@example.com");
        assert_eq!(email.subject, "(No Subject)");
        assert_eq!(email.body_text, raw);
        assert!(!email.body_text.is_empty());
    }

    #[test]
    fn test_non_eml_is_plain_text() {
        let normalizer = EmailNormalizer::new();
        let raw = "From: not-parsed@example.com\n\nhello";
        let email = normalizer.normalize(raw.as_bytes(), "notes.txt").unwrap();
        assert_eq!(email.sender, "unknown@example.com");
        assert_eq!(email.body_text, raw);
    }

    #[test]
    fn test_empty_payload_is_input_error() {
        let normalizer = EmailNormalizer::new();
        let result = normalizer.normalize(b"", "x.eml");
        assert!(matches!(result, Err(AnalysisError::Input(_))));
    }

    #[test]
    fn test_non_utf8_payload_is_input_error() {
        let normalizer = EmailNormalizer::new();
        let result = normalizer.normalize(&[0xff, 0xfe, 0x00], "x.eml");
        assert!(matches!(result, Err(AnalysisError::Input(_))));
    }

    #[test]
    fn test_multipart_prefers_text_part() {
        let normalizer = EmailNormalizer::new();
        let raw = concat!(
            "From: alerts@example.com\r\n",
            "Subject: Notice\r\n",
            "Content-Type: multipart/alternative; boundary=\"sep\"\r\n",
            "\r\n",
            "--sep\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>html version</p>\r\n",
            "--sep\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain version\r\n",
            "--sep--\r\n",
        );
        let email = normalizer.normalize(raw.as_bytes(), "notice.eml").unwrap();
        assert_eq!(email.body_text.trim(), "plain version");
    }

    #[test]
    fn test_multipart_falls_back_to_html_part() {
        let normalizer = EmailNormalizer::new();
        let raw = concat!(
            "From: alerts@example.com\r\n",
            "Content-Type: multipart/alternative; boundary=sep\r\n",
            "\r\n",
            "--sep\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>only html here</p>\r\n",
            "--sep--\r\n",
        );
        let email = normalizer.normalize(raw.as_bytes(), "notice.eml").unwrap();
        assert_eq!(email.body_text.trim(), "<p>only html here</p>");
    }

    #[test]
    fn test_base64_body_is_decoded() {
        let normalizer = EmailNormalizer::new();
        let raw = concat!(
            "From: a@b.com\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "SGVsbG8gd29ybGQ=",
        );
        let email = normalizer.normalize(raw.as_bytes(), "m.eml").unwrap();
        assert_eq!(email.body_text, "Hello world");
    }

    #[test]
    fn test_quoted_printable_body_is_decoded() {
        let normalizer = EmailNormalizer::new();
        let raw = concat!(
            "From: a@b.com\r\n",
            "Content-Transfer-Encoding: quoted-printable\r\n",
            "\r\n",
            "Caf=C3=A9 open",
        );
        let email = normalizer.normalize(raw.as_bytes(), "m.eml").unwrap();
        assert_eq!(email.body_text, "Café open");
    }

    #[test]
    fn test_mime_word_subject_decoding() {
        let normalizer = EmailNormalizer::new();
        let raw = "From: a@b.com\r\nSubject: =?UTF-8?B?SGVsbG8=?=\r\n\r\nbody";
        let email = normalizer.normalize(raw.as_bytes(), "m.eml").unwrap();
        assert_eq!(email.subject, "Hello");

        let raw_q = "From: a@b.com\r\nSubject: =?utf-8?Q?Caf=C3=A9_menu?=\r\n\r\nbody";
        let email_q = normalizer.normalize(raw_q.as_bytes(), "m.eml").unwrap();
        assert_eq!(email_q.subject, "Café menu");
    }

    #[test]
    fn test_folded_headers_are_unfolded() {
        let normalizer = EmailNormalizer::new();
        let raw = "From: a@b.com\r\nSubject: part one\r\n and part two\r\n\r\nbody";
        let email = normalizer.normalize(raw.as_bytes(), "m.eml").unwrap();
        assert_eq!(email.subject, "part one and part two");
    }
}
