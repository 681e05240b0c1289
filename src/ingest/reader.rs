//! Document readers, dispatched by file extension

use encoding_rs::{Encoding, UTF_8};
use regex::{Captures, Regex};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use crate::error::IngestError;

/// Turns a file into plain text
pub trait DocumentReader: Send + Sync {
    /// Extension handled by this reader, without the dot
    fn extension(&self) -> &str;

    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Plain UTF-8 text
pub struct TxtReader;

impl DocumentReader for TxtReader {
    fn extension(&self) -> &str {
        "txt"
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)</body\s*>").unwrap());
/// A CDATA section (text in group 1) or any other tag
static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>|<[^>]*>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());
static ENCODING_RE: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(r#"(?i-u)<\?xml[^>]*?encoding\s*=\s*["']([a-z0-9._:-]+)["']"#).unwrap()
});

/// How far into the file the XML declaration is looked for
const DECLARATION_SCAN_LEN: usize = 256;

/// FictionBook 2 (XML). Only the `<body>` sections are read, so the
/// title-info, annotations and base64 `<binary>` images are skipped.
pub struct Fb2Reader;

impl Fb2Reader {
    /// Text content of every `<body>` element
    pub fn extract_text(xml: &str) -> String {
        let mut text = String::new();
        for caps in BODY_RE.captures_iter(xml) {
            push_body_text(&caps[1], &mut text);
            text.push('\n');
        }
        text
    }

    /// Decode raw file bytes. A BOM wins, then the encoding named in the
    /// XML declaration, then UTF-8. Malformed sequences become U+FFFD.
    pub fn decode(bytes: &[u8]) -> (String, &'static Encoding, bool) {
        let encoding = Encoding::for_bom(bytes)
            .map(|(encoding, _)| encoding)
            .or_else(|| declared_encoding(bytes))
            .unwrap_or(UTF_8);
        let (text, used, had_errors) = encoding.decode(bytes);
        (text.into_owned(), used, had_errors)
    }
}

fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(DECLARATION_SCAN_LEN)];
    let caps = ENCODING_RE.captures(head)?;
    Encoding::for_label(caps.get(1)?.as_bytes())
}

/// Tags become spaces and CDATA is kept verbatim. Entities are decoded outside CDATA only.
fn push_body_text(body: &str, out: &mut String) {
    let mut last = 0;
    for caps in MARKUP_RE.captures_iter(body) {
        let Some(markup) = caps.get(0) else { continue };
        out.push_str(&decode_entities(&body[last..markup.start()]));
        match caps.get(1) {
            Some(cdata) => {
                out.push(' ');
                out.push_str(cdata.as_str());
                out.push(' ');
            }
            None => out.push(' '),
        }
        last = markup.end();
    }
    out.push_str(&decode_entities(&body[last..]));
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                    .and_then(|code| code.ok())
                    .and_then(char::from_u32),
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

impl DocumentReader for Fb2Reader {
    fn extension(&self) -> &str {
        "fb2"
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        let bytes = fs::read(path)?;
        let (xml, encoding, had_errors) = Self::decode(&bytes);
        if had_errors {
            log::warn!(
                "{}: malformed {} sequences replaced",
                path.display(),
                encoding.name()
            );
        }
        Ok(Self::extract_text(&xml))
    }
}

/// Readers keyed by extension
#[derive(Clone)]
pub struct ReaderRegistry {
    readers: Vec<Arc<dyn DocumentReader>>,
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::new()
            .with_reader(Arc::new(TxtReader))
            .with_reader(Arc::new(Fb2Reader))
    }
}

impl ReaderRegistry {
    /// Registry without any reader
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.readers.push(reader);
        self
    }

    pub fn reader_for(&self, path: &Path) -> Result<Arc<dyn DocumentReader>, IngestError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        self.readers
            .iter()
            .find(|r| r.extension().eq_ignore_ascii_case(ext))
            .cloned()
            .ok_or_else(|| IngestError::UnsupportedFile(path.to_path_buf()))
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.reader_for(path).is_ok()
    }

    pub fn extensions(&self) -> Vec<&str> {
        self.readers.iter().map(|r| r.extension()).collect()
    }
}
