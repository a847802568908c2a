//! Writing dump input.
//!
//! The encoders produce exactly what a dumper emits: `print` keeps
//! printable ASCII, doubles backslashes and writes everything else as
//! `\xx`; `bytevalue` writes two lowercase hex digits per byte.

use std::fmt::Write as _;

/// Payload encoding of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `format=print`
    Print,
    /// `format=bytevalue`
    Bytevalue,
}

impl Encoding {
    /// The `format=` header value.
    pub fn header_value(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Bytevalue => "bytevalue",
        }
    }

    /// Encodes one payload.
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Self::Print => encode_print(bytes),
            Self::Bytevalue => encode_hex(bytes),
        }
    }
}

/// Encodes bytes as escaped text.
pub fn encode_print(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => {
                let _ = write!(out, "\\{byte:02x}");
            }
        }
    }
    out
}

/// Encodes bytes as hex pairs.
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// One header block plus its records.
#[derive(Debug, Clone)]
pub struct Section {
    encoding: Encoding,
    database: Option<String>,
    flags: Vec<String>,
    extra: Vec<String>,
    pairs: Vec<(Vec<u8>, Vec<u8>)>,
    terminated: bool,
}

impl Section {
    /// Creates an empty section using `encoding`.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            database: None,
            flags: Vec::new(),
            extra: Vec::new(),
            pairs: Vec::new(),
            terminated: true,
        }
    }

    /// Targets a named sub-database.
    pub fn database(mut self, name: &str) -> Self {
        self.database = Some(name.to_string());
        self
    }

    /// Adds a flag keyword such as `dupsort`.
    pub fn flag(mut self, keyword: &str) -> Self {
        self.flags.push(keyword.to_string());
        self
    }

    /// Adds a verbatim header line (without newline).
    pub fn header_line(mut self, line: &str) -> Self {
        self.extra.push(line.to_string());
        self
    }

    /// Adds one record.
    pub fn pair(mut self, key: &[u8], value: &[u8]) -> Self {
        self.pairs.push((key.to_vec(), value.to_vec()));
        self
    }

    /// Adds several records.
    pub fn pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.pairs.extend(
            pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_vec(), v.as_ref().to_vec())),
        );
        self
    }

    /// Leaves off the closing `DATA=END` line.
    pub fn unterminated(mut self) -> Self {
        self.terminated = false;
        self
    }

    fn write_to(&self, out: &mut String) {
        out.push_str("VERSION=3\n");
        let _ = writeln!(out, "format={}", self.encoding.header_value());
        if let Some(name) = &self.database {
            let _ = writeln!(out, "database={name}");
        }
        out.push_str("type=btree\n");
        for flag in &self.flags {
            let _ = writeln!(out, "{flag}=1");
        }
        for line in &self.extra {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("HEADER=END\n");

        for (key, value) in &self.pairs {
            let _ = writeln!(out, " {}", self.encoding.encode(key));
            let _ = writeln!(out, " {}", self.encoding.encode(value));
        }
        if self.terminated {
            out.push_str("DATA=END\n");
        }
    }
}

/// Builds a complete dump from sections.
#[derive(Debug, Clone, Default)]
pub struct DumpBuilder {
    sections: Vec<Section>,
}

impl DumpBuilder {
    /// Creates an empty dump.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a section.
    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Renders the dump.
    pub fn build(&self) -> Vec<u8> {
        let mut out = String::new();
        for section in &self.sections {
            section.write_to(&mut out);
        }
        out.into_bytes()
    }
}

/// Renders pairs in raw mode: bare hex lines, no header, no framing.
pub fn raw_dump<I, K, V>(pairs: I) -> Vec<u8>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut out = String::new();
    for (key, value) in pairs {
        let _ = writeln!(out, "{}", encode_hex(key.as_ref()));
        let _ = writeln!(out, "{}", encode_hex(value.as_ref()));
    }
    out.into_bytes()
}
