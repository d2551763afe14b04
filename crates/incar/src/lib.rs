//! Reading VASP INCAR files into a map of typed values

use std::{
    borrow::Cow,
    collections::{BTreeMap, btree_map},
    error::Error,
    fmt::{Display, Formatter},
    io::ErrorKind,
    path::Path,
    str::FromStr,
};

use serde::Serialize;

pub mod value;
pub use value::{MAX_EXPANDED, Scalar, Value};

use value::is_space;


#[derive(Debug, PartialEq, Eq)]
pub enum IncarError {
    FileNotFound(String),
    ReadFileError(String, ErrorKind),
}

impl Display for IncarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IncarError::FileNotFound(path) => {
                write!(f, "INCAR file {path} not found")
            }
            IncarError::ReadFileError(path, kind) => {
                write!(f, "failed to read INCAR file {path}: {kind}")
            }
        }
    }
}

impl Error for IncarError {}

/// The keywords of an INCAR file. Keys are stored upper-case, and a key
/// assigned more than once keeps its last value. An [Incar] is never modified
/// after it is built by [Incar::parse], [Incar::load], or [FromIterator].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Incar {
    params: BTreeMap<String, Value>,
}

/// characters that end a line: `\n`, `\r`, and the rest of the Unicode line
/// and paragraph separators. `\r\n` splits into a line and an empty line,
/// which is skipped
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}',
    '\u{2028}', '\u{2029}',
];

/// drop everything from the first `!` or `#` on. quotes don't protect either
/// marker, so `SYSTEM = "a#b"` loses its closing quote
fn strip_comment(line: &str) -> &str {
    let line = match line.find(['!', '#']) {
        Some(i) => &line[..i],
        None => line,
    };
    line.trim_matches(is_space)
}

/// split one statement into its key and raw value, preferring `KEY = value`
/// and falling back to `KEY value`
fn split_assignment(chunk: &str) -> (&str, &str) {
    chunk
        .split_once('=')
        .or_else(|| chunk.split_once(is_space))
        .unwrap_or((chunk, ""))
}

fn normalize_key(key: &str) -> String {
    key.trim_matches(is_space).to_uppercase()
}

impl Incar {
    /// Parse the contents of an INCAR file. Every line is cut at its first
    /// comment marker and split on `;` into statements, so
    ///
    /// ```text
    /// ISMEAR = 0; SIGMA = 0.05 ! smearing
    /// ```
    ///
    /// sets two keywords. This cannot fail: anything unrecognized on the right
    /// of an assignment is kept as a string.
    pub fn parse(text: &str) -> Self {
        let mut params = BTreeMap::new();
        for line in text.split(LINE_BREAKS) {
            let line = strip_comment(line);
            if line.is_empty() {
                continue;
            }
            for chunk in line.split(';').map(|c| c.trim_matches(is_space)) {
                if chunk.is_empty() {
                    continue;
                }
                let (key, raw) = split_assignment(chunk);
                let key = normalize_key(key);
                let value = Value::parse(raw);
                log::trace!("{key} = {value}");
                params.insert(key, value);
            }
        }
        Self { params }
    }

    /// Read and parse the INCAR file at `path`. Invalid UTF-8, which turns up
    /// in comments written in other encodings, is replaced rather than
    /// rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IncarError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => IncarError::FileNotFound(name.clone()),
            kind => IncarError::ReadFileError(name.clone(), kind),
        })?;
        let text = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = text {
            log::warn!("replaced invalid UTF-8 in {name}");
        }
        let ret = Self::parse(&text);
        log::debug!("read {} keywords from {name}", ret.len());
        Ok(ret)
    }

    /// look up `key` the same way the parser stores it, so `encut`, `Encut`,
    /// and `ENCUT` all find the same entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(&normalize_key(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter(self.params.iter())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Return a copy of the keywords with lower-case keys, the form the
    /// calculator setup code expects. Keys are already unique upper-case
    /// strings, so no two of them collide.
    pub fn case_insensitive_view(&self) -> BTreeMap<String, Value> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect()
    }

    /// write the keywords like [Display] does, but with the lower-case keys of
    /// [Incar::case_insensitive_view]
    pub fn display_lower(&self) -> Lower<'_> {
        Lower(self)
    }
}

/// load the INCAR at `path` and return its keywords with lower-case keys
pub fn parse_incar(
    path: impl AsRef<Path>,
) -> Result<BTreeMap<String, Value>, IncarError> {
    Ok(Incar::load(path)?.case_insensitive_view())
}

impl FromStr for Incar {
    type Err = std::string::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl FromIterator<(String, Value)> for Incar {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .collect(),
        }
    }
}

/// Iterator over the keywords of an [Incar] in key order, returned by
/// [Incar::iter]
#[derive(Clone, Debug)]
pub struct Iter<'a>(btree_map::Iter<'a, String, Value>);

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k.as_str(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(k, v)| (k.as_str(), v))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Incar {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn write_entries<'a, K: Display>(
    f: &mut Formatter<'_>,
    entries: impl Iterator<Item = (K, &'a Value)>,
) -> std::fmt::Result {
    for (key, value) in entries {
        writeln!(f, "{key} = {value}")?;
    }
    Ok(())
}

/// Writes one `KEY = value` line per keyword, in key order. Reading the result
/// back with [Incar::parse] gives the same keywords.
impl Display for Incar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_entries(f, self.iter())
    }
}

/// [Display] wrapper returned by [Incar::display_lower]
#[derive(Clone, Copy, Debug)]
pub struct Lower<'a>(&'a Incar);

impl Display for Lower<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_entries(f, self.0.iter().map(|(k, v)| (k.to_lowercase(), v)))
    }
}
