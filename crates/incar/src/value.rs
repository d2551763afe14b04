use std::fmt::Display;

use serde::Serialize;


/// spellings of the two logical values, compared case-insensitively
const TRUE: [&str; 3] = [".true.", "true", "t"];
const FALSE: [&str; 3] = [".false.", "false", "f"];

/// the most scalars one value may expand to. a repeat count that would go past
/// this leaves its token as a single string
pub const MAX_EXPANDED: usize = 1 << 16;

/// whitespace between tokens: Unicode whitespace plus the ASCII information
/// separators `\x1c` to `\x1f`
pub(crate) fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

/// A single value from the right-hand side of an INCAR assignment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Parse a single whitespace-free token. This never fails: a token that is
    /// not a logical, a quoted string, or a number is returned unchanged as
    /// [Scalar::Str].
    ///
    /// Tokens containing `.`, `e`, or `E` are tried as floats, everything else
    /// as integers, so `1E-6` is a float and `300` is an integer. Fortran
    /// exponents like `1.D-21` are not numbers here.
    pub fn parse(token: &str) -> Self {
        let t = token.trim_matches(is_space);
        if TRUE.iter().any(|s| t.eq_ignore_ascii_case(s)) {
            return Self::Bool(true);
        }
        if FALSE.iter().any(|s| t.eq_ignore_ascii_case(s)) {
            return Self::Bool(false);
        }
        for q in ['"', '\''] {
            if t.starts_with(q) && t.ends_with(q) {
                // a lone quote character opens and closes at once
                let inner = t.get(1..t.len() - 1).unwrap_or_default();
                return Self::Str(inner.to_owned());
            }
        }
        let num = if t.contains(['.', 'e', 'E']) {
            t.parse().ok().map(Self::Float)
        } else {
            t.parse().ok().map(Self::Int)
        };
        num.unwrap_or_else(|| Self::Str(t.to_owned()))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// return the value of a [Scalar::Float], or of a [Scalar::Int] converted
    /// to `f64`, since INCAR files happily write `ENCUT = 400` for a real
    /// quantity
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// whether `s` survives being written without quotes and read back
fn is_bare(s: &str) -> bool {
    !s.is_empty()
        && !s.contains(is_space)
        && matches!(
            expand(s, MAX_EXPANDED).as_slice(),
            [Scalar::Str(t)] if t == s
        )
}

impl Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(true) => write!(f, ".TRUE."),
            Scalar::Bool(false) => write!(f, ".FALSE."),
            Scalar::Int(i) => write!(f, "{i}"),
            // Debug keeps the trailing .0 on whole numbers so they come back
            // as floats
            Scalar::Float(x) => write!(f, "{x:?}"),
            Scalar::Str(s) if is_bare(s) => write!(f, "{s}"),
            Scalar::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Expand the `N*V` shorthand in `token` to `N` copies of `V`. If the part
/// before the first `*` is not a plain decimal count, or the count is larger
/// than `room`, the whole token is a single scalar.
fn expand(token: &str, room: usize) -> Vec<Scalar> {
    if let Some((count, value)) = token.split_once('*') {
        if !count.is_empty() && count.bytes().all(|b| b.is_ascii_digit()) {
            let n = count.parse::<usize>().ok().filter(|&n| n <= room);
            if let Some(n) = n {
                return vec![Scalar::parse(value); n];
            }
        }
    }
    vec![Scalar::parse(token)]
}

/// The parsed right-hand side of an INCAR assignment. A [Value::Seq] produced
/// by [Value::parse] always has at least two elements; one element collapses
/// to [Value::Scalar].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Seq(Vec<Scalar>),
}

impl Value {
    /// parse the raw text after the `=`. empty text, or text whose multipliers
    /// expand to nothing like `0*1`, gives an empty [Scalar::Str]. at most
    /// [MAX_EXPANDED] scalars come from `N*V` expansions
    pub fn parse(raw: &str) -> Self {
        let mut values = Vec::new();
        for token in raw.split(is_space).filter(|t| !t.is_empty()) {
            let room = MAX_EXPANDED.saturating_sub(values.len());
            values.extend(expand(token, room));
        }
        values.into()
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Seq(_) => None,
        }
    }

    /// every scalar in `self`, in order. a single value is returned as a slice
    /// of length one, so this is the way to read keys like MAGMOM that may be
    /// written either way
    pub fn scalars(&self) -> &[Scalar] {
        match self {
            Value::Scalar(s) => std::slice::from_ref(s),
            Value::Seq(v) => v,
        }
    }

    #[must_use]
    pub fn is_seq(&self) -> bool {
        matches!(self, Value::Seq(..))
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Scalar::as_bool)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Scalar::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().and_then(Scalar::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// convert every scalar to `f64`, or return `None` if any of them is not a
    /// number
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        self.scalars().iter().map(Scalar::as_f64).collect()
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<Vec<Scalar>> for Value {
    fn from(values: Vec<Scalar>) -> Self {
        match <[Scalar; 1]>::try_from(values) {
            Ok([s]) => Self::Scalar(s),
            Err(values) if values.is_empty() => {
                Self::Scalar(Scalar::Str(String::new()))
            }
            Err(values) => Self::Seq(values),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, s) in self.scalars().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}
