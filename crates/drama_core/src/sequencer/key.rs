//! Ordinal keys for natural file ordering.
//!
//! A key splits a file stem into alternating digit and non-digit runs so that
//! `video-2` sorts before `video-10`. At a position where one key holds a
//! number and the other holds text, the number sorts first. A key that is a
//! prefix of another sorts first.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// One component of an ordinal key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    /// A run of ASCII digits, compared by value.
    Numeric(u64),
    /// A run of non-digits, compared case-insensitively.
    Literal(String),
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Numeric(a), KeyPart::Numeric(b)) => a.cmp(b),
            (KeyPart::Literal(a), KeyPart::Literal(b)) => a.cmp(b),
            (KeyPart::Numeric(_), KeyPart::Literal(_)) => Ordering::Less,
            (KeyPart::Literal(_), KeyPart::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Comparable key derived from a file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrdinalKey {
    parts: Vec<KeyPart>,
}

impl OrdinalKey {
    /// Build a key from the stem of `path` (extension excluded).
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        Self::parse(&stem)
    }

    /// Build a key from a bare name.
    pub fn parse(name: &str) -> Self {
        let mut parts = Vec::new();
        let mut run = String::new();
        let mut run_is_digit = false;

        for c in name.chars() {
            let is_digit = c.is_ascii_digit();
            if !run.is_empty() && is_digit != run_is_digit {
                parts.push(Self::finish_run(&run, run_is_digit));
                run.clear();
            }
            run_is_digit = is_digit;
            run.push(c);
        }
        if !run.is_empty() {
            parts.push(Self::finish_run(&run, run_is_digit));
        }

        Self { parts }
    }

    fn finish_run(run: &str, is_digit: bool) -> KeyPart {
        if is_digit {
            // Runs too long for u64 saturate; the file name tie-break keeps order total.
            KeyPart::Numeric(run.parse().unwrap_or(u64::MAX))
        } else {
            KeyPart::Literal(run.to_lowercase())
        }
    }

    /// Key components in encountered order.
    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    /// First numeric component, or 0 when the name has no digits.
    pub fn leading_number(&self) -> u64 {
        self.parts
            .iter()
            .find_map(|p| match p {
                KeyPart::Numeric(n) => Some(*n),
                KeyPart::Literal(_) => None,
            })
            .unwrap_or(0)
    }
}

impl fmt::Display for OrdinalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                KeyPart::Numeric(n) => write!(f, "{}", n)?,
                KeyPart::Literal(s) => write!(f, "{}", s)?,
            }
        }
        Ok(())
    }
}
