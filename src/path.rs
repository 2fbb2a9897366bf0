use crate::error::Result;
use std::fmt;
use std::ops::Deref;
use std::path::Path;

/// A user-supplied path with incidental quoting, padding and duplicate
/// separators removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for NormalizedPath {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl PartialEq<&str> for NormalizedPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cleans a path argument.
///
/// - Leading and trailing spaces and double quotes are stripped.
/// - Every run of `/` becomes a single `/`.
/// - A run of spaces touching a `/` on either side is dropped; spaces inside
///   a component are kept.
///
/// Applying it twice gives the same result as applying it once.
///
/// # Example
/// ```
/// use myshell::path::normalize;
///
/// assert_eq!(normalize("  \"/a//b/\"  ").unwrap(), "/a/b/");
/// assert_eq!(normalize("docs / my  notes").unwrap(), "docs/my  notes");
/// ```
pub fn normalize(path: &str) -> Result<NormalizedPath> {
    let trimmed = path.trim_matches(|c: char| c == ' ' || c == '"');

    let mut out = String::new();
    out.try_reserve(trimmed.len())?;

    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '/' => {
                if !out.ends_with('/') {
                    out.push('/');
                }
            }
            ' ' => {
                let mut run = 1;
                while chars.next_if_eq(&' ').is_some() {
                    run += 1;
                }
                let touches_slash = out.ends_with('/') || chars.peek() == Some(&'/');
                if !touches_slash {
                    out.extend(std::iter::repeat_n(' ', run));
                }
            }
            c => out.push(c),
        }
    }

    Ok(NormalizedPath(out))
}

/// Normalizes an optional argument; a missing argument stays missing.
pub fn normalize_opt(path: Option<&str>) -> Result<Option<NormalizedPath>> {
    path.map(normalize).transpose()
}
