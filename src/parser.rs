use crate::error::{Result, ShellError};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt;
use std::ops::Deref;

/// Delimiter set used for command lines: a literal space.
pub const DEFAULT_DELIMITERS: &str = " ";

/// One unit of text produced by the [`Tokenizer`].
///
/// A token borrows from the line it was scanned from whenever it contained no
/// quote characters. Quoted tokens have their quotes elided, which needs an
/// owned copy. Either way the token cannot outlive the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a>(Cow<'a, str>);

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the token is a plain view into the original line.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.0, Cow::Borrowed(_))
    }
}

impl Deref for Token<'_> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Token<'_> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<OsStr> for Token<'_> {
    fn as_ref(&self) -> &OsStr {
        OsStr::new(&*self.0)
    }
}

impl PartialEq<&str> for Token<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quote-aware scanner that hands out one token per call.
///
/// The scan position (the cursor) lives in the tokenizer itself, so two
/// tokenizers can walk two lines in any interleaving without touching each
/// other.
///
/// - Passing `Some(line)` restarts the scan at the beginning of `line`.
/// - Passing `None` continues from where the previous call stopped.
/// - Double quotes toggle a mode in which delimiters are literal; the quote
///   characters themselves never appear in the token. `\"` is a literal quote.
/// - Runs of delimiters never produce empty tokens.
///
/// # Example
/// ```
/// use myshell::parser::Tokenizer;
///
/// let mut tokenizer = Tokenizer::new(" ");
/// let first = tokenizer.next_token(Some("echo \"hello world\"")).unwrap();
/// assert_eq!(first.unwrap(), "echo");
/// let second = tokenizer.next_token(None).unwrap();
/// assert_eq!(second.unwrap(), "hello world");
/// assert!(tokenizer.next_token(None).unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    cursor: Option<&'a str>,
    delimiters: &'a str,
    strict: bool,
}

/// Where one scan stopped within the remaining text.
struct Scan {
    end: usize,
    resume: Option<usize>,
    quoted: bool,
    open_quote: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(delimiters: &'a str) -> Self {
        Self {
            cursor: None,
            delimiters,
            strict: false,
        }
    }

    /// With `strict` set, a quote left open at end of line is an error
    /// rather than the end of the token.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns the next token, or `None` once the line is used up.
    pub fn next_token(&mut self, line: Option<&'a str>) -> Result<Option<Token<'a>>> {
        if let Some(line) = line {
            self.cursor = Some(line);
        }
        let delimiters = self.delimiters;

        loop {
            let Some(rest) = self.cursor else {
                return Ok(None);
            };

            let rest = rest.trim_start_matches(|c: char| delimiters.contains(c));
            if rest.is_empty() {
                self.cursor = None;
                return Ok(None);
            }

            let scan = scan(rest, delimiters);
            self.cursor = scan.resume.map(|at| &rest[at..]);

            if scan.open_quote && self.strict {
                self.cursor = None;
                return Err(ShellError::MalformedInput {
                    reason: "unterminated double quote",
                });
            }

            let raw = &rest[..scan.end];
            let text = if scan.quoted {
                Cow::Owned(unquote(raw)?)
            } else {
                Cow::Borrowed(raw)
            };

            // A token made only of quotes carries no text; move on to the next one.
            if text.is_empty() {
                continue;
            }
            return Ok(Some(Token(text)));
        }
    }
}

fn scan(rest: &str, delimiters: &str) -> Scan {
    let mut in_quote = false;
    let mut quoted = false;
    let mut after_backslash = false;

    for (i, c) in rest.char_indices() {
        match c {
            '"' => {
                quoted = true;
                if !after_backslash {
                    in_quote = !in_quote;
                }
            }
            c if !in_quote && delimiters.contains(c) => {
                return Scan {
                    end: i,
                    resume: Some(i + c.len_utf8()),
                    quoted,
                    open_quote: false,
                };
            }
            _ => {}
        }
        after_backslash = c == '\\' && !after_backslash;
    }

    Scan {
        end: rest.len(),
        resume: None,
        quoted,
        open_quote: in_quote,
    }
}

/// Drops unescaped quotes and turns `\"` into `"`. Other backslashes stay.
fn unquote(raw: &str) -> Result<String> {
    let mut out = String::new();
    out.try_reserve(raw.len())?;

    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some('"')) => {
                out.push('"');
                chars.next();
            }
            ('\\', Some('\\')) => {
                out.push_str("\\\\");
                chars.next();
            }
            ('"', _) => {}
            (c, _) => out.push(c),
        }
    }
    Ok(out)
}

/// Ordered argument list for one command: program name first.
///
/// The vector's length is exactly the number of tokens; the end-of-arguments
/// marker is only materialized by [`ArgVector::terminated`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgVector<'a> {
    args: Vec<Token<'a>>,
}

impl<'a> ArgVector<'a> {
    /// Tokenizes `line` with a fresh lenient [`Tokenizer`].
    pub fn build(line: &'a str, delimiters: &'a str) -> Result<Self> {
        Self::build_with(Tokenizer::new(delimiters), line)
    }

    /// Drives `tokenizer` over `line` until it runs dry.
    ///
    /// Storage doubles when full and every reservation is fallible; on
    /// failure the partial vector is dropped and only the error comes back.
    pub fn build_with(mut tokenizer: Tokenizer<'a>, line: &'a str) -> Result<Self> {
        let mut args: Vec<Token<'a>> = Vec::new();
        let mut next = tokenizer.next_token(Some(line))?;

        while let Some(token) = next {
            if args.len() == args.capacity() {
                let grow_by = args.capacity().max(4);
                args.try_reserve_exact(grow_by)?;
            }
            args.push(token);
            next = tokenizer.next_token(None)?;
        }

        Ok(Self { args })
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The program name, i.e. the first token.
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(Token::as_str)
    }

    /// Everything after the program name.
    pub fn arguments(&self) -> &[Token<'a>] {
        self.args.get(1..).unwrap_or_default()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(Token::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(Token::as_str)
    }

    /// Every argument as `Some`, followed by a single `None` marking the end.
    pub fn terminated(&self) -> impl Iterator<Item = Option<&str>> {
        self.iter().map(Some).chain(std::iter::once(None))
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }
}
