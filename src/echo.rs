use crate::path::normalize;
use std::fs::OpenOptions;
use std::io::Write;

/// Where `echo` sends its text.
#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    Stdout,
    Overwrite(&'a str),
    Append(&'a str),
}

/// Implementation of the `echo` command.
///
/// `echo words...` prints the words separated by spaces. A `>` or `>>`
/// argument followed by a file name sends the words before it to that file,
/// truncating or appending respectively.
pub fn echo_cmd<W: Write, E: Write>(args: &[&str], stdout: &mut W, stderr: &mut E) {
    let (words, target) = match split_redirect(args) {
        Ok(parts) => parts,
        Err(marker) => {
            let _ = writeln!(stderr, "echo: usage: echo <text> {} <file>", marker);
            return;
        }
    };
    let text = words.join(" ");

    let (file, append) = match target {
        Target::Stdout => {
            let _ = writeln!(stdout, "{}", text);
            return;
        }
        Target::Overwrite(file) => (file, false),
        Target::Append(file) => (file, true),
    };

    let path = match normalize(file) {
        Ok(path) => path,
        Err(e) => {
            let _ = writeln!(stderr, "echo: {}", e);
            return;
        }
    };

    let opened = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(&path);

    let result = opened.and_then(|mut f| writeln!(f, "{}", text));
    if let Err(e) = result {
        let _ = writeln!(stderr, "echo: {}: {}", path, e);
    }
}

/// Splits the words from a trailing redirection. `Err` carries a marker
/// that was not followed by a file name.
fn split_redirect<'a, 'b>(args: &'b [&'a str]) -> Result<(&'b [&'a str], Target<'a>), &'a str> {
    let Some(pos) = args.iter().position(|a| *a == ">" || *a == ">>") else {
        return Ok((args, Target::Stdout));
    };
    let marker = args[pos];
    let Some(file) = args.get(pos + 1).copied() else {
        return Err(marker);
    };
    let target = if marker == ">>" {
        Target::Append(file)
    } else {
        Target::Overwrite(file)
    };
    Ok((&args[..pos], target))
}
