//! Column and record splitting shared by the per-tool parsers.
//!
//! None of these helpers fail on short input: a missing trailing column reads
//! as `""`, so each parser decides per field whether emptiness matters.

/// How a line is cut into columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy<'w> {
    /// Split on every occurrence of a delimiter; values are trimmed.
    Delimiter(char),
    /// Split on runs of whitespace. With `max_columns` set, the last column
    /// holds the untouched remainder of the line.
    Whitespace { max_columns: Option<usize> },
    /// Cut at fixed byte widths, each column followed by one separator
    /// character. The last column runs to end of line.
    FixedWidth(&'w [usize]),
}

/// Ordered column values of one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns<'a> {
    values: Vec<&'a str>,
}

impl<'a> Columns<'a> {
    /// Returns column `index`, or `""` when the line was too short.
    pub fn get(&self, index: usize) -> &'a str {
        self.values.get(index).copied().unwrap_or("")
    }

    /// Returns column `index` when it is present and non-empty.
    pub fn non_empty(&self, index: usize) -> Option<&'a str> {
        Some(self.get(index)).filter(|value| !value.is_empty())
    }

    /// Number of columns actually present.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.values.iter().copied()
    }
}

/// Splits `line` according to `policy`.
///
/// # Examples
///
/// ```
/// use hostfacts_parsers::parser::fields::{SplitPolicy, split_columns};
///
/// let cols = split_columns("ii  less  436-9  amd64  pager program", &SplitPolicy::Whitespace {
///     max_columns: Some(5),
/// });
/// assert_eq!(cols.get(1), "less");
/// assert_eq!(cols.get(4), "pager program");
/// assert_eq!(cols.get(9), "");
///
/// let cols = split_columns("pid, ppid,cmd", &SplitPolicy::Delimiter(','));
/// assert_eq!(cols.iter().collect::<Vec<_>>(), vec!["pid", "ppid", "cmd"]);
/// ```
pub fn split_columns<'a>(line: &'a str, policy: &SplitPolicy<'_>) -> Columns<'a> {
    let values = match *policy {
        SplitPolicy::Delimiter(delimiter) => line.split(delimiter).map(str::trim).collect(),
        SplitPolicy::Whitespace { max_columns: None } => line.split_whitespace().collect(),
        SplitPolicy::Whitespace {
            max_columns: Some(max),
        } => split_whitespace_capped(line, max),
        SplitPolicy::FixedWidth(widths) => split_fixed_width(line, widths),
    };
    Columns { values }
}

fn split_whitespace_capped(line: &str, max: usize) -> Vec<&str> {
    let mut values = Vec::new();
    let mut rest = line.trim_start();

    while !rest.is_empty() && values.len() + 1 < max {
        match rest.find(char::is_whitespace) {
            Some(end) => {
                values.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                values.push(rest);
                rest = "";
            }
        }
    }

    let rest = rest.trim_end();
    if max > 0 && !rest.is_empty() {
        values.push(rest);
    }
    values
}

fn split_fixed_width<'a>(line: &'a str, widths: &[usize]) -> Vec<&'a str> {
    let mut values = Vec::with_capacity(widths.len() + 1);
    let mut start = 0usize;

    for width in widths {
        if start >= line.len() {
            return values;
        }
        let end = (start + width).min(line.len());
        let Some(value) = line.get(start..end) else {
            return values;
        };
        values.push(value.trim());
        start = end + 1;
    }

    if let Some(rest) = line.get(start..) {
        let rest = rest.trim();
        if !rest.is_empty() {
            values.push(rest);
        }
    }
    values
}

/// Returns `true` when every column boundary implied by `widths` falls on a
/// whitespace character (or past the end of the line).
///
/// A `false` result means at least one value overflowed its column and the
/// line must be split another way.
pub fn fits_fixed_width(line: &str, widths: &[usize]) -> bool {
    let bytes = line.as_bytes();
    let mut boundary = 0usize;

    for width in widths {
        boundary += width;
        match bytes.get(boundary) {
            Some(byte) if !byte.is_ascii_whitespace() => return false,
            Some(_) => {}
            None => return true,
        }
        if !line.is_char_boundary(boundary) {
            return false;
        }
        boundary += 1;
    }
    true
}

/// Splits a `key<sep> value` line into trimmed key and value.
///
/// Returns `None` when the separator is missing or the key is empty.
///
/// # Examples
///
/// ```
/// use hostfacts_parsers::parser::fields::split_key_value;
///
/// assert_eq!(split_key_value("\tSerial Number: 2UA25107BB", ':'), Some(("Serial Number", "2UA25107BB")));
/// assert_eq!(split_key_value("\tUUID: 4596BF80-41F0", ':'), Some(("UUID", "4596BF80-41F0")));
/// assert_eq!(split_key_value("System Information", ':'), None);
/// ```
pub fn split_key_value(line: &str, separator: char) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(separator)?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Number of leading tab stops on `line`; four or eight spaces count as one.
pub fn indent_depth(line: &str) -> usize {
    let mut depth = 0usize;
    let mut spaces = 0usize;
    for ch in line.chars() {
        match ch {
            '\t' => {
                depth += 1;
                spaces = 0;
            }
            ' ' => {
                spaces += 1;
                if spaces == 4 {
                    depth += 1;
                    spaces = 0;
                }
            }
            _ => break,
        }
    }
    depth
}

/// Segments text into blocks separated by blank lines.
///
/// Blank-only lines never appear inside a block; empty blocks are dropped.
pub fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}
