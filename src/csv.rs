//! Quoted CSV tokenizer.
//!
//! This module turns raw CSV text into rows of trimmed field strings. Quoted fields may
//! contain commas, doubled quotes (`""`), and, in [`TokenizeMode::Streaming`], newlines.
//!
//! # Example
//!
//! ```
//! use digestboard::csv::{CsvTokenizer, TokenizeMode};
//!
//! let input = "title,summary\n\"Scaling, again\",\"line one\nline two\"";
//!
//! let rows = CsvTokenizer::new(TokenizeMode::Streaming).tokenize(input);
//! assert_eq!(rows[1], ["Scaling, again", "line one\nline two"]);
//! ```

pub mod mapper;

pub use mapper::{HeaderMap, MappedRow, RecordMapper};

const QUOTE: char = '"';
const DELIMITER: char = ',';

/// How row boundaries are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizeMode {
    /// Split the text on newlines first, then tokenize each line.
    ///
    /// A quoted field containing a newline is cut in two; only use this for exports
    /// known to keep every record on one line.
    Lines,
    /// Scan the whole text, carrying quote state across newlines.
    #[default]
    Streaming,
}

/// Tokenizer for comma-delimited, double-quoted CSV text.
///
/// Both modes share one field splitter, so they agree on any input without embedded
/// newlines. Malformed quoting never fails: an unterminated quoted field is closed at
/// the end of the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvTokenizer {
    mode: TokenizeMode,
}

impl CsvTokenizer {
    /// Creates a tokenizer using the given row-splitting mode
    #[must_use]
    pub fn new(mode: TokenizeMode) -> Self {
        Self { mode }
    }

    /// Returns the row-splitting mode
    pub fn mode(&self) -> TokenizeMode {
        self.mode
    }

    /// Tokenizes `input` into rows of fields, skipping blank rows.
    pub fn tokenize(&self, input: &str) -> Vec<Vec<String>> {
        let text = normalize_line_endings(input);
        let rows: Vec<&str> = match self.mode {
            TokenizeMode::Lines => text.split('\n').collect(),
            TokenizeMode::Streaming => RowSplit::new(&text).collect(),
        };

        rows.into_iter()
            .filter(|row| !row.trim().is_empty())
            .map(tokenize_row)
            .collect()
    }
}

/// Splits a single row into trimmed fields.
///
/// Newlines inside quotes are kept; an unquoted newline is treated like any other
/// character, so callers are expected to hand in one row at a time.
pub fn tokenize_row(row: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = row.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            QUOTE if in_quotes && chars.peek() == Some(&QUOTE) => {
                current.push(QUOTE);
                chars.next();
            }
            QUOTE => in_quotes = !in_quotes,
            DELIMITER if !in_quotes => {
                fields.push(clean_field(&current));
                current.clear();
            }
            _ => current.push(c),
        }
    }

    fields.push(clean_field(&current));
    fields
}

/// Trims a field and strips one pair of surrounding quotes left after unquoting.
///
/// A lone quote counts as its own pair and leaves an empty field.
fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = match trimmed.strip_prefix(QUOTE).and_then(|s| s.strip_suffix(QUOTE)) {
        Some(inner) => inner.trim(),
        None if trimmed.len() == 1 && trimmed.starts_with(QUOTE) => "",
        None => trimmed,
    };
    inner.to_string()
}

fn normalize_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

/// An [Iterator] over the raw rows of CSV text, honouring quoted newlines.
///
/// Rows are yielded without their terminating newline.
struct RowSplit<'a> {
    text: &'a str,
}

impl<'a> RowSplit<'a> {
    fn new(text: &'a str) -> Self {
        Self { text }
    }
}

impl<'a> Iterator for RowSplit<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.text.is_empty() {
            return None;
        }

        let mut in_quotes = false;
        for (i, c) in self.text.char_indices() {
            match c {
                QUOTE => in_quotes = !in_quotes,
                '\n' if !in_quotes => {
                    let row = &self.text[..i];
                    self.text = &self.text[i + 1..];
                    return Some(row);
                }
                _ => {}
            }
        }

        let row = self.text;
        self.text = "";
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn tokenize(mode: TokenizeMode, input: &str) -> Vec<Vec<String>> {
        CsvTokenizer::new(mode).tokenize(input)
    }

    #[rstest]
    #[case("plain")]
    #[case("Diffusion Model")]
    #[case("上海人工智能实验室")]
    #[case("2024-05-01")]
    fn test_single_plain_field_round_trips(#[case] value: &str) {
        assert_eq!(tokenize_row(value), [value]);
    }

    #[test]
    fn test_quoted_comma_is_literal() {
        assert_eq!(tokenize_row(r#""a,b",c"#), ["a,b", "c"]);
    }

    #[test]
    fn test_doubled_quote_is_escape() {
        assert_eq!(tokenize_row(r#""a""b",c"#), [r#"a"b"#, "c"]);
    }

    #[rstest]
    #[case("a,,c", &["a", "", "c"])]
    #[case(",", &["", ""])]
    #[case("", &[""])]
    #[case("  a  ,  \" b \"  ", &["a", "b"])]
    #[case("x,\"\"", &["x", ""])]
    #[case("\"\"\"quoted\"\"\"", &["quoted"])]
    #[case("\"\"\"\"", &[""])]
    #[case("a, \"\"\"\" ,b", &["a", "", "b"])]
    fn test_tokenize_row_edges(#[case] row: &str, #[case] expected: &[&str]) {
        assert_eq!(tokenize_row(row), expected);
    }

    #[test]
    fn test_unterminated_quote_closes_at_end_of_input() {
        assert_eq!(tokenize_row(r#"a,"open field, still open"#), ["a", "open field, still open"]);

        let rows = tokenize(TokenizeMode::Streaming, "h1,h2\nx,\"never closed\nmore");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], ["x", "never closed\nmore"]);
    }

    #[test]
    fn test_streaming_keeps_quoted_newlines() {
        let input = "标题,简明摘要\n\"Paper A\",\"first line\nsecond line\"\n\"Paper B\",short\n";
        let rows = tokenize(TokenizeMode::Streaming, input);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], ["Paper A", "first line\nsecond line"]);
        assert_eq!(rows[2], ["Paper B", "short"]);
    }

    #[test]
    fn test_lines_mode_cuts_quoted_newlines() {
        let input = "a,\"one\ntwo\"";
        let rows = tokenize(TokenizeMode::Lines, input);
        assert_eq!(rows.len(), 2);
    }

    #[rstest]
    #[case("a,b\r\nc,d\r\n")]
    #[case("a,b\rc,d")]
    #[case("a,b\n\n\nc,d\n   \n")]
    fn test_line_endings_and_blank_rows(#[case] input: &str) {
        for mode in [TokenizeMode::Lines, TokenizeMode::Streaming] {
            assert_eq!(tokenize(mode, input), [["a", "b"], ["c", "d"]]);
        }
    }

    #[rstest]
    #[case("a,b,c\n1,2,3")]
    #[case("\"a,b\",c\n\"x\"\"y\",z\n")]
    #[case("公众号,研究机构\n机器之心,\"DeepMind, Meta\"\n量子位,OpenAI")]
    #[case("  spaced , fields \n\"quoted , comma\",\"\"")]
    #[case("one\n\ntwo,three\n\"\",\"\"\"\"\n")]
    #[case("a,\"unterminated")]
    fn test_modes_agree_without_embedded_newlines(#[case] input: &str) {
        assert_eq!(
            tokenize(TokenizeMode::Lines, input),
            tokenize(TokenizeMode::Streaming, input)
        );
    }

    #[rstest]
    #[case("title,url\n\"Scaling, again\",https://a.example\nplain,\"say \"\"hi\"\"\"\n")]
    #[case("标题,简明摘要,Upvote数\n\"A\",\"multi\nline\",12\nB,short,3\n")]
    fn test_streaming_matches_csv_crate(#[case] input: &str) {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(::csv::Trim::All)
            .from_reader(input.as_bytes());
        let expected = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect_vec())
            .collect_vec();

        assert_eq!(tokenize(TokenizeMode::Streaming, input), expected);
    }

    #[test]
    fn test_default_mode_is_streaming() {
        assert_eq!(CsvTokenizer::default().mode(), TokenizeMode::Streaming);
    }
}
