use chumsky::error::{RichPattern, RichReason};
use chumsky::prelude::*;
use rg_core::SourceError;
use serde::Serialize;
use tracing::debug;

use crate::record_parser::parse_record;

type ParserError<'a> = extra::Err<Rich<'a, char>>;

/// One record string and the 1-based source line it starts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    pub line: usize,
    pub text: String,
}

impl SourceRecord {
    #[must_use]
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
        }
    }
}

/// True when the whole input is one bracketed list (or parenthesized tuple)
/// whose first item is a string literal, or which is empty.
///
/// A plain-line file whose first record happens to start with `['` or `[]`
/// is not a list: the text must also end with the matching close bracket,
/// and an empty list must be the only thing in the input.
#[must_use]
pub fn looks_like_list_literal(input: &str) -> bool {
    let text = input.trim();
    let closing = match text.chars().next() {
        Some('[') => ']',
        Some('(') => ')',
        _ => return false,
    };
    if !text.ends_with(closing) {
        return false;
    }

    let body = skip_blank(&text[1..]);
    let mut chars = body.chars();
    match chars.next() {
        Some(c) if c == closing => body.len() == c.len_utf8(),
        Some('\'' | '"') => true,
        Some('r' | 'R' | 'u' | 'U') => matches!(chars.next(), Some('\'' | '"')),
        _ => false,
    }
}

/// Skip whitespace and `#` comments.
fn skip_blank(mut text: &str) -> &str {
    loop {
        text = text.trim_start();
        match text.strip_prefix('#') {
            Some(comment) => text = comment.find('\n').map_or("", |end| &comment[end..]),
            None => return text,
        }
    }
}

/// Turn a text source into an ordered sequence of records.
///
/// A list literal such as `['[1], T:a', "[1] R [1]"]` yields its string
/// items; any other text yields its non-blank lines, skipping `#` comments.
/// When list-shaped text fails to read as a list but its first line is a
/// record on its own, the input is read as plain lines.
pub fn load_records(input: &str) -> Result<Vec<SourceRecord>, SourceError> {
    if looks_like_list_literal(input) {
        match parse_list_literal(input) {
            Ok(records) => {
                debug!(records = records.len(), "loaded records from list literal");
                return Ok(records);
            }
            Err(err) if first_line_is_record(input) => {
                debug!(error = %err, "input is not a list literal; reading plain lines");
            }
            Err(err) => return Err(err),
        }
    }

    let records: Vec<SourceRecord> = input
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, text)| SourceRecord::new(line, text))
        .collect();
    debug!(records = records.len(), "loaded records from plain lines");
    Ok(records)
}

fn first_line_is_record(input: &str) -> bool {
    input
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .is_some_and(|line| parse_record(line).is_ok())
}

/// Parse a list or tuple literal of Python string literals.
///
/// Accepts `#` comments, `r`/`u` prefixes, Python escapes and adjacent
/// literals, which are joined into one item.
pub fn parse_list_literal(input: &str) -> Result<Vec<SourceRecord>, SourceError> {
    let items = list_literal_parser()
        .parse(input)
        .into_result()
        .map_err(|errors| match errors.first() {
            Some(error) => source_error(input, error),
            None => SourceError {
                offset: 0,
                message: "unreadable list literal".to_string(),
            },
        })?;
    Ok(items
        .into_iter()
        .map(|(offset, text)| SourceRecord::new(line_column(input, offset).0, text))
        .collect())
}

fn source_error(input: &str, error: &Rich<'_, char>) -> SourceError {
    let offset = error.span().start;
    let (line, column) = line_column(input, offset);
    let detail = match error.reason() {
        RichReason::Custom(message) => message.clone(),
        RichReason::ExpectedFound { .. } => {
            let found = match error.found() {
                Some(c) => format!("unexpected {c:?}"),
                None => "unexpected end of input".to_string(),
            };
            let mut expected: Vec<String> = Vec::new();
            for pattern in error.expected() {
                if matches!(pattern, RichPattern::SomethingElse | RichPattern::Any) {
                    continue;
                }
                let pattern = pattern.to_string();
                if !expected.contains(&pattern) {
                    expected.push(pattern);
                }
            }
            if expected.is_empty() {
                found
            } else {
                format!("{found}, expected {}", expected.join(" or "))
            }
        }
    };
    SourceError {
        offset,
        message: format!("line {line}, column {column}: {detail}"),
    }
}

/// 1-based line and column (in characters) of a byte offset.
fn line_column(input: &str, offset: usize) -> (usize, usize) {
    let before = input.get(..offset).unwrap_or(input);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |at| at + 1);
    (line, before[line_start..].chars().count() + 1)
}

/// Whitespace and `#` comments between tokens.
fn blank<'a>() -> impl Parser<'a, &'a str, (), ParserError<'a>> + Clone {
    let space = any().filter(|c: &char| c.is_whitespace()).ignored();
    let comment = just('#')
        .then(any().filter(|c: &char| *c != '\n').repeated())
        .ignored();
    space.or(comment).repeated()
}

fn list_literal_parser<'a>() -> impl Parser<'a, &'a str, Vec<(usize, String)>, ParserError<'a>> {
    let literal = string_literal();
    let item = literal
        .clone()
        .map_with(|text, extra| (extra.span().start, text))
        .then(
            literal
                .padded_by(blank())
                .repeated()
                .collect::<Vec<String>>(),
        )
        .map(|((offset, first), rest)| (offset, first + &rest.concat()));

    let items = item
        .padded_by(blank())
        .separated_by(just(','))
        .allow_trailing()
        .collect::<Vec<_>>()
        .padded_by(blank());

    let list = items
        .clone()
        .delimited_by(just('['), just(']'))
        .or(items.delimited_by(just('('), just(')')));

    list.padded_by(blank()).then_ignore(end())
}

/// One string literal: optional `r`/`R` (raw) or `u`/`U` prefix, then a
/// single- or double-quoted body.
fn string_literal<'a>() -> impl Parser<'a, &'a str, String, ParserError<'a>> + Clone {
    let raw = just('r')
        .or(just('R'))
        .ignore_then(quoted_body('\'', true).or(quoted_body('"', true)));
    let cooked = just('u')
        .or(just('U'))
        .or_not()
        .ignore_then(quoted_body('\'', false).or(quoted_body('"', false)));
    raw.or(cooked).labelled("string literal")
}

fn quoted_body<'a>(quote: char, raw: bool) -> impl Parser<'a, &'a str, String, ParserError<'a>> + Clone {
    let plain = any()
        .filter(move |c: &char| *c != quote && *c != '\\' && *c != '\n')
        .map(String::from);
    // Raw strings keep the backslash, but it still stops the next quote from
    // closing the literal.
    let raw_escape = just('\\').then(any()).to_slice().map(str::to_string);
    let part = if raw {
        raw_escape.or(plain).boxed()
    } else {
        escape().or(plain).boxed()
    };

    just(quote)
        .ignore_then(part.repeated().collect::<Vec<String>>())
        .then_ignore(just(quote))
        .map(|parts| parts.concat())
}

/// A backslash escape as Python decodes it. Unknown escapes keep their
/// backslash.
fn escape<'a>() -> impl Parser<'a, &'a str, String, ParserError<'a>> + Clone {
    let octal = any()
        .filter(|c: &char| ('0'..='7').contains(c))
        .repeated()
        .at_least(1)
        .at_most(3)
        .to_slice()
        .try_map(|digits: &str, span| code_point(digits, 8, span));
    let simple = any()
        .filter(|c: &char| !matches!(c, 'x' | 'u' | 'U'))
        .map(|c: char| match c {
            'n' => "\n".to_string(),
            't' => "\t".to_string(),
            'r' => "\r".to_string(),
            'a' => "\u{7}".to_string(),
            'b' => "\u{8}".to_string(),
            'f' => "\u{c}".to_string(),
            'v' => "\u{b}".to_string(),
            '\\' | '\'' | '"' => c.to_string(),
            '\n' => String::new(),
            other => format!("\\{other}"),
        });

    just('\\').ignore_then(choice((
        just('x').ignore_then(hex_digits(2)),
        just('u').ignore_then(hex_digits(4)),
        just('U').ignore_then(hex_digits(8)),
        octal,
        simple,
    )))
}

fn hex_digits<'a>(count: usize) -> impl Parser<'a, &'a str, String, ParserError<'a>> + Clone {
    any()
        .filter(char::is_ascii_hexdigit)
        .repeated()
        .exactly(count)
        .to_slice()
        .try_map(|digits: &str, span| code_point(digits, 16, span))
        .labelled("hex digits")
}

fn code_point<'a>(digits: &str, radix: u32, span: SimpleSpan) -> Result<String, Rich<'a, char>> {
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| Rich::custom(span, format!("invalid character escape '{digits}'")))
}

#[cfg(test)]
mod tests {
    use super::{SourceRecord, load_records, looks_like_list_literal, parse_list_literal};

    fn texts(records: &[SourceRecord]) -> Vec<&str> {
        records.iter().map(|record| record.text.as_str()).collect()
    }

    #[test]
    fn detects_list_literals() {
        assert!(looks_like_list_literal("['[1], T:a']"));
        assert!(looks_like_list_literal("  [\n  \"[1], T:a\",\n]"));
        assert!(looks_like_list_literal("('[1], T:a',)"));
        assert!(looks_like_list_literal("[]"));
        assert!(looks_like_list_literal("[\n  # records\n  r'[1], T:a'\n]"));
        assert!(!looks_like_list_literal("[1], T:a\n[2], T:b"));
        assert!(!looks_like_list_literal("[1] R [2]"));
        assert!(!looks_like_list_literal(""));
    }

    #[test]
    fn empty_brackets_followed_by_text_are_not_a_list() {
        assert!(!looks_like_list_literal("[], T:x\n[1], T:y\n"));
        assert!(!looks_like_list_literal("['a'], T:x\n[2], T:y"));
    }

    #[test]
    fn empty_id_record_stays_a_plain_line() {
        let records = load_records("[], T:x\n[1], T:y\n").expect("plain lines");
        assert_eq!(texts(&records), ["[], T:x", "[1], T:y"]);
    }

    #[test]
    fn quoted_ids_in_plain_lines_are_not_a_list() {
        let records = load_records("['a'], T:x\n['a'] R ['a']\n").expect("plain lines");
        assert_eq!(texts(&records), ["['a'], T:x", "['a'] R ['a']"]);
        assert_eq!(records[1].line, 2);
    }

    #[test]
    fn loads_python_style_list() {
        let input = r#"[
            '[1], COMPANY:search engine company',
            "[2], string:Java source files",
            '[9] WRAPPED_IN [4]',
        ]"#;
        let records = load_records(input).expect("valid literal");
        assert_eq!(
            texts(&records),
            [
                "[1], COMPANY:search engine company",
                "[2], string:Java source files",
                "[9] WRAPPED_IN [4]",
            ]
        );
        let lines: Vec<usize> = records.iter().map(|record| record.line).collect();
        assert_eq!(lines, [2, 3, 4]);
    }

    #[test]
    fn loads_tuple_literal() {
        let records = load_records("('[1], T:a', '[2], T:b')").expect("valid tuple");
        assert_eq!(texts(&records), ["[1], T:a", "[2], T:b"]);
    }

    #[test]
    fn decodes_escapes() {
        let records =
            parse_list_literal(r#"['[1], T:it\'s', "[2], T:say \"hi\"", '[3], T:a\\b\q']"#)
                .expect("valid escapes");
        assert_eq!(
            texts(&records),
            ["[1], T:it's", "[2], T:say \"hi\"", "[3], T:a\\b\\q"]
        );
    }

    #[test]
    fn decodes_numeric_escapes() {
        let records = parse_list_literal(
            r"['[1], T:\x41cme', '[2], T:caf\u00e9', '[3], T:\U0001F600', '[4], T:\101\60']",
        )
        .expect("valid escapes");
        assert_eq!(
            texts(&records),
            ["[1], T:Acme", "[2], T:café", "[3], T:\u{1F600}", "[4], T:A0"]
        );
    }

    #[test]
    fn short_hex_escape_is_an_error() {
        let err = parse_list_literal(r"['[1], T:\x4']").expect_err("one hex digit");
        assert!(err.message.starts_with("line 1, column "), "{}", err.message);
    }

    #[test]
    fn raw_strings_keep_backslashes() {
        let records = parse_list_literal(r"[r'[1], T:C:\dir\n', R'[2], T:\'q']")
            .expect("raw strings");
        assert_eq!(texts(&records), [r"[1], T:C:\dir\n", r"[2], T:\'q"]);
    }

    #[test]
    fn comments_inside_list_are_skipped() {
        let input = "[\n  # entities\n  '[1], T:a',  # first\n  '[2], T:b', # second\n]\n";
        let records = load_records(input).expect("comments are blank");
        assert_eq!(texts(&records), ["[1], T:a", "[2], T:b"]);
        assert_eq!(records[0].line, 3);
    }

    #[test]
    fn adjacent_literals_are_joined() {
        let records = parse_list_literal("['[1], ' \"T:\"\n  'long label', '[2], T:b']")
            .expect("implicit concatenation");
        assert_eq!(texts(&records), ["[1], T:long label", "[2], T:b"]);
    }

    #[test]
    fn empty_list_yields_no_records() {
        assert!(load_records("[ ]").expect("empty list").is_empty());
        assert!(load_records("").expect("empty text").is_empty());
        assert!(load_records("\n   \n").expect("blank text").is_empty());
    }

    #[test]
    fn plain_lines_skip_blanks_and_comments() {
        let input = "# sample\n[1], T:a\n\n  [2], T:b  \n[1] R [2]\n";
        let records = load_records(input).expect("plain lines");
        assert_eq!(
            records,
            [
                SourceRecord::new(2, "[1], T:a"),
                SourceRecord::new(4, "[2], T:b"),
                SourceRecord::new(5, "[1] R [2]"),
            ]
        );
    }

    #[test]
    fn unterminated_literal_is_a_source_error() {
        let err = load_records("['[1], T:a', '[2], T:b]").expect_err("unterminated");
        assert!(err.offset > 0);
        assert!(err.message.contains("end of input"), "{}", err.message);
    }

    #[test]
    fn error_points_at_offending_item() {
        let err = load_records("['[1], T:a',\n 42]").expect_err("number item");
        assert_eq!(err.offset, 14);
        assert!(err.message.starts_with("line 2, column 2: unexpected '4'"), "{}", err.message);
    }

    #[test]
    fn mixed_brackets_are_rejected() {
        assert!(parse_list_literal("['[1], T:a')").is_err());
    }
}
