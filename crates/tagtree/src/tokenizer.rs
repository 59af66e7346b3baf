//! Permissive, span-producing HTML tokenizer.
//!
//! Every token records byte spans into the input instead of copies, so the
//! tree builder can give each node zero-copy access to its source HTML.
//!
//! Recovery rules:
//! - A `<` that does not open a tag, comment or declaration is text.
//! - A `<` inside a tag ends that tag; the next tag starts there.
//! - Unterminated tags, comments and quoted attribute values run to end of input.
//! - Raw-text elements consume everything up to `</name` followed by
//!   whitespace, `/`, `>` or end of input. Without one, the rest of the input
//!   is their text.
//!
//! Invariant: spans are only cut at ASCII bytes, so both ends always fall on
//! UTF-8 character boundaries.
use crate::config::ElementRules;
use crate::source::Span;
use crate::types::{AtomTable, QuoteStyle, RawAttribute, Token, TokenStream};
use memchr::{memchr, memmem};

const COMMENT_START: &[u8] = b"<!--";
const COMMENT_END: &[u8] = b"-->";
const CDATA_START: &[u8] = b"<![CDATA[";
const CDATA_END: &[u8] = b"]]>";
const DOCTYPE_START: &[u8] = b"<!doctype";
const DIRECTIVE_END: &[u8] = b"%>";

fn starts_with_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.get(start..start + needle.len()) == Some(needle)
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_tag_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

// Bytes >= 0x80 are UTF-8 lead/continuation bytes; a name never ends inside a char.
fn is_tag_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.') || b >= 0x80
}

fn is_attribute_name_char(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'<' | b'"' | b'\'')
}

/// Finds the start of `</name` closing a raw-text element, searching from `from`.
// it only attempts matches starting at ASCII <
fn find_raw_text_close(haystack: &[u8], from: usize, name: &[u8]) -> Option<usize> {
    let len = haystack.len();
    let mut i = from;
    while i < len {
        let rel = memchr(b'<', &haystack[i..])?;
        i += rel;
        if haystack.get(i + 1) == Some(&b'/')
            && starts_with_ignore_ascii_case_at(haystack, i + 2, name)
        {
            let after = i + 2 + name.len();
            match haystack.get(after) {
                None => return Some(i),
                Some(b) if b.is_ascii_whitespace() || *b == b'/' || *b == b'>' => return Some(i),
                Some(_) => {}
            }
        }
        i += 1;
    }
    None
}

/// Tokenizes `input` into span-based tokens with interned names.
pub fn tokenize(input: &str, rules: &ElementRules) -> TokenStream {
    let mut tokenizer = Tokenizer {
        input,
        bytes: input.as_bytes(),
        pos: 0,
        rules,
        atoms: AtomTable::new(),
        out: Vec::new(),
    };
    tokenizer.run();
    log::trace!(
        target: "tagtree.tokenizer",
        "tokenized {} bytes into {} tokens ({} names)",
        input.len(),
        tokenizer.out.len(),
        tokenizer.atoms.len()
    );
    TokenStream::new(tokenizer.out, tokenizer.atoms)
}

struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    rules: &'a ElementRules,
    atoms: AtomTable,
    out: Vec<Token>,
}

impl Tokenizer<'_> {
    fn run(&mut self) {
        let len = self.bytes.len();
        while self.pos < len {
            let start = self.pos;
            if self.bytes[start] != b'<' {
                let end = memchr(b'<', &self.bytes[start..]).map_or(len, |rel| start + rel);
                self.push_text(start, end);
                self.pos = end;
                continue;
            }
            if !self.markup(start) {
                let end =
                    memchr(b'<', &self.bytes[start + 1..]).map_or(len, |rel| start + 1 + rel);
                self.push_text(start, end);
                self.pos = end;
            }
            debug_assert!(self.pos > start, "tokenizer must make forward progress");
        }
    }

    /// Consumes the markup construct opening at `start`. Returns false when
    /// the `<` does not start one.
    fn markup(&mut self, start: usize) -> bool {
        let bytes = self.bytes;
        if starts_with_at(bytes, start, COMMENT_START) {
            self.comment(start);
            return true;
        }
        if starts_with_at(bytes, start, CDATA_START) {
            let end = memmem::find(&bytes[start + CDATA_START.len()..], CDATA_END)
                .map_or(bytes.len(), |rel| start + CDATA_START.len() + rel + CDATA_END.len());
            self.push(Token::Declaration {
                span: Span::new(start, end),
            });
            self.pos = end;
            return true;
        }
        if starts_with_ignore_ascii_case_at(bytes, start, DOCTYPE_START) {
            let end = self.past_next_gt(start + 2);
            self.push(Token::Doctype {
                span: Span::new(start, end),
            });
            self.pos = end;
            return true;
        }
        match bytes.get(start + 1) {
            Some(b'!') | Some(b'?') => {
                let end = self.past_next_gt(start + 2);
                self.push(Token::Declaration {
                    span: Span::new(start, end),
                });
                self.pos = end;
                true
            }
            Some(b'/') => match bytes.get(start + 2) {
                Some(b) if is_tag_name_start(*b) => {
                    self.tag(start, true);
                    true
                }
                _ => false,
            },
            Some(b) if is_tag_name_start(*b) => {
                self.tag(start, false);
                true
            }
            _ => false,
        }
    }

    fn past_next_gt(&self, from: usize) -> usize {
        let len = self.bytes.len();
        if from >= len {
            return len;
        }
        memchr(b'>', &self.bytes[from..]).map_or(len, |rel| from + rel + 1)
    }

    fn comment(&mut self, start: usize) {
        let payload_start = start + COMMENT_START.len();
        let (payload_end, end) = match memmem::find(&self.bytes[payload_start..], COMMENT_END) {
            Some(rel) => (
                payload_start + rel,
                payload_start + rel + COMMENT_END.len(),
            ),
            None => (self.bytes.len(), self.bytes.len()),
        };
        self.push(Token::Comment {
            payload: Span::new(payload_start, payload_end),
            span: Span::new(start, end),
        });
        self.pos = end;
    }

    fn tag(&mut self, start: usize, is_end_tag: bool) {
        let bytes = self.bytes;
        let name_start = start + if is_end_tag { 2 } else { 1 };
        let mut k = name_start;
        while k < bytes.len() && is_tag_name_char(bytes[k]) {
            k += 1;
        }
        debug_assert!(self.input.is_char_boundary(k));
        let name_span = Span::new(name_start, k);
        let name = self.atoms.intern_ascii_lowercase(&self.input[name_start..k]);
        let (attributes, self_closing, end) = self.attributes(k);
        let span = Span::new(start, end);
        self.pos = end;

        if is_end_tag {
            self.push(Token::EndTag {
                name,
                name_span,
                attributes,
                span,
            });
            return;
        }

        let tag_name = self.atoms.resolve(name);
        let self_closing = self_closing || self.rules.is_void(tag_name);
        let raw_text = !self_closing && self.rules.is_raw_text(tag_name);
        self.push(Token::StartTag {
            name,
            name_span,
            attributes,
            span,
            self_closing,
        });
        if raw_text {
            self.raw_text(name_span);
        }
    }

    /// Scans attributes from `k` to the end of the tag.
    /// Returns the attributes, whether the tag ended in `/>`, and the tag end.
    fn attributes(&mut self, mut k: usize) -> (Vec<RawAttribute>, bool, usize) {
        let bytes = self.bytes;
        let len = bytes.len();
        let mut attributes: Vec<RawAttribute> = Vec::new();
        let mut self_closing = false;

        loop {
            k = self.skip_whitespace(k);
            if k >= len {
                break;
            }
            match bytes[k] {
                b'>' => {
                    k += 1;
                    break;
                }
                b'/' => {
                    if bytes.get(k + 1) == Some(&b'>') {
                        self_closing = true;
                        k += 2;
                        break;
                    }
                    k += 1;
                    continue;
                }
                b'<' if bytes.get(k + 1) == Some(&b'%') => {
                    let end = memmem::find(&bytes[k + 2..], DIRECTIVE_END)
                        .map_or(len, |rel| k + 2 + rel + DIRECTIVE_END.len());
                    let name = self.atoms.intern_ascii_lowercase(&self.input[k..end]);
                    attributes.push(RawAttribute {
                        name,
                        name_span: Span::new(k, end),
                        value: None,
                        quote: QuoteStyle::Bare,
                    });
                    k = end;
                    continue;
                }
                // the tag is unterminated; the next one starts here
                b'<' => break,
                _ => {}
            }

            let name_start = k;
            while k < len && is_attribute_name_char(bytes[k]) {
                k += 1;
            }
            if name_start == k {
                // stray quote
                k += 1;
                continue;
            }
            debug_assert!(self.input.is_char_boundary(k));
            let name_span = Span::new(name_start, k);
            let name = self.atoms.intern_ascii_lowercase(&self.input[name_start..k]);

            let after_name = self.skip_whitespace(k);
            let (value, quote) = if after_name < len && bytes[after_name] == b'=' {
                let v = self.skip_whitespace(after_name + 1);
                if v < len && (bytes[v] == b'"' || bytes[v] == b'\'') {
                    let q = bytes[v];
                    let value_start = v + 1;
                    let (value_end, next) = match memchr(q, &bytes[value_start..]) {
                        Some(rel) => (value_start + rel, value_start + rel + 1),
                        None => (len, len),
                    };
                    k = next;
                    let quote = if q == b'"' {
                        QuoteStyle::Double
                    } else {
                        QuoteStyle::Single
                    };
                    (Some(Span::new(value_start, value_end)), quote)
                } else {
                    let mut e = v;
                    while e < len && !bytes[e].is_ascii_whitespace() && bytes[e] != b'>' {
                        if bytes[e] == b'/' && bytes.get(e + 1) == Some(&b'>') {
                            break;
                        }
                        e += 1;
                    }
                    k = e;
                    (Some(Span::new(v, e)), QuoteStyle::Double)
                }
            } else {
                (None, QuoteStyle::Bare)
            };

            if attributes.iter().any(|a| a.name == name) {
                log::trace!(
                    target: "tagtree.tokenizer",
                    "dropping duplicate attribute {:?} at {}",
                    self.atoms.resolve(name),
                    name_span
                );
                continue;
            }
            attributes.push(RawAttribute {
                name,
                name_span,
                value,
                quote,
            });
        }

        (attributes, self_closing, k.min(len))
    }

    fn raw_text(&mut self, name_span: Span) {
        let bytes = self.bytes;
        let content_start = self.pos;
        let name = &bytes[name_span.start..name_span.end];
        match find_raw_text_close(bytes, content_start, name) {
            Some(close) => {
                self.push_text(content_start, close);
                self.tag(close, true);
            }
            None => {
                self.push_text(content_start, bytes.len());
                self.pos = bytes.len();
            }
        }
    }

    fn skip_whitespace(&self, mut k: usize) -> usize {
        while k < self.bytes.len() && self.bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        k
    }

    fn push_text(&mut self, start: usize, end: usize) {
        if start == end {
            return;
        }
        debug_assert!(self.input.is_char_boundary(start));
        debug_assert!(self.input.is_char_boundary(end));
        if let Some(Token::Text(prev)) = self.out.last_mut() {
            if prev.end == start {
                prev.end = end;
                return;
            }
        }
        self.out.push(Token::Text(Span::new(start, end)));
    }

    fn push(&mut self, token: Token) {
        self.out.push(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> TokenStream {
        tokenize(input, &ElementRules::default())
    }

    fn text_of<'a>(input: &'a str, span: Span) -> &'a str {
        &input[span.start..span.end]
    }

    #[test]
    fn tokenize_preserves_utf8_text_nodes() {
        let input = "<p>120×32</p>";
        let stream = run(input);
        assert!(
            stream
                .iter()
                .any(|t| matches!(t, Token::Text(s) if text_of(input, *s) == "120×32")),
            "expected UTF-8 text token, got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_handles_mixed_case_doctype() {
        let input = "<!DoCtYpE html><p>";
        let stream = run(input);
        assert!(
            matches!(
                stream.tokens().first(),
                Some(Token::Doctype { span }) if text_of(input, *span) == "<!DoCtYpE html>"
            ),
            "expected case-insensitive doctype, got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_finds_script_end_tag_case_insensitive() {
        let input = "<script>if (a < b) { x = '</p>'; }</ScRiPt >";
        let stream = run(input);
        let atoms = stream.atoms();
        assert!(
            matches!(
                stream.tokens(),
                [
                    Token::StartTag { name, .. },
                    Token::Text(body),
                    Token::EndTag { name: end, span, .. }
                ] if atoms.resolve(*name) == "script"
                    && text_of(input, *body) == "if (a < b) { x = '</p>'; }"
                    && atoms.resolve(*end) == "script"
                    && text_of(input, *span) == "</ScRiPt >"
            ),
            "expected raw script text and matching end tag, got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_treats_missing_raw_text_close_as_text_to_end() {
        let input = "<style>p { color: red }";
        let stream = run(input);
        assert!(
            matches!(
                stream.tokens(),
                [Token::StartTag { .. }, Token::Text(body)]
                    if text_of(input, *body) == "p { color: red }"
            ),
            "expected unterminated style body as text, got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_records_attribute_quote_styles() {
        let input = r#"<a href="x" title='y' rel=z disabled>"#;
        let stream = run(input);
        let Some(Token::StartTag { attributes, .. }) = stream.tokens().first() else {
            panic!("expected start tag, got: {stream:?}");
        };
        let quotes: Vec<QuoteStyle> = attributes.iter().map(|a| a.quote).collect();
        assert_eq!(
            quotes,
            vec![
                QuoteStyle::Double,
                QuoteStyle::Single,
                QuoteStyle::Double,
                QuoteStyle::Bare
            ]
        );
        let values: Vec<Option<&str>> = attributes
            .iter()
            .map(|a| a.value.map(|s| text_of(input, s)))
            .collect();
        assert_eq!(values, vec![Some("x"), Some("y"), Some("z"), None]);
    }

    #[test]
    fn tokenize_keeps_original_attribute_name_span() {
        let input = r#"<div DATA-Role="main">"#;
        let stream = run(input);
        let Some(Token::StartTag { attributes, .. }) = stream.tokens().first() else {
            panic!("expected start tag, got: {stream:?}");
        };
        assert_eq!(stream.atoms().resolve(attributes[0].name), "data-role");
        assert_eq!(text_of(input, attributes[0].name_span), "DATA-Role");
    }

    #[test]
    fn tokenize_runs_unterminated_quoted_value_to_end() {
        let input = r#"<a href="oops><b>bold</b>"#;
        let stream = run(input);
        assert_eq!(stream.tokens().len(), 1, "got: {stream:?}");
        let Some(Token::StartTag {
            attributes, span, ..
        }) = stream.tokens().first()
        else {
            panic!("expected start tag, got: {stream:?}");
        };
        assert_eq!(span.end, input.len());
        assert_eq!(
            attributes[0].value.map(|s| text_of(input, s)),
            Some("oops><b>bold</b>")
        );
    }

    #[test]
    fn tokenize_keeps_first_of_duplicate_attributes() {
        let input = r#"<p class="a" CLASS="b">"#;
        let stream = run(input);
        let Some(Token::StartTag { attributes, .. }) = stream.tokens().first() else {
            panic!("expected start tag, got: {stream:?}");
        };
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].value.map(|s| text_of(input, s)), Some("a"));
    }

    #[test]
    fn tokenize_reads_template_directives_as_bare_attributes() {
        let input = r#"<input <%= Bind("x") %> type="text">"#;
        let stream = run(input);
        let Some(Token::StartTag { attributes, .. }) = stream.tokens().first() else {
            panic!("expected start tag, got: {stream:?}");
        };
        assert_eq!(attributes.len(), 2);
        assert_eq!(
            text_of(input, attributes[0].name_span),
            r#"<%= Bind("x") %>"#
        );
        assert_eq!(attributes[0].value, None);
    }

    #[test]
    fn tokenize_treats_stray_lt_as_text() {
        let input = "a < b <3 </ c";
        let stream = run(input);
        assert!(
            matches!(stream.tokens(), [Token::Text(s)] if text_of(input, *s) == input),
            "expected a single text token, got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_ends_tag_at_nested_lt() {
        let input = "<div<span>x";
        let stream = run(input);
        let atoms = stream.atoms();
        assert!(
            matches!(
                stream.tokens(),
                [
                    Token::StartTag { name: a, span, .. },
                    Token::StartTag { name: b, .. },
                    Token::Text(_)
                ] if atoms.resolve(*a) == "div" && *span == Span::new(0, 4)
                    && atoms.resolve(*b) == "span"
            ),
            "got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_marks_void_elements_self_closing() {
        let stream = run("<br><img src=a.png><div/>");
        let flags: Vec<bool> = stream
            .iter()
            .filter_map(|t| match t {
                Token::StartTag { self_closing, .. } => Some(*self_closing),
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![true, true, true]);
    }

    #[test]
    fn tokenize_handles_comments_and_declarations() {
        let input = "<!-- hi --><![CDATA[x<y]]><?php echo 1 ?><!--open";
        let stream = run(input);
        assert!(
            matches!(
                stream.tokens(),
                [
                    Token::Comment { payload: a, .. },
                    Token::Declaration { span: b },
                    Token::Declaration { span: c },
                    Token::Comment { payload: d, span: e },
                ] if text_of(input, *a) == " hi "
                    && text_of(input, *b) == "<![CDATA[x<y]]>"
                    && text_of(input, *c) == "<?php echo 1 ?>"
                    && text_of(input, *d) == "open"
                    && e.end == input.len()
            ),
            "got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_end_tag_keeps_attributes() {
        let input = r#"<p>x</p data-end="1">"#;
        let stream = run(input);
        assert!(
            matches!(
                stream.tokens().last(),
                Some(Token::EndTag { attributes, .. }) if attributes.len() == 1
            ),
            "got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_handles_large_raw_text_body_without_pathological_slowdown() {
        let mut input = String::from("<script>");
        while input.len() < 200_000 {
            input.push_str("</scri<pt");
        }
        input.push_str("</script>");
        let stream = run(&input);
        assert_eq!(stream.tokens().len(), 3, "expected start, text, end");
    }
}
