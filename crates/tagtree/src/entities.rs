//! Character reference decoding.
//!
//! Contract:
//! - Named references decoded: see `NAMED`; names are case-sensitive and must
//!   end in `;`.
//! - Numeric references decode only when well-formed, semicolon-terminated
//!   and a valid Unicode scalar: `&#215;`, `&#xD7;`.
//! - Anything else is left unchanged.
//!
//! Deliberately narrow; it is not the full HTML named-reference table.

const NAMED: &[(&[u8], char)] = &[
    (b"amp", '&'),
    (b"lt", '<'),
    (b"gt", '>'),
    (b"quot", '"'),
    (b"apos", '\''),
    (b"nbsp", '\u{00A0}'),
    (b"copy", '\u{00A9}'),
    (b"reg", '\u{00AE}'),
    (b"hellip", '\u{2026}'),
    (b"ndash", '\u{2013}'),
    (b"mdash", '\u{2014}'),
];

/// Names XML understands without a DTD.
const XML_PREDEFINED: &[&[u8]] = &[b"amp", b"lt", b"gt", b"quot", b"apos"];

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Decodes the reference starting at `bytes[i] == b'&'`.
/// Returns the character and the index just past the `;`.
pub(crate) fn reference_at(bytes: &[u8], i: usize) -> Option<(char, usize)> {
    debug_assert_eq!(bytes.get(i), Some(&b'&'));
    let rest = &bytes[i + 1..];
    if let Some(numeric) = rest.strip_prefix(b"#") {
        let (digits, radix, max, skip) = match numeric.first() {
            Some(b'x' | b'X') => (&numeric[1..], 16, MAX_HEX_DIGITS, 3),
            _ => (numeric, 10, MAX_DEC_DIGITS, 2),
        };
        let len = digits
            .iter()
            .take(max + 1)
            .take_while(|b| b.is_ascii_hexdigit() && (radix == 16 || b.is_ascii_digit()))
            .count();
        if len == 0 || len > max || digits.get(len) != Some(&b';') {
            return None;
        }
        let text = std::str::from_utf8(&digits[..len]).ok()?;
        let ch = u32::from_str_radix(text, radix).ok().and_then(char::from_u32)?;
        return Some((ch, i + skip + len + 1));
    }
    NAMED.iter().find_map(|(name, ch)| {
        (rest.starts_with(name) && rest.get(name.len()) == Some(&b';'))
            .then(|| (*ch, i + 1 + name.len() + 1))
    })
}

/// True when the reference at `bytes[i]` is one of XML's predefined names.
pub(crate) fn is_xml_predefined_at(bytes: &[u8], i: usize) -> bool {
    let rest = &bytes[i + 1..];
    XML_PREDEFINED
        .iter()
        .any(|name| rest.starts_with(name) && rest.get(name.len()) == Some(&b';'))
}

/// Decodes the supported character references in `s`.
pub fn deentitize(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut copy_start = 0;
    let mut i = 0;
    while let Some(rel) = memchr::memchr(b'&', &bytes[i..]) {
        let amp = i + rel;
        match reference_at(bytes, amp) {
            Some((ch, next)) => {
                out.push_str(&s[copy_start..amp]);
                out.push(ch);
                copy_start = next;
                i = next;
            }
            None => i = amp + 1,
        }
    }
    out.push_str(&s[copy_start..]);
    out
}
