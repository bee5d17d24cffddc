//! Character reference decoding.

/// Named references recognized in attribution markup.
const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("copy", '\u{a9}'),
    ("reg", '\u{ae}'),
    ("trade", '\u{2122}'),
    ("bull", '\u{2022}'),
    ("middot", '\u{b7}'),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
];

/// Decode the character reference at the start of `input`.
///
/// `input` must start with `&`. Returns the decoded character and the number
/// of bytes consumed, or `None` if this is not a reference we understand.
pub fn decode_reference(input: &str) -> Option<(char, usize)> {
    let body = input.strip_prefix('&')?;
    let end = body.find(';')?;
    let name = &body[..end];
    let consumed = end + 2;

    if let Some(number) = name.strip_prefix('#') {
        let code = if let Some(hex) = number
            .strip_prefix('x')
            .or_else(|| number.strip_prefix('X'))
        {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            number.parse::<u32>().ok()?
        };
        return char::from_u32(code).map(|c| (c, consumed));
    }

    NAMED
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, c)| (c, consumed))
}
