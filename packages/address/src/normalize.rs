//! Address normalization into join keys.
//!
//! Sources spell the same building in many ways:
//! - Unit suffixes: `"Riia 15-3"`
//! - Irregular spacing: `"  Tähe   10  "`
//! - Area prefixes: `"Tartu, Kalda tee 5"`
//!
//! [`normalize`] reduces these to `"<street> <house number>"`.
//!
//! Street tokens are matched against an explicit character set rather
//! than a Unicode word class, so the result does not depend on any
//! locale-specific notion of a "word".

/// Letters of the Estonian alphabet beyond ASCII.
const EXTENDED_LETTERS: &[char] = &[
    'ä', 'ö', 'ü', 'õ', 'š', 'ž', 'Ä', 'Ö', 'Ü', 'Õ', 'Š', 'Ž',
];

/// Returns `true` if `c` may appear inside a street-name token.
///
/// Hyphens count as token characters so that multi-part names such as
/// `"Kreutzwaldi-Vanemuise"` are never split.
#[must_use]
pub fn is_street_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-' || EXTENDED_LETTERS.contains(&c)
}

/// Byte offsets of a `"<street words> <house number>"` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StreetNumberSpan {
    /// Start of the first street word.
    pub start: usize,
    /// End of the last street word (exclusive).
    pub street_end: usize,
    /// End of the house number digits (exclusive).
    pub end: usize,
}

/// Canonicalizes a raw address into a join key.
///
/// Whitespace is collapsed, trailing `-<digits>` unit suffixes are
/// removed, and the leftmost `"<street words> <house number>"` run is
/// returned. Input without a recognizable house number comes back
/// trimmed but otherwise unchanged, so it still acts as a (probably
/// non-joining) key.
///
/// `normalize(&normalize(x)) == normalize(x)` for every input.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let address = strip_unit_suffix(&collapsed);

    find_street_number(address).map_or_else(
        || address.to_owned(),
        |span| address[span.start..span.end].to_owned(),
    )
}

/// Removes trailing `-<digits>` apartment/unit suffixes.
///
/// A suffix is kept when removing it would leave nothing behind.
fn strip_unit_suffix(address: &str) -> &str {
    let mut rest = address;

    loop {
        let without_digits = rest.trim_end_matches(|c: char| c.is_ascii_digit());
        if without_digits.len() == rest.len() {
            break;
        }
        let Some(head) = without_digits.strip_suffix('-') else {
            break;
        };
        let head = head.trim_end();
        if head.is_empty() {
            break;
        }
        rest = head;
    }

    rest
}

/// Finds the leftmost run of whitespace-separated street tokens followed
/// by whitespace and a decimal house number.
///
/// Among the matches starting at the leftmost position, the one with the
/// most street tokens wins.
pub(crate) fn find_street_number(address: &str) -> Option<StreetNumberSpan> {
    let chars: Vec<(usize, char)> = address.char_indices().collect();
    let byte_at = |idx: usize| chars.get(idx).map_or(address.len(), |&(b, _)| b);

    let mut prev_is_street = false;
    for (idx, &(_, c)) in chars.iter().enumerate() {
        let is_street = is_street_char(c);
        if is_street
            && !prev_is_street
            && let Some((street_end, end)) = match_at(&chars, idx)
        {
            return Some(StreetNumberSpan {
                start: byte_at(idx),
                street_end: byte_at(street_end),
                end: byte_at(end),
            });
        }
        prev_is_street = is_street;
    }

    None
}

/// Attempts a match whose first street token starts at char index
/// `start`. Returns char indices of the street end and the match end.
fn match_at(chars: &[(usize, char)], start: usize) -> Option<(usize, usize)> {
    let mut word_ends = Vec::new();
    let mut pos = start;

    loop {
        let end = pos
            + chars[pos..]
                .iter()
                .take_while(|(_, c)| is_street_char(*c))
                .count();
        word_ends.push(end);

        // Tokens chain across exactly one whitespace character.
        match (chars.get(end), chars.get(end + 1)) {
            (Some(&(_, sep)), Some(&(_, next))) if sep.is_whitespace() && is_street_char(next) => {
                pos = end + 1;
            }
            _ => break,
        }
    }

    word_ends.into_iter().rev().find_map(|street_end| {
        let spaces = chars[street_end..]
            .iter()
            .take_while(|(_, c)| c.is_whitespace())
            .count();
        if spaces == 0 {
            return None;
        }
        let digits = chars[street_end + spaces..]
            .iter()
            .take_while(|(_, c)| c.is_ascii_digit())
            .count();
        (digits > 0).then_some((street_end, street_end + spaces + digits))
    })
}
