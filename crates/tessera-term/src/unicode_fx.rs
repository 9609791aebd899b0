// SPDX-License-Identifier: MIT
//
// Unicode effects: text styles realised by swapping the character.
//
// Terminals only know a handful of SGR styles. Unicode carries many more as
// separate code points: circled letters, fullwidth forms, mathematical
// alphanumerics, regional indicators, superscript modifier letters. A shape
// applies these when a character is written, so the buffer (and the
// terminal) see `Ⓐ` rather than `A` plus a flag.
//
// Every mapping only touches ASCII input and produces non-ASCII output, so
// translating an already translated character changes nothing.

use crate::cell::Effects;

/// Apply the glyph-substitution subset of `effects` to `ch`.
///
/// Effects are tried in bit order; the first one with a variant for the
/// character wins. Characters without a variant pass through.
///
/// ```
/// use tessera_term::cell::Effects;
/// use tessera_term::unicode_fx::translate;
///
/// assert_eq!(translate('A', Effects::ENCIRCLED), 'Ⓐ');
/// assert_eq!(translate('7', Effects::FULLWIDTH), '７');
/// assert_eq!(translate('%', Effects::SQUARED), '%');
/// ```
#[must_use]
pub fn translate(ch: char, effects: Effects) -> char {
    if !ch.is_ascii() {
        return ch;
    }
    effects
        .unicode()
        .iter()
        .find_map(|fx| variant(ch, fx))
        .unwrap_or(ch)
}

/// Apply a single effect, `None` when it has no variant for `ch`.
fn variant(ch: char, fx: Effects) -> Option<char> {
    let upper = ch.to_ascii_uppercase();
    match fx {
        fx if fx == Effects::ENCIRCLED => match ch {
            'A'..='Z' => offset(0x24B6, ch, 'A'),
            'a'..='z' => offset(0x24D0, ch, 'a'),
            '1'..='9' => offset(0x2460, ch, '1'),
            '0' => Some('\u{24EA}'),
            _ => None,
        },
        fx if fx == Effects::NEGATIVE_CIRCLED => {
            upper.is_ascii_uppercase().then(|| offset(0x1F150, upper, 'A')).flatten()
        }
        fx if fx == Effects::SQUARED => {
            upper.is_ascii_uppercase().then(|| offset(0x1F130, upper, 'A')).flatten()
        }
        fx if fx == Effects::NEGATIVE_SQUARED => {
            upper.is_ascii_uppercase().then(|| offset(0x1F170, upper, 'A')).flatten()
        }
        fx if fx == Effects::PARENTHESIZED => match ch {
            'a'..='z' => offset(0x249C, ch, 'a'),
            'A'..='Z' => offset(0x1F110, ch, 'A'),
            '1'..='9' => offset(0x2474, ch, '1'),
            _ => None,
        },
        fx if fx == Effects::FULLWIDTH => match ch {
            '!'..='~' => offset(0xFF01, ch, '!'),
            _ => None,
        },
        fx if fx == Effects::MATH_BOLD => match ch {
            'A'..='Z' => offset(0x1D5D4, ch, 'A'),
            'a'..='z' => offset(0x1D5EE, ch, 'a'),
            '0'..='9' => offset(0x1D7EC, ch, '0'),
            _ => None,
        },
        fx if fx == Effects::MATH_BOLD_ITALIC => match ch {
            'A'..='Z' => offset(0x1D63C, ch, 'A'),
            'a'..='z' => offset(0x1D656, ch, 'a'),
            _ => None,
        },
        fx if fx == Effects::SUPER_BOLD => {
            upper.is_ascii_uppercase().then(|| offset(0x1F1E6, upper, 'A')).flatten()
        }
        fx if fx == Effects::SUPER_SCRIPT => superscript(ch),
        fx if fx == Effects::DOUBLE_STRUCK => double_struck(ch),
        _ => None,
    }
}

fn offset(base: u32, ch: char, first: char) -> Option<char> {
    char::from_u32(base + (u32::from(ch) - u32::from(first)))
}

fn superscript(ch: char) -> Option<char> {
    let mapped = match ch {
        'a' => 'ᵃ',
        'b' => 'ᵇ',
        'c' => 'ᶜ',
        'd' => 'ᵈ',
        'e' => 'ᵉ',
        'f' => 'ᶠ',
        'g' => 'ᵍ',
        'h' => 'ʰ',
        'i' => 'ⁱ',
        'j' => 'ʲ',
        'k' => 'ᵏ',
        'l' => 'ˡ',
        'm' => 'ᵐ',
        'n' => 'ⁿ',
        'o' => 'ᵒ',
        'p' => 'ᵖ',
        'r' => 'ʳ',
        's' => 'ˢ',
        't' => 'ᵗ',
        'u' => 'ᵘ',
        'v' => 'ᵛ',
        'w' => 'ʷ',
        'x' => 'ˣ',
        'y' => 'ʸ',
        'z' => 'ᶻ',
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4'..='9' => return offset(0x2074, ch, '4'),
        '+' => '⁺',
        '-' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        _ => return None,
    };
    Some(mapped)
}

fn double_struck(ch: char) -> Option<char> {
    match ch {
        'C' => Some('ℂ'),
        'H' => Some('ℍ'),
        'N' => Some('ℕ'),
        'P' => Some('ℙ'),
        'Q' => Some('ℚ'),
        'R' => Some('ℝ'),
        'Z' => Some('ℤ'),
        'A'..='Z' => offset(0x1D538, ch, 'A'),
        'a'..='z' => offset(0x1D552, ch, 'a'),
        '0'..='9' => offset(0x1D7D8, ch, '0'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encircled_letters_and_digits() {
        assert_eq!(translate('Z', Effects::ENCIRCLED), 'Ⓩ');
        assert_eq!(translate('a', Effects::ENCIRCLED), 'ⓐ');
        assert_eq!(translate('1', Effects::ENCIRCLED), '①');
        assert_eq!(translate('0', Effects::ENCIRCLED), '⓪');
    }

    #[test]
    fn negative_circled_uppercases() {
        assert_eq!(translate('b', Effects::NEGATIVE_CIRCLED), '\u{1F151}');
        assert_eq!(translate('3', Effects::NEGATIVE_CIRCLED), '3');
    }

    #[test]
    fn parenthesized_three_ranges() {
        assert_eq!(translate('a', Effects::PARENTHESIZED), '⒜');
        assert_eq!(translate('A', Effects::PARENTHESIZED), '\u{1F110}');
        assert_eq!(translate('9', Effects::PARENTHESIZED), '⑼');
    }

    #[test]
    fn fullwidth_covers_printable_ascii() {
        assert_eq!(translate('!', Effects::FULLWIDTH), '！');
        assert_eq!(translate('~', Effects::FULLWIDTH), '～');
        assert_eq!(translate(' ', Effects::FULLWIDTH), ' ');
    }

    #[test]
    fn math_alphanumerics() {
        assert_eq!(translate('A', Effects::MATH_BOLD), '\u{1D5D4}');
        assert_eq!(translate('0', Effects::MATH_BOLD), '\u{1D7EC}');
        assert_eq!(translate('a', Effects::MATH_BOLD_ITALIC), '\u{1D656}');
    }

    #[test]
    fn double_struck_uses_letterlike_holes() {
        assert_eq!(translate('R', Effects::DOUBLE_STRUCK), 'ℝ');
        assert_eq!(translate('A', Effects::DOUBLE_STRUCK), '\u{1D538}');
        assert_eq!(translate('1', Effects::DOUBLE_STRUCK), '\u{1D7D9}');
    }

    #[test]
    fn superscript_and_regional_indicators() {
        assert_eq!(translate('n', Effects::SUPER_SCRIPT), 'ⁿ');
        assert_eq!(translate('5', Effects::SUPER_SCRIPT), '⁵');
        assert_eq!(translate('q', Effects::SUPER_SCRIPT), 'q');
        assert_eq!(translate('b', Effects::SUPER_BOLD), '\u{1F1E7}');
    }

    #[test]
    fn terminal_effects_and_upside_down_leave_chars() {
        assert_eq!(translate('A', Effects::BOLD | Effects::UNDERLINE), 'A');
        assert_eq!(translate('A', Effects::UPSIDE_DOWN), 'A');
    }

    #[test]
    fn translation_is_idempotent() {
        for fx in Effects::UNICODE.iter() {
            for ch in ['A', 'z', '5', '!'] {
                let once = translate(ch, fx);
                assert_eq!(translate(once, fx), once, "{fx:?} {ch:?}");
            }
        }
    }

    #[test]
    fn first_effect_with_a_variant_wins() {
        assert_eq!(translate('A', Effects::ENCIRCLED | Effects::SQUARED), 'Ⓐ');
        assert_eq!(translate('!', Effects::ENCIRCLED | Effects::FULLWIDTH), '！');
    }
}
