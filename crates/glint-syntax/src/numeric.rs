//! The parameterized numeric-literal matcher shared by most scanners.
//!
//! Languages describe their number grammar declaratively (signs,
//! prefixes, exponent separators, suffixes, digit separator) and get
//! back a structural breakdown that the highlighter base turns into
//! `number` / `number_decor` / `number_delim` tokens.

use glint_util::ascii;

/// Which leading signs a literal may carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchedSigns {
    /// No sign is consumed.
    #[default]
    None,
    /// Only `-` is consumed.
    MinusOnly,
    /// Both `+` and `-` are consumed.
    PlusMinus,
}

/// A radix prefix, like `0x` mapping to base 16.
#[derive(Clone, Copy, Debug)]
pub struct NumberPrefix {
    pub text: &'static [u8],
    pub base: u32,
}

/// An exponent separator, like `e+`, applicable to literals of `base`.
#[derive(Clone, Copy, Debug)]
pub struct ExponentSeparator {
    pub text: &'static [u8],
    pub base: u32,
}

/// The declarative description of a language's number grammar.
#[derive(Clone, Copy, Debug, Default)]
pub struct NumberOptions {
    pub signs: MatchedSigns,
    pub prefixes: &'static [NumberPrefix],
    pub exponent_separators: &'static [ExponentSeparator],
    pub suffixes: &'static [&'static [u8]],
    /// When nonzero, a literal `0` followed by more digits is read in
    /// this base (legacy octal in JavaScript).
    pub default_leading_zero_base: u32,
    /// A digit separator byte, like `_` or `'`. Zero disables.
    pub digit_separator: u8,
    /// Marks literals whose integer part is empty as erroneous when
    /// they also lack a fractional part (e.g. a bare `0x` prefix form).
    pub nonempty_integer: bool,
}

/// The structural breakdown of a matched literal. All fields are byte
/// lengths of consecutive segments, in source order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NumberResult {
    pub length: usize,
    pub sign: usize,
    pub prefix: usize,
    pub integer: usize,
    pub radix_point: usize,
    pub fractional: usize,
    pub exponent_sep: usize,
    pub exponent_digits: usize,
    pub suffix: usize,
    pub erroneous: bool,
}

impl NumberResult {
    #[inline]
    pub fn matched(&self) -> bool {
        self.length != 0
    }

    /// Whether the literal has a fractional part or an exponent.
    #[inline]
    pub fn is_non_integer(&self) -> bool {
        self.radix_point != 0 || self.exponent_sep != 0
    }
}

/// A run of digits with separator validity tracking.
#[derive(Clone, Copy, Debug, Default)]
struct DigitsResult {
    length: usize,
    erroneous: bool,
}

/// Matches digits of `base`, permitting single `separator` bytes
/// between digits. Doubled, leading, or trailing separators render the
/// run erroneous but are still consumed.
fn match_digits(str: &[u8], base: u32, separator: u8) -> DigitsResult {
    let mut erroneous = false;
    let mut previous_was_separator = true;
    let length = ascii::length_if(str, |c| {
        if separator != 0 && c == separator {
            erroneous |= previous_was_separator;
            previous_was_separator = true;
            true
        } else if ascii::is_digit_in_base(c, base) {
            previous_was_separator = false;
            true
        } else {
            false
        }
    });
    // A trailing separator is as bad as a doubled one.
    erroneous |= length != 0 && separator != 0 && str[length - 1] == separator;
    DigitsResult { length, erroneous }
}

/// Matches a numeric literal at the start of `str` per `options`.
///
/// The match is structural: erroneous literals (misplaced separators,
/// digitless prefixes) are still matched in full so the caller can
/// emit a single error token covering them.
pub fn match_common_number(str: &[u8], options: &NumberOptions) -> NumberResult {
    fn advance<'s>(result: &mut NumberResult, rest: &mut &'s [u8], n: usize) {
        result.length += n;
        *rest = &rest[n..];
    }

    let mut result = NumberResult::default();
    let mut rest = str;

    // 1. Sign.
    let has_sign = match options.signs {
        MatchedSigns::None => false,
        MatchedSigns::MinusOnly => rest.starts_with(b"-"),
        MatchedSigns::PlusMinus => rest.starts_with(b"-") || rest.starts_with(b"+"),
    };
    if has_sign {
        result.sign = 1;
        advance(&mut result, &mut rest, 1);
    }

    // 2. Longest matching prefix, else decimal. A leading zero with
    //    more digits may select a legacy default base.
    let mut base = 10;
    let mut legacy_octal = false;
    let mut best_prefix: Option<&NumberPrefix> = None;
    for prefix in options.prefixes {
        if rest.starts_with(prefix.text)
            && best_prefix.is_none_or(|best| prefix.text.len() > best.text.len())
        {
            best_prefix = Some(prefix);
        }
    }
    if let Some(prefix) = best_prefix {
        base = prefix.base;
        result.prefix = prefix.text.len();
        advance(&mut result, &mut rest, prefix.text.len());
    } else if options.default_leading_zero_base != 0
        && rest.starts_with(b"0")
        && rest.get(1).is_some_and(|&c| ascii::is_digit(c))
    {
        legacy_octal = true;
    }

    // 3. Integer digits.
    let integer = match_digits(rest, base, options.digit_separator);
    result.integer = integer.length;
    result.erroneous |= integer.erroneous;
    if legacy_octal {
        // Digits were read as decimal; flag any digit the legacy base
        // does not actually allow.
        let digits = &rest[..integer.length];
        result.erroneous |= digits.iter().any(|&c| {
            c != options.digit_separator
                && !ascii::is_digit_in_base(c, options.default_leading_zero_base)
        });
    }
    advance(&mut result, &mut rest, integer.length);

    // A prefix with no digits is a recognizable but broken literal.
    if result.prefix != 0 && result.integer == 0 {
        result.erroneous = true;
        return result;
    }

    // 4. Radix point, for decimal-family literals only. Only consumed
    //    when introduced by a digit on either side, so a lone `.` or a
    //    member access like `x.y` never matches.
    if base == 10 && rest.starts_with(b".") {
        let digit_follows = rest.get(1).is_some_and(|&c| ascii::is_digit(c));
        if result.integer != 0 || digit_follows {
            result.radix_point = 1;
            advance(&mut result, &mut rest, 1);
            let fractional = match_digits(rest, base, options.digit_separator);
            result.fractional = fractional.length;
            result.erroneous |= fractional.erroneous;
            advance(&mut result, &mut rest, fractional.length);
        }
    }

    if result.integer == 0 && result.fractional == 0 {
        // Nothing numeric at all.
        return NumberResult::default();
    }

    // 5. Exponent, when a separator of the current base matches and
    //    digits follow.
    let mut best_exponent: Option<&ExponentSeparator> = None;
    for separator in options.exponent_separators {
        if separator.base == base
            && rest.starts_with(separator.text)
            && best_exponent.is_none_or(|best| separator.text.len() > best.text.len())
        {
            best_exponent = Some(separator);
        }
    }
    if let Some(separator) = best_exponent {
        let after = &rest[separator.text.len()..];
        let digits = match_digits(after, 10, options.digit_separator);
        if digits.length != 0 {
            result.exponent_sep = separator.text.len();
            advance(&mut result, &mut rest, separator.text.len());
            result.exponent_digits = digits.length;
            result.erroneous |= digits.erroneous;
            advance(&mut result, &mut rest, digits.length);
        }
    }

    // 6. At most one suffix, longest match.
    let mut best_suffix: Option<&&[u8]> = None;
    for suffix in options.suffixes {
        if rest.starts_with(suffix) && best_suffix.is_none_or(|best| suffix.len() > best.len()) {
            best_suffix = Some(suffix);
        }
    }
    if let Some(suffix) = best_suffix {
        result.suffix = suffix.len();
        advance(&mut result, &mut rest, suffix.len());
    }

    // 7. Language-specific emptiness constraint.
    if options.nonempty_integer && result.integer == 0 && result.fractional == 0 {
        result.erroneous = true;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const JS_PREFIXES: &[NumberPrefix] = &[
        NumberPrefix { text: b"0b", base: 2 },
        NumberPrefix { text: b"0B", base: 2 },
        NumberPrefix { text: b"0o", base: 8 },
        NumberPrefix { text: b"0O", base: 8 },
        NumberPrefix {
            text: b"0x",
            base: 16,
        },
        NumberPrefix {
            text: b"0X",
            base: 16,
        },
    ];
    const DECIMAL_EXPONENTS: &[ExponentSeparator] = &[
        ExponentSeparator {
            text: b"E+",
            base: 10,
        },
        ExponentSeparator {
            text: b"E-",
            base: 10,
        },
        ExponentSeparator { text: b"E", base: 10 },
        ExponentSeparator {
            text: b"e+",
            base: 10,
        },
        ExponentSeparator {
            text: b"e-",
            base: 10,
        },
        ExponentSeparator { text: b"e", base: 10 },
    ];

    fn js_options() -> NumberOptions {
        NumberOptions {
            prefixes: JS_PREFIXES,
            exponent_separators: DECIMAL_EXPONENTS,
            suffixes: &[b"n"],
            default_leading_zero_base: 8,
            digit_separator: b'_',
            ..NumberOptions::default()
        }
    }

    #[test]
    fn test_plain_integer() {
        let r = match_common_number(b"123;", &js_options());
        assert_eq!(r.length, 3);
        assert_eq!(r.integer, 3);
        assert!(!r.erroneous);
    }

    #[test]
    fn test_hex_prefix() {
        let r = match_common_number(b"0xFF_0 ", &js_options());
        assert_eq!(r.length, 6);
        assert_eq!(r.prefix, 2);
        assert_eq!(r.integer, 4);
        assert!(!r.erroneous);
    }

    #[test]
    fn test_prefix_without_digits() {
        let r = match_common_number(b"0x", &js_options());
        assert_eq!(r.length, 2);
        assert!(r.erroneous);
    }

    #[test]
    fn test_fraction_and_exponent() {
        let r = match_common_number(b"1.5e-3x", &js_options());
        assert_eq!(r.length, 6);
        assert_eq!(r.integer, 1);
        assert_eq!(r.radix_point, 1);
        assert_eq!(r.fractional, 1);
        assert_eq!(r.exponent_sep, 2);
        assert_eq!(r.exponent_digits, 1);
        assert!(!r.erroneous);
    }

    #[test]
    fn test_leading_dot() {
        let r = match_common_number(b".5", &js_options());
        assert_eq!(r.length, 2);
        assert_eq!(r.integer, 0);
        assert_eq!(r.fractional, 1);
        assert!(!r.erroneous);
    }

    #[test]
    fn test_lone_dot_is_no_match() {
        assert!(!match_common_number(b".", &js_options()).matched());
        assert!(!match_common_number(b".x", &js_options()).matched());
        assert!(!match_common_number(b"x", &js_options()).matched());
    }

    #[test]
    fn test_trailing_dot() {
        let r = match_common_number(b"5.", &js_options());
        assert_eq!(r.length, 2);
        assert_eq!(r.radix_point, 1);
        assert_eq!(r.fractional, 0);
    }

    #[test]
    fn test_bad_separator_placement() {
        assert!(match_common_number(b"1__2", &js_options()).erroneous);
        assert!(match_common_number(b"1_", &js_options()).erroneous);
        assert!(!match_common_number(b"1_2", &js_options()).erroneous);
    }

    #[test]
    fn test_legacy_octal() {
        let r = match_common_number(b"0123", &js_options());
        assert_eq!(r.length, 4);
        assert!(!r.erroneous);
        let r = match_common_number(b"0189", &js_options());
        assert_eq!(r.length, 4);
        assert!(r.erroneous);
    }

    #[test]
    fn test_suffix() {
        let r = match_common_number(b"12n", &js_options());
        assert_eq!(r.suffix, 1);
        assert!(!r.is_non_integer());
        let r = match_common_number(b"1.2n", &js_options());
        assert_eq!(r.suffix, 1);
        assert!(r.is_non_integer());
    }

    #[test]
    fn test_exponent_without_digits_not_consumed() {
        let r = match_common_number(b"1e", &js_options());
        assert_eq!(r.length, 1);
        assert_eq!(r.exponent_sep, 0);
    }

    #[test]
    fn test_minus_only_sign() {
        let options = NumberOptions {
            signs: MatchedSigns::MinusOnly,
            exponent_separators: DECIMAL_EXPONENTS,
            ..NumberOptions::default()
        };
        let r = match_common_number(b"-42", &options);
        assert_eq!(r.sign, 1);
        assert_eq!(r.length, 3);
        assert!(!match_common_number(b"+42", &options).matched());
        // Sign alone is not a number.
        assert!(!match_common_number(b"-x", &options).matched());
    }
}
