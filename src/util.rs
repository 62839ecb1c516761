//! Small text formatting helpers shared by the formatter

/// Format a number for devicetree output.
///
/// Negative numbers are parenthesized, since a bare `-5` in devicetree
/// source parses as `5` negated. If `width` is non-zero the result is
/// left-padded with spaces.
pub fn dtnum(value: i64, width: usize) -> String {
    let text = if value < 0 {
        format!("({value})")
    } else {
        value.to_string()
    };

    if width > 0 {
        format!("{text:>width$}")
    } else {
        text
    }
}

/// Indent every non-empty line in a string by the given prefix.
pub fn indent(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The number of digits needed for the widest value in the array.
///
/// Returns 1 for an empty array so the width is always defined.
pub fn max_digits(values: &[i64]) -> usize {
    values
        .iter()
        .map(|v| decimal_digits(v.unsigned_abs()))
        .max()
        .unwrap_or(1)
}

fn decimal_digits(mut n: u64) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtnum_positive() {
        assert_eq!(dtnum(42, 0), "42");
    }

    #[test]
    fn test_dtnum_negative_is_parenthesized() {
        assert_eq!(dtnum(-5, 0), "(-5)");
    }

    #[test]
    fn test_dtnum_pads_to_width() {
        assert_eq!(dtnum(7, 4), "   7");
        assert_eq!(dtnum(-5, 6), "  (-5)");
    }

    #[test]
    fn test_indent_skips_blank_lines() {
        assert_eq!(indent("a\n\nb", "  "), "  a\n\n  b");
    }

    #[test]
    fn test_max_digits() {
        assert_eq!(max_digits(&[1, 22, 333]), 3);
        assert_eq!(max_digits(&[0]), 1);
        assert_eq!(max_digits(&[-1234]), 4);
        assert_eq!(max_digits(&[]), 1);
    }
}
