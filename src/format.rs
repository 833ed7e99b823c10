//! Human-readable rendering of large production figures

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NumberStyle {
    /// 1 234 567
    Spaced,
    /// 1.235 million
    Short,
    /// 1.235M
    Suffix,
    /// 1.235e+6
    Sci,
    /// Fraction as a percentage: 0.25 -> 25.0%
    #[value(skip)]
    Percentage,
}

struct Magnitude {
    value: f64,
    name: &'static str,
    short: &'static str,
}

const MAGNITUDES: &[Magnitude] = &[
    Magnitude { value: 1e63, name: "vigintillion", short: "Vi" },
    Magnitude { value: 1e60, name: "novemdecillion", short: "Nd" },
    Magnitude { value: 1e57, name: "octodecillion", short: "Od" },
    Magnitude { value: 1e54, name: "septendecillion", short: "Sd" },
    Magnitude { value: 1e51, name: "sexdecillion", short: "Sxd" },
    Magnitude { value: 1e48, name: "quindecillion", short: "Qid" },
    Magnitude { value: 1e45, name: "quattuordecillion", short: "Qad" },
    Magnitude { value: 1e42, name: "tredecillion", short: "Td" },
    Magnitude { value: 1e39, name: "duodecillion", short: "Dd" },
    Magnitude { value: 1e36, name: "undecillion", short: "Ud" },
    Magnitude { value: 1e33, name: "decillion", short: "Dc" },
    Magnitude { value: 1e30, name: "nonillion", short: "No" },
    Magnitude { value: 1e27, name: "octillion", short: "Oc" },
    Magnitude { value: 1e24, name: "septillion", short: "Sp" },
    Magnitude { value: 1e21, name: "sextillion", short: "Sx" },
    Magnitude { value: 1e18, name: "quintillion", short: "Qi" },
    Magnitude { value: 1e15, name: "quadrillion", short: "Qa" },
    Magnitude { value: 1e12, name: "trillion", short: "T" },
    Magnitude { value: 1e9, name: "billion", short: "B" },
    Magnitude { value: 1e6, name: "million", short: "M" },
    Magnitude { value: 1e3, name: "thousand", short: "K" },
];

/// Format `value` for display. Non-finite input renders as an empty string.
///
/// Below 1000 every style except `Percentage` shows a rounded integer;
/// `decimals` applies to the `Short`, `Suffix` and `Sci` styles.
pub fn format_large_number(value: f64, style: NumberStyle, decimals: usize) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value.abs() < 1000.0 && style != NumberStyle::Percentage {
        return round_half_up(value).to_string();
    }

    match style {
        NumberStyle::Spaced => group_thousands(value),
        NumberStyle::Short | NumberStyle::Suffix => {
            match MAGNITUDES.iter().find(|m| value.abs() >= m.value) {
                Some(m) if style == NumberStyle::Suffix => {
                    format!("{:.*}{}", decimals, value / m.value, m.short)
                }
                Some(m) => format!("{:.*} {}", decimals, value / m.value, m.name),
                None => round_half_up(value).to_string(),
            }
        }
        NumberStyle::Sci => {
            let s = format!("{:.*e}", decimals, value);
            match s.split_once('e') {
                Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
                _ => s,
            }
        }
        NumberStyle::Percentage => format!("{:.1}%", value * 100.0),
    }
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Thousands separated by spaces, at most three fractional digits.
fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 1);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_round_to_integers() {
        assert_eq!(format_large_number(999.4, NumberStyle::Suffix, 3), "999");
        assert_eq!(format_large_number(2.5, NumberStyle::Spaced, 3), "3");
        assert_eq!(format_large_number(-2.5, NumberStyle::Short, 3), "-2");
        assert_eq!(format_large_number(0.0, NumberStyle::Sci, 3), "0");
    }

    #[test]
    fn suffix_and_short_pick_the_largest_magnitude() {
        assert_eq!(format_large_number(1_234_567.0, NumberStyle::Suffix, 3), "1.235M");
        assert_eq!(format_large_number(1_234_567.0, NumberStyle::Short, 3), "1.235 million");
        assert_eq!(format_large_number(5e21, NumberStyle::Suffix, 1), "5.0Sx");
        assert_eq!(format_large_number(-2500.0, NumberStyle::Suffix, 2), "-2.50K");
    }

    #[test]
    fn spaced_groups_thousands() {
        assert_eq!(format_large_number(1_234_567.0, NumberStyle::Spaced, 3), "1 234 567");
        assert_eq!(format_large_number(1000.5, NumberStyle::Spaced, 3), "1 000.5");
        assert_eq!(format_large_number(-123_456.0, NumberStyle::Spaced, 3), "-123 456");
    }

    #[test]
    fn sci_uses_signed_exponent() {
        assert_eq!(format_large_number(1_234_567.0, NumberStyle::Sci, 3), "1.235e+6");
    }

    #[test]
    fn percentage_and_non_finite() {
        assert_eq!(format_large_number(0.256, NumberStyle::Percentage, 3), "25.6%");
        assert_eq!(format_large_number(f64::NAN, NumberStyle::Suffix, 3), "");
        assert_eq!(format_large_number(f64::INFINITY, NumberStyle::Spaced, 3), "");
    }
}
