//! Float-syntax rate adjustment grammar and its rounding helper, grounded on
//! `original_source/app/model/rate.go`'s `ParseFloatRate`/`round`.
//!
//! Grammar: empty string passes the raw rate through unchanged; a bare
//! number is a literal override; otherwise the string must match
//! `^[~+\-]\d+(\.\d+)?$` — `~k` multiplies, `+k` adds, `-k` subtracts. An
//! unrecognized syntax logs an error and yields 0 so downstream consumers
//! fall back to the raw rate (§7).

/// `round_half_up(v, p)` per §4.J/§8 property 6: floor-scaled half-up,
/// explicitly signed (not magnitude-symmetric) — `round_half_up(-0.5, 0) ==
/// 0`, not `-1`, because the formula floors the scaled value before
/// dividing back down rather than rounding the absolute magnitude.
pub fn round_half_up(v: f64, p: i32) -> f64 {
    if p >= 0 {
        let scale = 10f64.powi(p);
        (v * scale + 0.5).floor() / scale
    } else {
        let scale = 10f64.powi(p);
        (v * scale + 0.5).floor() * 10f64.powi(-p)
    }
}

fn round4(v: f64) -> f64 {
    round_half_up(v, 4)
}

/// Apply a float-syntax adjustment to a raw rate.
pub fn apply_float_syntax(syntax: &str, raw: f64) -> f64 {
    let syntax = syntax.trim();
    if syntax.is_empty() {
        return raw;
    }

    let Some(op) = syntax.chars().next() else {
        return raw;
    };
    if !matches!(op, '~' | '+' | '-') {
        return syntax.parse::<f64>().unwrap_or_else(|_| {
            tracing::error!(syntax, "unrecognized rate float syntax");
            0.0
        });
    }

    let Ok(operand) = syntax[1..].parse::<f64>() else {
        tracing::error!(syntax, "unrecognized rate float syntax");
        return 0.0;
    };

    match op {
        '~' => round4(raw * operand),
        '+' => round4(raw + operand),
        '-' => round4(raw - operand),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_syntax_passes_raw_through() {
        assert_eq!(apply_float_syntax("", 7.2), 7.2);
    }

    #[test]
    fn bare_numeric_syntax_is_a_literal_override() {
        assert_eq!(apply_float_syntax("1.5", 7.2), 1.5);
    }

    #[test]
    fn multiply_syntax_rounds_to_4dp() {
        assert_eq!(apply_float_syntax("~1", 7.23456), round4(7.23456));
    }

    #[test]
    fn add_syntax_rounds_to_4dp() {
        assert_eq!(apply_float_syntax("+0.1", 7.2), round4(7.3));
    }

    #[test]
    fn invalid_syntax_yields_zero() {
        assert_eq!(apply_float_syntax("garbage", 7.2), 0.0);
    }

    #[test]
    fn round_half_up_property_6() {
        assert_eq!(round_half_up(0.5, 0), 1.0);
        assert_eq!(round_half_up(1.5, 0), 2.0);
        assert_eq!(round_half_up(-0.5, 0), 0.0);
    }

    #[test]
    fn cnye_scenario_s6_adjustment_leg() {
        // USDC/CNY raw=7.2, syntax="+0.05" -> adjusted 7.25
        assert_eq!(apply_float_syntax("+0.05", 7.2), 7.25);
    }
}
