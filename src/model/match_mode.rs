//! Amount-matching mode (§4.F), grounded on `original_source/app/task/transfer.go`'s
//! `amountMatch`, which branches on a global `PaymentMatchMode` config value.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMatchMode {
    /// Transfer amount must equal the order amount exactly.
    Classic,
    /// Transfer amount must start with the order amount's digits (the
    /// sender paid extra, e.g. for anti-collision padding on their end).
    HasPrefix,
    /// Transfer amount must equal the order amount once both are rounded
    /// to the tighter of the order's own precision and the trade type's
    /// standard precision.
    RoundOff,
}

impl FromStr for PaymentMatchMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(PaymentMatchMode::Classic),
            "has_prefix" => Ok(PaymentMatchMode::HasPrefix),
            "round_off" => Ok(PaymentMatchMode::RoundOff),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PaymentMatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentMatchMode::Classic => "classic",
            PaymentMatchMode::HasPrefix => "has_prefix",
            PaymentMatchMode::RoundOff => "round_off",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for mode in [PaymentMatchMode::Classic, PaymentMatchMode::HasPrefix, PaymentMatchMode::RoundOff] {
            assert_eq!(mode.to_string().parse::<PaymentMatchMode>().unwrap(), mode);
        }
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!("nonsense".parse::<PaymentMatchMode>().is_err());
    }
}
