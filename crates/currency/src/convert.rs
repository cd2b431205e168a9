//! Cross-rate conversion math.
//!
//! All configured rates relate a currency to the company's base currency, so
//! a conversion between two arbitrary currencies is two legs: source → base,
//! then base → target. A leg is skipped when the respective currency *is* the
//! base.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bodega_core::{CurrencyId, DomainError, DomainResult};

use crate::exchange::ConversionMethod;

/// One effective leg of a conversion: the rate configuration that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeLeg {
    pub currency_id: CurrencyId,
    pub rate: Decimal,
    pub method: ConversionMethod,
}

/// Result of a cross-rate conversion, including the intermediate base amount
/// and the legs that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOutcome {
    pub original: Decimal,
    pub base_amount: Decimal,
    pub converted: Decimal,
    pub from_leg: Option<ExchangeLeg>,
    pub to_leg: Option<ExchangeLeg>,
}

/// Convert an amount of a currency into the base currency.
pub fn to_base(amount: Decimal, rate: Decimal, method: ConversionMethod) -> DomainResult<Decimal> {
    match method {
        ConversionMethod::Multiply => amount
            .checked_mul(rate)
            .ok_or_else(|| DomainError::invariant("conversion overflow")),
        ConversionMethod::Divide => {
            if rate.is_zero() {
                // Unreachable through the write path (rate > 0 is enforced
                // there), but the math stays total.
                return Err(DomainError::invariant("rate must be non-zero"));
            }
            amount
                .checked_div(rate)
                .ok_or_else(|| DomainError::invariant("conversion overflow"))
        }
    }
}

/// Convert an amount of the base currency into a currency; inverse of
/// [`to_base`] for the same rate configuration.
pub fn from_base(amount: Decimal, rate: Decimal, method: ConversionMethod) -> DomainResult<Decimal> {
    let inverse = match method {
        ConversionMethod::Multiply => ConversionMethod::Divide,
        ConversionMethod::Divide => ConversionMethod::Multiply,
    };
    to_base(amount, rate, inverse)
}

/// Convert `amount` from one currency to another through the base currency.
///
/// `from_leg`/`to_leg` are `None` when the respective currency is the base.
/// Negative amounts are rejected; a zero amount converts to zero.
pub fn convert_via_base(
    amount: Decimal,
    from_leg: Option<ExchangeLeg>,
    to_leg: Option<ExchangeLeg>,
) -> DomainResult<ConversionOutcome> {
    if amount < Decimal::ZERO {
        return Err(DomainError::validation("amount cannot be negative"));
    }

    let base_amount = match &from_leg {
        Some(leg) => to_base(amount, leg.rate, leg.method)?,
        None => amount,
    };
    let converted = match &to_leg {
        Some(leg) => from_base(base_amount, leg.rate, leg.method)?,
        None => base_amount,
    };

    Ok(ConversionOutcome {
        original: amount,
        base_amount,
        converted,
        from_leg,
        to_leg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn leg(rate: &str, method: ConversionMethod) -> ExchangeLeg {
        ExchangeLeg {
            currency_id: CurrencyId::new(),
            rate: dec(rate),
            method,
        }
    }

    #[test]
    fn multiply_to_base() {
        assert_eq!(
            to_base(dec("10"), dec("1.5"), ConversionMethod::Multiply).unwrap(),
            dec("15")
        );
    }

    #[test]
    fn divide_to_base() {
        assert_eq!(
            to_base(dec("10"), dec("4"), ConversionMethod::Divide).unwrap(),
            dec("2.5")
        );
    }

    #[test]
    fn from_base_inverts_to_base() {
        assert_eq!(
            from_base(dec("15"), dec("1.5"), ConversionMethod::Multiply).unwrap(),
            dec("10")
        );
        assert_eq!(
            from_base(dec("2.5"), dec("4"), ConversionMethod::Divide).unwrap(),
            dec("10")
        );
    }

    #[test]
    fn divide_by_zero_is_an_invariant_error() {
        let err = to_base(dec("10"), Decimal::ZERO, ConversionMethod::Divide).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn cross_conversion_goes_through_base() {
        // 10 FOO at 2 (multiply) = 20 base; 20 base at 4 (multiply) = 5 BAR.
        let outcome = convert_via_base(
            dec("10"),
            Some(leg("2", ConversionMethod::Multiply)),
            Some(leg("4", ConversionMethod::Multiply)),
        )
        .unwrap();
        assert_eq!(outcome.base_amount, dec("20"));
        assert_eq!(outcome.converted, dec("5"));
    }

    #[test]
    fn base_to_base_is_identity() {
        let outcome = convert_via_base(dec("12.34"), None, None).unwrap();
        assert_eq!(outcome.converted, dec("12.34"));
        assert_eq!(outcome.base_amount, dec("12.34"));
        assert!(outcome.from_leg.is_none() && outcome.to_leg.is_none());
    }

    #[test]
    fn base_to_currency_uses_only_the_target_leg() {
        let outcome =
            convert_via_base(dec("20"), None, Some(leg("4", ConversionMethod::Divide))).unwrap();
        // Divide-method rate: base → currency multiplies.
        assert_eq!(outcome.converted, dec("80"));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = convert_via_base(dec("-1"), None, None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn zero_amount_converts_to_zero() {
        let outcome = convert_via_base(
            Decimal::ZERO,
            Some(leg("3.7", ConversionMethod::Divide)),
            Some(leg("0.25", ConversionMethod::Multiply)),
        )
        .unwrap();
        assert_eq!(outcome.converted, Decimal::ZERO);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn rate_strategy() -> impl Strategy<Value = Decimal> {
            // Positive rates with up to 4 decimal places.
            (1i64..=10_000_000).prop_map(|n| Decimal::new(n, 4))
        }

        fn amount_strategy() -> impl Strategy<Value = Decimal> {
            (0i64..=1_000_000_000).prop_map(|n| Decimal::new(n, 2))
        }

        proptest! {
            /// Property: multiply-method round trips are exact (the true
            /// quotient is representable, so division recovers it).
            #[test]
            fn multiply_round_trip_is_exact(amount in amount_strategy(), rate in rate_strategy()) {
                let base = to_base(amount, rate, ConversionMethod::Multiply).unwrap();
                let back = from_base(base, rate, ConversionMethod::Multiply).unwrap();
                prop_assert_eq!(back, amount);
            }

            /// Property: divide-method round trips recover the amount within
            /// rounding noise (the intermediate quotient may be truncated).
            #[test]
            fn divide_round_trip_is_tight(amount in amount_strategy(), rate in rate_strategy()) {
                let base = to_base(amount, rate, ConversionMethod::Divide).unwrap();
                let back = from_base(base, rate, ConversionMethod::Divide).unwrap();
                let diff = (back - amount).abs();
                prop_assert!(diff <= Decimal::new(1, 10), "diff {diff} too large");
            }

            /// Property: the two methods are mirror images of each other.
            #[test]
            fn methods_are_inverses(amount in amount_strategy(), rate in rate_strategy()) {
                let via_multiply = to_base(amount, rate, ConversionMethod::Multiply).unwrap();
                let via_divide = from_base(amount, rate, ConversionMethod::Divide).unwrap();
                prop_assert_eq!(via_multiply, via_divide);
            }

            /// Property: conversion never produces a negative result from a
            /// non-negative amount.
            #[test]
            fn conversion_preserves_sign(
                amount in amount_strategy(),
                from_rate in rate_strategy(),
                to_rate in rate_strategy(),
            ) {
                let outcome = convert_via_base(
                    amount,
                    Some(ExchangeLeg {
                        currency_id: CurrencyId::new(),
                        rate: from_rate,
                        method: ConversionMethod::Divide,
                    }),
                    Some(ExchangeLeg {
                        currency_id: CurrencyId::new(),
                        rate: to_rate,
                        method: ConversionMethod::Multiply,
                    }),
                ).unwrap();
                prop_assert!(outcome.converted >= Decimal::ZERO);
                prop_assert!(outcome.base_amount >= Decimal::ZERO);
            }
        }
    }
}
