//! Transfer fee policy
//!
//! Mirrors the Token-2022 transfer fee parameters: a rate in basis points and
//! a per-transfer cap, both in base units. Quotes use floor division and are
//! clamped to the cap.

use crate::error::{FeeTokenError, FeeTokenResult};

/// 100% expressed in basis points
pub const MAX_FEE_BASIS_POINTS: u16 = 10_000;

/// Immutable token parameters, fixed at mint creation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenConfig {
    decimals: u8,
    fee_basis_points: u16,
    maximum_fee: u64,
    mint_supply: u64,
}

impl TokenConfig {
    /// Build a config from base-unit amounts
    pub fn new(
        decimals: u8,
        fee_basis_points: u16,
        maximum_fee: u64,
        mint_supply: u64,
    ) -> FeeTokenResult<Self> {
        if fee_basis_points > MAX_FEE_BASIS_POINTS {
            return Err(FeeTokenError::InvalidFeeBasisPoints(fee_basis_points));
        }
        Ok(Self {
            decimals,
            fee_basis_points,
            maximum_fee,
            mint_supply,
        })
    }

    /// Build a config from whole-token amounts
    pub fn from_ui(
        decimals: u8,
        fee_basis_points: u16,
        maximum_fee_ui: u64,
        mint_supply_ui: u64,
    ) -> FeeTokenResult<Self> {
        Self::new(
            decimals,
            fee_basis_points,
            to_base_units(maximum_fee_ui, decimals)?,
            to_base_units(mint_supply_ui, decimals)?,
        )
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn fee_basis_points(&self) -> u16 {
        self.fee_basis_points
    }

    /// Fee cap in base units
    pub fn maximum_fee(&self) -> u64 {
        self.maximum_fee
    }

    /// Initial supply in base units
    pub fn mint_supply(&self) -> u64 {
        self.mint_supply
    }

    /// Convert a whole-token amount using this token's decimals
    pub fn base_units(&self, ui_amount: u64) -> FeeTokenResult<u64> {
        to_base_units(ui_amount, self.decimals)
    }
}

/// A single transfer, in base units
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub amount: u64,
}

impl TransferRequest {
    pub fn new(amount: u64) -> Self {
        Self { amount }
    }

    /// Consume the request and quote its fee
    pub fn quote(self, config: &TokenConfig) -> FeeQuote {
        FeeQuote {
            fee: compute_fee(config, self.amount),
        }
    }
}

/// Fee owed on a transfer. Only produced by [`compute_fee`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeQuote {
    fee: u64,
}

impl FeeQuote {
    pub fn fee(&self) -> u64 {
        self.fee
    }
}

/// `min(floor(amount * bps / 10000), maximum_fee)`
pub fn compute_fee(config: &TokenConfig, amount: u64) -> u64 {
    let raw = raw_fee(amount, config.fee_basis_points);
    raw.min(config.maximum_fee)
}

/// Uncapped fee with floor rounding
pub fn raw_fee(amount: u64, fee_basis_points: u16) -> u64 {
    // u64::MAX * 10000 fits in u128, and dividing by 10000 brings it back under u64::MAX
    let raw = amount as u128 * fee_basis_points as u128 / MAX_FEE_BASIS_POINTS as u128;
    raw as u64
}

/// `ui_amount * 10^decimals` with overflow reported, never wrapped
pub fn to_base_units(ui_amount: u64, decimals: u8) -> FeeTokenResult<u64> {
    10u64
        .checked_pow(decimals as u32)
        .and_then(|scale| ui_amount.checked_mul(scale))
        .ok_or_else(|| {
            FeeTokenError::AmountOverflow(format!(
                "{} tokens at {} decimals exceeds u64",
                ui_amount, decimals
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOKEN: u64 = 1_000_000_000;

    fn config(bps: u16, cap: u64) -> TokenConfig {
        TokenConfig::new(9, bps, cap, 1_000_000 * TOKEN).unwrap()
    }

    #[test]
    fn test_fee_clamped_to_cap() {
        // 1% of 1000 tokens is 10 tokens, capped at 9
        let config = config(100, 9 * TOKEN);
        assert_eq!(compute_fee(&config, 1_000 * TOKEN), 9 * TOKEN);
    }

    #[test]
    fn test_fee_below_cap_is_raw() {
        let config = config(100, 1_000_000 * TOKEN);
        assert_eq!(compute_fee(&config, 1_000 * TOKEN), 10 * TOKEN);
    }

    #[test]
    fn test_zero_cases() {
        assert_eq!(compute_fee(&config(100, 9 * TOKEN), 0), 0);
        assert_eq!(compute_fee(&config(0, 9 * TOKEN), 1_000 * TOKEN), 0);
        assert_eq!(compute_fee(&config(10_000, 0), 1_000 * TOKEN), 0);
    }

    #[test]
    fn test_floor_rounding() {
        // 99 * 100 / 10000 = 0.99
        assert_eq!(compute_fee(&config(100, u64::MAX), 99), 0);
        assert_eq!(compute_fee(&config(100, u64::MAX), 199), 1);
    }

    #[test]
    fn test_no_overflow_at_extremes() {
        let config = config(10_000, u64::MAX);
        assert_eq!(compute_fee(&config, u64::MAX), u64::MAX);
        assert_eq!(raw_fee(u64::MAX, 5_000), u64::MAX / 2);
    }

    #[test]
    fn test_rejects_rate_above_100_percent() {
        let err = TokenConfig::new(9, 10_001, 0, 0).unwrap_err();
        assert!(matches!(err, FeeTokenError::InvalidFeeBasisPoints(10_001)));
    }

    #[test]
    fn test_from_ui_amounts() {
        let config = TokenConfig::from_ui(9, 100, 9, 1_000_000).unwrap();
        assert_eq!(config.maximum_fee(), 9 * TOKEN);
        assert_eq!(config.mint_supply(), 1_000_000 * TOKEN);
        assert_eq!(config.base_units(1_000).unwrap(), 1_000 * TOKEN);
    }

    #[test]
    fn test_from_ui_overflow() {
        let err = TokenConfig::from_ui(9, 100, 9, 20_000_000_000).unwrap_err();
        assert!(matches!(err, FeeTokenError::AmountOverflow(_)));
        assert!(to_base_units(1, 20).is_err());
        assert_eq!(to_base_units(1, 19).unwrap(), 10u64.pow(19));
    }

    #[test]
    fn test_any_decimals_in_base_units() {
        // base-unit amounts need no scaling, so large decimals are fine
        let config = TokenConfig::new(25, 100, 9, 1_000).unwrap();
        assert_eq!(config.decimals(), 25);
        assert_eq!(compute_fee(&config, 1_000), 9);

        // only the whole-token conversion overflows
        assert!(matches!(
            TokenConfig::from_ui(25, 100, 0, 0),
            Err(FeeTokenError::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_request_quoted_once_per_instance() {
        let config = config(100, 9 * TOKEN);
        let request = TransferRequest::new(500 * TOKEN);
        let copy = request.clone();
        assert_eq!(request.quote(&config), copy.quote(&config));
    }

    #[test]
    fn test_quote_from_request() {
        let config = config(100, 9 * TOKEN);
        let quote = TransferRequest::new(1_000 * TOKEN).quote(&config);
        assert_eq!(quote.fee(), 9 * TOKEN);
    }

    proptest! {
        #[test]
        fn prop_fee_bounded_by_cap_and_raw(
            amount in any::<u64>(),
            bps in 0u16..=10_000,
            cap in any::<u64>(),
        ) {
            let config = TokenConfig::new(9, bps, cap, 0).unwrap();
            let fee = compute_fee(&config, amount);
            prop_assert!(fee <= cap);
            prop_assert!(fee <= raw_fee(amount, bps));
            prop_assert!(fee <= amount);
        }

        #[test]
        fn prop_fee_is_deterministic(
            amount in any::<u64>(),
            bps in 0u16..=10_000,
            cap in any::<u64>(),
        ) {
            let config = TokenConfig::new(6, bps, cap, 0).unwrap();
            prop_assert_eq!(compute_fee(&config, amount), compute_fee(&config, amount));
        }

        #[test]
        fn prop_zero_rate_or_cap_is_free(amount in any::<u64>(), cap in any::<u64>()) {
            prop_assert_eq!(compute_fee(&TokenConfig::new(9, 0, cap, 0).unwrap(), amount), 0);
            prop_assert_eq!(compute_fee(&TokenConfig::new(9, 10_000, 0, 0).unwrap(), amount), 0);
        }
    }
}
