pub mod constants;
pub mod env;
pub mod logger;

use rust_decimal::Decimal;

pub fn round_to_decimals(input: Decimal, decimals: u32) -> Decimal {
    input.round_dp(decimals)
}

pub fn safe_file_name(symbol: &str) -> String {
    symbol.replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_to_decimals() {
        assert_eq!(round_to_decimals(dec!(1.234567891), 6), dec!(1.234568));
        assert_eq!(round_to_decimals(dec!(10.12345), 4), dec!(10.1234));
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("BRK/B"), "BRK_B");
        assert_eq!(safe_file_name("KESKOB.HE"), "KESKOB.HE");
    }
}
