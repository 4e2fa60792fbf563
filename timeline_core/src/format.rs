use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::OnceLock;

pub const DEFAULT_EXPLORER_BASE_URL: &str = "https://etherscan.io";

const WEI_PER_ETH_EXP: u32 = 18;

fn address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex is valid"))
}

/// `0x` followed by exactly 40 hex characters
pub fn is_evm_address(input: &str) -> bool {
    address_regex().is_match(input)
}

/// Wei to ETH, rounded to 6 decimal places
pub fn format_eth_from_wei(wei: u128) -> Decimal {
    // Decimal holds 96-bit mantissas; anything larger is far beyond any real sale
    let mantissa = i128::try_from(wei).unwrap_or(i128::MAX);
    match Decimal::try_from_i128_with_scale(mantissa, WEI_PER_ETH_EXP) {
        Ok(eth) => eth
            .round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
            .normalize(),
        Err(_) => {
            let whole = Decimal::from_i128_with_scale(mantissa / 10i128.pow(WEI_PER_ETH_EXP), 0);
            whole.normalize()
        }
    }
}

/// `0x1234...abcd`, or "Unknown" for an empty address
pub fn trim_address(address: &str) -> String {
    if address.is_empty() {
        return "Unknown".to_string();
    }
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Cut `input` to `length` characters and mark the cut with "..."
pub fn truncate(input: &str, length: usize) -> String {
    if input.chars().count() > length {
        let cut: String = input.chars().take(length).collect();
        format!("{}...", cut)
    } else {
        input.to_string()
    }
}

/// Block-explorer link for a transaction hash
pub fn explorer_tx_url(base_url: &str, transaction_hash: &str) -> String {
    format!("{}/tx/{}", base_url.trim_end_matches('/'), transaction_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_address_validation() {
        assert!(is_evm_address("0x742d35cc6131b2f6e7f4c3b5e8a8c8d8f0b4c4e3"));
        assert!(is_evm_address("0x742D35CC6131B2F6E7F4C3B5E8A8C8D8F0B4C4E3"));
        assert!(!is_evm_address("742d35cc6131b2f6e7f4c3b5e8a8c8d8f0b4c4e3"));
        assert!(!is_evm_address("0x742d35cc6131b2f6e7f4c3b5e8a8c8d8f0b4c4"));
        assert!(!is_evm_address("0x742d35cc6131b2f6e7f4c3b5e8a8c8d8f0b4c4g3"));
        assert!(!is_evm_address("vitalik.eth"));
    }

    #[test]
    fn test_format_eth_from_wei() {
        assert_eq!(format_eth_from_wei(1_000_000_000_000_000_000), Decimal::ONE);
        assert_eq!(
            format_eth_from_wei(1_234_567_890_000_000_000),
            Decimal::from_str("1.234568").unwrap()
        );
        assert_eq!(
            format_eth_from_wei(25_000_000_000_000_000_000),
            Decimal::from(25)
        );
        assert_eq!(format_eth_from_wei(0), Decimal::ZERO);
        assert_eq!(format_eth_from_wei(400), Decimal::ZERO);
    }

    #[test]
    fn test_trim_address() {
        assert_eq!(
            trim_address("0x742d35cc6131b2f6e7f4c3b5e8a8c8d8f0b4c4e3"),
            "0x742d...c4e3"
        );
        assert_eq!(trim_address(""), "Unknown");
        assert_eq!(trim_address("0xabc"), "0xabc");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Bored Ape Yacht Club", 5), "Bored...");
        assert_eq!(truncate("Apes", 5), "Apes");
    }

    #[test]
    fn test_explorer_url() {
        assert_eq!(
            explorer_tx_url("https://etherscan.io/", "0xabc"),
            "https://etherscan.io/tx/0xabc"
        );
    }
}
