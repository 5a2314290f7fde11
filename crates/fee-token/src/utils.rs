//! Console helpers

use solana_sdk::signature::Signature;
use url::form_urlencoded;

const EXPLORER_BASE: &str = "https://explorer.solana.com/tx";

/// Explorer link for a transaction. A `custom` cluster points the explorer
/// at `rpc_url`.
pub fn explorer_url(signature: &Signature, cluster: &str, rpc_url: &str) -> String {
    match cluster {
        "mainnet-beta" => format!("{}/{}", EXPLORER_BASE, signature),
        "custom" => {
            let encoded: String = form_urlencoded::byte_serialize(rpc_url.as_bytes()).collect();
            format!(
                "{}/{}?cluster=custom&customUrl={}",
                EXPLORER_BASE, signature, encoded
            )
        }
        other => format!("{}/{}?cluster={}", EXPLORER_BASE, signature, other),
    }
}

/// Format base units as a decimal token amount
pub fn format_amount(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u128.pow(decimals as u32);
    let whole = amount as u128 / scale;
    let fraction = amount as u128 % scale;
    format!(
        "{}.{:0width$}",
        whole,
        fraction,
        width = decimals as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_cluster_encodes_rpc_url() {
        let signature = Signature::default();
        let url = explorer_url(&signature, "custom", "http://127.0.0.1:8899");
        assert_eq!(
            url,
            format!(
                "https://explorer.solana.com/tx/{}?cluster=custom&customUrl=http%3A%2F%2F127.0.0.1%3A8899",
                signature
            )
        );
    }

    #[test]
    fn test_named_clusters() {
        let signature = Signature::default();
        assert!(explorer_url(&signature, "devnet", "").ends_with("?cluster=devnet"));
        assert!(!explorer_url(&signature, "mainnet-beta", "").contains('?'));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(9_000_000_000, 9), "9.000000000");
        assert_eq!(format_amount(1_500, 3), "1.500");
        assert_eq!(format_amount(7, 0), "7");
        assert_eq!(format_amount(u64::MAX, 19), "1.8446744073709551615");
    }
}
