use mb_contract::{DEFAULT_CONTRACT_ADDRESS, parse_contract_address};
use mb_types::ContractAddress;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub contract_address: ContractAddress,
    /// Bound on requests the wallet answers without prompting the user
    /// (`eth_accounts`, `eth_call`). `None` waits forever.
    pub call_timeout: Option<Duration>,
    /// Bound on waiting for a write to be mined. `None` waits forever.
    pub confirmation_timeout: Option<Duration>,
    pub receipt_poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            contract_address: ContractAddress(DEFAULT_CONTRACT_ADDRESS.to_owned()),
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
            confirmation_timeout: Some(DEFAULT_CONFIRMATION_TIMEOUT),
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        }
    }
}

impl BridgeConfig {
    /// Reads `MSGBRIDGE_*` overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Unparsable values keep the default.
    ///
    /// Timeouts of `0` disable the bound.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("MSGBRIDGE_CONTRACT_ADDRESS") {
            match parse_contract_address(&raw) {
                Ok(address) => config.contract_address = address,
                Err(err) => warn!("ignoring MSGBRIDGE_CONTRACT_ADDRESS: {err}"),
            }
        }
        if let Some(secs) = parse_u64(&lookup, "MSGBRIDGE_CALL_TIMEOUT_SECS") {
            config.call_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = parse_u64(&lookup, "MSGBRIDGE_CONFIRM_TIMEOUT_SECS") {
            config.confirmation_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(ms) = parse_u64(&lookup, "MSGBRIDGE_POLL_INTERVAL_MS") {
            config.receipt_poll_interval = Duration::from_millis(ms.max(1));
        }

        config
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring non-numeric {key}={raw}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        assert_eq!(BridgeConfig::from_lookup(lookup(&[])), BridgeConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = BridgeConfig::from_lookup(lookup(&[
            ("MSGBRIDGE_CONTRACT_ADDRESS", "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512"),
            ("MSGBRIDGE_CALL_TIMEOUT_SECS", "5"),
            ("MSGBRIDGE_CONFIRM_TIMEOUT_SECS", "0"),
            ("MSGBRIDGE_POLL_INTERVAL_MS", "250"),
        ]));

        assert_eq!(
            config.contract_address,
            ContractAddress("0xe7f1725e7734ce288f8367e1bb143e90bb3f0512".to_owned())
        );
        assert_eq!(config.call_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.confirmation_timeout, None);
        assert_eq!(config.receipt_poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = BridgeConfig::from_lookup(lookup(&[
            ("MSGBRIDGE_CONTRACT_ADDRESS", "not-an-address"),
            ("MSGBRIDGE_CALL_TIMEOUT_SECS", "soon"),
        ]));

        assert_eq!(config, BridgeConfig::default());
    }
}
