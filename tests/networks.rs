//! Network file handling and application config loading.

use std::fs;
use std::io::Write;

use crypto_transfer::config::{load_config, ConfigError, LogFormat, NetworkConfig, NetworkConfigStore};

#[test]
fn test_missing_file_uses_builtins_quietly() {
    let dir = tempfile::tempdir().unwrap();
    let store = NetworkConfigStore::load(dir.path().join("networks.json"));

    assert!(store.fallback_reason().is_none());
    assert_eq!(store.list().len(), 6);
    assert_eq!(store.list()[0].key, "ethereum_mainnet");
}

#[test]
fn test_malformed_file_falls_back_with_reason() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("networks.json");

    fs::write(&path, "{ this is not json").unwrap();
    let store = NetworkConfigStore::load(&path);
    assert!(store.fallback_reason().is_some());
    assert!(store.get("ethereum_sepolia").is_some());

    fs::write(&path, "{}").unwrap();
    let store = NetworkConfigStore::load(&path);
    assert!(store.fallback_reason().unwrap().contains("no networks"));

    fs::write(
        &path,
        r#"{"bad": {"name": "Bad", "rpc_url": "ftp://x", "chain_id": 0, "symbol": "B", "explorer": "x"}}"#,
    )
    .unwrap();
    let store = NetworkConfigStore::load(&path);
    let reason = store.fallback_reason().unwrap();
    assert!(reason.contains("chain_id"));
    assert!(reason.contains("rpc_url"));
    assert!(store.get("bad").is_none());
}

#[test]
fn test_file_order_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("networks.json");
    fs::write(
        &path,
        r#"{
            "zeta": {"name": "Zeta", "rpc_url": "http://z", "chain_id": 9, "symbol": "Z", "explorer": "http://z"},
            "alpha": {"name": "Alpha", "rpc_url": "http://a", "chain_id": 8, "symbol": "A", "explorer": "http://a", "decimals": 6}
        }"#,
    )
    .unwrap();

    let store = NetworkConfigStore::load(&path);
    assert!(store.fallback_reason().is_none());
    let keys: Vec<&str> = store.list().iter().map(|n| n.key.as_str()).collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
    assert_eq!(store.get("alpha").unwrap().decimals, 6);
}

#[test]
fn test_add_persists_and_reloads_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("networks.json");

    let mut store = NetworkConfigStore::load(&path);
    let local = NetworkConfig::new("", "Local Anvil", "http://127.0.0.1:8545", 31337, "ETH", "http://localhost");
    store.add("local", local).unwrap();

    let mut renamed = store.get("ethereum_mainnet").unwrap().clone();
    renamed.name = "Mainnet (custom RPC)".to_string();
    store.add("ethereum_mainnet", renamed).unwrap();

    let reloaded = NetworkConfigStore::load(&path);
    assert!(reloaded.fallback_reason().is_none());
    let keys: Vec<&str> = reloaded.list().iter().map(|n| n.key.as_str()).collect();
    assert_eq!(keys.first(), Some(&"ethereum_mainnet"));
    assert_eq!(keys.last(), Some(&"local"));
    assert_eq!(keys.len(), 7);
    assert_eq!(reloaded.get("ethereum_mainnet").unwrap().name, "Mainnet (custom RPC)");
    assert_eq!(reloaded.get("local").unwrap().chain_id, 31337);
}

#[test]
fn test_add_over_malformed_file_keeps_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("networks.json");
    fs::write(&path, "{ hand-edited, broken").unwrap();

    let mut store = NetworkConfigStore::load(&path);
    assert!(store.fallback_reason().is_some());
    let local = NetworkConfig::new("", "Local Anvil", "http://127.0.0.1:8545", 31337, "ETH", "http://localhost");
    store.add("local", local).unwrap();
    assert!(store.fallback_reason().is_none());

    let backup = dir.path().join("networks.json.bak");
    assert_eq!(fs::read_to_string(&backup).unwrap(), "{ hand-edited, broken");

    let reloaded = NetworkConfigStore::load(&path);
    assert!(reloaded.fallback_reason().is_none());
    assert_eq!(reloaded.list().len(), 7);
    assert!(reloaded.get("local").is_some());
}

#[test]
fn test_add_rejects_invalid_network() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("networks.json");
    let mut store = NetworkConfigStore::load(&path);

    let bad = NetworkConfig::new("", "Bad", "not-a-url", 5, "B", "http://b");
    let err = store.add("bad", bad).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(store.get("bad").is_none());
    assert!(!path.exists());
}

#[test]
fn test_app_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[wallet]
dir = "/srv/wallets"

[networks]
file = "/srv/networks.json"
default = "polygon_amoy"

[rpc]
timeout_secs = 4
max_gas_price_gwei = 50

[logging]
level = "debug"
format = "json"
"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.networks.default, "polygon_amoy");
    assert_eq!(config.rpc.confirmation_timeout_secs, 180);
    assert_eq!(config.logging.format, LogFormat::Json);

    let settings = config.rpc.client_settings();
    assert_eq!(settings.rpc_timeout.as_secs(), 4);
    assert_eq!(settings.max_gas_price_gwei, 50);
}
