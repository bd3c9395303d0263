//! Test configuration helpers

use asset_courier::Config;
use asset_courier::config::{DeliveryConfig, PathsConfig, StoreConfig};
use std::path::Path;

/// Bot token used by every test channel
pub const TEST_TOKEN: &str = "TESTTOKEN";

/// Chat id used by every test channel
pub const TEST_CHAT: &str = "-1001";

/// Valid configuration with all local paths under `root` and no file log
pub fn test_config(root: &Path) -> Config {
    Config {
        store: StoreConfig {
            bucket: "assets".to_string(),
            key_id: "test-key".to_string(),
            application_key: "test-secret".to_string(),
            ..Default::default()
        },
        delivery: DeliveryConfig {
            bot_token: TEST_TOKEN.to_string(),
            chat_id: TEST_CHAT.to_string(),
            ..Default::default()
        },
        paths: PathsConfig {
            staging_dir: root.join("data").join("downloaded"),
            state_file: root.join("config").join("config_public.json"),
            log_file: None,
        },
        ..Default::default()
    }
}
