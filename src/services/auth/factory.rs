/// Factory: build the DPoP services from application `Config`.
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::services::auth::error::PopError;
use crate::services::auth::gateway::PopGateway;
use crate::services::auth::keys::KeyMaterial;
use crate::services::auth::replay::{
    MemoryReplayStore, ReplayError, ReplayStore, ValkeyReplayStore,
};

/// Key files are read here, once; any failure is fatal for startup.
pub fn build_pop_gateway(config: &Config) -> Result<Arc<PopGateway>, PopError> {
    let keys = KeyMaterial::load(&config.private_key_path, &config.public_key_path)?;
    Ok(Arc::new(PopGateway::new(Arc::new(keys))))
}

/// `None` when replay protection is switched off.
pub async fn build_replay_store(
    config: &Config,
) -> Result<Option<Arc<dyn ReplayStore>>, ReplayError> {
    if !config.replay_protection {
        warn!("DPoP replay protection is disabled");
        return Ok(None);
    }

    let store: Arc<dyn ReplayStore> = match config.valkey_url.as_deref() {
        Some(url) => Arc::new(ValkeyReplayStore::connect(url).await?),
        None => Arc::new(MemoryReplayStore::new()),
    };
    info!(backend = store.backend_name(), "DPoP replay protection enabled");

    Ok(Some(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testing::server_key_pems;

    fn config(vars: Vec<(&'static str, String)>) -> Config {
        Config::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn missing_key_files_are_key_material_missing() {
        let dir = std::env::temp_dir().join(format!("fare-api-{}", uuid::Uuid::new_v4()));
        let c = config(vec![
            ("DPOP_PRIVATE_KEY_PATH", dir.join("private.pem").display().to_string()),
            ("DPOP_PUBLIC_KEY_PATH", dir.join("public.pem").display().to_string()),
        ]);

        assert_eq!(
            build_pop_gateway(&c).unwrap_err(),
            PopError::KeyMaterialMissing
        );
    }

    #[test]
    fn builds_gateway_from_key_files() {
        let dir = std::env::temp_dir().join(format!("fare-api-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let (private_pem, public_pem) = server_key_pems();
        std::fs::write(dir.join("private.pem"), private_pem).unwrap();
        std::fs::write(dir.join("public.pem"), public_pem).unwrap();

        let c = config(vec![
            ("DPOP_PRIVATE_KEY_PATH", dir.join("private.pem").display().to_string()),
            ("DPOP_PUBLIC_KEY_PATH", dir.join("public.pem").display().to_string()),
        ]);
        assert!(build_pop_gateway(&c).is_ok());

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn replay_store_follows_config() {
        let off = config(vec![("DPOP_REPLAY_PROTECTION", "false".into())]);
        assert!(build_replay_store(&off).await.unwrap().is_none());

        let memory = config(vec![]);
        let store = build_replay_store(&memory).await.unwrap().unwrap();
        assert_eq!(store.backend_name(), "memory");
    }
}
