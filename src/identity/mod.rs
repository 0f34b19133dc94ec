// src/identity/mod.rs

//! Device identity: a stable per-installation identifier plus a capability
//! descriptor. Created once on first run and never deleted programmatically;
//! every memory key is namespaced by it. Only `last_seen` and the
//! capability flags are refreshed on subsequent loads.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::KeyValueStore;

/// Storage key for the identity record. Deliberately outside the per-device
/// namespace: the identity is what establishes the namespace.
const IDENTITY_KEY: &str = "orion_identity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Desktop,
    Mobile,
    Web,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub network: bool,
    pub storage: bool,
    pub audio: bool,
    pub camera: bool,
}

/// Capability collaborator: supplies the flags at identity-creation time
/// (and on refresh). Read-only to the core.
pub trait CapabilityProbe: Send + Sync {
    fn probe(&self) -> DeviceCapabilities;
}

/// Conservative probe for a headless host: network and disk assumed,
/// audio and camera not.
pub struct HostProbe;

impl CapabilityProbe for HostProbe {
    fn probe(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            network: true,
            storage: true,
            audio: false,
            camera: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub id: String,
    pub kind: DeviceKind,
    pub capabilities: DeviceCapabilities,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Load the identity from the store, or create and persist a fresh one.
/// A corrupt record is replaced rather than propagated; persistence failures
/// degrade to an in-memory identity so startup never fails here.
pub fn get_or_create(kv: &dyn KeyValueStore, probe: &dyn CapabilityProbe) -> DeviceIdentity {
    match kv.get(IDENTITY_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<DeviceIdentity>(&raw) {
            Ok(mut identity) => {
                identity.last_seen = Utc::now();
                identity.capabilities = probe.probe();
                save(kv, &identity);
                return identity;
            }
            Err(e) => warn!("corrupt identity record ({}); creating a new one", e),
        },
        Ok(None) => {}
        Err(e) => warn!("failed to load identity ({}); creating a new one", e),
    }

    let identity = DeviceIdentity {
        id: generate_device_id(),
        kind: DeviceKind::Desktop,
        capabilities: probe.probe(),
        created_at: Utc::now(),
        last_seen: Utc::now(),
    };
    save(kv, &identity);
    info!("created device identity {}", identity.id);
    identity
}

fn save(kv: &dyn KeyValueStore, identity: &DeviceIdentity) {
    match serde_json::to_string(identity) {
        Ok(raw) => {
            if let Err(e) = kv.set(IDENTITY_KEY, &raw) {
                warn!("failed to persist identity: {}", e);
            }
        }
        Err(e) => warn!("failed to serialize identity: {}", e),
    }
}

/// Ids look like `orion_<base36 millis>_<9 random base36 chars>`.
fn generate_device_id() -> String {
    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    format!("orion_{}_{}", to_base36(Utc::now().timestamp_millis().max(0) as u64), suffix)
}

fn to_base36(mut n: u64) -> String {
    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(CHARSET[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
