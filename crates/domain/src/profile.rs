//! Light profile: what a set of lights does once a rule selects it.
//!
//! The rule engine treats profiles as opaque names; only their existence is
//! checked.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightProfile {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness_pct: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}
