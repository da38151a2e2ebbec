use std::time::Duration;

use serde::Deserialize;

/// SSE delivery pacing
///
/// Backend responses arrive in one piece; pacing spreads the translated
/// deltas out with a random delay in `0..=max_delay` before each one.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamingConfig {
    #[serde(default = "default_pacing")]
    pub pacing: bool,
    #[serde(default = "default_max_delay", with = "crate::duration")]
    pub max_delay: Duration,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            pacing: default_pacing(),
            max_delay: default_max_delay(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_pacing() -> bool {
    true
}

const fn default_max_delay() -> Duration {
    Duration::from_millis(300)
}
