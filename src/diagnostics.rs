//! Opt-in debug logging.
//!
//! `main` decides once whether diagnostics are on and hands a [`Diagnostics`]
//! value to the runner, which passes it down to every provider.

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn debug(&self, namespace: &str, message: impl AsRef<str>) {
        if self.enabled {
            tracing::debug!(namespace, "{}", message.as_ref());
        }
    }

    /// Build from the values of `CC_HUD_DEBUG` and `DEBUG`.
    pub fn from_env_values(hud_debug: Option<&str>, debug: Option<&str>) -> Self {
        let hud = matches!(hud_debug, Some("1" | "true" | "yes"));
        let generic = debug
            .map(|value| value == "*" || value.contains("cc-hud"))
            .unwrap_or(false);
        Self {
            enabled: hud || generic,
        }
    }

    /// Install a stderr subscriber. No-op when disabled, so stdout stays clean.
    pub fn install_subscriber(&self) {
        if !self.enabled {
            return;
        }
        let filter = EnvFilter::try_from_env("CC_HUD_LOG")
            .unwrap_or_else(|_| EnvFilter::new("cc_hud=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}
