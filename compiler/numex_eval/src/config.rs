//! Per-call evaluation configuration and the process-wide math backend.

use std::sync::OnceLock;

/// Default bound on the number of runs a ragged `sum` may be split into.
pub const DEFAULT_SUM_RUN_LIMIT: usize = 8;

/// Accuracy of `float32` transcendental functions.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum UlpMode {
    /// Computed in `float64`, then rounded (about 1 ulp).
    #[default]
    Precise,
    /// Computed in `float32` (up to about 3.5 ulp).
    Relaxed,
}

impl UlpMode {
    /// Parse the `NUMEX_ULP` spelling: `1` or `3.5`.
    pub fn parse(value: &str) -> Option<UlpMode> {
        match value.trim() {
            "1" | "1.0" => Some(UlpMode::Precise),
            "3.5" => Some(UlpMode::Relaxed),
            _ => None,
        }
    }
}

/// How elementwise float math walks its operands.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MathBackend {
    /// One element at a time.
    Scalar,
    /// Fixed-width lanes the compiler can vectorize.
    Lanes,
}

static DETECTED_BACKEND: OnceLock<MathBackend> = OnceLock::new();

/// The backend this machine supports, detected once per process.
pub fn detected_backend() -> MathBackend {
    *DETECTED_BACKEND.get_or_init(|| {
        let backend = detect();
        tracing::debug!(?backend, "selected math backend");
        backend
    })
}

#[cfg(target_arch = "x86_64")]
fn detect() -> MathBackend {
    if std::arch::is_x86_feature_detected!("avx2") {
        MathBackend::Lanes
    } else {
        MathBackend::Scalar
    }
}

#[cfg(target_arch = "aarch64")]
fn detect() -> MathBackend {
    MathBackend::Lanes
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect() -> MathBackend {
    MathBackend::Scalar
}

/// Evaluation settings, passed explicitly to every evaluate call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct EvalConfig {
    /// Force the scalar math backend.
    pub disable_simd: bool,
    pub ulp_mode: UlpMode,
    /// Most runs a ragged block may be split into for a root `sum` before
    /// the engine packs instead.
    pub sum_run_limit: usize,
    /// Always take the pack/scatter path for ragged blocks (testing).
    pub force_pack: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            disable_simd: false,
            ulp_mode: UlpMode::Precise,
            sum_run_limit: DEFAULT_SUM_RUN_LIMIT,
            force_pack: false,
        }
    }
}

impl EvalConfig {
    /// Defaults overridden by `NUMEX_DISABLE_SIMD`, `NUMEX_ULP` and
    /// `NUMEX_SUM_RUN_LIMIT`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = EvalConfig::default();
        if let Some(value) = lookup("NUMEX_DISABLE_SIMD") {
            config.disable_simd = !matches!(value.trim(), "" | "0" | "false");
        }
        if let Some(mode) = lookup("NUMEX_ULP").as_deref().and_then(UlpMode::parse) {
            config.ulp_mode = mode;
        }
        if let Some(limit) = lookup("NUMEX_SUM_RUN_LIMIT").and_then(|v| v.trim().parse().ok()) {
            config.sum_run_limit = limit;
        }
        config
    }

    #[must_use]
    pub fn with_ulp_mode(mut self, ulp_mode: UlpMode) -> Self {
        self.ulp_mode = ulp_mode;
        self
    }

    /// The backend in effect for this configuration.
    pub fn backend(&self) -> MathBackend {
        if self.disable_simd {
            MathBackend::Scalar
        } else {
            detected_backend()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn environment_overrides() {
        let config = EvalConfig::from_lookup(lookup(&[
            ("NUMEX_DISABLE_SIMD", "1"),
            ("NUMEX_ULP", "3.5"),
            ("NUMEX_SUM_RUN_LIMIT", "32"),
        ]));
        assert!(config.disable_simd);
        assert_eq!(config.ulp_mode, UlpMode::Relaxed);
        assert_eq!(config.sum_run_limit, 32);
        assert_eq!(config.backend(), MathBackend::Scalar);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = EvalConfig::from_lookup(lookup(&[
            ("NUMEX_DISABLE_SIMD", "0"),
            ("NUMEX_ULP", "2"),
            ("NUMEX_SUM_RUN_LIMIT", "many"),
        ]));
        assert_eq!(config, EvalConfig::default());
    }

    #[test]
    fn detection_is_stable() {
        assert_eq!(detected_backend(), detected_backend());
    }
}
