//! Effective settings and the per-document settings cache.
//!
//! Settings come from two places. At startup the global value is layered from
//! optional config files over built-in defaults. When the client supports
//! scoped `workspace/configuration` requests, each document instead gets its
//! own value fetched lazily from the client and cached here; the cache entry
//! is the shared in-flight fetch, so concurrent validations of one document
//! never issue duplicate requests.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tower_lsp::lsp_types::Url;

/// The configuration namespace used for scoped client requests and for the
/// `workspace/didChangeConfiguration` payload.
pub const CONFIG_SECTION: &str = "mbdls";

fn default_max_problems() -> u32 {
    1000
}

/// The settings applicable to one open document.
///
/// Client payloads use the camelCase wire shape
/// `{ "maxNumberOfProblems": 1000 }`; config files use snake_case keys.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSettings {
    /// Cap on diagnostics published per document.
    #[serde(
        default = "default_max_problems",
        alias = "maxNumberOfProblems"
    )]
    pub max_number_of_problems: u32,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        EffectiveSettings {
            max_number_of_problems: default_max_problems(),
        }
    }
}

impl EffectiveSettings {
    /// Layer settings from the user config file and an optional workspace
    /// `.mbdls` file over the built-in defaults.
    pub fn load(root_dir: Option<&Path>) -> anyhow::Result<EffectiveSettings> {
        let expanded = shellexpand::tilde("~/.config/mbdls/settings");
        let mut builder = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .set_default("max_number_of_problems", default_max_problems() as i64)?;

        if let Some(root_dir) = root_dir {
            builder = builder.add_source(
                File::with_name(&format!(
                    "{}/.mbdls",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            );
        }

        let settings = builder.build().map_err(|err| anyhow!("Build err: {err}"))?;

        anyhow::Ok(settings.try_deserialize::<EffectiveSettings>()?)
    }

    /// Parse a settings value received from the client. Absent or malformed
    /// payloads fall back to the defaults.
    pub fn from_client_value(value: serde_json::Value) -> EffectiveSettings {
        serde_json::from_value(value).unwrap_or_default()
    }
}

type SettingsCell = Arc<OnceCell<Option<EffectiveSettings>>>;

/// Per-document settings storage.
///
/// Each entry holds the shared outcome of at most one configuration fetch. A
/// fetch that fails is cached as a miss and never retried; the entry only
/// goes away through [`SettingsCache::evict`] (document close) or
/// [`SettingsCache::invalidate_all`] (configuration change).
///
/// When the client does not support scoped configuration the per-document map
/// stays empty and [`SettingsCache::global`] is the single source of truth.
#[derive(Debug, Default)]
pub struct SettingsCache {
    global: RwLock<EffectiveSettings>,
    per_document: Mutex<HashMap<Url, SettingsCell>>,
}

impl SettingsCache {
    pub fn new(global: EffectiveSettings) -> Self {
        SettingsCache {
            global: RwLock::new(global),
            per_document: Mutex::default(),
        }
    }

    /// The process-wide settings value.
    pub async fn global(&self) -> EffectiveSettings {
        self.global.read().await.clone()
    }

    /// Replace the process-wide settings value wholesale.
    pub async fn replace_global(&self, settings: EffectiveSettings) {
        *self.global.write().await = settings;
    }

    /// Look up the settings for `uri`, running `fetch` if no fetch for this
    /// document is cached yet. Concurrent callers share one outstanding
    /// fetch. Returns `None` when the cached fetch failed.
    pub async fn get_or_fetch<F, Fut>(&self, uri: &Url, fetch: F) -> Option<EffectiveSettings>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<EffectiveSettings>>,
    {
        let cell = {
            let mut per_document = self.per_document.lock().await;
            per_document.entry(uri.clone()).or_default().clone()
        };

        cell.get_or_init(|| async {
            match fetch().await {
                Ok(settings) => Some(settings),
                Err(err) => {
                    tracing::warn!(%uri, "configuration fetch failed: {err}");
                    None
                }
            }
        })
        .await
        .clone()
    }

    /// Drop every cached per-document value, forcing a re-fetch on next
    /// access.
    pub async fn invalidate_all(&self) {
        self.per_document.lock().await.clear();
    }

    /// Drop the cached value for one document.
    pub async fn evict(&self, uri: &Url) {
        self.per_document.lock().await.remove(uri);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use serde_json::json;

    use super::*;

    fn test_uri() -> Url {
        Url::parse("file:///deck/model.mbd").expect("valid uri")
    }

    #[test]
    fn default_settings_cap_is_one_thousand() {
        assert_eq!(EffectiveSettings::default().max_number_of_problems, 1000);
    }

    #[test]
    fn client_value_parses_wire_shape() {
        let settings = EffectiveSettings::from_client_value(json!({ "maxNumberOfProblems": 25 }));
        assert_eq!(settings.max_number_of_problems, 25);
    }

    #[test]
    fn absent_or_malformed_client_value_falls_back_to_defaults() {
        assert_eq!(
            EffectiveSettings::from_client_value(serde_json::Value::Null),
            EffectiveSettings::default()
        );
        assert_eq!(
            EffectiveSettings::from_client_value(json!({ "maxNumberOfProblems": "many" })),
            EffectiveSettings::default()
        );
    }

    #[test]
    fn workspace_file_overrides_defaults() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        fs::write(
            temp_dir.path().join(".mbdls.toml"),
            "max_number_of_problems = 7\n",
        )
        .expect("write config");

        let settings = EffectiveSettings::load(Some(temp_dir.path())).expect("load");
        assert_eq!(settings.max_number_of_problems, 7);
    }

    #[test]
    fn load_without_root_uses_defaults() {
        let settings = EffectiveSettings::load(None).expect("load");
        assert_eq!(settings.max_number_of_problems, 1000);
    }

    #[tokio::test]
    async fn global_value_is_replaced_wholesale() {
        let cache = SettingsCache::default();
        assert_eq!(cache.global().await.max_number_of_problems, 1000);

        cache
            .replace_global(EffectiveSettings {
                max_number_of_problems: 3,
            })
            .await;
        assert_eq!(cache.global().await.max_number_of_problems, 3);
    }

    #[tokio::test]
    async fn repeated_lookups_share_one_fetch() {
        let cache = SettingsCache::default();
        let uri = test_uri();
        let fetches = AtomicUsize::new(0);

        for _ in 0..3 {
            let settings = cache
                .get_or_fetch(&uri, || async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(EffectiveSettings {
                        max_number_of_problems: 42,
                    })
                })
                .await;
            assert_eq!(settings.map(|it| it.max_number_of_problems), Some(42));
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_fetch() {
        let cache = SettingsCache::default();
        let uri = test_uri();
        let fetches = AtomicUsize::new(0);

        let fetch = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(EffectiveSettings::default())
        };
        let (first, second) = tokio::join!(
            cache.get_or_fetch(&uri, fetch),
            cache.get_or_fetch(&uri, || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(EffectiveSettings::default())
            })
        );

        assert!(first.is_some());
        assert!(second.is_some());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_cached_and_never_retried() {
        let cache = SettingsCache::default();
        let uri = test_uri();
        let fetches = AtomicUsize::new(0);

        let settings = cache
            .get_or_fetch(&uri, || async { Err(anyhow!("client went away")) })
            .await;
        assert!(settings.is_none());

        // The miss is sticky: the second fetch closure must never run.
        let settings = cache
            .get_or_fetch(&uri, || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(EffectiveSettings::default())
            })
            .await;
        assert!(settings.is_none());
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn eviction_forces_a_fresh_fetch() {
        let cache = SettingsCache::default();
        let uri = test_uri();
        let fetches = AtomicUsize::new(0);

        let fetch = |cap: u32| {
            let fetches = &fetches;
            move || async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(EffectiveSettings {
                    max_number_of_problems: cap,
                })
            }
        };

        let first = cache.get_or_fetch(&uri, fetch(1)).await;
        cache.evict(&uri).await;
        let second = cache.get_or_fetch(&uri, fetch(2)).await;

        assert_eq!(first.map(|it| it.max_number_of_problems), Some(1));
        assert_eq!(second.map(|it| it.max_number_of_problems), Some(2));
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_clears_every_entry() {
        let cache = SettingsCache::default();
        let uri = test_uri();
        let fetches = AtomicUsize::new(0);

        let fetch = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(EffectiveSettings::default())
        };
        cache.get_or_fetch(&uri, fetch).await;
        cache.invalidate_all().await;
        cache
            .get_or_fetch(&uri, || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(EffectiveSettings::default())
            })
            .await;

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}
