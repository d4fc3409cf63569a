//! Works out which remote directory the host page is showing.
//!
//! State lifecycle: one [`DirectoryResolver`] is created at startup and
//! owned by the control flow. It holds the single-slot id cache and the id
//! seen on the most recent list-API request, each kept for the cache TTL. A
//! navigation change clears both before the next resolution runs.

pub mod cache;
pub mod snapshot;
pub mod strategies;

use std::time::Duration;
use tracing::{debug, info};

use crate::config::ResolverConfig;
use crate::host::HostPage;

pub use cache::{DirectoryIdCache, DirectoryIdCacheEntry};
pub use snapshot::{NavigationSnapshot, PageSnapshot};
pub use strategies::{
    default_strategies, is_plausible_id, is_well_formed_id, ResolutionContext,
    ResolutionStrategy,
};

const LIST_API_MARKER: &str = "clouddrive/file";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub id: String,
    /// `"cache"` or the name of the strategy that produced the id.
    pub source: &'static str,
}

pub struct DirectoryResolver {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    cache: DirectoryIdCache,
    /// Expires like the cache: a list request seen long ago no longer
    /// describes the page.
    intercepted: DirectoryIdCache,
    location: Option<String>,
    refresh_delay: Duration,
}

impl std::fmt::Debug for DirectoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("DirectoryResolver")
            .field("strategies", &names)
            .field("cache", &self.cache)
            .field("intercepted", &self.intercepted)
            .field("location", &self.location)
            .finish()
    }
}

impl Default for DirectoryResolver {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

impl DirectoryResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self::with_strategies(config, default_strategies())
    }

    pub fn with_strategies(
        config: &ResolverConfig,
        strategies: Vec<Box<dyn ResolutionStrategy>>,
    ) -> Self {
        Self {
            strategies,
            cache: DirectoryIdCache::new(Duration::from_secs(config.cache_ttl_secs)),
            intercepted: DirectoryIdCache::new(Duration::from_secs(config.cache_ttl_secs)),
            location: None,
            refresh_delay: Duration::from_millis(config.navigation_refresh_delay_ms),
        }
    }

    /// Record an outgoing request made by the page. Only list-API requests
    /// carrying a non-root directory id are kept.
    pub fn observe_request(&mut self, request_url: &str) {
        if !request_url.contains(LIST_API_MARKER) {
            return;
        }
        let Some(query) = request_url.split_once('?').map(|(_, q)| q) else {
            return;
        };
        let query = query.split('#').next().unwrap_or_default();
        let dir_id = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == strategies::DIR_ID_PARAM)
            .map(|(_, value)| value.into_owned());

        if let Some(dir_id) = dir_id.filter(|id| !id.is_empty() && id != "0") {
            if self.intercepted.get() != Some(dir_id.as_str()) {
                debug!("Observed list request for directory {}", dir_id);
            }
            self.intercepted.store(&dir_id);
        }
    }

    /// Note the page's current location. A change drops the cached id and
    /// the intercepted id; returns whether the location changed.
    pub fn navigate(&mut self, navigation: &NavigationSnapshot) -> bool {
        if self.location.as_deref() == Some(navigation.href()) {
            return false;
        }
        let first_visit = self.location.is_none();
        self.location = Some(navigation.href().to_string());
        if !first_visit {
            info!("Location changed to {}; clearing cached directory id", navigation.href());
        }
        self.cache.invalidate();
        self.intercepted.invalidate();
        true
    }

    /// Forget the cached id so the next resolution runs the full cascade.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub fn cached(&mut self) -> Option<&str> {
        self.cache.get()
    }

    /// Run the cascade against explicit snapshots. `None` means every
    /// strategy came up empty, which callers must treat as a normal outcome.
    pub fn resolve(
        &mut self,
        navigation: &NavigationSnapshot,
        page: &PageSnapshot,
    ) -> Option<Resolution> {
        if let Some(id) = self.cache.get() {
            debug!("Using cached directory id {}", id);
            return Some(Resolution {
                id: id.to_string(),
                source: "cache",
            });
        }

        let intercepted = self.intercepted.get().map(str::to_string);
        let ctx = ResolutionContext {
            navigation,
            page,
            intercepted: intercepted.as_deref(),
        };

        let hit = self.strategies.iter().find_map(|strategy| {
            let found = strategy.resolve(&ctx).filter(|id| is_plausible_id(id));
            match &found {
                Some(id) => debug!("Strategy {} resolved directory id {}", strategy.name(), id),
                None => debug!("Strategy {} found nothing", strategy.name()),
            }
            found.map(|id| (id, strategy.name(), strategy.cacheable()))
        });

        match hit {
            Some((id, source, cacheable)) => {
                if cacheable {
                    self.cache.store(&id);
                }
                Some(Resolution { id, source })
            }
            None => {
                debug!("No strategy could resolve the current directory id");
                None
            }
        }
    }

    /// Sync with the host's location, then resolve against its current state.
    pub fn resolve_on(&mut self, host: &dyn HostPage) -> Option<Resolution> {
        let navigation = host.navigation();
        self.navigate(&navigation);
        let page = host.page_snapshot();
        self.resolve(&navigation, &page)
    }

    /// React to a navigation event: clear state at once, then let the page
    /// settle and resolve again. Returns `None` when the location did not change.
    pub async fn follow_navigation(&mut self, host: &dyn HostPage) -> Option<Resolution> {
        if !self.navigate(&host.navigation()) {
            return None;
        }
        tokio::time::sleep(self.refresh_delay).await;
        self.resolve_on(host)
    }
}
