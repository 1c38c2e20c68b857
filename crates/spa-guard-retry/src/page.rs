// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

use std::time::Duration;

use url::Url;

/// Abstracts the browsing context the orchestrator observes and ultimately
/// navigates away from.
///
/// In a real deployment this is backed by `window.location` and
/// `performance.timeOrigin`; tests and the `spa-guard-cache`/server side of
/// this workspace never need a real browser, so they implement this trait
/// against an in-memory [`Url`] instead. This is the same seam
/// [`spa_guard_clock::Clock`] provides for time: one trait, a production
/// implementation, and a fully controllable test implementation.
pub trait PageEnvironment: Send + Sync + std::fmt::Debug {
    /// The current page URL, including any retry-state query parameters.
    fn current_url(&self) -> Url;

    /// How long ago this document's navigation started.
    fn time_since_navigation_start(&self) -> Duration;

    /// Replaces the browsing context's location with `url`. In a browser this
    /// ends the page's JavaScript process; callers must treat this as the
    /// last action the orchestrator performs for its current script instance.
    fn navigate(&self, url: &Url);

    /// Rewrites the address bar to `url` without reloading, i.e.
    /// `history.replaceState`. Used to scrub retry query parameters once a
    /// boot has been classified as healthy.
    fn replace_url(&self, url: &Url);
}

/// A [`PageEnvironment`] for tests: a fixed URL, a fixed navigation age, and
/// navigations recorded for assertions instead of actually happening.
#[derive(Debug, Default)]
pub struct FakePage {
    url: parking_lot::Mutex<Url>,
    navigation_age: parking_lot::Mutex<Duration>,
    navigations: parking_lot::Mutex<Vec<Url>>,
    replacements: parking_lot::Mutex<Vec<Url>>,
}

impl FakePage {
    /// Creates a fake page at `url`, freshly navigated (age zero).
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: parking_lot::Mutex::new(Url::parse(url).expect("valid test URL")),
            navigation_age: parking_lot::Mutex::new(Duration::ZERO),
            navigations: parking_lot::Mutex::new(Vec::new()),
            replacements: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Sets how long ago this page's navigation happened, for testing the
    /// staleness check in the first-trigger boot logic.
    pub fn set_navigation_age(&self, age: Duration) {
        *self.navigation_age.lock() = age;
    }

    /// Returns every URL passed to [`PageEnvironment::navigate`], in order.
    #[must_use]
    pub fn navigations(&self) -> Vec<Url> {
        self.navigations.lock().clone()
    }

    /// Returns every URL passed to [`PageEnvironment::replace_url`], in order.
    #[must_use]
    pub fn replacements(&self) -> Vec<Url> {
        self.replacements.lock().clone()
    }
}

impl PageEnvironment for FakePage {
    fn current_url(&self) -> Url {
        self.url.lock().clone()
    }

    fn time_since_navigation_start(&self) -> Duration {
        *self.navigation_age.lock()
    }

    fn navigate(&self, url: &Url) {
        self.navigations.lock().push(url.clone());
    }

    fn replace_url(&self, url: &Url) {
        *self.url.lock() = url.clone();
        self.replacements.lock().push(url.clone());
    }
}
