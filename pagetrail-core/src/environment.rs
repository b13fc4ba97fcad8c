//! Environment provider
//!
//! The event factory reads the hosting page's environment fresh on every
//! record. Hosts implement [`Environment`]; [`StaticEnvironment`] is the
//! implementation used by native hosts, the CLI and tests.

use serde::{Deserialize, Serialize};

/// Environment context merged into every event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentContext {
    pub user_agent: String,
    /// `{width}x{height}` of the screen
    pub screen_resolution: String,
    /// `{width}x{height}` of the viewport
    pub viewport_size: String,
    pub language: String,
    pub timezone: String,
    /// Referring URL, or `direct` when there is none
    pub referrer: String,
}

/// Where the page currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLocation {
    /// Full URL of the page
    pub href: String,
    /// Path component, used as the pageview target
    pub pathname: String,
    pub title: String,
}

/// Describes the current page and its runtime environment.
pub trait Environment: Send + Sync {
    /// Current environment context (user agent, sizes, locale, referrer)
    fn context(&self) -> EnvironmentContext;

    /// Current page location and title
    fn location(&self) -> PageLocation;

    /// Duration between navigation start and the end of the load event
    fn load_time_ms(&self) -> u64;
}

/// An [`Environment`] whose values are set by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticEnvironment {
    pub user_agent: String,
    pub screen: (u32, u32),
    pub viewport: (u32, u32),
    pub language: String,
    pub timezone: String,
    pub referrer: Option<String>,
    pub href: String,
    pub title: String,
    pub load_time_ms: u64,
}

impl Default for StaticEnvironment {
    fn default() -> Self {
        Self {
            user_agent: format!("pagetrail/{}", env!("CARGO_PKG_VERSION")),
            screen: (1920, 1080),
            viewport: (1280, 720),
            language: "en-US".to_string(),
            timezone: "UTC".to_string(),
            referrer: None,
            href: "about:blank".to_string(),
            title: String::new(),
            load_time_ms: 0,
        }
    }
}

impl StaticEnvironment {
    /// Environment for a page at `href`
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Default::default()
        }
    }

    /// Environment for a page at `href`, with locale read from `LANG` and
    /// timezone read from `TZ`.
    pub fn from_system(href: impl Into<String>) -> Self {
        let mut env = Self::new(href);
        if let Some(language) = std::env::var("LANG")
            .ok()
            .and_then(|lang| language_tag(&lang))
        {
            env.language = language;
        }
        if let Ok(tz) = std::env::var("TZ") {
            let tz = tz.trim_start_matches(':').trim();
            if !tz.is_empty() {
                env.timezone = tz.to_string();
            }
        }
        env
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }

    pub fn with_load_time_ms(mut self, load_time_ms: u64) -> Self {
        self.load_time_ms = load_time_ms;
        self
    }
}

impl Environment for StaticEnvironment {
    fn context(&self) -> EnvironmentContext {
        EnvironmentContext {
            user_agent: self.user_agent.clone(),
            screen_resolution: format!("{}x{}", self.screen.0, self.screen.1),
            viewport_size: format!("{}x{}", self.viewport.0, self.viewport.1),
            language: self.language.clone(),
            timezone: self.timezone.clone(),
            referrer: self
                .referrer
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| "direct".to_string()),
        }
    }

    fn location(&self) -> PageLocation {
        PageLocation {
            href: self.href.clone(),
            pathname: pathname_of(&self.href),
            title: self.title.clone(),
        }
    }

    fn load_time_ms(&self) -> u64 {
        self.load_time_ms
    }
}

/// Convert a POSIX locale (`en_US.UTF-8`) into a BCP 47 tag (`en-US`).
fn language_tag(locale: &str) -> Option<String> {
    let base = locale.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

/// Path component of a URL; `/` when the URL has none.
fn pathname_of(href: &str) -> String {
    let rest = match href.find("://") {
        Some(idx) => {
            let after_scheme = &href[idx + 3..];
            match after_scheme.find('/') {
                Some(slash) => &after_scheme[slash..],
                None => return "/".to_string(),
            }
        }
        None => href,
    };
    let path = rest.split(['?', '#']).next().unwrap_or("");
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_defaults_referrer_to_direct() {
        let env = StaticEnvironment::new("https://shop.example/");
        assert_eq!(env.context().referrer, "direct");

        let env = env.with_referrer("https://search.example/?q=x");
        assert_eq!(env.context().referrer, "https://search.example/?q=x");
    }

    #[test]
    fn test_context_sizes() {
        let env = StaticEnvironment::new("https://shop.example/").with_viewport(800, 600);
        let ctx = env.context();
        assert_eq!(ctx.viewport_size, "800x600");
        assert_eq!(ctx.screen_resolution, "1920x1080");
    }

    #[test]
    fn test_pathname_of() {
        assert_eq!(pathname_of("https://shop.example"), "/");
        assert_eq!(pathname_of("https://shop.example/"), "/");
        assert_eq!(pathname_of("https://shop.example/cart?id=1#top"), "/cart");
        assert_eq!(pathname_of("/docs/intro"), "/docs/intro");
    }

    #[test]
    fn test_language_tag() {
        assert_eq!(language_tag("en_US.UTF-8").as_deref(), Some("en-US"));
        assert_eq!(language_tag("de_DE@euro").as_deref(), Some("de-DE"));
        assert_eq!(language_tag("C"), None);
    }
}
