//! HTTP font source: pinned distribution, static CDN, then web-font CSS.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{css, FontKey, FontProgram, FontSource};
use crate::error::FirmaError;

/// Base URLs and limits for [`HttpFontSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSourceConfig {
    /// Family served from `pinned_base_url` instead of the CDN.
    pub pinned_family: String,
    pub pinned_base_url: String,
    pub pinned_version: String,
    pub cdn_base_url: String,
    pub css_base_url: String,
    /// File extension requested from the pinned and CDN steps. WOFF2 cannot
    /// be decoded, so anything other than `woff` or `ttf` falls through.
    pub file_format: String,
    pub timeout_secs: u64,
    /// Sent with every request when set. Web-font CSS endpoints pick the
    /// served format from it; without one they answer with truetype.
    pub user_agent: Option<String>,
}

impl Default for FontSourceConfig {
    fn default() -> Self {
        Self {
            pinned_family: "Inter".to_string(),
            pinned_base_url: "https://rsms.me/inter/font-files".to_string(),
            pinned_version: "3.19".to_string(),
            cdn_base_url: "https://cdn.jsdelivr.net/npm".to_string(),
            css_base_url: "https://fonts.googleapis.com".to_string(),
            file_format: "woff".to_string(),
            timeout_secs: 15,
            user_agent: None,
        }
    }
}

impl FontSourceConfig {
    pub fn pinned_url(&self, key: &FontKey) -> Option<String> {
        if key.family != self.pinned_family {
            return None;
        }
        let style = match (key.bold, key.italic) {
            (false, false) => "Regular",
            (true, false) => "Bold",
            (false, true) => "Italic",
            (true, true) => "BoldItalic",
        };
        Some(format!(
            "{}/{}-{}.{}?v={}",
            self.pinned_base_url.trim_end_matches('/'),
            key.family,
            style,
            self.file_format,
            self.pinned_version
        ))
    }

    pub fn cdn_url(&self, key: &FontKey) -> String {
        let family = key.family.to_lowercase().replace(' ', "-");
        let style = if key.italic { "italic" } else { "normal" };
        format!(
            "{base}/@fontsource/{family}/files/{family}-latin-{weight}-{style}.{ext}",
            base = self.cdn_base_url.trim_end_matches('/'),
            family = family,
            weight = key.weight(),
            style = style,
            ext = self.file_format,
        )
    }

    pub fn css_url(&self, key: &FontKey) -> String {
        format!(
            "{}/css2?family={}:ital,wght@{},{}&display=swap",
            self.css_base_url.trim_end_matches('/'),
            key.family.replace(' ', "+"),
            u8::from(key.italic),
            key.weight()
        )
    }
}

pub struct HttpFontSource {
    client: reqwest::Client,
    config: FontSourceConfig,
}

impl HttpFontSource {
    pub fn new(config: FontSourceConfig) -> Result<Self, FirmaError> {
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| FirmaError::FontError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FontSourceConfig {
        &self.config
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FirmaError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FirmaError::FontError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FirmaError::FontError(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FirmaError::FontError(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Fetch `url` and keep it only if it decodes to an embeddable program.
    async fn fetch_program(&self, url: &str) -> Result<Vec<u8>, FirmaError> {
        let bytes = self.fetch(url).await?;
        Ok(FontProgram::parse(bytes)?.into_data())
    }

    async fn from_stylesheet(&self, key: &FontKey) -> Result<Vec<u8>, FirmaError> {
        let css_bytes = self.fetch(&self.config.css_url(key)).await?;
        let stylesheet = String::from_utf8_lossy(&css_bytes);
        let urls = css::font_urls(&stylesheet);
        if urls.is_empty() {
            return Err(FirmaError::FontError(format!(
                "no usable font source in stylesheet for {}",
                key
            )));
        }

        let mut last_error = None;
        for url in urls {
            match self.fetch_program(&url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    tracing::debug!(font = %key, %url, error = %e, "Stylesheet source unusable");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| FirmaError::FontError(key.to_string())))
    }
}

#[async_trait]
impl FontSource for HttpFontSource {
    async fn resolve_font_bytes(&self, family: &str, bold: bool, italic: bool) -> Option<Vec<u8>> {
        let key = FontKey::new(family, bold, italic);

        if let Some(url) = self.config.pinned_url(&key) {
            match self.fetch_program(&url).await {
                Ok(bytes) => return Some(bytes),
                Err(e) => tracing::warn!(font = %key, error = %e, "Pinned font fetch failed, falling back"),
            }
        }

        match self.fetch_program(&self.config.cdn_url(&key)).await {
            Ok(bytes) => return Some(bytes),
            Err(e) => tracing::warn!(font = %key, error = %e, "CDN font fetch failed, falling back"),
        }

        match self.from_stylesheet(&key).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(font = %key, error = %e, "Stylesheet font fetch failed");
                None
            }
        }
    }
}
