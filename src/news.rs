//! Read-only client for top headlines from newsapi.org.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use sha2::{Digest, Sha256};

use crate::error::{AdmError, Result};
use crate::models::{Article, NewsResponse};

const BASE_URL: &str = "https://newsapi.org/v2";
/// Pages fetched per call. Not configurable.
const PAGES: u32 = 2;

pub struct NewsClient {
    client: Client,
    api_key: String,
    language: String,
}

impl NewsClient {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("adm/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| AdmError::News(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            language: language.into(),
        })
    }

    fn fetch_page(&self, category: &str, page: u32) -> Result<NewsResponse> {
        let url = format!("{}/top-headlines", BASE_URL);
        let page = page.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("category", category),
                ("language", self.language.as_str()),
                ("page", page.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .map_err(|e| AdmError::News(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().unwrap_or_default();
            return Err(AdmError::News(format!("{} {}", status, txt)));
        }
        resp.json::<NewsResponse>()
            .map_err(|e| AdmError::News(format!("bad response: {}", e)))
    }

    /// Headlines for `category`, pages 1 and 2 concatenated.
    ///
    /// A page that fails is logged and skipped, so the result may be partial
    /// or empty. There is no retry.
    pub fn get_news(&self, category: &str) -> NewsResponse {
        let mut articles = Vec::new();
        for page in 1..=PAGES {
            match self.fetch_page(category, page) {
                Ok(r) => articles.extend(r.articles),
                Err(e) => log::error!("Fetching {} headlines, page {}: {}", category, page, e),
            }
        }
        NewsResponse {
            status: "ok".to_string(),
            articles,
        }
    }

    /// Downloads an article image. Failures are logged and yield `None`.
    pub fn fetch_image(&self, url: &str) -> Option<Vec<u8>> {
        let result = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes());
        match result {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                log::warn!("Failed to download image from {} due to {}", url, e);
                None
            }
        }
    }

    /// Saves the images of `articles` into `dir`, skipping those that fail.
    /// Returns the files written.
    pub fn cache_images(&self, articles: &[Article], dir: &Path) -> Vec<PathBuf> {
        if let Err(e) = fs::create_dir_all(dir) {
            log::error!("Cannot create image cache {}: {}", dir.display(), e);
            return Vec::new();
        }
        let mut written = Vec::new();
        for url in articles.iter().filter_map(|a| a.url_to_image.as_deref()) {
            let path = dir.join(image_file_name(url));
            if path.exists() {
                written.push(path);
                continue;
            }
            let Some(bytes) = self.fetch_image(url) else { continue };
            match fs::write(&path, bytes) {
                Ok(()) => written.push(path),
                Err(e) => log::warn!("Cannot write {}: {}", path.display(), e),
            }
        }
        written
    }
}

/// Cache file name for an image URL: the first 16 hex digits of the URL's
/// SHA-256, plus its extension when it is a known image type.
pub fn image_file_name(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    let ext = url
        .split(['?', '#'])
        .next()
        .and_then(|u| u.rsplit('/').next())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "gif" | "webp"))
        .unwrap_or_else(|| "img".to_string());
    format!("{}.{}", &digest[..16], ext)
}
