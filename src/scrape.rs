//! HTML attribute scraper
//!
//! Fetches one page, takes the first container element, finds the first
//! matching element inside it and returns one of its attributes. By default
//! this is the `alt` text of the comic on existentialcomics.com.

use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::utils::error::{ClassifierError, Result};

/// Page fetched when no URL is given
pub const DEFAULT_URL: &str = "http://existentialcomics.com/";

/// What to extract from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub url: String,
    /// CSS selector of the container; only its first match is searched
    pub container: String,
    /// CSS selector of the element inside the container
    pub element: String,
    pub attribute: String,
}

impl Default for ScrapeTarget {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            container: "div".to_string(),
            element: "img.comicImg".to_string(),
            attribute: "alt".to_string(),
        }
    }
}

impl ScrapeTarget {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ClassifierError::Scrape(format!("invalid selector '{}': {:?}", css, e)))
}

/// GET a page and return its body as text
pub fn fetch_html(url: &str) -> Result<String> {
    info!("Fetching {}", url);
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let body = response.text()?;
    debug!("Fetched {} bytes", body.len());
    Ok(body)
}

/// Extract the target attribute from an HTML document
pub fn extract_attribute(html: &str, target: &ScrapeTarget) -> Result<String> {
    let document = Html::parse_document(html);
    let container_selector = selector(&target.container)?;
    let element_selector = selector(&target.element)?;

    let container = document
        .select(&container_selector)
        .next()
        .ok_or_else(|| ClassifierError::Scrape(format!("no '{}' element found", target.container)))?;

    let element = container.select(&element_selector).next().ok_or_else(|| {
        ClassifierError::Scrape(format!(
            "no '{}' inside the first '{}'",
            target.element, target.container
        ))
    })?;

    element
        .value()
        .attr(&target.attribute)
        .map(str::to_string)
        .ok_or_else(|| {
            ClassifierError::Scrape(format!(
                "'{}' has no '{}' attribute",
                target.element, target.attribute
            ))
        })
}

/// Fetch the target page and extract its attribute
pub fn scrape(target: &ScrapeTarget) -> Result<String> {
    let html = fetch_html(&target.url)?;
    extract_attribute(&html, target)
}
