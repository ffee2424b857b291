//! Headless Chrome backend for [`PageClient`], addressed with XPath.

use std::path::PathBuf;
use std::sync::Arc;

use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info};

use crate::error::PageError;
use crate::scraper::page::PageClient;

/// Which browser binary to drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverSource {
    /// A binary shipped alongside the tool.
    Local(PathBuf),
    /// Whatever headless_chrome resolves: an installed Chrome, or a downloaded
    /// Chromium when built with the `fetch` feature.
    Managed,
}

pub struct ChromePage {
    // Dropping the browser kills the Chrome process.
    _browser: Browser,
    tab: Arc<Tab>,
    closed: bool,
}

impl ChromePage {
    pub fn launch(source: &DriverSource, headless: bool) -> Result<Self, PageError> {
        let path = match source {
            DriverSource::Local(path) => Some(path.clone()),
            DriverSource::Managed => None,
        };
        let sandbox = std::env::var("BRREG_CONTAINER").is_err()
            && !std::path::Path::new("/.dockerenv").exists();

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .sandbox(sandbox)
            .path(path)
            .build()
            .map_err(|e| PageError::Launch(format!("invalid launch options: {}", e)))?;
        let browser = Browser::new(options).map_err(|e| PageError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| PageError::Launch(format!("cannot open tab: {}", e)))?;

        info!(?source, headless, sandbox, "Browser launched");
        Ok(Self {
            _browser: browser,
            tab,
            closed: false,
        })
    }

    fn open_tab(&self) -> Result<&Tab, PageError> {
        if self.closed {
            Err(PageError::Closed)
        } else {
            Ok(self.tab.as_ref())
        }
    }
}

fn element_error(selector: &str, e: impl std::fmt::Display) -> PageError {
    PageError::Element {
        selector: selector.to_string(),
        reason: e.to_string(),
    }
}

impl PageClient for ChromePage {
    fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        let nav_error = |e: anyhow::Error| PageError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let tab = self.open_tab()?;
        tab.navigate_to(url).map_err(nav_error)?;
        tab.wait_until_navigated().map_err(nav_error)?;
        debug!(url, "Navigated");
        Ok(())
    }

    fn find_text(&self, selector: &str) -> Result<Option<String>, PageError> {
        let tab = self.open_tab()?;
        let element = match tab.find_element_by_xpath(selector) {
            Ok(element) => element,
            Err(e) if e.downcast_ref::<NoElementFound>().is_some() => return Ok(None),
            Err(e) => return Err(element_error(selector, e)),
        };
        let text = element
            .get_inner_text()
            .map_err(|e| element_error(selector, e))?;
        Ok(Some(text.trim().to_string()))
    }

    fn type_into(&mut self, selector: &str, text: &str) -> Result<(), PageError> {
        let tab = self.open_tab()?;
        tab.find_element_by_xpath(selector)
            .and_then(|element| element.type_into(text).map(|_| ()))
            .map_err(|e| element_error(selector, e))
    }

    fn submit(&mut self, selector: &str) -> Result<(), PageError> {
        let tab = self.open_tab()?;
        tab.find_element_by_xpath(selector)
            .and_then(|element| element.focus().map(|_| ()))
            .map_err(|e| element_error(selector, e))?;
        tab.press_key("Enter")
            .map_err(|e| element_error(selector, e))?;
        tab.wait_until_navigated()
            .map_err(|e| PageError::Navigation {
                url: tab.get_url(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PageError> {
        let tab = self.open_tab()?;
        tab.close(false)
            .map_err(|e| PageError::Navigation {
                url: tab.get_url(),
                reason: format!("closing tab: {}", e),
            })?;
        self.closed = true;
        info!("Browser session closed");
        Ok(())
    }
}
