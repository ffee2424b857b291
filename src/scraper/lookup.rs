use indexmap::IndexMap;
use tracing::debug;

use crate::error::PageError;
use crate::scraper::notify::{Notifier, Severity};
use crate::scraper::page::{locate, PageClient};
use crate::scraper::selectors::{SelectorSet, NAME, NOT_FOUND, SEARCH_BOX};

pub const FALLBACK_NOT_FOUND: &str = "Could not find error message";

/// Field name → extracted text, `None` when the selector matched nothing.
pub type Fields = IndexMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct FoundRecord {
    pub record_key: String,
    pub identifier: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(FoundRecord),
    NotFound { record_key: String, message: String },
}

/// Keep only ASCII digits: `"NO 123 456 789 MVA"` → `"123456789"`.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.chars().filter(char::is_ascii_digit).collect()
}

/// Search-and-extract protocol for one registry.
pub struct PageLookup {
    selectors: SelectorSet,
}

impl PageLookup {
    pub fn new(selectors: SelectorSet) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &SelectorSet {
        &self.selectors
    }

    /// Search one identifier and report the outcome through `notifier`.
    ///
    /// An empty or absent entity name means the registry has no match.
    pub fn lookup<P, N>(
        &self,
        page: &mut P,
        notifier: &N,
        record_key: &str,
        identifier: &str,
    ) -> Result<LookupOutcome, PageError>
    where
        P: PageClient + ?Sized,
        N: Notifier + ?Sized,
    {
        let identifier = normalize_identifier(identifier);
        let search_box = self.navigation(SEARCH_BOX)?;

        page.navigate(&self.selectors.entry_url)?;
        page.type_into(search_box, &identifier)?;
        page.submit(search_box)?;

        let name = locate(page, self.selector(NAME)?, Some(String::new()))?;
        if name.as_deref().map_or(true, str::is_empty) {
            let message = locate(
                page,
                self.navigation(NOT_FOUND)?,
                Some(FALLBACK_NOT_FOUND.to_string()),
            )?
            .unwrap_or_else(|| FALLBACK_NOT_FOUND.to_string());
            notifier.notify(
                record_key,
                Severity::Warning,
                &format!("{} {}: {}", record_key, identifier, message),
            );
            return Ok(LookupOutcome::NotFound {
                record_key: record_key.to_string(),
                message,
            });
        }

        let mut fields = Fields::new();
        for (field, selector) in self.selectors.data() {
            fields.insert(field.to_string(), locate(page, selector, None)?);
        }
        debug!(record_key, %identifier, fields = fields.len(), "Entity page extracted");
        notifier.notify(record_key, Severity::Info, &format!("found {}", identifier));

        Ok(LookupOutcome::Found(FoundRecord {
            record_key: record_key.to_string(),
            identifier,
            fields,
        }))
    }

    fn selector(&self, field: &str) -> Result<&str, PageError> {
        self.selectors.get(field).ok_or_else(|| self.undefined(field))
    }

    fn navigation(&self, field: &str) -> Result<&str, PageError> {
        self.selectors
            .navigation(field)
            .ok_or_else(|| self.undefined(field))
    }

    fn undefined(&self, field: &str) -> PageError {
        PageError::Element {
            selector: field.to_string(),
            reason: format!("not defined in selector set {}", self.selectors.name),
        }
    }
}
