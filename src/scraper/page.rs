use crate::error::PageError;

/// A rendered-page session that can be driven one step at a time.
///
/// Every call blocks until the backend's own wait completes. Selector syntax is up to
/// the backend (XPath for Chrome).
pub trait PageClient {
    fn navigate(&mut self, url: &str) -> Result<(), PageError>;

    /// Trimmed text of the element at `selector`, `None` if nothing matches.
    fn find_text(&self, selector: &str) -> Result<Option<String>, PageError>;

    fn type_into(&mut self, selector: &str, text: &str) -> Result<(), PageError>;

    /// Send Enter to the element at `selector` and wait for the resulting page.
    fn submit(&mut self, selector: &str) -> Result<(), PageError>;

    /// End the session. Further calls fail with [`PageError::Closed`].
    fn close(&mut self) -> Result<(), PageError>;
}

impl<P: PageClient + ?Sized> PageClient for &mut P {
    fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        (**self).navigate(url)
    }

    fn find_text(&self, selector: &str) -> Result<Option<String>, PageError> {
        (**self).find_text(selector)
    }

    fn type_into(&mut self, selector: &str, text: &str) -> Result<(), PageError> {
        (**self).type_into(selector, text)
    }

    fn submit(&mut self, selector: &str) -> Result<(), PageError> {
        (**self).submit(selector)
    }

    fn close(&mut self) -> Result<(), PageError> {
        (**self).close()
    }
}

/// Text at `selector`, or `default` untouched when the selector resolves to nothing.
///
/// Absence is the only condition handled here; every other page fault propagates.
pub fn locate<P>(page: &P, selector: &str, default: Option<String>) -> Result<Option<String>, PageError>
where
    P: PageClient + ?Sized,
{
    Ok(page.find_text(selector)?.or(default))
}
