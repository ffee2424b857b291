//! Registry lookups driven through a rendered-page session.
//!
//! One [`PageLookup`] per registry layout, one [`BatchRunner`] per batch, and a
//! [`PageClient`] backend underneath (headless Chrome in production).

pub mod batch;
pub mod chrome;
pub mod lookup;
pub mod notify;
pub mod page;
pub mod selectors;

pub use batch::{BatchRunner, ErrorLog, Pacing};
pub use chrome::{ChromePage, DriverSource};
pub use lookup::{LookupOutcome, PageLookup};
pub use notify::TracingNotifier;
pub use selectors::SelectorSet;
