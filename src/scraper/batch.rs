use std::time::Duration;

use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use tracing::info;

use crate::error::PageError;
use crate::scraper::lookup::{FoundRecord, LookupOutcome, PageLookup};
use crate::scraper::notify::Notifier;
use crate::scraper::page::PageClient;
use crate::table::{self, ResultTable};

/// Record key → not-found message, in the order the failures happened.
pub type ErrorLog = IndexMap<String, String>;

/// Whole-second pause drawn uniformly from `min_secs..=max_secs` after every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min_secs: 0,
            max_secs: 3,
        }
    }
}

impl Pacing {
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let hi = self.max_secs.max(self.min_secs);
        Duration::from_secs(rng.gen_range(self.min_secs..=hi))
    }
}

pub struct BatchOutput {
    pub table: ResultTable,
    pub errors: ErrorLog,
}

/// Runs lookups for a whole batch over one exclusively owned page session.
pub struct BatchRunner<P, N> {
    page: P,
    lookup: PageLookup,
    notifier: N,
    pacing: Pacing,
    include_country_code: bool,
    show_progress: bool,
}

impl<P: PageClient, N: Notifier> BatchRunner<P, N> {
    pub fn new(page: P, lookup: PageLookup, notifier: N) -> Self {
        Self {
            page,
            lookup,
            notifier,
            pacing: Pacing::default(),
            include_country_code: false,
            show_progress: true,
        }
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn include_country_code(mut self, include: bool) -> Self {
        self.include_country_code = include;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Look up every `(record key, identifier)` pair in order, then close the session.
    ///
    /// A page fault aborts the batch and discards what was collected so far; the session
    /// is then released when the runner is dropped instead of through `close`.
    pub fn run<I, K, V>(mut self, records: I) -> Result<BatchOutput, PageError>
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let records = records.into_iter();
        let pb = if self.show_progress {
            ProgressBar::new(records.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        let mut rng = rand::thread_rng();
        let mut found: Vec<FoundRecord> = Vec::new();
        let mut errors = ErrorLog::new();

        for (record_key, identifier) in records {
            let (record_key, identifier) = (record_key.as_ref(), identifier.as_ref());
            match self
                .lookup
                .lookup(&mut self.page, &self.notifier, record_key, identifier)?
            {
                LookupOutcome::Found(record) => found.push(record),
                LookupOutcome::NotFound { record_key, message } => {
                    errors.insert(record_key, message);
                }
            }
            pb.inc(1);
            std::thread::sleep(self.pacing.next_delay(&mut rng));
        }
        pb.finish_and_clear();

        self.page.close()?;
        info!(
            found = found.len(),
            not_found = errors.len(),
            "Batch finished"
        );

        let table = table::assemble(
            found,
            self.lookup.selectors(),
            self.include_country_code,
        );
        Ok(BatchOutput { table, errors })
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::scraper::notify::{Recorder, Severity};
    use crate::scraper::page::fake::FakePage;
    use crate::scraper::selectors::{SelectorSet, NAME, NOT_FOUND, SEARCH_BOX};

    fn setup(exclude: &[String]) -> (PageLookup, FakePage) {
        let selectors = SelectorSet::brreg("https://www.brreg.no/", exclude);
        let sel = |f: &str| selectors.get(f).unwrap().to_string();
        let page = FakePage::for_search_box(&sel(SEARCH_BOX))
            .with_entry(
                "923609016",
                &[
                    (sel(NAME).as_str(), "EQUINOR ASA"),
                    (sel("address").as_str(), "EQUINOR ASA\nForusbeen 50\n4035 STAVANGER"),
                    (sel("postal_address").as_str(), "Postboks 8500\n4035 STAVANGER"),
                ],
            )
            .with_entry("984851006", &[(sel(NAME).as_str(), "DNB BANK ASA")])
            .with_not_found(&sel(NOT_FOUND), "Fant ingen enheter");
        (PageLookup::new(selectors), page)
    }

    fn runner<'a>(
        page: &'a mut FakePage,
        lookup: PageLookup,
        rec: &'a Recorder,
    ) -> BatchRunner<&'a mut FakePage, &'a Recorder> {
        BatchRunner::new(page, lookup, rec)
            .pacing(Pacing {
                min_secs: 0,
                max_secs: 0,
            })
            .show_progress(false)
    }

    #[test]
    fn pacing_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let pacing = Pacing::default();
        for _ in 0..200 {
            let d = pacing.next_delay(&mut rng);
            assert!(d <= Duration::from_secs(3));
        }
        let fixed = Pacing {
            min_secs: 2,
            max_secs: 2,
        };
        assert_eq!(fixed.next_delay(&mut rng), Duration::from_secs(2));
    }

    #[test]
    fn one_found_one_missing() {
        let (lookup, mut page) = setup(&[]);
        let rec = Recorder::default();
        let out = runner(&mut page, lookup, &rec)
            .run(vec![("A", "923 609 016"), ("B", "000000000")])
            .unwrap();

        assert_eq!(out.table.len(), 1);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors["B"], "Fant ingen enheter");
        assert_eq!(out.table.get(0, "supplier_id"), Some("A"));
        assert_eq!(page.close_calls, 1);
        let seen: Vec<(String, Severity)> = rec
            .0
            .borrow()
            .iter()
            .map(|(key, severity, _)| (key.clone(), *severity))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("A".to_string(), Severity::Info),
                ("B".to_string(), Severity::Warning)
            ]
        );
    }

    #[test]
    fn order_kept_and_outputs_disjoint() {
        let (lookup, mut page) = setup(&[]);
        let rec = Recorder::default();
        let records = vec![
            ("k1", "984851006"),
            ("k2", "1"),
            ("k3", "NO 923609016 MVA"),
            ("k4", "2"),
        ];
        let out = runner(&mut page, lookup, &rec).run(records).unwrap();

        let keys: Vec<_> = (0..out.table.len())
            .map(|i| out.table.get(i, "supplier_id").unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["k1", "k3"]);
        assert_eq!(out.errors.keys().collect::<Vec<_>>(), vec!["k2", "k4"]);
        assert_eq!(out.table.len() + out.errors.len(), 4);
        assert!(keys.iter().all(|k| !out.errors.contains_key(k)));
    }

    #[test]
    fn addresses_normalized_when_collected() {
        let (lookup, mut page) = setup(&[]);
        let rec = Recorder::default();
        let out = runner(&mut page, lookup, &rec)
            .include_country_code(true)
            .run(vec![("A", "923609016"), ("B", "984851006")])
            .unwrap();

        let t = &out.table;
        assert!(!t.has_column("address"));
        assert!(!t.has_column("postal_address"));
        assert_eq!(t.get(0, "country_code"), Some("NO"));
        assert_eq!(t.get(0, "street"), Some("Forusbeen 50"));
        assert_eq!(t.get(0, "postal_code"), Some("4035"));
        assert_eq!(t.get(0, "city"), Some("STAVANGER"));
        assert_eq!(t.get(0, "postal_street"), Some("Postboks 8500"));
        assert_eq!(t.get(0, "postal_att"), None);
        // Second entity has no address on its page.
        assert_eq!(t.get(1, "street"), None);
        assert_eq!(t.get(1, "postal_city"), None);
    }

    #[test]
    fn excluded_address_is_left_alone() {
        let (lookup, mut page) = setup(&["address".into()]);
        let rec = Recorder::default();
        let out = runner(&mut page, lookup, &rec)
            .run(vec![("A", "923609016")])
            .unwrap();
        assert!(!out.table.has_column("street"));
        assert!(out.table.has_column("postal_city"));
    }

    #[test]
    fn fault_aborts_without_close() {
        let (lookup, mut page) = setup(&[]);
        page.known_selectors.clear();
        let rec = Recorder::default();
        let result = runner(&mut page, lookup, &rec).run(vec![("A", "923609016")]);
        assert!(result.is_err());
        assert_eq!(page.close_calls, 0);
    }
}
