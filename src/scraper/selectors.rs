use indexmap::IndexMap;
use tracing::warn;

pub const SEARCH_BOX: &str = "front-page-search-box";
pub const SEARCH_BUTTON: &str = "front-page-button";
pub const NOT_FOUND: &str = "company_not_found";
pub const NAME: &str = "name";
pub const ADDRESS: &str = "address";
pub const POSTAL_ADDRESS: &str = "postal_address";

const NAVIGATION: [&str; 3] = [SEARCH_BOX, SEARCH_BUTTON, NOT_FOUND];

/// Brønnøysund Register Centre front page and entity page layout.
const BRREG_XPATHS: &[(&str, &str)] = &[
    (
        SEARCH_BOX,
        r#"//div[@class="input-group"]/input[@placeholder="Søk på navn eller organisasjonsnummer"]"#,
    ),
    (SEARCH_BUTTON, r#"//*[@id="companySearch"]/div"#),
    (NAME, r#"//div[@id="pagecontent"]/div[3]/div[2]/p"#),
    (ADDRESS, r#"//div[@id="pagecontent"]/div[5]/div[2]/p"#),
    ("municipality", r#"//*[@id="pagecontent"]/div[6]/div[2]/p"#),
    (POSTAL_ADDRESS, r#"//*[@id="pagecontent"]/div[7]/div[2]/p"#),
    (NOT_FOUND, r#"//*[@id="pagecontent"]/p"#),
];

/// Selectors for one registry, split into page-driving selectors and extractable fields.
#[derive(Debug, Clone)]
pub struct SelectorSet {
    pub name: &'static str,
    pub version: u32,
    pub entry_url: String,
    pub country_code: &'static str,
    navigation: IndexMap<String, String>,
    all: IndexMap<String, String>,
    data: IndexMap<String, String>,
}

impl SelectorSet {
    pub fn brreg(entry_url: impl Into<String>, exclude: &[String]) -> Self {
        Self::partition("brreg", 1, entry_url.into(), "NO", BRREG_XPATHS, exclude)
    }

    fn partition(
        name: &'static str,
        version: u32,
        entry_url: String,
        country_code: &'static str,
        table: &[(&str, &str)],
        exclude: &[String],
    ) -> Self {
        for field in exclude {
            if !table.iter().any(|(k, _)| k == field) {
                warn!(field = %field, "Ignoring exclusion of unknown field");
            }
        }

        let all: IndexMap<String, String> = table
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let (navigation, data): (IndexMap<_, _>, IndexMap<_, _>) = all
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .partition(|(k, _)| NAVIGATION.contains(&k.as_str()));
        let data = data
            .into_iter()
            .filter(|(k, _)| !exclude.contains(k))
            .collect();

        SelectorSet {
            name,
            version,
            entry_url,
            country_code,
            navigation,
            all,
            data,
        }
    }

    /// Any selector by field name, including excluded and navigation ones.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.all.get(field).map(String::as_str)
    }

    pub fn navigation(&self, field: &str) -> Option<&str> {
        self.navigation.get(field).map(String::as_str)
    }

    /// Fields extracted from a found entity page, in table order.
    pub fn data(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn extracts(&self, field: &str) -> bool {
        self.data.contains_key(field)
    }
}
