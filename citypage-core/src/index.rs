use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

use crate::{
    config::{Config, with_trailing_slash},
    document::{Document, Element},
    error::WeatherError,
    model::{CityRecord, Language},
    source::{DocumentSource, HttpSource},
};

/// Every city the service publishes, keyed by English name.
///
/// Built from a single fetch of the site list and never modified afterwards.
/// Lookups for unknown names return `None`.
#[derive(Debug, Clone)]
pub struct CityIndex {
    site_list_url: String,
    base_url: String,
    cities: BTreeMap<String, CityRecord>,
}

impl CityIndex {
    /// Fetch the site list from the default public feed.
    pub async fn load() -> Result<Self, WeatherError> {
        let config = Config::default();
        let source = HttpSource::from_config(&config)?;
        Self::fetch(&source, &config).await
    }

    /// Fetch the configured site list through `source`.
    ///
    /// A non-OK answer yields an empty index rather than an error.
    #[instrument(skip(source, config), fields(url = %config.site_list_url))]
    pub async fn fetch(
        source: &dyn DocumentSource,
        config: &Config,
    ) -> Result<Self, WeatherError> {
        let mut index = Self {
            site_list_url: config.site_list_url.clone(),
            base_url: with_trailing_slash(config.base_url.clone()),
            cities: BTreeMap::new(),
        };

        match source.fetch(&config.site_list_url).await? {
            Some(body) => index.insert_sites(&Document::parse(&body)?)?,
            None => warn!("site list unavailable, city index is empty"),
        }

        debug!(cities = index.len(), "city index loaded");
        Ok(index)
    }

    /// Build an index from an already-fetched site list.
    pub fn from_xml(xml: &str, base_url: &str) -> Result<Self, WeatherError> {
        let mut index = Self {
            site_list_url: String::new(),
            base_url: with_trailing_slash(base_url.to_string()),
            cities: BTreeMap::new(),
        };
        index.insert_sites(&Document::parse(xml)?)?;
        Ok(index)
    }

    fn insert_sites(&mut self, doc: &Document) -> Result<(), WeatherError> {
        for site in doc.find_all("site") {
            let record = site_record(site)?;
            if let Some(previous) = self.cities.insert(record.english_name.clone(), record) {
                debug!(name = %previous.english_name, code = %previous.site_code, "duplicate site replaced");
            }
        }
        Ok(())
    }

    pub fn site_list_url(&self) -> &str {
        &self.site_list_url
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Returns true if `name` is a known English city name.
    pub fn is_city(&self, name: &str) -> bool {
        self.cities.contains_key(name)
    }

    pub fn record(&self, name: &str) -> Option<&CityRecord> {
        self.cities.get(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &CityRecord> {
        self.cities.values()
    }

    /// URL of the English weather document for `name`.
    pub fn data_url(&self, name: &str) -> Option<String> {
        self.data_url_for(name, Language::English)
    }

    /// URL of the weather document for `name` in `language`, e.g.
    /// `<base>ON/s0000430_e.xml`.
    pub fn data_url_for(&self, name: &str, language: Language) -> Option<String> {
        self.record(name).map(|city| {
            format!(
                "{}{}/{}{}",
                self.base_url,
                city.province_code,
                city.site_code,
                language.document_suffix()
            )
        })
    }

    /// Province code (e.g. `ON`, `BC`) of the city.
    pub fn province(&self, name: &str) -> Option<&str> {
        self.record(name).map(|city| city.province_code.as_str())
    }

    /// Station identifier, e.g. `s0000001` for Athabasca, AB.
    pub fn site_code(&self, name: &str) -> Option<&str> {
        self.record(name).map(|city| city.site_code.as_str())
    }

    pub fn french_name(&self, name: &str) -> Option<&str> {
        self.record(name).map(|city| city.french_name.as_str())
    }

    pub fn english_city_list(&self) -> Vec<&str> {
        self.cities.keys().map(String::as_str).collect()
    }

    /// French names in the same order as [`CityIndex::english_city_list`].
    /// Not sorted by French name and not deduplicated.
    pub fn french_city_list(&self) -> Vec<&str> {
        self.records().map(|city| city.french_name.as_str()).collect()
    }
}

fn site_record(site: &Element) -> Result<CityRecord, WeatherError> {
    let child_text = |tag: &str| {
        site.children()
            .iter()
            .find(|child| child.tag() == tag)
            .map(|child| child.text().to_string())
            .unwrap_or_default()
    };

    let english_name = child_text("nameEn");
    let site_code = site
        .attribute("code")
        .ok_or_else(|| {
            WeatherError::InvalidSiteList(format!("site '{english_name}' has no code attribute"))
        })?
        .to_string();

    Ok(CityRecord {
        site_code,
        province_code: child_text("provinceCode"),
        french_name: child_text("nameFr"),
        english_name,
    })
}
