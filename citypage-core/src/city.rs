use tracing::{debug, instrument, warn};

use crate::{
    config::Config,
    document::{Document, Element},
    error::WeatherError,
    source::{DocumentSource, HttpSource},
};

/// Location of the forecast periods inside a city document.
pub const FORECAST_PERIOD_PATH: &str = "forecastGroup/forecast/period";

/// Attribute carrying a period's label, e.g. "Tonight".
pub const FORECAST_NAME_ATTRIBUTE: &str = "textForecastName";

/// One city's weather document.
///
/// Paths passed to the lookups are plain tag paths relative to the root
/// element, such as `currentConditions/temperature`. The predicate paths
/// returned by [`City::get_available_quantities`] are meant for display and
/// do not resolve as lookup paths; [`City::get_available_quantity_paths`]
/// returns paths that do.
#[derive(Debug, Clone, Default)]
pub struct City {
    url: String,
    document: Document,
}

impl City {
    /// Fetch the document at `url` over HTTP, with the same client settings
    /// as [`CityIndex::load`](crate::CityIndex::load).
    pub async fn load(url: &str) -> Result<Self, WeatherError> {
        let source = HttpSource::from_config(&Config::default())?;
        Self::fetch(&source, url).await
    }

    /// Fetch the document at `url` through `source`.
    ///
    /// A non-OK answer yields an empty document rather than an error.
    #[instrument(skip(source))]
    pub async fn fetch(source: &dyn DocumentSource, url: &str) -> Result<Self, WeatherError> {
        let document = match source.fetch(url).await? {
            Some(body) => Document::parse(&body)?,
            None => {
                warn!("city document unavailable, queries will find nothing");
                Document::empty()
            }
        };

        debug!(empty = document.is_empty(), "city document loaded");
        Ok(Self { url: url.to_string(), document })
    }

    /// Build a city from an already-fetched document.
    pub fn from_xml(xml: &str) -> Result<Self, WeatherError> {
        Ok(Self { url: String::new(), document: Document::parse(xml)? })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Text of the first element at `path`.
    pub fn get_quantity(&self, path: &str) -> Option<&str> {
        self.document.find_text(path)
    }

    /// Value of `attribute` on the first element at `path`.
    pub fn get_attribute(&self, path: &str, attribute: &str) -> Option<&str> {
        self.document.find(path).and_then(|element| element.attribute(attribute))
    }

    /// Every leaf path with its attributes as `[@name='value']` predicates.
    pub fn get_available_quantities(&self) -> Vec<String> {
        self.document.leaf_paths(true)
    }

    /// Every leaf path without predicates, usable with [`City::get_quantity`].
    pub fn get_available_quantity_paths(&self) -> Vec<String> {
        self.document.leaf_paths(false)
    }

    /// Labels of the forecast periods, in document order. A period without a
    /// label contributes an empty string so the result lines up with
    /// [`City::get_available_forecast_periods`].
    pub fn get_available_forecast_names(&self) -> Vec<String> {
        self.forecast_periods()
            .map(|period| period.attribute(FORECAST_NAME_ATTRIBUTE).unwrap_or_default().to_string())
            .collect()
    }

    /// Text of the forecast periods, in document order.
    pub fn get_available_forecast_periods(&self) -> Vec<String> {
        self.forecast_periods().map(|period| period.text().to_string()).collect()
    }

    fn forecast_periods(&self) -> impl Iterator<Item = &Element> {
        self.document.find_all(FORECAST_PERIOD_PATH).into_iter()
    }
}
