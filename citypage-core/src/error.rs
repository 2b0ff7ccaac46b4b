use thiserror::Error;

/// Errors raised while building a [`CityIndex`](crate::CityIndex) or a [`City`](crate::City).
///
/// Lookups on an already-built value never fail; they return `None` instead.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The request could not be made or its body could not be read.
    #[error("Unable to open the data url: {url}")]
    DataSourceUnavailable {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The HTTP client could not be set up; no request was made.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Malformed XML document: {0}")]
    MalformedDocument(String),

    #[error("Invalid site list: {0}")]
    InvalidSiteList(String),
}

impl WeatherError {
    pub(crate) fn unavailable(
        url: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::DataSourceUnavailable { url: url.to_string(), source: source.into() }
    }
}

impl From<quick_xml::Error> for WeatherError {
    fn from(err: quick_xml::Error) -> Self {
        Self::MalformedDocument(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_message_names_the_url() {
        let err = WeatherError::unavailable("http://localhost/siteList.xml", "connection refused");
        assert_eq!(err.to_string(), "Unable to open the data url: http://localhost/siteList.xml");

        let source = std::error::Error::source(&err).expect("source must be kept");
        assert_eq!(source.to_string(), "connection refused");
    }

    #[test]
    fn client_error_does_not_name_a_url() {
        let builder_err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err = WeatherError::HttpClient(builder_err);

        assert!(err.to_string().starts_with("Failed to build HTTP client"));
        assert!(!err.to_string().contains("Unable to open the data url"));
    }
}
