use anyhow::{Context, Result, anyhow, bail};
use citypage_core::{City, CityIndex, Config, HttpSource, Language};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select, Text};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citypage", version, about = "Canadian citypage weather CLI")]
pub struct Cli {
    /// Document language, "english" or "french"; defaults to the configured one.
    #[arg(long, global = true, value_parser = parse_language)]
    pub language: Option<Language>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively configure the feed URLs, timeout and language.
    Configure,

    /// List every city in the site list.
    Cities {
        /// Print French names instead of English ones.
        #[arg(long)]
        french: bool,
    },

    /// Show site code, province and document URL for a city.
    Lookup {
        /// English city name as listed by `citypage cities`.
        city: String,

        #[arg(long)]
        json: bool,
    },

    /// List every quantity path available for a city.
    Quantities {
        city: String,

        /// Print plain paths usable with `citypage get` instead of annotated ones.
        #[arg(long)]
        plain: bool,
    },

    /// Print one value from a city's document, e.g. `currentConditions/temperature`.
    Get {
        city: String,
        path: String,

        /// Print this attribute of the element instead of its text.
        #[arg(long)]
        attribute: Option<String>,
    },

    /// Show the forecast periods for a city.
    Forecast { city: String },
}

fn parse_language(value: &str) -> Result<Language, String> {
    Language::try_from(value)
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            command => Session::open(self.language).await?.run(command).await,
        }
    }
}

/// Everything a query command needs: the HTTP source and the city index.
struct Session {
    language: Language,
    source: HttpSource,
    index: CityIndex,
}

impl Session {
    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Configure => return configure(),
            Command::Cities { french } => {
                let names =
                    if french { self.index.french_city_list() } else { self.index.english_city_list() };
                for name in names {
                    println!("{name}");
                }
            }
            Command::Lookup { city, json } => {
                let record = self.index.record(&city).ok_or_else(|| unknown_city(&city))?;
                let url = self.data_url(&city)?;

                if json {
                    let out = serde_json::json!({
                        "english_name": record.english_name,
                        "french_name": record.french_name,
                        "province_code": record.province_code,
                        "site_code": record.site_code,
                        "data_url": url,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    println!("City:        {}", record.english_name);
                    println!("French name: {}", record.french_name);
                    println!("Province:    {}", record.province_code);
                    println!("Site code:   {}", record.site_code);
                    println!("Data URL:    {url}");
                }
            }
            Command::Quantities { city, plain } => {
                let city = self.city(&city).await?;
                let paths = if plain {
                    city.get_available_quantity_paths()
                } else {
                    city.get_available_quantities()
                };
                for path in paths {
                    println!("{path}");
                }
            }
            Command::Get { city, path, attribute } => {
                let weather = self.city(&city).await?;
                let value = match &attribute {
                    Some(attr) => weather.get_attribute(&path, attr),
                    None => weather.get_quantity(&path),
                };
                let value = value.ok_or_else(|| match &attribute {
                    Some(attr) => anyhow!("No attribute '{attr}' at '{path}' for {city}"),
                    None => anyhow!(
                        "Nothing found at '{path}' for {city}.\n\
                         Hint: run `citypage quantities --plain {city:?}` to list valid paths."
                    ),
                })?;
                println!("{value}");
            }
            Command::Forecast { city } => {
                let weather = self.city(&city).await?;
                let names = weather.get_available_forecast_names();
                let periods = weather.get_available_forecast_periods();
                if names.is_empty() {
                    println!("No forecast published for {city}.");
                }
                for (name, period) in names.iter().zip(&periods) {
                    println!("{name:<24} {period}");
                }
            }
        }

        Ok(())
    }

    async fn open(language: Option<Language>) -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        let source = HttpSource::from_config(&config)?;
        let index = CityIndex::fetch(&source, &config)
            .await
            .context("Failed to load the city list")?;

        if index.is_empty() {
            bail!(
                "The site list at {} returned no cities.\n\
                 Hint: check the URLs with `citypage configure`.",
                config.site_list_url
            );
        }

        Ok(Self { language: language.unwrap_or(config.language), source, index })
    }

    fn data_url(&self, city: &str) -> Result<String> {
        self.index.data_url_for(city, self.language).ok_or_else(|| unknown_city(city))
    }

    async fn city(&self, name: &str) -> Result<City> {
        let url = self.data_url(name)?;
        let city = City::fetch(&self.source, &url)
            .await
            .with_context(|| format!("Failed to load weather for {name}"))?;

        if city.is_empty() {
            bail!("No weather document published for {name} at {url}");
        }
        Ok(city)
    }
}

fn unknown_city(name: &str) -> anyhow::Error {
    anyhow!("Unknown city '{name}'.\nHint: run `citypage cities` to list available names.")
}

fn configure() -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    let site_list_url =
        Text::new("Site list URL:").with_default(&config.site_list_url).prompt()?;
    let base_url = Text::new("Base document URL:").with_default(&config.base_url).prompt()?;
    let timeout = CustomType::<u64>::new("Request timeout in seconds (0 waits forever):")
        .with_default(config.timeout_secs.unwrap_or(0))
        .prompt()?;
    let language = Select::new("Document language:", Language::all().to_vec()).prompt()?;

    config.set_site_list_url(site_list_url);
    config.set_base_url(base_url);
    config.timeout_secs = (timeout > 0).then_some(timeout);
    config.language = language;

    let path = config.save().context("Failed to save configuration")?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
