use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Current conditions for one place.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub location: String,
    pub description: String,
    pub temperature_c: i32,
    pub feels_like_c: i32,
    pub humidity: u32,
    pub wind_kmph: u32,
}

// wttr.in `format=j1` payload; numbers arrive as strings.
#[derive(Debug, Deserialize)]
struct WttrResponse {
    current_condition: Vec<WttrCondition>,
    #[serde(default)]
    nearest_area: Vec<WttrArea>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WttrCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    humidity: String,
    windspeed_kmph: String,
    #[serde(default)]
    weather_desc: Vec<WttrValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WttrArea {
    #[serde(default)]
    area_name: Vec<WttrValue>,
    #[serde(default)]
    country: Vec<WttrValue>,
}

#[derive(Debug, Deserialize)]
struct WttrValue {
    value: String,
}

pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    pub fn request_url(&self, city: &str) -> String {
        format!(
            "{}/{}?format=j1",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(city.trim())
        )
    }

    pub async fn current(&self, city: &str) -> Result<WeatherReport> {
        let url = self.request_url(city);
        debug!("🌦️ Consultando clima: {}", url);

        let response: WttrResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("Weather service unreachable")?
            .error_for_status()?
            .json()
            .await
            .context("Weather service returned an unexpected payload")?;

        parse_report(response, city)
    }
}

fn parse_report(response: WttrResponse, city: &str) -> Result<WeatherReport> {
    let condition = response
        .current_condition
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No current conditions for {}", city))?;

    let location = response
        .nearest_area
        .first()
        .and_then(|area| {
            let name = area.area_name.first()?.value.clone();
            Some(match area.country.first() {
                Some(country) => format!("{}, {}", name, country.value),
                None => name,
            })
        })
        .unwrap_or_else(|| city.trim().to_string());

    Ok(WeatherReport {
        location,
        description: condition
            .weather_desc
            .first()
            .map(|desc| desc.value.trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
        temperature_c: condition.temp_c.trim().parse().context("Bad temperature")?,
        feels_like_c: condition.feels_like_c.trim().parse().context("Bad feels-like temperature")?,
        humidity: condition.humidity.trim().parse().context("Bad humidity")?,
        wind_kmph: condition.windspeed_kmph.trim().parse().context("Bad wind speed")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "current_condition": [{
            "FeelsLikeC": "12",
            "humidity": "81",
            "temp_C": "14",
            "weatherDesc": [{"value": "Light rain"}],
            "windspeedKmph": "17"
        }],
        "nearest_area": [{
            "areaName": [{"value": "London"}],
            "country": [{"value": "United Kingdom"}]
        }]
    }"#;

    #[test]
    fn test_parse_report() {
        let response: WttrResponse = serde_json::from_str(SAMPLE).unwrap();
        let report = parse_report(response, "london").unwrap();

        assert_eq!(
            report,
            WeatherReport {
                location: "London, United Kingdom".to_string(),
                description: "Light rain".to_string(),
                temperature_c: 14,
                feels_like_c: 12,
                humidity: 81,
                wind_kmph: 17,
            }
        );
    }

    #[test]
    fn test_missing_conditions_is_error() {
        let response: WttrResponse =
            serde_json::from_str(r#"{"current_condition": []}"#).unwrap();
        assert!(parse_report(response, "Atlantis").is_err());
    }

    #[test]
    fn test_request_url_encodes_city() {
        let client = WeatherClient::new("https://wttr.in/");
        assert_eq!(
            client.request_url(" New York "),
            "https://wttr.in/New%20York?format=j1"
        );
    }
}
