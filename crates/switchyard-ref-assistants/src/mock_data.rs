//! Canned data standing in for the external services the assistants would
//! call: a news search API, IP geolocation and a weather forecast API.
//!
//! Everything here is hardcoded and fictional. Nothing touches the network.

use serde_json::{json, Value};

/// News articles matching `query`.
///
/// Queries mentioning interest rates, elections or climate return two
/// articles each; anything else returns a single generic wire story.
pub fn search_news(query: &str) -> Value {
    let q = query.to_lowercase();

    let articles = if q.contains("interest rate") || q.contains("rates") {
        json!([
            {
                "title": "Central bank holds benchmark rate steady for third meeting",
                "source": "Example Wire",
                "date": "2026-10-17",
                "snippet": "Policymakers signalled that cuts remain possible before year end."
            },
            {
                "title": "Mortgage costs ease as bond yields slip",
                "source": "Daily Ledger",
                "date": "2026-10-16",
                "snippet": "Average 30-year fixed rates fell for a second week."
            }
        ])
    } else if q.contains("election") {
        json!([
            {
                "title": "Turnout hits record in regional elections",
                "source": "Example Wire",
                "date": "2026-10-18",
                "snippet": "Officials reported queues at polling stations into the evening."
            },
            {
                "title": "Debate night: five takeaways",
                "source": "Morning Post",
                "date": "2026-10-15",
                "snippet": "Candidates clashed over housing and transport."
            }
        ])
    } else if q.contains("climate") {
        json!([
            {
                "title": "Delegates agree on methane reporting rules",
                "source": "Planet Desk",
                "date": "2026-10-14",
                "snippet": "The framework takes effect in 2028."
            },
            {
                "title": "Record autumn heat across southern Europe",
                "source": "Example Wire",
                "date": "2026-10-12",
                "snippet": "Temperatures ran six degrees above the seasonal average."
            }
        ])
    } else {
        json!([
            {
                "title": format!("Latest coverage: {}", query.trim()),
                "source": "Example Wire",
                "date": "2026-10-18",
                "snippet": "Developing story; details to follow."
            }
        ])
    };

    json!({ "query": query, "articles": articles })
}

/// The caller's location as an IP geolocation lookup would report it.
pub fn ip_location() -> Value {
    json!({ "lat": 52.52, "long": 13.41 })
}

/// Current conditions at a coordinate.
///
/// Two coordinates are known (Berlin and Seattle, within 0.5 degrees);
/// everywhere else gets mild, dry defaults.
pub fn current_weather(lat: f64, long: f64) -> Value {
    let near = |a: f64, b: f64| (lat - a).abs() < 0.5 && (long - b).abs() < 0.5;

    let (temperature, precipitation, cloud_cover, wind_speed) = if near(52.52, 13.41) {
        (11.4, 0.2, 78.0, 14.6)
    } else if near(47.61, -122.33) {
        (9.1, 2.8, 100.0, 9.7)
    } else {
        (18.0, 0.0, 20.0, 6.0)
    };

    json!({
        "time": "2026-10-19T09:00:00Z",
        "temperature_2m": temperature,
        "precipitation": precipitation,
        "cloud_cover": cloud_cover,
        "wind_speed_10m": wind_speed
    })
}

/// Render a `current_weather` reading the way the weather tool reports it.
pub fn format_weather(reading: &Value) -> String {
    format!(
        "Current time: {}\n\
         Current temperature in celsius: {}\n\
         Current precipitation in millimeters: {}\n\
         Current cloud cover percentage: {}\n\
         Current wind speed km/h: {}",
        reading["time"].as_str().unwrap_or("unknown"),
        reading["temperature_2m"],
        reading["precipitation"],
        reading["cloud_cover"],
        reading["wind_speed_10m"],
    )
}
