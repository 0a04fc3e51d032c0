//! Tools used by the reference assistants, plus a time-bounded result cache.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use serde_json::{json, Value};
use tracing::debug;

use switchyard_contracts::{
    error::ToolInvocationError,
    generation::ToolDeclaration,
    shape::{Shape, ShapeRule, ShapeRuleType},
};
use switchyard_core::traits::Tool;

use crate::mock_data::{current_weather, format_weather, ip_location, search_news};

fn location_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "lat": { "type": "number", "minimum": -90, "maximum": 90 },
            "long": { "type": "number", "minimum": -180, "maximum": 180 }
        },
        "required": ["lat", "long"]
    })
}

/// News search over the mock wire service.
pub struct NewsSearchTool {
    declaration: ToolDeclaration,
}

impl NewsSearchTool {
    pub fn new() -> Self {
        Self {
            declaration: ToolDeclaration {
                name: "news_search".to_string(),
                description: "Search recent news articles for a query.".to_string(),
                input: Shape::from_json_schema(
                    "news-search-input-v1",
                    json!({
                        "type": "object",
                        "properties": { "query": { "type": "string" } },
                        "required": ["query"]
                    }),
                )
                .with_rule(ShapeRule::new(
                    "query-present",
                    "the search query must not be blank",
                    ShapeRuleType::NonEmptyString { field_path: "query".to_string() },
                )),
                output: Shape::any("news-search-output-v1"),
            },
        }
    }
}

impl Default for NewsSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for NewsSearchTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolInvocationError> {
        let query = arguments["query"].as_str().ok_or_else(|| ToolInvocationError::InvalidArguments {
            tool: self.declaration.name.clone(),
            reason: "'query' must be a string".to_string(),
        })?;
        Ok(search_news(query))
    }
}

/// Fetch the current location.
pub struct GetMyLocationTool {
    declaration: ToolDeclaration,
}

impl GetMyLocationTool {
    pub fn new() -> Self {
        Self {
            declaration: ToolDeclaration {
                name: "get_my_location".to_string(),
                description: "Fetch the current location.".to_string(),
                input: Shape::from_json_schema("get-my-location-input-v1", json!({ "type": "object" })),
                output: Shape::from_json_schema("location-v1", location_schema()),
            },
        }
    }
}

impl Default for GetMyLocationTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for GetMyLocationTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    fn invoke(&self, _arguments: &Value) -> Result<Value, ToolInvocationError> {
        Ok(ip_location())
    }
}

/// Fetch the weather for a given location.
pub struct FetchWeatherTool {
    declaration: ToolDeclaration,
}

impl FetchWeatherTool {
    pub fn new() -> Self {
        Self {
            declaration: ToolDeclaration {
                name: "fetch_weather".to_string(),
                description: "Fetch the weather for a given location.".to_string(),
                input: Shape::from_json_schema(
                    "fetch-weather-input-v1",
                    json!({
                        "type": "object",
                        "properties": { "location": location_schema() },
                        "required": ["location"]
                    }),
                ),
                output: Shape::from_json_schema("fetch-weather-output-v1", json!({ "type": "string" })),
            },
        }
    }
}

impl Default for FetchWeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for FetchWeatherTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolInvocationError> {
        let coordinate = |key: &str| {
            arguments["location"][key].as_f64().ok_or_else(|| ToolInvocationError::InvalidArguments {
                tool: self.declaration.name.clone(),
                reason: format!("location.{key} must be a number"),
            })
        };
        let reading = current_weather(coordinate("lat")?, coordinate("long")?);
        Ok(Value::String(format_weather(&reading)))
    }
}

struct CacheEntry {
    stored_at: DateTime<Utc>,
    value: Value,
}

/// Entries kept by `CachedTool::new`.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Memoizes successful results of `inner` per argument value for `ttl`,
/// keeping at most `capacity` entries (least recently used evicted first).
/// Failures are never cached; expired entries are dropped when looked up.
pub struct CachedTool<T> {
    inner: T,
    ttl: Duration,
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl<T: Tool> CachedTool<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::with_capacity(inner, ttl, capacity)
    }

    pub fn with_capacity(inner: T, ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn cached_entries(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<String, CacheEntry>>, ToolInvocationError> {
        self.entries.lock().map_err(|e| ToolInvocationError::Failed {
            tool: self.inner.name().to_string(),
            reason: format!("tool cache lock poisoned: {e}"),
        })
    }
}

impl<T: Tool> Tool for CachedTool<T> {
    fn declaration(&self) -> &ToolDeclaration {
        self.inner.declaration()
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolInvocationError> {
        let key = arguments.to_string();
        let now = Utc::now();

        {
            let mut entries = self.lock()?;
            let cached = entries
                .get(&key)
                .map(|entry| (now - entry.stored_at < self.ttl, entry.value.clone()));
            match cached {
                Some((true, value)) => {
                    debug!(tool = self.inner.name(), "tool cache hit");
                    return Ok(value);
                }
                Some((false, _)) => {
                    debug!(tool = self.inner.name(), "tool cache entry expired");
                    entries.pop(&key);
                }
                None => {}
            }
        }

        let value = self.inner.invoke(arguments)?;
        self.lock()?.put(key, CacheEntry { stored_at: now, value: value.clone() });
        Ok(value)
    }
}
