//! Configuration loader: merges env vars, .env file, and config.toml.

use common::{Error, ServiceConfig, VesselClass};
use std::path::Path;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn parse_non_negative_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer >= 0")))
}

fn validate_config(config: &ServiceConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    for (name, url) in [
        ("upstream.marine_url", &config.upstream.marine_url),
        ("upstream.weather_url", &config.upstream.weather_url),
        ("upstream.archive_url", &config.upstream.archive_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            issues.push(format!("{name} must be an http(s) URL"));
        }
    }
    if config.upstream.timeout_secs == 0 {
        issues.push("upstream.timeout_secs must be > 0".into());
    }
    if config.upstream.requests_per_second == 0 {
        issues.push("upstream.requests_per_second must be > 0".into());
    }

    if config.forecast.forecast_days == 0 || config.forecast.forecast_days > 16 {
        issues.push("forecast.forecast_days must be in [1,16]".into());
    }
    if config.forecast.timezone.trim().is_empty() {
        issues.push("forecast.timezone must not be empty".into());
    }
    if config.forecast.period_hours == 0 {
        issues.push("forecast.period_hours must be > 0".into());
    }
    if config.forecast.horizon_hours < config.forecast.period_hours {
        issues.push("forecast.horizon_hours must be >= forecast.period_hours".into());
    }

    if config.scan.grid_concurrency == 0 {
        issues.push("scan.grid_concurrency must be > 0".into());
    }
    if !config.scan.backoff_factor.is_finite() || config.scan.backoff_factor < 1.0 {
        issues.push("scan.backoff_factor must be a number >= 1.0".into());
    }

    if config.default_vessel.parse::<VesselClass>().is_err() {
        issues.push(format!(
            "default_vessel must be one of: small_boat, fishing_boat, large_vessel (got {})",
            config.default_vessel
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Overlay environment-style variables onto `config`.
fn apply_env_overrides<F>(config: &mut ServiceConfig, var: F) -> Result<(), Error>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = var("MARINE_API_URL") {
        config.upstream.marine_url = url.trim().to_string();
    }
    if let Some(url) = var("WEATHER_API_URL") {
        config.upstream.weather_url = url.trim().to_string();
    }
    if let Some(url) = var("ARCHIVE_API_URL") {
        config.upstream.archive_url = url.trim().to_string();
    }
    if let Some(raw) = var("UPSTREAM_TIMEOUT_SECS") {
        config.upstream.timeout_secs = parse_positive_u64(&raw, "UPSTREAM_TIMEOUT_SECS")?;
    }
    if let Some(raw) = var("UPSTREAM_REQUESTS_PER_SECOND") {
        let parsed = parse_positive_u64(&raw, "UPSTREAM_REQUESTS_PER_SECOND")?;
        config.upstream.requests_per_second = u32::try_from(parsed).map_err(|_| {
            Error::Config("UPSTREAM_REQUESTS_PER_SECOND is out of range".into())
        })?;
    }
    if let Some(raw) = var("CACHE_TTL_SECS") {
        config.cache.ttl_secs = parse_non_negative_u64(&raw, "CACHE_TTL_SECS")?;
    }
    if let Some(raw) = var("FORECAST_DAYS") {
        let parsed = parse_positive_u64(&raw, "FORECAST_DAYS")?;
        config.forecast.forecast_days = u8::try_from(parsed)
            .map_err(|_| Error::Config("FORECAST_DAYS is out of range".into()))?;
    }
    if let Some(tz) = var("FORECAST_TIMEZONE") {
        config.forecast.timezone = tz.trim().to_string();
    }
    if let Some(raw) = var("SCAN_GRID_CONCURRENCY") {
        config.scan.grid_concurrency =
            parse_positive_u64(&raw, "SCAN_GRID_CONCURRENCY")? as usize;
    }
    if let Some(raw) = var("SCAN_GRID_BATCH_PAUSE_MS") {
        config.scan.grid_batch_pause_ms =
            parse_non_negative_u64(&raw, "SCAN_GRID_BATCH_PAUSE_MS")?;
    }
    if let Some(raw) = var("SCAN_ROUTE_DELAY_MS") {
        config.scan.route_delay_ms = parse_non_negative_u64(&raw, "SCAN_ROUTE_DELAY_MS")?;
    }
    if let Some(raw) = var("SCAN_BACKOFF_FACTOR") {
        config.scan.backoff_factor = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::Config("SCAN_BACKOFF_FACTOR must be a number".into()))?;
    }
    if let Some(raw) = var("SCAN_MAX_PAUSE_MS") {
        config.scan.max_pause_ms = parse_non_negative_u64(&raw, "SCAN_MAX_PAUSE_MS")?;
    }
    if let Some(vessel) = var("DEFAULT_VESSEL") {
        config.default_vessel = vessel.trim().to_string();
    }
    Ok(())
}

/// Load service configuration from environment and optional config file.
pub fn load_config() -> Result<ServiceConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = ServiceConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables (highest priority).
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_apply() {
        let env = env_of(&[
            ("CACHE_TTL_SECS", "0"),
            ("SCAN_GRID_CONCURRENCY", "5"),
            ("FORECAST_TIMEZONE", " Asia/Makassar "),
            ("DEFAULT_VESSEL", "kapal_besar"),
            ("SCAN_BACKOFF_FACTOR", "1.5"),
            ("SCAN_MAX_PAUSE_MS", "800"),
        ]);
        let mut config = ServiceConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).cloned()).expect("valid overrides");

        assert_eq!(config.cache.ttl_secs, 0);
        assert_eq!(config.scan.grid_concurrency, 5);
        assert_eq!(config.forecast.timezone, "Asia/Makassar");
        assert_eq!(config.scan.backoff_factor, 1.5);
        assert_eq!(config.scan.max_pause_ms, 800);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let env = env_of(&[("UPSTREAM_TIMEOUT_SECS", "ten")]);
        let mut config = ServiceConfig::default();
        let err = apply_env_overrides(&mut config, |k| env.get(k).cloned());
        assert!(matches!(err, Err(Error::Config(_))));

        let env = env_of(&[("FORECAST_DAYS", "300")]);
        assert!(apply_env_overrides(&mut config, |k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn test_validate_collects_all_issues() {
        let mut config = ServiceConfig::default();
        config.upstream.marine_url = "ftp://example".into();
        config.scan.grid_concurrency = 0;
        config.default_vessel = "submarine".into();
        config.scan.backoff_factor = 0.5;

        let Err(Error::Config(msg)) = validate_config(&config) else {
            panic!("expected config error");
        };
        assert!(msg.contains("upstream.marine_url"));
        assert!(msg.contains("scan.grid_concurrency"));
        assert!(msg.contains("default_vessel"));
        assert!(msg.contains("scan.backoff_factor"));
    }

    #[test]
    fn test_toml_document_parses() {
        let doc = r#"
            default_vessel = "small_boat"

            [cache]
            ttl_secs = 120

            [scan]
            route_delay_ms = 0
        "#;
        let config: ServiceConfig = toml::from_str(doc).expect("toml config");
        assert_eq!(config.cache.ttl_secs, 120);
        assert_eq!(config.scan.route_delay_ms, 0);
        assert_eq!(config.scan.grid_concurrency, 3);
        assert!(validate_config(&config).is_ok());
    }
}
