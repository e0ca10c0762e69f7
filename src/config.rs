use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub admin_api_key: String,
    pub app_base_url: String,
    /// Offset from UTC, in minutes, of the frame operating hours are authored in.
    pub venue_utc_offset_minutes: i32,
    /// Let a previous day's overnight entry keep a venue open past midnight.
    pub open_now_carry_over: bool,
    pub search_default_limit: i64,
    pub search_max_limit: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            admin_api_key: required("ADMIN_API_KEY")?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".into()),
            // JST
            venue_utc_offset_minutes: env::var("VENUE_UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "540".into())
                .parse()?,
            open_now_carry_over: env::var("OPEN_NOW_CARRY_OVER")
                .ok()
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            search_default_limit: env::var("SEARCH_DEFAULT_LIMIT")
                .unwrap_or_else(|_| "20".into())
                .parse()?,
            search_max_limit: env::var("SEARCH_MAX_LIMIT")
                .unwrap_or_else(|_| "100".into())
                .parse()?,
        };

        config.check_ranges()?;
        Ok(config)
    }

    fn check_ranges(&self) -> anyhow::Result<()> {
        if !(-(24 * 60 - 1)..=24 * 60 - 1).contains(&self.venue_utc_offset_minutes) {
            anyhow::bail!(
                "VENUE_UTC_OFFSET_MINUTES out of range: {}",
                self.venue_utc_offset_minutes
            );
        }
        if self.search_default_limit < 1 || self.search_max_limit < self.search_default_limit {
            anyhow::bail!("SEARCH_DEFAULT_LIMIT must be >= 1 and <= SEARCH_MAX_LIMIT");
        }
        Ok(())
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
