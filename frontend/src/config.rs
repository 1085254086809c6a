/// Where the app finds `/predict` and `/kb/search`, plus UI timings.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub toast_duration_ms: u32,
}

const DEFAULT_TOAST_DURATION_MS: u32 = 5000;

impl ApiConfig {
    /// Same origin unless `PLANT_API_BASE_URL` was set when the bundle was built.
    pub fn from_build_env() -> Self {
        Self::with_base_url(option_env!("PLANT_API_BASE_URL").unwrap_or(""))
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            toast_duration_ms: DEFAULT_TOAST_DURATION_MS,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::with_base_url("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        assert_eq!(ApiConfig::default().base_url, "");
        assert_eq!(
            ApiConfig::with_base_url(" https://plants.example/api/ ").base_url,
            "https://plants.example/api"
        );
    }
}
