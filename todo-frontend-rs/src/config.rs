#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Where the todo API lives, without a trailing slash.
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:3001")
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `TODO_API_URL`, falling back to the local default. Loads `.env` if there is one.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        match std::env::var("TODO_API_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_dropped() {
        assert_eq!(
            ClientConfig::new("http://localhost:3001/").base_url,
            "http://localhost:3001"
        );
        assert_eq!(ClientConfig::default().base_url, "http://127.0.0.1:3001");
    }
}
