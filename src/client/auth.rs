pub enum Auth {
    /// Use a CoinGecko API key sent via the `x-cg-demo-api-key` header
    ApiKey(String),
    /// Use the public, keyless rate-limit tier
    None,
}

impl Auth {
    /// Build auth from an optional API key, as resolved from the environment.
    pub fn from_api_key(api_key: Option<String>) -> Self {
        match api_key {
            Some(key) => Self::ApiKey(key),
            None => Self::None,
        }
    }
}

impl std::fmt::Display for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => write!(f, "ApiKey"),
            Self::None => write!(f, "None"),
        }
    }
}
