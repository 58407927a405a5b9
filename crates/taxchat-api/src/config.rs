use std::fmt;
use std::str::FromStr;

/// Which client answers chat requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiMode {
    /// Real backend over HTTP
    #[default]
    Http,
    /// Canned offline answers
    Mock,
}

impl ApiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for ApiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" | "live" | "real" => Ok(Self::Http),
            "mock" | "offline" => Ok(Self::Mock),
            other => Err(format!("unknown API mode '{}' (expected 'http' or 'mock')", other)),
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip trailing slashes so endpoint paths can be appended verbatim
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
