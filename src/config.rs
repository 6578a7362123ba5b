use std::env;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
/// Room for multipart boundaries and form fields on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub storage_root: String,
    pub storage_bucket: String,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let storage_root = env::var("STORAGE_ROOT").unwrap_or_else(|_| "./storage".to_string());
        let storage_bucket = env::var("STORAGE_BUCKET").unwrap_or_else(|_| "images".to_string());
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://{host}:{port}"));
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty());

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            storage_root,
            storage_bucket,
            public_base_url,
            max_upload_bytes,
            cors_origin,
        })
    }

    /// Largest request body the server accepts.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_upload_bytes: usize) -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/test".into(),
            host: "127.0.0.1".into(),
            port: 3000,
            jwt_secret: "secret".into(),
            storage_root: "./storage".into(),
            storage_bucket: "images".into(),
            public_base_url: "http://127.0.0.1:3000".into(),
            max_upload_bytes,
            cors_origin: None,
        }
    }

    #[test]
    fn body_limit_leaves_room_for_multipart_framing() {
        assert_eq!(config(1024).body_limit(), 1024 + MULTIPART_OVERHEAD);
        assert_eq!(config(usize::MAX).body_limit(), usize::MAX);
        assert_eq!(config(usize::MAX - 1).body_limit(), usize::MAX);
    }
}
