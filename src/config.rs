//! Configuración del servidor desde variables de entorno

use std::env;
use std::path::PathBuf;

/// 16MB
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// URI de conexión a MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,
    /// Dirección y puerto del servidor
    pub bind_address: String,
    /// Directorio donde se guardan las imágenes subidas
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Contraseña del administrador creado al arrancar
    pub admin_password: String,
    /// Endpoint HTTP del relay de correo; sin él los correos solo se registran en el log
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_from: String,
    /// Clave de Gemini; sin ella el chat responde "AI service not available"
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// Marca la cookie de sesión como `Secure`
    pub cookie_secure: bool,
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            mongodb_uri: env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "hotel_booking".to_string()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./static/uploads")),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
            mail_api_url: optional("MAIL_API_URL"),
            mail_api_key: optional("MAIL_API_KEY"),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@hotel.com".to_string()),
            gemini_api_key: optional("GOOGLE_GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-pro".to_string()),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "hotel_booking".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
            upload_dir: PathBuf::from("./static/uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            admin_password: "admin123".to_string(),
            mail_api_url: None,
            mail_api_key: None,
            mail_from: "no-reply@hotel.com".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-pro".to_string(),
            cookie_secure: false,
        }
    }
}
