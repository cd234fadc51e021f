//! # Almacenamiento de imágenes subidas
//!
//! Los ficheros se guardan en un directorio local con nombre único
//! `<uuid>_<nombre saneado>` y se sirven bajo `/static/uploads/`.

use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type '{0}'. Allowed: png, jpg, jpeg, gif, webp")]
    UnsupportedType(String),

    #[error("File too large: maximum size is {max} bytes")]
    TooLarge { max: usize },

    #[error("Empty file provided")]
    Empty,

    #[error("Error guardando fichero en {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Extensión en minúsculas si está permitida
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Deja solo caracteres seguros para un nombre de fichero y elimina rutas
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Valida y guarda la imagen; devuelve la ruta relativa a `/static`
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<String, UploadError> {
        let ext = allowed_extension(original_name)
            .ok_or_else(|| UploadError::UnsupportedType(original_name.to_string()))?;
        if data.is_empty() {
            return Err(UploadError::Empty);
        }
        if data.len() > self.max_bytes {
            return Err(UploadError::TooLarge { max: self.max_bytes });
        }

        let mut safe_name = sanitize_filename(original_name);
        if safe_name.is_empty() || allowed_extension(&safe_name).is_none() {
            safe_name = format!("image.{}", ext);
        }
        let unique_name = format!("{}_{}", Uuid::new_v4().simple(), safe_name);
        let path = self.dir.join(&unique_name);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| UploadError::Io {
                path: self.dir.display().to_string(),
                source,
            })?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|source| UploadError::Io {
                path: path.display().to_string(),
                source,
            })?;

        tracing::info!(file = %unique_name, size = data.len(), "Imagen guardada");
        Ok(format!("uploads/{}", unique_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extensions_case_insensitive() {
        assert_eq!(allowed_extension("room.PNG").as_deref(), Some("png"));
        assert_eq!(allowed_extension("a.b.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(allowed_extension("lobby.webp").as_deref(), Some("webp"));
    }

    #[test]
    fn rejects_other_extensions() {
        assert!(allowed_extension("script.exe").is_none());
        assert!(allowed_extension("noextension").is_none());
        assert!(allowed_extension("image.svg").is_none());
    }

    #[test]
    fn sanitizes_paths_and_spaces() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\photos\\my room.jpg"), "my_room.jpg");
        assert_eq!(sanitize_filename(".hidden.png"), "hidden.png");
        assert_eq!(sanitize_filename("suite*#1.gif"), "suite1.gif");
    }

    #[actix_web::test]
    async fn save_writes_unique_file() {
        let dir = std::env::temp_dir().join(format!("hotel-uploads-{}", Uuid::new_v4().simple()));
        let store = UploadStore::new(&dir, 1024);

        let first = store.save("suite.png", b"fake-png").await.unwrap();
        let second = store.save("suite.png", b"fake-png").await.unwrap();

        assert!(first.starts_with("uploads/"));
        assert!(first.ends_with("_suite.png"));
        assert_ne!(first, second);
        let stored = dir.join(first.trim_start_matches("uploads/"));
        assert_eq!(std::fs::read(stored).unwrap(), b"fake-png");

        std::fs::remove_dir_all(dir).ok();
    }

    #[actix_web::test]
    async fn save_enforces_limits() {
        let dir = std::env::temp_dir().join(format!("hotel-uploads-{}", Uuid::new_v4().simple()));
        let store = UploadStore::new(&dir, 4);

        assert!(matches!(store.save("a.exe", b"x").await, Err(UploadError::UnsupportedType(_))));
        assert!(matches!(store.save("a.png", b"").await, Err(UploadError::Empty)));
        assert!(matches!(
            store.save("a.png", b"12345").await,
            Err(UploadError::TooLarge { max: 4 })
        ));
    }
}
