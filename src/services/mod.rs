//! # Colaboradores externos
//!
//! - [`mailer`] - Correo transaccional (fallos no fatales)
//! - [`assistant`] - Completado de texto para el chat
//! - [`uploads`] - Almacenamiento local de imágenes

pub mod assistant;
pub mod mailer;
pub mod uploads;

pub use assistant::{Assistant, AssistantError};
pub use mailer::Mailer;
pub use uploads::{UploadError, UploadStore};
