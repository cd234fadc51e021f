//! # Manejo de errores
//!
//! `AppError` es el único tipo de error que devuelven los handlers. En rutas JSON
//! se convierte en respuesta vía [`ResponseError`]; en rutas de formulario se
//! convierte en mensaje flash con [`AppError::user_message`].

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::error::Error;
use thiserror::Error;

/// Tipos de error de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    /// Error de base de datos con la operación que falló
    #[error("Error de base de datos en operación '{operation}': {source}")]
    Database {
        operation: String,
        #[source]
        source: mongodb::error::Error,
    },

    /// Error de validación con campo específico
    #[error("Error de validación en campo '{field}': {message}")]
    ValidationWithField { field: String, message: String },

    /// Error de validación general; el mensaje se muestra tal cual al usuario
    #[error("{0}")]
    Validation(String),

    /// Falta sesión o credenciales incorrectas
    #[error("{0}")]
    Unauthorized(String),

    /// Hay sesión pero no permiso sobre el recurso
    #[error("{0}")]
    Forbidden(String),

    /// Error de recurso no encontrado
    #[error("No encontrado: {resource_type} con ID '{id}'")]
    NotFoundWithId { resource_type: String, id: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Error interno con código de rastreo
    #[error("Error interno (trace: {trace_id}): {message}")]
    InternalWithTrace { trace_id: String, message: String },

    #[error("Error interno: {0}")]
    Internal(String),
}

// Métodos helper para crear errores con contexto
impl AppError {
    /// Crea un error de base de datos con contexto de operación
    pub fn database(operation: &str, source: mongodb::error::Error) -> Self {
        Self::Database {
            operation: operation.to_string(),
            source,
        }
    }

    /// Crea un error de validación con campo específico
    pub fn validation_field(field: &str, message: &str) -> Self {
        Self::ValidationWithField {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Crea un error de no encontrado con ID
    pub fn not_found_id(resource_type: &str, id: &str) -> Self {
        Self::NotFoundWithId {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Crea un error interno con trace ID
    pub fn internal_trace(message: &str, trace_id: Option<String>) -> Self {
        Self::InternalWithTrace {
            trace_id: trace_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            message: message.to_string(),
        }
    }

    /// Texto apto para mostrar al usuario; nunca expone detalles internos
    pub fn user_message(&self) -> String {
        match self {
            Self::Database { .. } | Self::Internal(_) => {
                "Something went wrong, please try again later.".to_string()
            }
            Self::InternalWithTrace { trace_id, .. } => {
                format!("Something went wrong, please try again later (ref: {}).", trace_id)
            }
            Self::ValidationWithField { field, message } => format!("{}: {}", field, message),
            Self::NotFoundWithId { resource_type, .. } => format!("{} not found!", resource_type),
            Self::Validation(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m) => m.clone(),
        }
    }

    /// Registra el error con el nivel adecuado a su gravedad
    pub fn log(&self) {
        match self {
            Self::Database { operation, source } => {
                tracing::error!(
                    operation = %operation,
                    error = %source,
                    error_chain = ?source.source(),
                    "Database error occurred"
                );
            }
            Self::InternalWithTrace { trace_id, message } => {
                tracing::error!(trace_id = %trace_id, message = %message, "Internal error with trace");
            }
            Self::Internal(message) => {
                tracing::error!(message = %message, "Internal error");
            }
            Self::Unauthorized(_) | Self::Forbidden(_) => {
                tracing::warn!(error = %self, "Unauthorized access attempt");
            }
            Self::NotFoundWithId { resource_type, id } => {
                tracing::info!(resource_type = %resource_type, id = %id, "Resource not found");
            }
            other => {
                tracing::debug!(error = %other, "Request rejected");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::ValidationWithField { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::NotFoundWithId { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database { .. } | Self::InternalWithTrace { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.log();
        let error = match self.status_code() {
            StatusCode::BAD_REQUEST => "Validation error",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not found",
            StatusCode::CONFLICT => "Conflict",
            _ => "Internal error",
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            success: false,
            error: error.to_string(),
            message: self.user_message(),
        })
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

pub type AppResult<T> = Result<T, AppError>;

// Conversión automática desde mongodb::error::Error
impl From<mongodb::error::Error> for AppError {
    fn from(error: mongodb::error::Error) -> Self {
        Self::Database {
            operation: "database_operation".to_string(),
            source: error,
        }
    }
}

// Conversión desde errores de ObjectId
impl From<mongodb::bson::oid::Error> for AppError {
    fn from(e: mongodb::bson::oid::Error) -> Self {
        Self::validation_field("id", &e.to_string())
    }
}

impl From<crate::services::UploadError> for AppError {
    fn from(e: crate::services::UploadError) -> Self {
        match e {
            crate::services::UploadError::Io { .. } => Self::internal_trace(&e.to_string(), None),
            other => Self::Validation(other.to_string()),
        }
    }
}

pub trait ResultExt<T> {
    fn map_err_validation(self, message: &str) -> AppResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + 'static,
{
    fn map_err_validation(self, message: &str) -> AppResult<T> {
        self.map_err(|_| AppError::Validation(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn status_codes() {
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_not_shown_to_users() {
        let err = AppError::Internal("connection pool exhausted".into());
        assert!(!err.user_message().contains("pool"));

        let traced = AppError::internal_trace("disk full", Some("abc".into()));
        assert!(traced.user_message().contains("ref: abc"));
        assert!(!traced.user_message().contains("disk"));
    }

    #[test]
    fn invalid_object_id_is_a_validation_error() {
        let err: AppError = mongodb::bson::oid::ObjectId::parse_str("nope").unwrap_err().into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn error_body_is_json() {
        let resp = AppError::Forbidden("Invalid or unauthorized booking!".into()).error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Invalid or unauthorized booking!");
    }
}
