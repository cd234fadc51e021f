//! # Utilidades de logging para errores

use std::error::Error as StdError;

/// Registra la cadena completa de errores (`source()` encadenados)
///
/// # Parámetros
/// - `error`: Error a analizar y registrar
/// - `context`: Contexto opcional, p. ej. `"sending email"`
pub fn log_error_chain<E>(error: &E, context: Option<&str>)
where
    E: StdError + 'static,
{
    let error_chain = error_chain(error);

    if let Some(ctx) = context {
        tracing::error!(
            context = %ctx,
            error_chain = ?error_chain,
            "Error with full chain (with context)"
        );
    } else {
        tracing::error!(error_chain = ?error_chain, "Error with full chain");
    }
}

fn error_chain(error: &(dyn StdError + 'static)) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current_error: Option<&dyn StdError> = Some(error);

    while let Some(err) = current_error {
        chain.push(err.to_string());
        current_error = err.source();
    }
    chain
}

/// Extension trait para Results que añade logging automático de error chains
///
/// ```ignore
/// assistant.complete(&prompt).await.log_error_context("calling assistant")?;
/// ```
pub trait ErrorLogExt<T, E> {
    /// Loggea la cadena de errores con contexto adicional
    fn log_error_context(self, context: &str) -> Result<T, E>;
}

impl<T, E> ErrorLogExt<T, E> for Result<T, E>
where
    E: StdError + 'static,
{
    fn log_error_context(self, context: &str) -> Result<T, E> {
        if let Err(ref error) = self {
            log_error_chain(error, Some(context));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AppError;

    #[test]
    fn chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let upload = crate::services::UploadError::Io {
            path: "/tmp/x".into(),
            source: io,
        };
        let chain = error_chain(&upload);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1], "disk full");
    }

    #[test]
    fn log_error_context_passes_result_through() {
        let ok: Result<u8, AppError> = Ok(3);
        assert_eq!(ok.log_error_context("noop").unwrap(), 3);

        let err: Result<u8, AppError> = Err(AppError::Conflict("taken".into()));
        assert!(err.log_error_context("noop").is_err());
    }
}
