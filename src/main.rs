//! # Hotel Booking Server
//!
//! Servidor web de reservas de hotel construido con Rust, Actix Web y MongoDB.
//!
//! ## Características principales
//!
//! - **Habitaciones**: Catálogo por tipo y consulta de disponibilidad
//! - **Reservas**: Alta con precio calculado, aprobación y cancelación
//! - **Fidelización**: Niveles bronze/silver/gold/platinum por reservas confirmadas
//! - **Servicio de comidas**: Pedidos ligados a reservas aprobadas
//! - **Administración**: Estadísticas, gestión de reservas e imágenes
//!
//! ## Configuración
//!
//! El servidor se configura mediante variables de entorno (archivo `.env`):
//!
//! ```env
//! MONGODB_URI=mongodb://localhost:27017
//! MONGODB_DATABASE=hotel_booking
//! BIND_ADDRESS=0.0.0.0:8080
//! ADMIN_PASSWORD=admin123
//!
//! # Opcionales
//! MAIL_API_URL=https://mail-relay.example.com/send
//! GOOGLE_GEMINI_API_KEY=...
//!
//! RUST_LOG=debug,mongodb=info
//! ```
//!
//! ## Arquitectura
//!
//! ```text
//! Cliente (HTML/JS)
//!     ↓ HTTP/JSON + cookie de sesión
//! API REST (Actix Web)
//!     ↓ MongoDB Driver          ↓ reqwest
//! MongoDB Database          Relay de correo / Gemini
//! ```

use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::path::Path;

mod api;
mod config;
mod db;
mod domain;
mod services;
mod state;

use config::AppConfig;
use state::AppState;

/// `/static/uploads` sale de `UPLOAD_DIR`; el resto de `/static` de `./static`
fn static_files(cfg: &mut web::ServiceConfig, upload_dir: &Path) {
    cfg.service(Files::new("/static/uploads", upload_dir))
        .service(Files::new("/static", "./static"));
}

/// Función principal que inicia el servidor web
///
/// 1. Carga variables de entorno desde `.env`
/// 2. Configura el logging con tracing
/// 3. Conecta con MongoDB, crea índices y datos iniciales
/// 4. Arranca el servidor HTTP con las rutas de la API y `/static`
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["hotel_booking=debug", "mongodb=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Iniciando Hotel Booking Server con MongoDB...");

    let config = AppConfig::from_env();

    // El cliente conecta de forma perezosa; solo falla con una URI inválida
    let repo = db::MongoRepo::connect(&config).await.map_err(|e| {
        tracing::error!("Configuración de MongoDB no válida: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, format!("Error de MongoDB: {}", e))
    })?;

    // Una sola vez, antes de aceptar peticiones
    db::seed::prepare(&repo, &config.admin_password).await;

    let state = web::Data::new(AppState::new(repo, &config));
    tokio::fs::create_dir_all(state.uploads.dir()).await?;
    let upload_dir = state.uploads.dir().to_path_buf();

    tracing::info!("Servidor iniciando en {}", config.bind_address);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(api::init_routes)
            .configure(|cfg| static_files(cfg, &upload_dir))
    })
    .bind(&config.bind_address)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    #[actix_web::test]
    async fn uploads_are_served_from_configured_dir() {
        let dir = std::env::temp_dir().join(format!("hotel-static-{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("abc_suite.png"), b"fake-png").unwrap();

        let app = test::init_service(App::new().configure(|cfg| static_files(cfg, &dir))).await;
        let req = test::TestRequest::get().uri("/static/uploads/abc_suite.png").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(test::read_body(resp).await.as_ref(), b"fake-png");

        std::fs::remove_dir_all(dir).ok();
    }
}
