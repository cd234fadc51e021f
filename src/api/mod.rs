//! # Módulo API
//!
//! Rutas y controladores HTTP del hotel.
//!
//! ## Módulos principales
//!
//! - [`auth`] - Registro, login y sesiones
//! - [`rooms`] - Tipos de habitación, habitaciones y disponibilidad
//! - [`bookings`] - Crear, listar y cancelar reservas
//! - [`food`] - Menú y pedidos de comida
//! - [`admin`] - Panel y gestión de reservas
//! - [`images`] - Subida de imágenes de habitaciones
//! - [`contact`] / [`chat`] - Formulario de contacto y asistente
//! - [`errors`] - Manejo de errores de la aplicación

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod chat;
pub mod contact;
pub mod errors;
pub mod flash;
pub mod food;
pub mod images;
pub mod middleware;
pub mod rooms;

// Re-exportar tipos comunes para facilitar su uso
pub use errors::{AppError, AppResult, ErrorResponse, ResultExt};

use actix_web::web;

/// Configura todas las rutas de la API
///
/// ## Rutas configuradas
///
/// - `/`, `/rooms`, `/room_type/*`, `/check_availability/*` - Ver [`rooms::routes`]
/// - `/register`, `/login`, `/logout` - Ver [`auth::routes`]
/// - `/book/*`, `/my_bookings`, `/cancel_booking/*` - Ver [`bookings::routes`]
/// - `/food_menu/*`, `/order_food` - Ver [`food::routes`]
/// - `/admin/*` - Ver [`admin::routes`] e [`images::routes`]
/// - `/contact`, `/api/chat`, `/flash`
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    rooms::routes(cfg);
    auth::routes(cfg);
    bookings::routes(cfg);
    food::routes(cfg);
    admin::routes(cfg);
    images::routes(cfg);
    contact::routes(cfg);
    chat::routes(cfg);
    flash::routes(cfg);
}
