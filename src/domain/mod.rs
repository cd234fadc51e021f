//! # Lógica de dominio
//!
//! Funciones puras sin acceso a base de datos:
//!
//! - [`booking`] - Estados de reserva, rangos de fechas, disponibilidad y precio
//! - [`loyalty`] - Niveles de fidelización según reservas confirmadas

pub mod booking;
pub mod loyalty;

pub use booking::{is_available, total_price, BookingStatus, DateRange};
pub use loyalty::LoyaltyTier;
