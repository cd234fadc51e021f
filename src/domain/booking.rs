//! # Reservas: estados, disponibilidad y precio
//!
//! Las estancias se modelan como intervalos semiabiertos `[check_in, check_out)`:
//! la noche del `check_out` no se ocupa, así que una salida y una entrada el
//! mismo día no se solapan.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Estado de una reserva
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Estados que bloquean la habitación
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Una reserva activa es la que está pendiente o confirmada
    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Check-out date must be after check-in date!")]
pub struct InvalidDateRange;

/// Intervalo semiabierto de noches `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Crea un rango exigiendo `start < end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidDateRange> {
        if start >= end {
            return Err(InvalidDateRange);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Número de noches completas
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Prueba de solape entre dos intervalos semiabiertos.
    ///
    /// Equivale a comprobar los tres casos: el nuevo inicio cae dentro del
    /// existente, el inicio existente cae dentro del nuevo, o uno contiene al otro.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Cada noche ocupada por el rango, en orden
    pub fn nights_iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end;
        std::iter::successors(Some(self.start), |d| d.checked_add_days(Days::new(1)))
            .take_while(move |d| *d < end)
    }
}

/// Devuelve `true` si ningún rango existente solapa con el candidato.
///
/// Se espera que `existing` contenga solo reservas activas de la misma habitación.
pub fn is_available<I>(candidate: &DateRange, existing: I) -> bool
where
    I: IntoIterator<Item = DateRange>,
{
    existing.into_iter().all(|booked| !booked.overlaps(candidate))
}

/// Precio total: tarifa por noche × número de noches, sin prorrateo ni descuentos
pub fn total_price(nightly_rate: f64, range: &DateRange) -> f64 {
    nightly_rate * range.nights() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(date(start), date(end)).unwrap()
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert_eq!(DateRange::new(date("2024-01-10"), date("2024-01-10")), Err(InvalidDateRange));
        assert_eq!(DateRange::new(date("2024-01-12"), date("2024-01-10")), Err(InvalidDateRange));
    }

    #[test]
    fn overlapping_request_is_unavailable() {
        let existing = vec![range("2024-01-10", "2024-01-12")];
        let candidate = range("2024-01-11", "2024-01-13");
        assert!(!is_available(&candidate, existing));
    }

    #[test]
    fn back_to_back_stays_do_not_overlap() {
        let existing = vec![range("2024-01-10", "2024-01-12")];
        assert!(is_available(&range("2024-01-12", "2024-01-14"), existing.clone()));
        assert!(is_available(&range("2024-01-08", "2024-01-10"), existing));
    }

    #[test]
    fn containment_overlaps_both_ways() {
        let outer = range("2024-03-01", "2024-03-10");
        let inner = range("2024-03-03", "2024-03-04");
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(!is_available(&inner, vec![outer]));
        assert!(!is_available(&outer, vec![inner]));
    }

    #[test]
    fn available_with_no_bookings() {
        assert!(is_available(&range("2024-05-01", "2024-05-02"), Vec::new()));
    }

    #[test]
    fn price_is_rate_times_nights() {
        let stay = range("2024-01-10", "2024-01-13");
        assert_eq!(stay.nights(), 3);
        assert_eq!(total_price(150.0, &stay), 450.0);
    }

    #[test]
    fn price_across_month_boundary() {
        let stay = range("2024-02-28", "2024-03-02");
        assert_eq!(stay.nights(), 3);
        assert_eq!(total_price(100.0, &stay), 300.0);
    }

    #[test]
    fn nights_iter_excludes_checkout_day() {
        let nights: Vec<String> = range("2024-12-30", "2025-01-02")
            .nights_iter()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(nights, vec!["2024-12-30", "2024-12-31", "2025-01-01"]);
    }

    #[test]
    fn only_pending_and_confirmed_are_active() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
        assert!(!BookingStatus::Completed.is_active());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&BookingStatus::Confirmed).unwrap(), "\"confirmed\"");
        let parsed: BookingStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, BookingStatus::Completed);
    }
}
