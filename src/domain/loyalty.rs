//! # Programa de fidelización
//!
//! El nivel se deriva siempre del contador de reservas confirmadas; no caduca.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    /// Calcula el nivel a partir del total de reservas confirmadas
    ///
    /// | Reservas | Nivel    | Descuento |
    /// |----------|----------|-----------|
    /// | 0-1      | bronze   | 0%        |
    /// | 2-4      | silver   | 5%        |
    /// | 5-9      | gold     | 10%       |
    /// | 10+      | platinum | 15%       |
    pub fn for_bookings(total_bookings: u32) -> Self {
        match total_bookings {
            10.. => Self::Platinum,
            5..=9 => Self::Gold,
            2..=4 => Self::Silver,
            _ => Self::Bronze,
        }
    }

    pub fn discount_percentage(&self) -> f64 {
        match self {
            Self::Bronze => 0.0,
            Self::Silver => 5.0,
            Self::Gold => 10.0,
            Self::Platinum => 15.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }
}

impl Default for LoyaltyTier {
    fn default() -> Self {
        Self::Bronze
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        let expected = [
            (0, LoyaltyTier::Bronze),
            (1, LoyaltyTier::Bronze),
            (2, LoyaltyTier::Silver),
            (4, LoyaltyTier::Silver),
            (5, LoyaltyTier::Gold),
            (9, LoyaltyTier::Gold),
            (10, LoyaltyTier::Platinum),
            (250, LoyaltyTier::Platinum),
        ];
        for (count, tier) in expected {
            assert_eq!(LoyaltyTier::for_bookings(count), tier, "count = {}", count);
        }
    }

    #[test]
    fn fifth_confirmed_booking_is_gold() {
        let tier = LoyaltyTier::for_bookings(5);
        assert_eq!(tier.as_str(), "gold");
        assert_eq!(tier.discount_percentage(), 10.0);
    }

    #[test]
    fn tier_never_decreases_as_count_grows() {
        let mut previous = LoyaltyTier::for_bookings(0);
        for count in 1..30 {
            let tier = LoyaltyTier::for_bookings(count);
            assert!(tier >= previous);
            assert!(tier.discount_percentage() >= previous.discount_percentage());
            previous = tier;
        }
    }
}
