use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::domain::{BookingStatus, DateRange, LoyaltyTier};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: i64, // timestamp unix
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoomType {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    /// Tarifa por noche
    pub base_price: f64,
    pub capacity: i32,
    #[serde(default)]
    pub amenities: String,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Room {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub room_number: String,
    pub room_type_id: ObjectId,
    pub is_available: bool,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoomImage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub room_id: ObjectId,
    /// Ruta relativa a `/static`, p. ej. `uploads/<uuid>_foto.png`
    pub image_path: String,
    pub is_primary: bool,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub room_id: ObjectId,
    /// Fechas en formato YYYY-MM-DD; el orden lexicográfico coincide con el cronológico
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_price: f64,
    pub booking_date: i64, // timestamp unix
    pub status: BookingStatus,
    #[serde(default)]
    pub special_requests: String,
    pub is_approved: bool,
    /// Ya sumada al contador de fidelización del usuario
    #[serde(default)]
    pub loyalty_counted: bool,
}

impl Booking {
    /// Rango de noches de la reserva; `None` si el documento tiene fechas incoherentes
    pub fn range(&self) -> Option<DateRange> {
        DateRange::new(self.check_in, self.check_out).ok()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FoodItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// breakfast, lunch, dinner, snacks
    pub category: String,
    pub is_available: bool,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FoodOrder {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub booking_id: ObjectId,
    pub food_item_id: ObjectId,
    pub quantity: i32,
    pub total_price: f64,
    pub order_date: i64,
    /// pending, preparing, delivered
    pub status: String,
    #[serde(default)]
    pub special_instructions: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContactMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerLoyalty {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub loyalty_level: LoyaltyTier,
    pub total_bookings: u32,
    pub discount_percentage: f64,
}

/// Sesión de servidor; la cookie solo transporta el token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Session {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub token: String,
    pub user_id: ObjectId,
    pub created_at: i64,
}
