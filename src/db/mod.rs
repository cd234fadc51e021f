// src/db/mod.rs
pub mod models;
pub mod mongodb;
pub mod seed;

pub use self::mongodb::{MongoRepo, Result};
pub use models::{Booking, ContactMessage, FoodItem, FoodOrder, Room, RoomImage, RoomType, User};
