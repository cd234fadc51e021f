//! # Datos iniciales
//!
//! Se ejecuta una sola vez desde `main` antes de arrancar el servidor HTTP.
//! Cada bloque solo inserta si la colección correspondiente está vacía, así que
//! repetir el arranque no duplica datos.

use mongodb::bson::doc;
use std::collections::HashMap;

use super::models::{FoodItem, Room, RoomType, User};
use super::{MongoRepo, Result};
use crate::api::auth::hash_password;
use crate::api::AppError;

pub const ADMIN_EMAIL: &str = "admin@hotel.com";

/// (nombre, descripción, precio por noche, capacidad, servicios)
const ROOM_TYPES: [(&str, &str, f64, i32, &str); 4] = [
    (
        "Deluxe Suite",
        "Luxurious suite with city view, king-size bed, and premium amenities.",
        200.0,
        2,
        "King Bed, City View, Mini Bar, Room Service, Free WiFi",
    ),
    (
        "Standard Room",
        "Comfortable room with modern amenities, perfect for solo travelers or couples.",
        100.0,
        2,
        "Queen Bed, TV, Free WiFi, Coffee Maker",
    ),
    (
        "Family Room",
        "Spacious room perfect for families with multiple beds and extra space.",
        150.0,
        4,
        "2 Queen Beds, Extra Space, Kids Amenities, Free WiFi",
    ),
    (
        "Executive Suite",
        "Premium suite with business amenities, separate living area, and work space.",
        300.0,
        2,
        "King Bed, Living Area, Work Desk, Premium WiFi, Business Services",
    ),
];

/// (número de habitación, tipo)
const ROOMS: [(&str, &str); 8] = [
    ("101", "Deluxe Suite"),
    ("102", "Deluxe Suite"),
    ("201", "Standard Room"),
    ("202", "Standard Room"),
    ("203", "Standard Room"),
    ("301", "Family Room"),
    ("302", "Family Room"),
    ("401", "Executive Suite"),
];

/// (nombre, descripción, precio, categoría)
const FOOD_ITEMS: [(&str, &str, f64, &str); 8] = [
    ("Continental Breakfast", "Fresh pastries, coffee, and juice", 15.0, "breakfast"),
    ("Full English Breakfast", "Eggs, bacon, toast, and tea", 20.0, "breakfast"),
    ("Caesar Salad", "Fresh romaine lettuce with Caesar dressing", 12.0, "lunch"),
    ("Grilled Chicken Sandwich", "Grilled chicken with vegetables", 18.0, "lunch"),
    ("Beef Steak", "Premium beef steak with sides", 35.0, "dinner"),
    ("Pasta Carbonara", "Creamy pasta with bacon and cheese", 22.0, "dinner"),
    ("French Fries", "Crispy golden fries", 8.0, "snacks"),
    ("Chocolate Cake", "Rich chocolate cake with cream", 10.0, "snacks"),
];

/// Prepara la base de datos al arrancar: conexión, índices y datos iniciales.
///
/// Nada de esto es fatal. Devuelve `false` si MongoDB no respondió; en ese caso
/// no se intentan índices ni datos y el servidor arranca igualmente.
pub async fn prepare(repo: &MongoRepo, admin_password: &str) -> bool {
    if let Err(e) = repo.ping().await {
        tracing::warn!(error = %e, "MongoDB no responde, se arranca sin índices ni datos iniciales");
        return false;
    }
    tracing::info!(database = %repo.database.name(), "Conexión a MongoDB establecida");

    // No es un error fatal, continuamos sin índices
    if let Err(e) = repo.create_indexes().await {
        tracing::warn!("Advertencia creando índices: {}", e);
    }
    initialize(repo, admin_password).await;
    true
}

/// Crea el administrador y el catálogo de ejemplo.
///
/// Los errores no son fatales: se registran y el servidor arranca con lo que haya.
pub async fn initialize(repo: &MongoRepo, admin_password: &str) {
    match seed(repo, admin_password).await {
        Ok(()) => tracing::info!("Inicialización de la base de datos completada"),
        Err(e) => tracing::error!(error = %e, "Error inicializando la base de datos, se continúa sin datos de ejemplo"),
    }
}

async fn seed(repo: &MongoRepo, admin_password: &str) -> Result<()> {
    seed_admin(repo, admin_password).await?;
    seed_room_types(repo).await?;
    seed_rooms(repo).await?;
    seed_food_items(repo).await?;
    Ok(())
}

async fn seed_admin(repo: &MongoRepo, admin_password: &str) -> Result<()> {
    let existing = repo
        .users()
        .find_one(doc! { "email": ADMIN_EMAIL })
        .await
        .map_err(|e| AppError::database("seed_find_admin", e))?;
    if existing.is_some() {
        return Ok(());
    }

    let admin = User {
        id: None,
        username: "admin".to_string(),
        email: ADMIN_EMAIL.to_string(),
        password_hash: hash_password(admin_password)?,
        is_admin: true,
        created_at: MongoRepo::current_timestamp(),
    };
    repo.users()
        .insert_one(admin)
        .await
        .map_err(|e| AppError::database("seed_admin", e))?;
    tracing::info!("Usuario administrador creado");
    Ok(())
}

async fn seed_room_types(repo: &MongoRepo) -> Result<()> {
    let count = repo
        .room_types()
        .count_documents(doc! {})
        .await
        .map_err(|e| AppError::database("seed_count_room_types", e))?;
    if count > 0 {
        return Ok(());
    }

    let now = MongoRepo::current_timestamp();
    let room_types = ROOM_TYPES.iter().map(|(name, description, base_price, capacity, amenities)| RoomType {
        id: None,
        name: name.to_string(),
        description: description.to_string(),
        base_price: *base_price,
        capacity: *capacity,
        amenities: amenities.to_string(),
        created_at: now,
    });
    repo.room_types()
        .insert_many(room_types)
        .await
        .map_err(|e| AppError::database("seed_room_types", e))?;
    tracing::info!(count = ROOM_TYPES.len(), "Tipos de habitación de ejemplo añadidos");
    Ok(())
}

async fn seed_rooms(repo: &MongoRepo) -> Result<()> {
    let count = repo
        .rooms()
        .count_documents(doc! {})
        .await
        .map_err(|e| AppError::database("seed_count_rooms", e))?;
    if count > 0 {
        return Ok(());
    }

    let type_ids: HashMap<String, _> = repo
        .list_room_types()
        .await?
        .into_iter()
        .filter_map(|rt| rt.id.map(|id| (rt.name, id)))
        .collect();

    let now = MongoRepo::current_timestamp();
    let rooms: Vec<Room> = ROOMS
        .iter()
        .filter_map(|(number, type_name)| {
            type_ids.get(*type_name).map(|type_id| Room {
                id: None,
                room_number: number.to_string(),
                room_type_id: *type_id,
                is_available: true,
                created_at: now,
            })
        })
        .collect();

    if rooms.is_empty() {
        return Ok(());
    }

    let inserted = rooms.len();
    repo.rooms()
        .insert_many(rooms)
        .await
        .map_err(|e| AppError::database("seed_rooms", e))?;
    tracing::info!(count = inserted, "Habitaciones de ejemplo añadidas");
    Ok(())
}

async fn seed_food_items(repo: &MongoRepo) -> Result<()> {
    let count = repo
        .food_items()
        .count_documents(doc! {})
        .await
        .map_err(|e| AppError::database("seed_count_food_items", e))?;
    if count > 0 {
        return Ok(());
    }

    let now = MongoRepo::current_timestamp();
    let items = FOOD_ITEMS.iter().map(|(name, description, price, category)| FoodItem {
        id: None,
        name: name.to_string(),
        description: description.to_string(),
        price: *price,
        category: category.to_string(),
        is_available: true,
        created_at: now,
    });
    repo.food_items()
        .insert_many(items)
        .await
        .map_err(|e| AppError::database("seed_food_items", e))?;
    tracing::info!(count = FOOD_ITEMS.len(), "Menú de ejemplo añadido");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[actix_web::test]
    async fn unreachable_database_is_not_fatal() {
        let config = AppConfig {
            mongodb_uri: "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200&connectTimeoutMS=200"
                .to_string(),
            ..AppConfig::default()
        };
        let repo = MongoRepo::connect(&config).await.unwrap();
        assert!(!prepare(&repo, "admin123").await);
    }
}
