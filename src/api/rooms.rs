//! # Catálogo de habitaciones
//!
//! Listado de tipos de habitación, detalle de un tipo y noches ocupadas de una
//! habitación concreta.

use actix_web::{get, web, HttpResponse, Responder};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::json;

use super::{flash, AppError, AppResult};
use crate::db::{Room, RoomImage, RoomType};
use crate::domain::BookingStatus;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RoomTypeResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub base_price: f64,
    pub capacity: i32,
    pub amenities: Vec<String>,
}

impl From<RoomType> for RoomTypeResponse {
    fn from(rt: RoomType) -> Self {
        RoomTypeResponse {
            id: rt.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: rt.name,
            description: rt.description,
            base_price: rt.base_price,
            capacity: rt.capacity,
            amenities: rt
                .amenities
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct RoomResponse {
    pub id: String,
    pub room_number: String,
    pub room_type_id: String,
    pub is_available: bool,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        RoomResponse {
            id: room.id.map(|id| id.to_hex()).unwrap_or_default(),
            room_number: room.room_number,
            room_type_id: room.room_type_id.to_hex(),
            is_available: room.is_available,
        }
    }
}

#[derive(Serialize)]
pub struct ImageResponse {
    pub room_id: String,
    pub url: String,
    pub is_primary: bool,
}

impl From<RoomImage> for ImageResponse {
    fn from(image: RoomImage) -> Self {
        ImageResponse {
            room_id: image.room_id.to_hex(),
            url: format!("/static/{}", image.image_path),
            is_primary: image.is_primary,
        }
    }
}

/// Parsea un ObjectId de la URL
pub fn parse_id(raw: &str, resource: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} not found!", resource)))
}

async fn room_types_json(state: &AppState) -> AppResult<HttpResponse> {
    let room_types: Vec<RoomTypeResponse> = state
        .repo
        .list_room_types()
        .await?
        .into_iter()
        .map(RoomTypeResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "room_types": room_types })))
}

#[get("/")]
async fn index(state: web::Data<AppState>) -> AppResult<impl Responder> {
    room_types_json(&state).await
}

#[get("/rooms")]
async fn list_rooms(state: web::Data<AppState>) -> AppResult<impl Responder> {
    room_types_json(&state).await
}

async fn room_type_detail_json(state: &AppState, raw_id: &str) -> AppResult<HttpResponse> {
    let type_id = parse_id(raw_id, "Room type")?;
    let room_type = state
        .repo
        .find_room_type(type_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room type not found!".to_string()))?;
    let rooms = state.repo.rooms_of_type(type_id).await?;
    let room_ids: Vec<ObjectId> = rooms.iter().filter_map(|r| r.id).collect();
    let images: Vec<ImageResponse> = state
        .repo
        .images_of_rooms(&room_ids)
        .await?
        .into_iter()
        .map(ImageResponse::from)
        .collect();
    let rooms: Vec<RoomResponse> = rooms.into_iter().map(RoomResponse::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "room_type": RoomTypeResponse::from(room_type),
        "rooms": rooms,
        "images": images
    })))
}

/// Detalle de un tipo con sus habitaciones; si no existe vuelve al listado con flash
#[get("/room_type/{id}")]
async fn room_type_detail(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    flash::redirect_on_error(room_type_detail_json(&state, &path).await, "/rooms")
}

/// Noches ocupadas por reservas confirmadas de una habitación
#[get("/check_availability/{room_id}")]
async fn check_availability(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<impl Responder> {
    let room_id = parse_id(&path, "Room")?;
    let (room, room_type) = state
        .repo
        .room_with_type(room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    let bookings = state
        .repo
        .room_bookings(room_id, &[BookingStatus::Confirmed])
        .await?;
    let booked_dates = booked_dates(bookings.iter().filter_map(|b| b.range()));

    Ok(HttpResponse::Ok().json(json!({
        "room_number": room.room_number,
        "room_type": room_type.name,
        "booked_dates": booked_dates
    })))
}

/// Lista plana y ordenada de noches `YYYY-MM-DD`
pub fn booked_dates<I>(ranges: I) -> Vec<String>
where
    I: IntoIterator<Item = crate::domain::DateRange>,
{
    let mut dates: Vec<String> = ranges
        .into_iter()
        .flat_map(|range| range.nights_iter().map(|d| d.to_string()).collect::<Vec<_>>())
        .collect();
    dates.sort();
    dates.dedup();
    dates
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index);
    cfg.service(list_rooms);
    cfg.service(room_type_detail);
    cfg.service(check_availability);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DateRange;
    use chrono::NaiveDate;

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(
            NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn booked_dates_cover_each_night() {
        let dates = booked_dates(vec![
            range("2024-01-12", "2024-01-14"),
            range("2024-01-10", "2024-01-12"),
        ]);
        assert_eq!(dates, vec!["2024-01-10", "2024-01-11", "2024-01-12", "2024-01-13"]);
    }

    #[test]
    fn amenities_are_split() {
        let rt = RoomType {
            id: None,
            name: "Standard Room".into(),
            description: "Comfortable".into(),
            base_price: 100.0,
            capacity: 2,
            amenities: "Queen Bed, TV,  Free WiFi,".into(),
            created_at: 0,
        };
        let resp = RoomTypeResponse::from(rt);
        assert_eq!(resp.amenities, vec!["Queen Bed", "TV", "Free WiFi"]);
    }

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(parse_id("xyz", "Room"), Err(AppError::NotFound(_))));
    }
}
