//! # Reservas de habitaciones
//!
//! - Formulario de reserva y creación (con comprobación de disponibilidad)
//! - Listado de las reservas propias
//! - Cancelación por el propio cliente o por un administrador
//!
//! La comprobación de disponibilidad y la inserción se ejecutan bajo el candado
//! de la habitación ([`crate::state::RoomLocks`]).

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use chrono::{NaiveDate, Utc};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

use super::auth::require_user;
use super::rooms::{parse_id, RoomResponse, RoomTypeResponse};
use super::{flash, AppError, AppResult, ResultExt};
use crate::db::{Booking, MongoRepo, Room, User};
use crate::domain::{is_available, total_price, BookingStatus, DateRange};
use crate::services::mailer;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BookRoomForm {
    check_in: Option<String>,
    check_out: Option<String>,
    #[serde(default)]
    special_requests: String,
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub room_id: String,
    pub room_number: Option<String>,
    pub check_in: String,
    pub check_out: String,
    pub nights: i64,
    pub total_price: f64,
    pub booking_date: i64,
    pub status: BookingStatus,
    pub special_requests: String,
    pub is_approved: bool,
}

impl BookingResponse {
    fn new(booking: Booking, room_number: Option<String>) -> Self {
        BookingResponse {
            id: booking.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: booking.user_id.to_hex(),
            room_id: booking.room_id.to_hex(),
            room_number,
            nights: booking.range().map(|r| r.nights()).unwrap_or(0),
            check_in: booking.check_in.to_string(),
            check_out: booking.check_out.to_string(),
            total_price: booking.total_price,
            booking_date: booking.booking_date,
            status: booking.status,
            special_requests: booking.special_requests,
            is_approved: booking.is_approved,
        }
    }
}

/// Convierte reservas en respuestas resolviendo el número de habitación en una sola consulta
pub async fn booking_responses(repo: &MongoRepo, bookings: Vec<Booking>) -> AppResult<Vec<BookingResponse>> {
    let mut room_ids: Vec<ObjectId> = bookings.iter().map(|b| b.room_id).collect();
    room_ids.sort();
    room_ids.dedup();

    let cursor = repo
        .rooms()
        .find(doc! { "_id": { "$in": room_ids } })
        .await
        .map_err(|e| AppError::database("rooms_for_bookings", e))?;
    let numbers: HashMap<ObjectId, String> = MongoRepo::collect::<Room>(cursor, "rooms_for_bookings")
        .await?
        .into_iter()
        .filter_map(|room| room.id.map(|id| (id, room.room_number)))
        .collect();

    Ok(bookings
        .into_iter()
        .map(|b| {
            let number = numbers.get(&b.room_id).cloned();
            BookingResponse::new(b, number)
        })
        .collect())
}

fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err_validation("Invalid date format!")
}

/// Valida las fechas del formulario y construye el rango de la estancia
pub fn parse_stay(
    check_in: Option<&str>,
    check_out: Option<&str>,
    today: NaiveDate,
) -> AppResult<DateRange> {
    let (check_in, check_out) = match (check_in, check_out) {
        (Some(ci), Some(co)) if !ci.trim().is_empty() && !co.trim().is_empty() => (ci, co),
        _ => {
            return Err(AppError::Validation(
                "Please select both check-in and check-out dates!".to_string(),
            ))
        }
    };

    let check_in = parse_date(check_in)?;
    let check_out = parse_date(check_out)?;
    let stay = DateRange::new(check_in, check_out).map_err(|e| AppError::Validation(e.to_string()))?;

    if stay.start() < today {
        return Err(AppError::Validation("Check-in date cannot be in the past!".to_string()));
    }
    Ok(stay)
}

/// Datos para el formulario de reserva
#[get("/book/{room_id}")]
async fn book_room_form(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    require_user(&state.repo, &req, "Please login to book a room!").await?;
    let room_id = parse_id(&path, "Room")?;
    let (room, room_type) = state
        .repo
        .room_with_type(room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found!".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "room": RoomResponse::from(room),
        "room_type": RoomTypeResponse::from(room_type),
        "today": Utc::now().date_naive().to_string()
    })))
}

async fn create_booking(
    state: &AppState,
    req: &HttpRequest,
    raw_room_id: &str,
    form: &BookRoomForm,
) -> AppResult<HttpResponse> {
    let user = require_user(&state.repo, req, "Please login to book a room!").await?;
    let user_id = user
        .id
        .ok_or_else(|| AppError::internal_trace("user without _id", None))?;

    let room_id = parse_id(raw_room_id, "Room")?;
    let (room, room_type) = state
        .repo
        .room_with_type(room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found!".to_string()))?;

    let stay = parse_stay(
        form.check_in.as_deref(),
        form.check_out.as_deref(),
        Utc::now().date_naive(),
    )?;

    let booking = {
        let _room_guard = state.room_locks.lock(room_id).await;

        let active = state.repo.room_bookings(room_id, &BookingStatus::ACTIVE).await?;
        if !is_available(&stay, active.iter().filter_map(|b| b.range())) {
            return Err(AppError::Conflict(
                "Room is not available for the selected dates!".to_string(),
            ));
        }

        let booking = Booking {
            id: None,
            user_id,
            room_id,
            check_in: stay.start(),
            check_out: stay.end(),
            total_price: total_price(room_type.base_price, &stay),
            booking_date: MongoRepo::current_timestamp(),
            status: BookingStatus::Pending,
            special_requests: form.special_requests.clone(),
            is_approved: false,
            loyalty_counted: false,
        };
        state
            .repo
            .bookings()
            .insert_one(&booking)
            .await
            .map_err(|e| AppError::database("create_booking", e))?;
        booking
    };

    tracing::info!(
        user = %user.username,
        room = %room.room_number,
        check_in = %booking.check_in,
        check_out = %booking.check_out,
        total_price = booking.total_price,
        "Reserva creada"
    );

    send_pending_email(state, &user, &room, &booking).await;

    Ok(flash::redirect(
        "/my_bookings",
        "Booking submitted successfully! Please wait for admin approval.",
    ))
}

async fn send_pending_email(state: &AppState, user: &User, room: &Room, booking: &Booking) {
    let body = format!(
        "Your booking for Room {} from {} to {} has been submitted and is pending admin approval.",
        room.room_number, booking.check_in, booking.check_out
    );
    mailer::notify(
        state.mailer.as_ref(),
        &user.email,
        "Booking Confirmation - Pending Approval",
        &body,
    )
    .await;
}

#[post("/book/{room_id}")]
async fn book_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<BookRoomForm>,
    req: HttpRequest,
) -> impl Responder {
    let result = create_booking(&state, &req, &path, &form).await;
    let back = match &result {
        Err(AppError::NotFound(_)) => "/rooms".to_string(),
        _ => format!("/book/{}", path),
    };
    flash::redirect_on_error(result, &back)
}

#[get("/my_bookings")]
async fn my_bookings(state: web::Data<AppState>, req: HttpRequest) -> AppResult<impl Responder> {
    let user = require_user(&state.repo, &req, "Please login to view your bookings!").await?;
    let bookings = state
        .repo
        .list_bookings(doc! { "user_id": user.id }, None)
        .await?;
    let bookings = booking_responses(&state.repo, bookings).await?;
    Ok(HttpResponse::Ok().json(json!({ "bookings": bookings })))
}

/// El dueño o un administrador puede cancelar una reserva que no esté ya cancelada
pub fn authorize_cancel(booking: &Booking, user: &User) -> AppResult<()> {
    if Some(booking.user_id) != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "You can only cancel your own bookings!".to_string(),
        ));
    }
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::Validation(
            "This booking is already cancelled!".to_string(),
        ));
    }
    Ok(())
}

async fn cancel_own_booking(
    state: &AppState,
    req: &HttpRequest,
    raw_booking_id: &str,
) -> AppResult<HttpResponse> {
    let user = require_user(&state.repo, req, "Please login to cancel bookings!").await?;
    let booking_id = parse_id(raw_booking_id, "Booking")?;
    let booking = state
        .repo
        .find_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found!".to_string()))?;

    authorize_cancel(&booking, &user)?;
    state
        .repo
        .set_booking_status(booking_id, BookingStatus::Cancelled, false)
        .await?;

    tracing::info!(booking_id = %booking_id.to_hex(), by = %user.username, "Reserva cancelada");
    Ok(flash::redirect("/my_bookings", "Booking cancelled successfully!"))
}

#[post("/cancel_booking/{id}")]
async fn cancel_booking(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> impl Responder {
    flash::redirect_on_error(cancel_own_booking(&state, &req, &path).await, "/my_bookings")
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(book_room_form);
    cfg.service(book_room);
    cfg.service(my_bookings);
    cfg.service(cancel_booking);
}
