//! # Panel de administración
//!
//! Estadísticas agregadas y gestión del estado de las reservas. Cada petición
//! comprueba `is_admin` contra el usuario persistido.

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use mongodb::bson::doc;
use serde_json::json;

use super::auth::{ensure_admin, require_admin, require_user};
use super::bookings::booking_responses;
use super::rooms::parse_id;
use super::{flash, AppError, AppResult};
use crate::db::{Booking, MongoRepo};
use crate::domain::{is_available, BookingStatus};
use crate::services::mailer;
use crate::state::AppState;

/// Acción sobre una reserva desde el panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Approve,
    Cancel,
    Complete,
}

impl AdminAction {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "approve" => Ok(Self::Approve),
            "cancel" => Ok(Self::Cancel),
            "complete" => Ok(Self::Complete),
            other => Err(AppError::Validation(format!("Unknown booking action '{}'!", other))),
        }
    }

    pub fn target_status(&self) -> BookingStatus {
        match self {
            Self::Approve => BookingStatus::Confirmed,
            Self::Cancel => BookingStatus::Cancelled,
            Self::Complete => BookingStatus::Completed,
        }
    }

    fn flash_message(&self) -> &'static str {
        match self {
            Self::Approve => "Booking approved!",
            Self::Cancel => "Booking cancelled!",
            Self::Complete => "Booking marked as completed!",
        }
    }
}

/// Reactivar una reserva cancelada o completada exige que sus noches sigan libres.
///
/// `active` son las reservas activas de la misma habitación; la propia reserva se ignora.
pub fn ensure_can_confirm(booking: &Booking, active: &[Booking]) -> AppResult<()> {
    if booking.status.is_active() {
        return Ok(());
    }
    let Some(stay) = booking.range() else {
        return Err(AppError::Validation("Booking has invalid dates!".to_string()));
    };
    let others = active
        .iter()
        .filter(|other| other.id != booking.id)
        .filter_map(Booking::range);
    if is_available(&stay, others) {
        Ok(())
    } else {
        Err(AppError::Conflict(
            "Room is no longer available for this booking's dates!".to_string(),
        ))
    }
}

/// Límites `[inicio, fin)` en timestamp unix del mes natural de `now`
pub fn month_bounds(now: DateTime<Utc>) -> (i64, i64) {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now.date_naive());
    let next = if now.month() == 12 {
        NaiveDate::from_ymd_opt(now.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(now.year(), now.month() + 1, 1)
    }
    .unwrap_or(first);
    let ts = |d: NaiveDate| d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or(0);
    (ts(first), ts(next))
}

#[get("/admin")]
async fn dashboard(state: web::Data<AppState>, req: HttpRequest) -> AppResult<impl Responder> {
    require_admin(&state.repo, &req).await?;
    let repo = &state.repo;

    let count = |operation: &'static str, result: Result<u64, mongodb::error::Error>| {
        result.map_err(|e| AppError::database(operation, e))
    };

    let total_bookings = count("count_bookings", repo.bookings().count_documents(doc! {}).await)?;
    let total_users = count("count_users", repo.users().count_documents(doc! {}).await)?;
    let total_rooms = count("count_rooms", repo.rooms().count_documents(doc! {}).await)?;
    let pending_bookings = count(
        "count_pending",
        repo.bookings()
            .count_documents(doc! { "status": BookingStatus::Pending.as_str() })
            .await,
    )?;
    let (month_start, month_end) = month_bounds(Utc::now());
    let monthly_bookings = count(
        "count_monthly",
        repo.bookings()
            .count_documents(doc! { "booking_date": { "$gte": month_start, "$lt": month_end } })
            .await,
    )?;
    let total_revenue = repo.confirmed_revenue().await?;
    let recent = repo.list_bookings(doc! {}, Some(5)).await?;
    let recent_bookings = booking_responses(repo, recent).await?;

    Ok(HttpResponse::Ok().json(json!({
        "total_bookings": total_bookings,
        "total_users": total_users,
        "total_rooms": total_rooms,
        "pending_bookings": pending_bookings,
        "total_revenue": total_revenue,
        "monthly_bookings": monthly_bookings,
        "recent_bookings": recent_bookings
    })))
}

#[get("/admin/bookings")]
async fn list_all_bookings(state: web::Data<AppState>, req: HttpRequest) -> AppResult<impl Responder> {
    require_admin(&state.repo, &req).await?;
    let bookings = state.repo.list_bookings(doc! {}, None).await?;
    let bookings = booking_responses(&state.repo, bookings).await?;
    Ok(HttpResponse::Ok().json(json!({ "bookings": bookings })))
}

async fn apply_action(
    state: &AppState,
    raw_booking_id: &str,
    action: AdminAction,
) -> AppResult<HttpResponse> {
    let repo: &MongoRepo = &state.repo;
    let booking_id = parse_id(raw_booking_id, "Booking")?;
    let booking = repo
        .find_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found!".to_string()))?;

    if action == AdminAction::Approve {
        // Mismo candado que la creación de reservas
        let _room_guard = state.room_locks.lock(booking.room_id).await;
        let current = repo
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found!".to_string()))?;
        let active = repo.room_bookings(booking.room_id, &BookingStatus::ACTIVE).await?;
        ensure_can_confirm(&current, &active)?;
        repo.set_booking_status(booking_id, BookingStatus::Confirmed, true).await?;
    } else {
        repo.set_booking_status(booking_id, action.target_status(), false).await?;
    }
    tracing::info!(
        booking_id = %booking_id.to_hex(),
        status = %action.target_status(),
        "Estado de reserva actualizado por administrador"
    );

    // Una reserva suma una sola vez aunque se apruebe varias veces o en paralelo
    if action == AdminAction::Approve && repo.claim_loyalty(booking_id).await? {
        repo.record_confirmed_booking(booking.user_id).await?;
    }

    // El cambio ya está guardado; un fallo aquí no debe deshacer la acción
    if action == AdminAction::Approve {
        if let Err(e) = send_confirmation_email(state, &booking).await {
            e.log();
        }
    }

    Ok(flash::redirect("/admin/bookings", action.flash_message()))
}

async fn send_confirmation_email(state: &AppState, booking: &Booking) -> AppResult<()> {
    let Some(user) = state.repo.find_user(booking.user_id).await? else {
        return Ok(());
    };
    let room_number = state
        .repo
        .find_room(booking.room_id)
        .await?
        .map(|room| room.room_number)
        .unwrap_or_default();
    let body = format!(
        "Your booking for Room {} from {} to {} has been confirmed!",
        room_number, booking.check_in, booking.check_out
    );
    mailer::notify(state.mailer.as_ref(), &user.email, "Booking Confirmed!", &body).await;
    Ok(())
}

#[post("/admin/bookings/{id}/{action}")]
async fn booking_action(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> impl Responder {
    let (booking_id, action) = path.into_inner();

    let admin = match require_user(&state.repo, &req, "Please login to continue!").await {
        Ok(user) => ensure_admin(&user),
        Err(e) => Err(e),
    };
    if let Err(e) = admin {
        let location = match e {
            AppError::Forbidden(_) => "/",
            _ => "/admin/bookings",
        };
        return flash::redirect_on_error(Err(e), location);
    }

    let result = match AdminAction::parse(&action) {
        Ok(action) => apply_action(&state, &booking_id, action).await,
        Err(e) => Err(e),
    };
    flash::redirect_on_error(result, "/admin/bookings")
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(dashboard);
    cfg.service(list_all_bookings);
    cfg.service(booking_action);
}
