//! # Servicio de comidas
//!
//! Solo se puede pedir comida contra una reserva aprobada del propio usuario.

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::auth::require_user;
use super::rooms::parse_id;
use super::{AppError, AppResult};
use crate::db::{Booking, FoodItem, FoodOrder, MongoRepo};
use crate::state::AppState;

#[derive(Serialize)]
struct FoodItemResponse {
    id: String,
    name: String,
    description: String,
    price: f64,
    category: String,
}

impl From<FoodItem> for FoodItemResponse {
    fn from(item: FoodItem) -> Self {
        FoodItemResponse {
            id: item.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: item.name,
            description: item.description,
            price: item.price,
            category: item.category,
        }
    }
}

#[derive(Deserialize)]
pub struct OrderLine {
    pub id: String,
    /// Número o texto numérico; las líneas no válidas se ignoran
    #[serde(default)]
    pub quantity: Value,
}

#[derive(Deserialize)]
pub struct FoodOrderRequest {
    pub booking_id: String,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub special_instructions: String,
}

/// Cantidad positiva o `None`
pub fn parse_quantity(raw: &Value) -> Option<i32> {
    let quantity = match raw {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    i32::try_from(quantity).ok().filter(|q| *q > 0)
}

/// La reserva debe existir, pertenecer al usuario y estar aprobada
pub fn authorize_food_order(booking: Option<&Booking>, user_id: ObjectId) -> AppResult<()> {
    match booking {
        Some(b) if b.user_id == user_id && b.is_approved => Ok(()),
        _ => Err(AppError::Forbidden("Invalid or unauthorized booking!".to_string())),
    }
}

/// Menú disponible para una reserva aprobada
#[get("/food_menu/{booking_id}")]
async fn food_menu(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    let user = require_user(&state.repo, &req, "Please login to access food menu!").await?;
    let booking_id = parse_id(&path, "Booking")?;
    let booking = state
        .repo
        .find_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found!".to_string()))?;

    if Some(booking.user_id) != user.id {
        return Err(AppError::Forbidden("Access denied!".to_string()));
    }
    if !booking.is_approved {
        return Err(AppError::Forbidden(
            "Food menu is only available for approved bookings!".to_string(),
        ));
    }

    let items: Vec<FoodItemResponse> = state
        .repo
        .available_food_items()
        .await?
        .into_iter()
        .map(FoodItemResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "booking_id": booking_id.to_hex(),
        "food_items": items
    })))
}

/// Crea una línea de pedido por cada artículo válido
#[post("/order_food")]
async fn order_food(
    state: web::Data<AppState>,
    data: web::Json<FoodOrderRequest>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    let user = require_user(&state.repo, &req, "Please login to order food!").await?;
    let user_id = user
        .id
        .ok_or_else(|| AppError::internal_trace("user without _id", None))?;

    let booking = match ObjectId::parse_str(&data.booking_id) {
        Ok(id) => state.repo.find_booking(id).await?,
        Err(_) => None,
    };
    authorize_food_order(booking.as_ref(), user_id)?;
    let booking_id = booking
        .and_then(|b| b.id)
        .ok_or_else(|| AppError::internal_trace("booking without _id", None))?;

    let mut orders = Vec::new();
    for line in &data.items {
        let Ok(item_id) = ObjectId::parse_str(&line.id) else {
            continue;
        };
        let Some(item) = state.repo.find_food_item(item_id).await? else {
            continue;
        };
        let Some(quantity) = parse_quantity(&line.quantity) else {
            continue;
        };

        orders.push(FoodOrder {
            id: None,
            user_id,
            booking_id,
            food_item_id: item_id,
            quantity,
            total_price: item.price * f64::from(quantity),
            order_date: MongoRepo::current_timestamp(),
            status: "pending".to_string(),
            special_instructions: data.special_instructions.clone(),
        });
    }

    if !orders.is_empty() {
        let count = orders.len();
        state
            .repo
            .food_orders()
            .insert_many(orders)
            .await
            .map_err(|e| AppError::database("order_food", e))?;
        tracing::info!(booking_id = %booking_id.to_hex(), lines = count, "Pedido de comida registrado");
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Food order placed successfully!"
    })))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(food_menu);
    cfg.service(order_food);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BookingStatus;
    use chrono::NaiveDate;

    fn booking(owner: ObjectId, approved: bool) -> Booking {
        Booking {
            id: Some(ObjectId::new()),
            user_id: owner,
            room_id: ObjectId::new(),
            check_in: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            total_price: 200.0,
            booking_date: 0,
            status: if approved { BookingStatus::Confirmed } else { BookingStatus::Pending },
            special_requests: String::new(),
            is_approved: approved,
            loyalty_counted: false,
        }
    }

    #[test]
    fn unapproved_booking_is_rejected() {
        let owner = ObjectId::new();
        let err = authorize_food_order(Some(&booking(owner, false)), owner).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn foreign_booking_is_rejected() {
        let b = booking(ObjectId::new(), true);
        assert!(matches!(
            authorize_food_order(Some(&b), ObjectId::new()),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn missing_booking_is_rejected() {
        assert!(authorize_food_order(None, ObjectId::new()).is_err());
    }

    #[test]
    fn approved_own_booking_is_accepted() {
        let owner = ObjectId::new();
        assert!(authorize_food_order(Some(&booking(owner, true)), owner).is_ok());
    }

    #[test]
    fn quantities() {
        assert_eq!(parse_quantity(&json!(2)), Some(2));
        assert_eq!(parse_quantity(&json!("3")), Some(3));
        assert_eq!(parse_quantity(&json!(0)), None);
        assert_eq!(parse_quantity(&json!(-1)), None);
        assert_eq!(parse_quantity(&json!("two")), None);
        assert_eq!(parse_quantity(&json!(1.5)), None);
        assert_eq!(parse_quantity(&Value::Null), None);
    }

    #[test]
    fn order_request_tolerates_missing_fields() {
        let req: FoodOrderRequest =
            serde_json::from_value(json!({ "booking_id": "abc", "items": [{ "id": "x" }] })).unwrap();
        assert_eq!(req.items.len(), 1);
        assert!(parse_quantity(&req.items[0].quantity).is_none());
        assert!(req.special_instructions.is_empty());
    }
}
