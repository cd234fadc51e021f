//! # Mensajes flash
//!
//! Las rutas de formulario responden siempre con una redirección `303 See Other`
//! y dejan un mensaje en la cookie `hotel_flash`. La capa de presentación lo
//! recoge con `GET /flash`, que lo devuelve y lo borra.

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use super::AppResult;

pub const FLASH_COOKIE: &str = "hotel_flash";

fn flash_cookie(message: &str) -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, message.to_string())
        .path("/")
        .http_only(true)
        .finish()
}

/// Redirección con mensaje flash
pub fn redirect(location: &str, message: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, location))
        .append_header((header::SET_COOKIE, flash_cookie(message).encoded().to_string()))
        .finish()
}

/// Convierte el resultado de un handler de formulario en redirección.
///
/// Los errores nunca llegan al cliente como tales: se registran y se muestran
/// como flash. La falta de sesión redirige a `/login`; el resto vuelve a `back`.
pub fn redirect_on_error(result: AppResult<HttpResponse>, back: &str) -> HttpResponse {
    match result {
        Ok(response) => response,
        Err(e) => {
            e.log();
            let location = match &e {
                super::AppError::Unauthorized(_) => "/login",
                _ => back,
            };
            redirect(location, &e.user_message())
        }
    }
}

/// Devuelve y consume el mensaje flash pendiente
#[get("/flash")]
async fn take_flash(req: HttpRequest) -> impl Responder {
    match req.cookie(FLASH_COOKIE) {
        Some(cookie) => {
            let mut removal = flash_cookie("");
            removal.make_removal();
            HttpResponse::Ok()
                .append_header((header::SET_COOKIE, removal.to_string()))
                .json(json!({ "messages": [cookie.value()] }))
        }
        None => HttpResponse::Ok().json(json!({ "messages": [] })),
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(take_flash);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AppError;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    fn location(resp: &HttpResponse) -> &str {
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap()
    }

    #[actix_web::test]
    async fn errors_redirect_back_with_message() {
        let resp = redirect_on_error(
            Err(AppError::Validation("Room is not available for the selected dates!".into())),
            "/book/abc",
        );
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/book/abc");
        let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("hotel_flash="));
    }

    #[actix_web::test]
    async fn missing_session_redirects_to_login() {
        let resp = redirect_on_error(
            Err(AppError::Unauthorized("Please login to book a room!".into())),
            "/book/abc",
        );
        assert_eq!(location(&resp), "/login");
    }

    #[actix_web::test]
    async fn ok_passes_through() {
        let resp = redirect_on_error(Ok(redirect("/my_bookings", "Done")), "/book/abc");
        assert_eq!(location(&resp), "/my_bookings");
    }

    #[actix_web::test]
    async fn take_flash_returns_pending_message() {
        let app = test::init_service(App::new().configure(routes)).await;

        let req = test::TestRequest::get()
            .uri("/flash")
            .cookie(Cookie::new(FLASH_COOKIE, "Saved!"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["messages"][0], "Saved!");

        let req = test::TestRequest::get().uri("/flash").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 0);
    }
}
