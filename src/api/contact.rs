use actix_web::{post, web, HttpResponse, Responder};
use serde::Deserialize;

use super::{flash, AppError, AppResult};
use crate::db::{ContactMessage, MongoRepo};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    message: String,
}

impl ContactForm {
    /// Todos los campos son obligatorios tras recortar espacios
    pub fn into_message(self, created_at: i64) -> AppResult<ContactMessage> {
        let fields = [
            self.name.trim(),
            self.email.trim(),
            self.subject.trim(),
            self.message.trim(),
        ];
        if fields.iter().any(|f| f.is_empty()) {
            return Err(AppError::Validation("Please fill in all fields!".to_string()));
        }
        let [name, email, subject, message] = fields.map(String::from);
        Ok(ContactMessage {
            id: None,
            name,
            email,
            subject,
            message,
            created_at,
        })
    }
}

async fn save_message(state: &AppState, form: ContactForm) -> AppResult<HttpResponse> {
    let message = form.into_message(MongoRepo::current_timestamp())?;
    state
        .repo
        .contact_messages()
        .insert_one(&message)
        .await
        .map_err(|e| AppError::database("save_contact_message", e))?;

    tracing::info!(from = %message.email, subject = %message.subject, "Mensaje de contacto recibido");
    Ok(flash::redirect(
        "/contact",
        "Your message has been sent! Thank you for contacting us.",
    ))
}

#[post("/contact")]
async fn contact(state: web::Data<AppState>, form: web::Form<ContactForm>) -> impl Responder {
    flash::redirect_on_error(save_message(&state, form.into_inner()).await, "/contact")
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(contact);
}
