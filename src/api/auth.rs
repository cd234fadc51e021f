//! # Cuentas y sesiones
//!
//! - Registro, login y logout de usuarios
//! - Resolución de la sesión al usuario persistido en cada petición
//!
//! La cookie `hotel_session` (o el header `Authorization: Bearer`) solo lleva un
//! token opaco. El rol de administrador se lee siempre del documento del usuario.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use mongodb::bson::doc;
use serde::Deserialize;
use validator::Validate;

use super::flash;
use super::{AppError, AppResult};
use crate::db::{MongoRepo, User};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "hotel_session";

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 3, message = "Username must be at least 3 characters long!"))]
    pub username: String,
    #[validate(email(message = "Please enter a valid email address!"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long!"))]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl RegisterForm {
    /// Comprueba los campos en el orden del formulario y devuelve el primer fallo
    pub fn check(&self) -> AppResult<()> {
        if let Err(errors) = self.validate() {
            let field_errors = errors.field_errors();
            for field in ["username", "email", "password"] {
                if let Some(error) = field_errors.get(field).and_then(|errs| errs.first()) {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field));
                    return Err(AppError::Validation(message));
                }
            }
        }
        if self.password != self.confirm_password {
            return Err(AppError::Validation("Passwords do not match!".to_string()));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Hash argon2 con sal aleatoria
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal_trace(&format!("Error generando hash: {}", e), None))
}

/// `false` también si el hash almacenado no es válido
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Hash de contraseña almacenado no válido");
            false
        }
    }
}

/// Extrae el token de sesión de la cookie o del header Authorization
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Usuario de la sesión actual, si la hay
pub async fn current_user(repo: &MongoRepo, req: &HttpRequest) -> AppResult<Option<User>> {
    match extract_token(req) {
        Some(token) => repo.session_user(&token).await,
        None => Ok(None),
    }
}

/// Exige sesión iniciada
pub async fn require_user(repo: &MongoRepo, req: &HttpRequest, message: &str) -> AppResult<User> {
    current_user(repo, req)
        .await?
        .ok_or_else(|| AppError::Unauthorized(message.to_string()))
}

/// Exige un usuario cuyo registro persistido tenga `is_admin`
pub async fn require_admin(repo: &MongoRepo, req: &HttpRequest) -> AppResult<User> {
    let user = require_user(repo, req, "Please login to continue!").await?;
    ensure_admin(&user)?;
    Ok(user)
}

pub fn ensure_admin(user: &User) -> AppResult<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied! Admin privileges required.".to_string()))
    }
}

fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish()
}

async fn register_user(state: &AppState, form: &RegisterForm) -> AppResult<HttpResponse> {
    form.check()?;

    let users = state.repo.users();
    let by_username = users
        .find_one(doc! { "username": &form.username })
        .await
        .map_err(|e| AppError::database("check_username", e))?;
    if by_username.is_some() {
        return Err(AppError::Conflict("Username already exists!".to_string()));
    }

    let by_email = users
        .find_one(doc! { "email": &form.email })
        .await
        .map_err(|e| AppError::database("check_email", e))?;
    if by_email.is_some() {
        return Err(AppError::Conflict("Email already registered!".to_string()));
    }

    let user = User {
        id: None,
        username: form.username.clone(),
        email: form.email.clone(),
        password_hash: hash_password(&form.password)?,
        is_admin: false,
        created_at: MongoRepo::current_timestamp(),
    };
    users
        .insert_one(user)
        .await
        .map_err(|e| AppError::database("register_user", e))?;

    tracing::info!(username = %form.username, "Usuario registrado");
    Ok(flash::redirect("/login", "Registration successful! Please login."))
}

#[post("/register")]
async fn register(state: web::Data<AppState>, form: web::Form<RegisterForm>) -> impl Responder {
    flash::redirect_on_error(register_user(&state, &form).await, "/register")
}

async fn login_user(state: &AppState, form: &LoginForm) -> AppResult<HttpResponse> {
    if form.username.is_empty() || form.password.is_empty() {
        return Err(AppError::Validation(
            "Please enter both username and password!".to_string(),
        ));
    }

    let user = state
        .repo
        .users()
        .find_one(doc! { "username": &form.username })
        .await
        .map_err(|e| AppError::database("find_user_for_login", e))?;

    let user = match user {
        Some(user) if verify_password(&form.password, &user.password_hash) => user,
        _ => return Err(AppError::Validation("Invalid username or password!".to_string())),
    };
    let user_id = user
        .id
        .ok_or_else(|| AppError::internal_trace("user without _id", None))?;

    let token = state.repo.create_session(user_id).await?;
    tracing::info!(username = %user.username, "Login correcto");

    let mut response = flash::redirect("/", "Login successful! Welcome back!");
    response
        .add_cookie(&session_cookie(&token, state.cookie_secure))
        .map_err(|e| AppError::internal_trace(&format!("Error creando cookie: {}", e), None))?;
    Ok(response)
}

#[post("/login")]
async fn login(state: web::Data<AppState>, form: web::Form<LoginForm>) -> impl Responder {
    flash::redirect_on_error(login_user(&state, &form).await, "/login")
}

#[get("/logout")]
async fn logout(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Some(token) = extract_token(&req) {
        if let Err(e) = state.repo.delete_session(&token).await {
            e.log();
        }
    }

    let mut response = flash::redirect("/", "You have been logged out successfully.");
    let mut removal = session_cookie("", state.cookie_secure);
    removal.make_removal();
    if let Err(e) = response.add_cookie(&removal) {
        tracing::warn!(error = %e, "No se pudo borrar la cookie de sesión");
    }
    response
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register);
    cfg.service(login);
    cfg.service(logout);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn form(username: &str, email: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    fn message(result: AppResult<()>) -> String {
        result.unwrap_err().user_message()
    }

    #[test]
    fn valid_registration_passes() {
        assert!(form("alice", "alice@example.com", "secret1", "secret1").check().is_ok());
    }

    #[test]
    fn registration_errors_follow_field_order() {
        assert_eq!(
            message(form("al", "bad", "123", "123").check()),
            "Username must be at least 3 characters long!"
        );
        assert_eq!(
            message(form("alice", "bad", "123", "123").check()),
            "Please enter a valid email address!"
        );
        assert_eq!(
            message(form("alice", "alice@example.com", "123", "123").check()),
            "Password must be at least 6 characters long!"
        );
        assert_eq!(
            message(form("alice", "alice@example.com", "secret1", "secret2").check()),
            "Passwords do not match!"
        );
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("admin123").unwrap();
        assert_ne!(hash, "admin123");
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
        assert!(!verify_password("admin123", "not-a-hash"));
    }

    #[test]
    fn token_from_cookie_or_bearer() {
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "cookie-token"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("cookie-token"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer api-token"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("api-token"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert!(extract_token(&req).is_none());
    }

    #[test]
    fn admin_flag_comes_from_user_record() {
        let mut user = User {
            id: None,
            username: "guest".into(),
            email: "guest@example.com".into(),
            password_hash: String::new(),
            is_admin: false,
            created_at: 0,
        };
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden(_))));
        user.is_admin = true;
        assert!(ensure_admin(&user).is_ok());
    }
}
