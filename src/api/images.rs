//! # Subida de imágenes de habitaciones
//!
//! `multipart/form-data` con un campo `file`. Solo administradores.

use actix_multipart::Multipart;
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use serde_json::json;

use super::auth::require_admin;
use super::rooms::parse_id;
use super::{AppError, AppResult};
use crate::db::{MongoRepo, RoomImage};
use crate::services::uploads::allowed_extension;
use crate::services::UploadError;
use crate::state::AppState;

/// Lee el campo `file` completo respetando el tamaño máximo
async fn read_file_field(payload: &mut Multipart, max_bytes: usize) -> AppResult<(String, Vec<u8>)> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("No file selected!".to_string()))?;
        if allowed_extension(&filename).is_none() {
            return Err(UploadError::UnsupportedType(filename).into());
        }

        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::Validation(format!("Error reading upload: {}", e)))?
        {
            if data.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge { max: max_bytes }.into());
            }
            data.extend_from_slice(&chunk);
        }
        return Ok((filename, data));
    }

    Err(AppError::Validation("No 'file' field found in upload".to_string()))
}

/// La primera imagen de una habitación es la principal
fn new_room_image(room_id: ObjectId, image_path: String, existing_images: u64, created_at: i64) -> RoomImage {
    RoomImage {
        id: None,
        room_id,
        image_path,
        is_primary: existing_images == 0,
        created_at,
    }
}

#[post("/admin/rooms/{room_id}/images")]
async fn upload_room_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
    mut payload: Multipart,
) -> AppResult<impl Responder> {
    require_admin(&state.repo, &req).await?;
    let room_id = parse_id(&path, "Room")?;
    if state.repo.find_room(room_id).await?.is_none() {
        return Err(AppError::NotFound("Room not found!".to_string()));
    }

    let (filename, data) = read_file_field(&mut payload, state.uploads.max_bytes()).await?;
    let image_path = state.uploads.save(&filename, &data).await?;

    let existing = state
        .repo
        .room_images()
        .count_documents(doc! { "room_id": room_id })
        .await
        .map_err(|e| AppError::database("count_room_images", e))?;
    let image = new_room_image(room_id, image_path.clone(), existing, MongoRepo::current_timestamp());
    let result = state
        .repo
        .room_images()
        .insert_one(&image)
        .await
        .map_err(|e| AppError::database("insert_room_image", e))?;

    Ok(HttpResponse::Created().json(json!({
        "id": result.inserted_id.as_object_id().map(|id| id.to_hex()),
        "room_id": room_id.to_hex(),
        "image_path": image_path,
        "url": format!("/static/{}", image_path),
        "is_primary": image.is_primary
    })))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_room_image);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::error::PayloadError;
    use actix_web::http::header::{self, HeaderMap, HeaderValue};
    use actix_web::web::Bytes;

    const BOUNDARY: &str = "hotel-test-boundary";

    fn multipart(field: &str, filename: &str, data: &[u8]) -> Multipart {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = BOUNDARY
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(&format!("multipart/form-data; boundary={}", BOUNDARY)).unwrap(),
        );
        let stream = futures_util::stream::once(async move { Ok::<_, PayloadError>(Bytes::from(body)) });
        Multipart::new(&headers, stream)
    }

    #[actix_web::test]
    async fn reads_file_field() {
        let mut payload = multipart("file", "suite.png", b"fake-png");
        let (name, data) = read_file_field(&mut payload, 1024).await.unwrap();
        assert_eq!(name, "suite.png");
        assert_eq!(data, b"fake-png");
    }

    #[actix_web::test]
    async fn stops_reading_past_the_size_limit() {
        let mut payload = multipart("file", "suite.png", &[7u8; 64]);
        let err = read_file_field(&mut payload, 16).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("too large")));
    }

    #[actix_web::test]
    async fn missing_file_field_is_rejected() {
        let mut payload = multipart("photo", "suite.png", b"fake-png");
        let err = read_file_field(&mut payload, 1024).await.unwrap_err();
        assert_eq!(err.user_message(), "No 'file' field found in upload");
    }

    #[actix_web::test]
    async fn unsupported_extension_is_rejected() {
        let mut payload = multipart("file", "notes.txt", b"hello");
        let err = read_file_field(&mut payload, 1024).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("Unsupported file type")));
    }

    #[test]
    fn only_the_first_image_is_primary() {
        let room = ObjectId::new();
        assert!(new_room_image(room, "uploads/a.png".into(), 0, 0).is_primary);
        assert!(!new_room_image(room, "uploads/b.png".into(), 1, 0).is_primary);
    }
}
