use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Cursor, Database};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::models::{
    Booking, ContactMessage, CustomerLoyalty, FoodItem, FoodOrder, Room, RoomImage, RoomType,
    Session, User,
};
use crate::api::AppError;
use crate::config::AppConfig;
use crate::domain::{BookingStatus, LoyaltyTier};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone)]
pub struct MongoRepo {
    pub client: Client,
    pub database: Database,
}

impl MongoRepo {
    /// Crea el cliente sin validar la conexión (el driver conecta de forma perezosa)
    pub async fn connect(config: &AppConfig) -> Result<MongoRepo> {
        let client = Client::with_uri_str(&config.mongodb_uri)
            .await
            .map_err(|e| AppError::Internal(format!("Error conectando a MongoDB: {}", e)))?;

        let database = client.database(&config.mongodb_database);

        Ok(MongoRepo { client, database })
    }

    /// Comprueba que el servidor responde
    pub async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! {"ping": 1})
            .await
            .map_err(|e| AppError::Internal(format!("Error validando conexión MongoDB: {}", e)))?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.database.collection("users")
    }

    pub fn room_types(&self) -> Collection<RoomType> {
        self.database.collection("room_types")
    }

    pub fn rooms(&self) -> Collection<Room> {
        self.database.collection("rooms")
    }

    pub fn room_images(&self) -> Collection<RoomImage> {
        self.database.collection("room_images")
    }

    pub fn bookings(&self) -> Collection<Booking> {
        self.database.collection("bookings")
    }

    pub fn food_items(&self) -> Collection<FoodItem> {
        self.database.collection("food_items")
    }

    pub fn food_orders(&self) -> Collection<FoodOrder> {
        self.database.collection("food_orders")
    }

    pub fn contact_messages(&self) -> Collection<ContactMessage> {
        self.database.collection("contact_messages")
    }

    pub fn loyalty(&self) -> Collection<CustomerLoyalty> {
        self.database.collection("customer_loyalty")
    }

    pub fn sessions(&self) -> Collection<Session> {
        self.database.collection("sessions")
    }

    pub async fn create_indexes(&self) -> Result<()> {
        use mongodb::{options::IndexOptions, IndexModel};

        let unique = || IndexOptions::builder().unique(true).build();

        self.users()
            .create_indexes(vec![
                IndexModel::builder().keys(doc! { "username": 1 }).options(unique()).build(),
                IndexModel::builder().keys(doc! { "email": 1 }).options(unique()).build(),
            ])
            .await
            .map_err(|e| AppError::database("create_indexes_users", e))?;

        self.rooms()
            .create_indexes(vec![
                IndexModel::builder().keys(doc! { "room_number": 1 }).options(unique()).build(),
                IndexModel::builder().keys(doc! { "room_type_id": 1 }).build(),
            ])
            .await
            .map_err(|e| AppError::database("create_indexes_rooms", e))?;

        self.bookings()
            .create_indexes(vec![
                IndexModel::builder().keys(doc! { "room_id": 1, "status": 1 }).build(),
                IndexModel::builder().keys(doc! { "user_id": 1, "booking_date": -1 }).build(),
                IndexModel::builder().keys(doc! { "booking_date": -1 }).build(),
            ])
            .await
            .map_err(|e| AppError::database("create_indexes_bookings", e))?;

        self.loyalty()
            .create_index(IndexModel::builder().keys(doc! { "user_id": 1 }).options(unique()).build())
            .await
            .map_err(|e| AppError::database("create_indexes_loyalty", e))?;

        self.sessions()
            .create_index(IndexModel::builder().keys(doc! { "token": 1 }).options(unique()).build())
            .await
            .map_err(|e| AppError::database("create_indexes_sessions", e))?;

        tracing::info!("Índices MongoDB creados exitosamente");
        Ok(())
    }

    // Función auxiliar para obtener timestamp actual
    pub fn current_timestamp() -> i64 {
        chrono::Utc::now().timestamp()
    }

    /// Recorre un cursor completo y deserializa cada documento
    pub async fn collect<T>(mut cursor: Cursor<T>, operation: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let mut results = Vec::new();
        while cursor.advance().await.map_err(|e| AppError::database(operation, e))? {
            let item = cursor
                .deserialize_current()
                .map_err(|e| AppError::database(operation, e))?;
            results.push(item);
        }
        Ok(results)
    }

    pub async fn find_user(&self, id: ObjectId) -> Result<Option<User>> {
        self.users()
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::database("find_user", e))
    }

    pub async fn find_room(&self, id: ObjectId) -> Result<Option<Room>> {
        self.rooms()
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::database("find_room", e))
    }

    pub async fn find_room_type(&self, id: ObjectId) -> Result<Option<RoomType>> {
        self.room_types()
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::database("find_room_type", e))
    }

    /// Habitación junto con su tipo, resuelto con una consulta explícita
    pub async fn room_with_type(&self, room_id: ObjectId) -> Result<Option<(Room, RoomType)>> {
        let Some(room) = self.find_room(room_id).await? else {
            return Ok(None);
        };
        let room_type = self
            .find_room_type(room.room_type_id)
            .await?
            .ok_or_else(|| AppError::not_found_id("RoomType", &room.room_type_id.to_hex()))?;
        Ok(Some((room, room_type)))
    }

    pub async fn list_room_types(&self) -> Result<Vec<RoomType>> {
        let cursor = self
            .room_types()
            .find(doc! {})
            .sort(doc! { "base_price": 1 })
            .await
            .map_err(|e| AppError::database("list_room_types", e))?;
        Self::collect(cursor, "list_room_types").await
    }

    pub async fn rooms_of_type(&self, room_type_id: ObjectId) -> Result<Vec<Room>> {
        let cursor = self
            .rooms()
            .find(doc! { "room_type_id": room_type_id })
            .sort(doc! { "room_number": 1 })
            .await
            .map_err(|e| AppError::database("rooms_of_type", e))?;
        Self::collect(cursor, "rooms_of_type").await
    }

    /// Imágenes de varias habitaciones, la principal primero
    pub async fn images_of_rooms(&self, room_ids: &[ObjectId]) -> Result<Vec<RoomImage>> {
        let cursor = self
            .room_images()
            .find(doc! { "room_id": { "$in": room_ids } })
            .sort(doc! { "is_primary": -1, "created_at": 1 })
            .await
            .map_err(|e| AppError::database("images_of_rooms", e))?;
        Self::collect(cursor, "images_of_rooms").await
    }

    pub async fn find_booking(&self, id: ObjectId) -> Result<Option<Booking>> {
        self.bookings()
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::database("find_booking", e))
    }

    /// Reservas de una habitación con alguno de los estados indicados
    pub async fn room_bookings(
        &self,
        room_id: ObjectId,
        statuses: &[BookingStatus],
    ) -> Result<Vec<Booking>> {
        let statuses: Vec<&str> = statuses.iter().map(BookingStatus::as_str).collect();
        let cursor = self
            .bookings()
            .find(doc! { "room_id": room_id, "status": { "$in": statuses } })
            .await
            .map_err(|e| AppError::database("room_bookings", e))?;
        Self::collect(cursor, "room_bookings").await
    }

    /// Reservas más recientes primero; `filter` vacío para todas
    pub async fn list_bookings(&self, filter: Document, limit: Option<i64>) -> Result<Vec<Booking>> {
        let bookings = self.bookings();
        let mut find = bookings.find(filter).sort(doc! { "booking_date": -1 });
        if let Some(limit) = limit {
            find = find.limit(limit);
        }
        let cursor = find.await.map_err(|e| AppError::database("list_bookings", e))?;
        Self::collect(cursor, "list_bookings").await
    }

    pub async fn set_booking_status(
        &self,
        booking_id: ObjectId,
        status: BookingStatus,
        approve: bool,
    ) -> Result<()> {
        let mut set = doc! { "status": status.as_str() };
        if approve {
            set.insert("is_approved", true);
        }
        self.bookings()
            .update_one(doc! { "_id": booking_id }, doc! { "$set": set })
            .await
            .map_err(|e| AppError::database("set_booking_status", e))?;
        Ok(())
    }

    /// Suma el precio de todas las reservas confirmadas
    pub async fn confirmed_revenue(&self) -> Result<f64> {
        let pipeline = vec![
            doc! { "$match": { "status": BookingStatus::Confirmed.as_str() } },
            doc! { "$group": { "_id": Bson::Null, "total": { "$sum": "$total_price" } } },
        ];
        let cursor = self
            .bookings()
            .aggregate(pipeline)
            .await
            .map_err(|e| AppError::database("confirmed_revenue", e))?;
        let groups = Self::collect(cursor, "confirmed_revenue").await?;
        Ok(groups
            .first()
            .and_then(|group| group.get("total"))
            .and_then(|total| match total {
                Bson::Double(v) => Some(*v),
                Bson::Int32(v) => Some(f64::from(*v)),
                Bson::Int64(v) => Some(*v as f64),
                _ => None,
            })
            .unwrap_or(0.0))
    }

    pub async fn available_food_items(&self) -> Result<Vec<FoodItem>> {
        let cursor = self
            .food_items()
            .find(doc! { "is_available": true })
            .sort(doc! { "category": 1, "name": 1 })
            .await
            .map_err(|e| AppError::database("available_food_items", e))?;
        Self::collect(cursor, "available_food_items").await
    }

    pub async fn find_food_item(&self, id: ObjectId) -> Result<Option<FoodItem>> {
        self.food_items()
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::database("find_food_item", e))
    }

    /// Filtro que solo casa si la reserva aún no se ha contado para fidelización
    pub fn loyalty_claim_filter(booking_id: ObjectId) -> Document {
        doc! { "_id": booking_id, "loyalty_counted": { "$ne": true } }
    }

    /// Marca la reserva como contada; `true` solo para quien gana la marca
    pub async fn claim_loyalty(&self, booking_id: ObjectId) -> Result<bool> {
        let result = self
            .bookings()
            .update_one(
                Self::loyalty_claim_filter(booking_id),
                doc! { "$set": { "loyalty_counted": true } },
            )
            .await
            .map_err(|e| AppError::database("claim_loyalty", e))?;
        Ok(result.modified_count == 1)
    }

    /// Suma una reserva confirmada al contador del usuario y recalcula su nivel
    pub async fn record_confirmed_booking(&self, user_id: ObjectId) -> Result<CustomerLoyalty> {
        let counted = self
            .loyalty()
            .find_one_and_update(
                doc! { "user_id": user_id },
                doc! {
                    "$inc": { "total_bookings": 1 },
                    "$setOnInsert": {
                        "loyalty_level": LoyaltyTier::Bronze.as_str(),
                        "discount_percentage": 0.0
                    }
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| AppError::database("increment_loyalty", e))?
            .ok_or_else(|| AppError::internal_trace("loyalty upsert returned no document", None))?;

        let tier = LoyaltyTier::for_bookings(counted.total_bookings);
        self.loyalty()
            .update_one(
                doc! { "user_id": user_id },
                doc! {
                    "$set": {
                        "loyalty_level": tier.as_str(),
                        "discount_percentage": tier.discount_percentage()
                    }
                },
            )
            .await
            .map_err(|e| AppError::database("update_loyalty_tier", e))?;

        tracing::info!(
            user_id = %user_id.to_hex(),
            total_bookings = counted.total_bookings,
            tier = tier.as_str(),
            "Nivel de fidelización actualizado"
        );

        Ok(CustomerLoyalty {
            loyalty_level: tier,
            discount_percentage: tier.discount_percentage(),
            ..counted
        })
    }

    /// Abre una sesión nueva y devuelve su token
    pub async fn create_session(&self, user_id: ObjectId) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        self.sessions()
            .insert_one(Session {
                id: None,
                token: token.clone(),
                user_id,
                created_at: Self::current_timestamp(),
            })
            .await
            .map_err(|e| AppError::database("create_session", e))?;
        Ok(token)
    }

    /// Usuario persistido al que pertenece el token, si la sesión existe
    pub async fn session_user(&self, token: &str) -> Result<Option<User>> {
        let session = self
            .sessions()
            .find_one(doc! { "token": token })
            .await
            .map_err(|e| AppError::database("find_session", e))?;
        match session {
            Some(session) => self.find_user(session.user_id).await,
            None => Ok(None),
        }
    }

    pub async fn delete_session(&self, token: &str) -> Result<()> {
        self.sessions()
            .delete_one(doc! { "token": token })
            .await
            .map_err(|e| AppError::database("delete_session", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loyalty_claim_skips_counted_bookings() {
        let id = ObjectId::new();
        let filter = MongoRepo::loyalty_claim_filter(id);
        assert_eq!(filter.get_object_id("_id").unwrap(), id);
        let counted = filter.get_document("loyalty_counted").unwrap();
        assert_eq!(counted.get_bool("$ne").unwrap(), true);
    }

    #[test]
    fn bookings_stored_before_the_flag_read_as_uncounted() {
        let stored = doc! {
            "_id": ObjectId::new(),
            "user_id": ObjectId::new(),
            "room_id": ObjectId::new(),
            "check_in": "2024-01-10",
            "check_out": "2024-01-12",
            "total_price": 200.0,
            "booking_date": 0_i64,
            "status": "confirmed",
            "special_requests": "",
            "is_approved": true
        };
        let booking: Booking = mongodb::bson::from_document(stored).unwrap();
        assert!(!booking.loyalty_counted);
    }
}
