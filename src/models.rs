use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// Establishments

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::establishments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EstablishmentEntity {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::establishments)]
pub struct CreateEstablishmentEntity {
    pub name: String,
    pub address: Option<String>,
}

// Offers

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::offers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OfferEntity {
    pub id: i32,
    pub establishment_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub original_price: f32,
    pub sale_price: f32,
    pub initial_stock: i32,
    pub current_stock: i32,
    pub pickup_window_start: String,
    pub pickup_window_end: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::offers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOfferEntity {
    pub establishment_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub original_price: f32,
    pub sale_price: f32,
    pub initial_stock: i32,
    pub current_stock: i32,
    pub pickup_window_start: String,
    pub pickup_window_end: String,
    pub status: String,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub consumer_id: i32,
    pub offer_id: i32,
    pub quantity: i32,
    pub total_value: f32,
    pub pickup_code: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub picked_up_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub consumer_id: i32,
    pub offer_id: i32,
    pub quantity: i32,
    pub total_value: f32,
    pub pickup_code: String,
    pub status: String,
}

// Payments

#[derive(Queryable, Serialize, Selectable, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentEntity {
    pub id: Uuid,
    pub order_id: i32,
    pub amount: f32,
    pub method: String,
    pub status: String,
    pub provider_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Serialize, Deserialize, Debug)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreatePaymentEntity {
    pub order_id: i32,
    pub amount: f32,
    pub method: String,
    pub status: String,
    pub provider_ref: Option<String>,
}
