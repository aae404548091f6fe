use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner: String,
    pub name: String,
    pub property_type: String,
    pub description: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub beds: Option<f64>,
    pub baths: Option<f64>,
    pub square_feet: Option<f64>,
    pub amenities: String, // JSON array of tags
    pub rate_nightly: Option<f64>,
    pub rate_weekly: Option<f64>,
    pub rate_monthly: Option<f64>,
    pub seller_name: String,
    pub seller_email: String,
    pub seller_phone: String,
    pub images: String, // JSON array of hosted URLs
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
