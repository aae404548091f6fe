use crate::entities;
use crate::errors::PulseError;
use crate::settings::Database as DbCfg;
use async_trait::async_trait;
use base64ct::Encoding;
use chrono::Utc;
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
}

/// Rates the owner offers. `None` means the rate is not offered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub nightly: Option<f64>,
    pub weekly: Option<f64>,
    pub monthly: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Submitted listing fields, everything except owner, images and ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyFields {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub description: String,
    pub location: Location,
    pub beds: f64,
    pub baths: f64,
    pub square_feet: f64,
    pub amenities: Vec<String>,
    pub rates: Rates,
    pub seller_info: SellerInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProperty {
    pub owner: String,
    pub fields: PropertyFields,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub id: String,
    pub owner: String,
    #[serde(flatten)]
    pub fields: PropertyFields,
    pub images: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// What the profile page shows for one listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub id: String,
    pub name: String,
    pub address: String,
    pub image: Option<String>,
}

impl Property {
    pub fn summary(&self) -> PropertySummary {
        let loc = &self.fields.location;
        PropertySummary {
            id: self.id.clone(),
            name: self.fields.name.clone(),
            address: format!("{} {} {}", loc.street, loc.city, loc.state),
            image: self.images.first().cloned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub subject: String,
    pub created_at: i64,
    pub expires_at: i64,
}

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, PulseError> {
    let db = Database::connect(&cfg.url).await?;
    Ok(db)
}

// SQL engines have no NaN, so a NaN measure is stored as NULL
fn measure_to_column(v: f64) -> Option<f64> {
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

fn measure_from_column(v: Option<f64>) -> f64 {
    v.unwrap_or(f64::NAN)
}

fn rate_to_column(v: Option<f64>) -> Option<f64> {
    v.filter(|r| !r.is_nan())
}

fn property_from_model(model: entities::property::Model) -> Result<Property, PulseError> {
    let amenities: Vec<String> = serde_json::from_str(&model.amenities)?;
    let images: Vec<String> = serde_json::from_str(&model.images)?;

    Ok(Property {
        id: model.id,
        owner: model.owner,
        fields: PropertyFields {
            name: model.name,
            property_type: model.property_type,
            description: model.description,
            location: Location {
                street: model.street,
                city: model.city,
                state: model.state,
                zipcode: model.zipcode,
            },
            beds: measure_from_column(model.beds),
            baths: measure_from_column(model.baths),
            square_feet: measure_from_column(model.square_feet),
            amenities,
            rates: Rates {
                nightly: model.rate_nightly,
                weekly: model.rate_weekly,
                monthly: model.rate_monthly,
            },
            seller_info: SellerInfo {
                name: model.seller_name,
                email: model.seller_email,
                phone: model.seller_phone,
            },
        },
        images,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// Property functions

pub async fn create_property(
    db: &DatabaseConnection,
    input: NewProperty,
) -> Result<Property, PulseError> {
    let id = random_id();
    let now = Utc::now().timestamp();
    let NewProperty {
        owner,
        fields,
        images,
    } = input;

    let property = entities::property::ActiveModel {
        id: Set(id.clone()),
        owner: Set(owner.clone()),
        name: Set(fields.name.clone()),
        property_type: Set(fields.property_type.clone()),
        description: Set(fields.description.clone()),
        street: Set(fields.location.street.clone()),
        city: Set(fields.location.city.clone()),
        state: Set(fields.location.state.clone()),
        zipcode: Set(fields.location.zipcode.clone()),
        beds: Set(measure_to_column(fields.beds)),
        baths: Set(measure_to_column(fields.baths)),
        square_feet: Set(measure_to_column(fields.square_feet)),
        amenities: Set(serde_json::to_string(&fields.amenities)?),
        rate_nightly: Set(rate_to_column(fields.rates.nightly)),
        rate_weekly: Set(rate_to_column(fields.rates.weekly)),
        rate_monthly: Set(rate_to_column(fields.rates.monthly)),
        seller_name: Set(fields.seller_info.name.clone()),
        seller_email: Set(fields.seller_info.email.clone()),
        seller_phone: Set(fields.seller_info.phone.clone()),
        images: Set(serde_json::to_string(&images)?),
        created_at: Set(now),
        updated_at: Set(now),
    };

    property.insert(db).await?;

    Ok(Property {
        id,
        owner,
        fields,
        images,
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_property(
    db: &DatabaseConnection,
    id: &str,
) -> Result<Option<Property>, PulseError> {
    use entities::property::Entity;

    match Entity::find_by_id(id.to_string()).one(db).await? {
        Some(model) => Ok(Some(property_from_model(model)?)),
        None => Ok(None),
    }
}

pub async fn get_properties_by_owner(
    db: &DatabaseConnection,
    owner: &str,
) -> Result<Vec<Property>, PulseError> {
    use entities::property::{Column, Entity};

    let models = Entity::find()
        .filter(Column::Owner.eq(owner))
        .order_by_desc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await?;

    models.into_iter().map(property_from_model).collect()
}

/// Delete a property on behalf of `owner`. Only the owner may delete.
pub async fn delete_property(
    db: &DatabaseConnection,
    id: &str,
    owner: &str,
) -> Result<(), PulseError> {
    use entities::property::{Column, Entity};

    let model = Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| PulseError::NotFound(id.to_string()))?;

    if model.owner != owner {
        return Err(PulseError::Forbidden(id.to_string()));
    }

    // Owner is part of the filter so a concurrent re-assignment cannot slip through
    let result = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::Owner.eq(owner))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(PulseError::NotFound(id.to_string()));
    }

    Ok(())
}

fn random_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}

// Session functions

pub async fn create_session(
    db: &DatabaseConnection,
    subject: &str,
    ttl_secs: i64,
) -> Result<Session, PulseError> {
    let session_id = random_id();
    let now = Utc::now().timestamp();
    let expires_at = now + ttl_secs;

    let session = entities::session::ActiveModel {
        session_id: Set(session_id.clone()),
        subject: Set(subject.to_string()),
        created_at: Set(now),
        expires_at: Set(expires_at),
    };

    session.insert(db).await?;

    Ok(Session {
        session_id,
        subject: subject.to_string(),
        created_at: now,
        expires_at,
    })
}

pub async fn get_session(
    db: &DatabaseConnection,
    session_id: &str,
) -> Result<Option<Session>, PulseError> {
    use entities::session::{Column, Entity};

    if let Some(model) = Entity::find()
        .filter(Column::SessionId.eq(session_id))
        .one(db)
        .await?
    {
        // Check if session is expired
        let now = Utc::now().timestamp();
        if now > model.expires_at {
            return Ok(None);
        }

        Ok(Some(Session {
            session_id: model.session_id,
            subject: model.subject,
            created_at: model.created_at,
            expires_at: model.expires_at,
        }))
    } else {
        Ok(None)
    }
}

pub async fn cleanup_expired_sessions(db: &DatabaseConnection) -> Result<u64, PulseError> {
    use entities::session::{Column, Entity};

    let now = Utc::now().timestamp();
    let result = Entity::delete_many()
        .filter(Column::ExpiresAt.lt(now))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Durable store seen by the listing flows.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Make sure the store is reachable before any side effect happens.
    async fn ensure_ready(&self) -> Result<(), PulseError>;
    async fn create(&self, input: NewProperty) -> Result<Property, PulseError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Property>, PulseError>;
    async fn find_by_owner(&self, owner: &str) -> Result<Vec<Property>, PulseError>;
    async fn delete_by_id(&self, id: &str, owner: &str) -> Result<(), PulseError>;
}

#[derive(Clone)]
pub struct DbPropertyRepository {
    db: DatabaseConnection,
}

impl DbPropertyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PropertyRepository for DbPropertyRepository {
    async fn ensure_ready(&self) -> Result<(), PulseError> {
        self.db.ping().await?;
        Ok(())
    }

    async fn create(&self, input: NewProperty) -> Result<Property, PulseError> {
        create_property(&self.db, input).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Property>, PulseError> {
        get_property(&self.db, id).await
    }

    async fn find_by_owner(&self, owner: &str) -> Result<Vec<Property>, PulseError> {
        get_properties_by_owner(&self.db, owner).await
    }

    async fn delete_by_id(&self, id: &str, owner: &str) -> Result<(), PulseError> {
        delete_property(&self.db, id, owner).await
    }
}
