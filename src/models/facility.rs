use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::row_parsers::parse_uuid;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: Uuid,
    #[schema(example = "Norseus Gym")]
    pub name: String,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbFacility {
    pub id: String,
    pub name: String,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbFacility> for Facility {
    type Error = AppError;

    fn try_from(value: DbFacility) -> Result<Self, Self::Error> {
        Ok(Facility {
            id: parse_uuid(&value.id)?,
            name: value.name,
            logo: value.logo,
            created_at: value.created_at,
        })
    }
}
