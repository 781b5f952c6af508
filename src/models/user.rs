use crate::entity::{Entity, EntityDescriptor, FieldDef, FieldKind, ValidationRule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub email: String,
    /// `active` or `inactive`.
    pub status: String,
    pub age: i64,
    pub phone: String,
}

impl Entity for User {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new("users")
            .timestamps()
            .soft_delete()
            .field(FieldDef::new("name", FieldKind::Text).not_null().max_length(100))
            .field(FieldDef::new("email", FieldKind::Text).not_null().unique().max_length(100))
            .field(
                FieldDef::new("status", FieldKind::Text)
                    .max_length(20)
                    .default_value(json!(STATUS_INACTIVE)),
            )
            .field(FieldDef::new("age", FieldKind::Int))
            .field(FieldDef::new("phone", FieldKind::Text).max_length(20))
            .rule("name", ValidationRule::required().with_max_length(100))
            .rule(
                "email",
                ValidationRule::required()
                    .with_format("email")
                    .with_max_length(100),
            )
            .rule("phone", ValidationRule::default().with_max_length(20))
    }

    fn id(&self) -> Option<i64> {
        self.id
    }
}
