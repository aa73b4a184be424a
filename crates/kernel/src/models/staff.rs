//! Staff accounts as seen by the resident directory.
//!
//! Staff are created by administrators, so every staff view counts as
//! verified.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;

use crate::listing::{
    ListingParams, PartialBirthDate, QueryContext, ResidentKind, ResidentSource, ResidentView,
    ResourceSchema, compile, display_case, fetch_documents, join_name, sort,
};

/// Collection holding staff documents.
pub const COLLECTION: &str = "staff";

/// Staff-side filters of the resident directory.
pub static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::builder(COLLECTION)
        .exact("department", "department")
        .boolean("isActive", "isActive")
        .build()
});

/// Stored staff document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub gender: Option<String>,
    pub civil_status: Option<String>,
    pub birth_date: Option<PartialBirthDate>,
    pub address: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: Option<String>,
}

impl Staff {
    pub fn into_view(self, today: NaiveDate) -> ResidentView {
        let birth = self.birth_date.unwrap_or_default();
        let first_name = self.first_name.unwrap_or_default();
        let last_name = self.last_name.unwrap_or_default();
        let full_name = join_name(&[
            Some(first_name.as_str()),
            self.middle_name.as_deref(),
            Some(last_name.as_str()),
        ]);

        ResidentView {
            id: self.id,
            kind: ResidentKind::Staff,
            first_name,
            middle_name: self.middle_name,
            last_name,
            full_name,
            email: self.email,
            contact_number: self.contact_number,
            address: self.address.filter(|a| !a.trim().is_empty()),
            gender: self.gender.as_deref().and_then(display_case),
            civil_status: self.civil_status.as_deref().and_then(display_case),
            birthdate: birth.date().map(|d| d.format("%Y-%m-%d").to_string()),
            age: birth.age_on(today),
            registered_date: self.created_at,
            is_verified: true,
            position: self.position,
            department: self.department,
        }
    }
}

/// Resident source backed by the staff collection.
pub struct StaffSource {
    pool: PgPool,
}

impl StaffSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResidentSource for StaffSource {
    fn kind(&self) -> ResidentKind {
        ResidentKind::Staff
    }

    async fn fetch(&self, params: &ListingParams, ctx: &QueryContext) -> Result<Vec<ResidentView>> {
        let filter = compile(&SCHEMA, params, ctx);
        let order = sort::resolve(None, None, &SCHEMA);
        let today = ctx.now.with_timezone(&ctx.offset).date_naive();

        let docs = fetch_documents(&self.pool, &SCHEMA, &filter, &order).await?;
        docs.into_iter()
            .map(|doc| -> Result<ResidentView> {
                let staff: Staff = serde_json::from_value(doc).context("failed to decode staff")?;
                Ok(staff.into_view(today))
            })
            .collect()
    }
}
