//! Citizen accounts as seen by the resident directory.
//!
//! Citizens register through the public client; their address is stored
//! in parts and their birth date as independent year/month/day strings.

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

/// Collection holding citizen documents.
pub const COLLECTION: &str = "citizen";

/// Citizen-side filters of the resident directory.
pub static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::builder(COLLECTION)
        .exact("purok", "address.purok")
        .boolean("isVerified", "isVerified")
        .build()
});

/// Stored citizen document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citizen {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub gender: Option<String>,
    pub civil_status: Option<String>,
    pub birth_date: Option<PartialBirthDate>,
    pub address: Option<CitizenAddress>,
    pub is_verified: Option<bool>,
    pub created_at: Option<String>,
}

/// Address parts, most specific first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CitizenAddress {
    pub house_number: Option<String>,
    pub street: Option<String>,
    pub purok: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
}

impl CitizenAddress {
    /// Comma-joined address line; `None` when every part is blank.
    pub fn line(&self) -> Option<String> {
        let parts: Vec<&str> = [
            &self.house_number,
            &self.street,
            &self.purok,
            &self.barangay,
            &self.municipality,
            &self.province,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref().map(str::trim))
        .filter(|p| !p.is_empty())
        .collect();

        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

impl Citizen {
    /// Project into the directory view; `today` is the local date.
    pub fn into_view(self, today: NaiveDate) -> ResidentView {
        let birth = self.birth_date.unwrap_or_default();
        let first_name = self.first_name.unwrap_or_default();
        let last_name = self.last_name.unwrap_or_default();
        let full_name = join_name(&[
            Some(first_name.as_str()),
            self.middle_name.as_deref(),
            Some(last_name.as_str()),
            self.suffix.as_deref(),
        ]);

        ResidentView {
            id: self.id,
            kind: ResidentKind::Resident,
            first_name,
            middle_name: self.middle_name,
            last_name,
            full_name,
            email: self.email,
            contact_number: self.contact_number,
            address: self.address.as_ref().and_then(CitizenAddress::line),
            gender: self.gender.as_deref().and_then(display_case),
            civil_status: self.civil_status.as_deref().and_then(display_case),
            birthdate: birth.date().map(|d| d.format("%Y-%m-%d").to_string()),
            age: birth.age_on(today),
            registered_date: self.created_at,
            is_verified: self.is_verified.unwrap_or(false),
            position: None,
            department: None,
        }
    }
}

/// Resident source backed by the citizen collection.
pub struct CitizenSource {
    pool: PgPool,
}

impl CitizenSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResidentSource for CitizenSource {
    fn kind(&self) -> ResidentKind {
        ResidentKind::Resident
    }

    async fn fetch(&self, params: &ListingParams, ctx: &QueryContext) -> Result<Vec<ResidentView>> {
        let filter = compile(&SCHEMA, params, ctx);
        let order = sort::resolve(None, None, &SCHEMA);
        let today = ctx.now.with_timezone(&ctx.offset).date_naive();

        let docs = fetch_documents(&self.pool, &SCHEMA, &filter, &order).await?;
        docs.into_iter()
            .map(|doc| -> Result<ResidentView> {
                let citizen: Citizen =
                    serde_json::from_value(doc).context("failed to decode citizen")?;
                Ok(citizen.into_view(today))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn declaration_is_valid() {
        assert!(SCHEMA.validate().is_empty(), "{:?}", SCHEMA.validate());
    }

    #[test]
    fn projects_into_resident_view() {
        let citizen: Citizen = serde_json::from_value(json!({
            "_id": "c-1",
            "firstName": "Maria",
            "middleName": "Santos",
            "lastName": "Reyes",
            "gender": "female",
            "civilStatus": "MARRIED",
            "birthDate": {"year": "1990", "month": "August", "day": "3"},
            "address": {
                "houseNumber": "12",
                "street": "Mabini St.",
                "purok": "Purok 3",
                "barangay": ""
            },
            "isVerified": true,
            "createdAt": "2024-01-10T02:00:00Z"
        }))
        .unwrap();

        let view = citizen.into_view(today());
        assert_eq!(view.kind, ResidentKind::Resident);
        assert_eq!(view.full_name, "Maria Santos Reyes");
        assert_eq!(view.gender.as_deref(), Some("Female"));
        assert_eq!(view.civil_status.as_deref(), Some("Married"));
        assert_eq!(view.birthdate.as_deref(), Some("1990-08-03"));
        assert_eq!(view.age, Some(33));
        assert_eq!(view.address.as_deref(), Some("12, Mabini St., Purok 3"));
        assert_eq!(
            view.registered_date.as_deref(),
            Some("2024-01-10T02:00:00Z")
        );
        assert!(view.is_verified);
    }

    #[test]
    fn tolerates_nulls_and_missing_parts() {
        let citizen: Citizen = serde_json::from_value(json!({
            "_id": "c-2",
            "firstName": "Pedro",
            "lastName": null,
            "birthDate": null,
            "address": null
        }))
        .unwrap();

        let view = citizen.into_view(today());
        assert_eq!(view.full_name, "Pedro");
        assert_eq!(view.age, None);
        assert_eq!(view.birthdate, None);
        assert_eq!(view.address, None);
        assert!(!view.is_verified);
    }

    #[test]
    fn purok_filter_targets_address() {
        let params: ListingParams = [("purok", "Purok 3"), ("isVerified", "true")]
            .into_iter()
            .collect();
        let ctx = QueryContext::new(
            chrono::Utc::now(),
            chrono::FixedOffset::east_opt(0).unwrap(),
        );
        let filter = compile(&SCHEMA, &params, &ctx);

        assert!(filter.matches(&json!({"address": {"purok": "Purok 3"}, "isVerified": true})));
        assert!(!filter.matches(&json!({"address": {"purok": "Purok 1"}, "isVerified": true})));
    }
}
