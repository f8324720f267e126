use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::subscription::{self, SubscriptionPlan, SubscriptionStatus};

/// Service-provider profile, 1:1 extension of a `role = craftsman` user.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Craftsman {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub experience_years: i64,
    pub rating: f64,
    pub review_count: i64,
    pub verified: bool,
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: SubscriptionPlan,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Craftsman {
    /// Lazy expiry at read time: downgrade a lapsed ACTIVE subscription to
    /// EXPIRED in the returned view. The stored row is left untouched.
    pub fn apply_expiry(mut self, now: DateTime<Utc>) -> Self {
        self.subscription_status = subscription::effective_status(
            self.subscription_status,
            self.subscription_end_date,
            now,
        );
        self
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbCraftsman {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub experience_years: i64,
    pub rating: f64,
    pub review_count: i64,
    pub verified: bool,
    pub subscription_status: String,
    pub subscription_plan: String,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbCraftsman> for Craftsman {
    type Error = AppError;

    fn try_from(value: DbCraftsman) -> Result<Self, Self::Error> {
        let subscription_status = SubscriptionStatus::parse(&value.subscription_status)
            .ok_or_else(|| {
                AppError::internal(format!(
                    "unknown subscription status in database: {}",
                    value.subscription_status
                ))
            })?;
        let subscription_plan = SubscriptionPlan::parse(&value.subscription_plan).ok_or_else(|| {
            AppError::internal(format!(
                "unknown subscription plan in database: {}",
                value.subscription_plan
            ))
        })?;

        Ok(Craftsman {
            id: value.id,
            user_id: value.user_id,
            business_name: value.business_name,
            description: value.description,
            phone: value.phone,
            county: value.county,
            city: value.city,
            category: value.category,
            experience_years: value.experience_years,
            rating: value.rating,
            review_count: value.review_count,
            verified: value.verified,
            subscription_status,
            subscription_plan,
            subscription_start_date: value.subscription_start_date,
            subscription_end_date: value.subscription_end_date,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Craftsman profile block accepted at signup.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CraftsmanOnboarding {
    #[schema(example = "Instalații Popescu SRL")]
    pub business_name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Cluj")]
    pub county: Option<String>,
    pub city: Option<String>,
    #[schema(example = "instalatii")]
    pub category: Option<String>,
    pub experience_years: Option<i64>,
    pub subscription_plan: Option<SubscriptionPlan>,
}

/// Directory entry shown to the public: profile fields plus the owner's
/// display name, no subscription internals.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CraftsmanProfile {
    pub id: Uuid,
    pub name: String,
    pub business_name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub experience_years: i64,
    pub rating: f64,
    pub review_count: i64,
    pub verified: bool,
}

impl CraftsmanProfile {
    pub fn from_parts(craftsman: Craftsman, name: String) -> Self {
        Self {
            id: craftsman.id,
            name,
            business_name: craftsman.business_name,
            description: craftsman.description,
            phone: craftsman.phone,
            county: craftsman.county,
            city: craftsman.city,
            category: craftsman.category,
            experience_years: craftsman.experience_years,
            rating: craftsman.rating,
            review_count: craftsman.review_count,
            verified: craftsman.verified,
        }
    }
}

/// Back-office row: the full craftsman record together with its user.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CraftsmanWithUser {
    pub craftsman: Craftsman,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CraftsmanActionResponse {
    pub success: bool,
    pub message: String,
    pub craftsman: Craftsman,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DirectoryQuery {
    pub county: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// Admin listing also filters on user status, so keep it distinct from the
// public directory query.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminCraftsmenQuery {
    pub subscription_status: Option<String>,
    pub verified: Option<bool>,
}
