use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    #[schema(example = "ana@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnsubscribeQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewsletterResponse {
    pub success: bool,
    pub message: String,
}
