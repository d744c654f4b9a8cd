//! Lead capture forms (contact, booking, general enquiry).

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::LeadResponse,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadForm {
    Contact,
    Booking,
    Enquiry,
}

impl LeadForm {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "contact" => Some(Self::Contact),
            "booking" => Some(Self::Booking),
            "enquiry" => Some(Self::Enquiry),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Booking => "booking",
            Self::Enquiry => "enquiry",
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Contact | Self::Enquiry => &["name", "email", "message"],
            Self::Booking => &["name", "email", "phone", "date"],
        }
    }
}

fn has_text(fields: &serde_json::Map<String, Value>, name: &str) -> bool {
    fields
        .get(name)
        .and_then(Value::as_str)
        .is_some_and(|v| !v.trim().is_empty())
}

/// POST /leads/:form
#[instrument(skip(state, payload))]
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    Path(form): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<LeadResponse>> {
    let Json(body) = payload?;
    let form = LeadForm::parse(&form)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown form: {form}")))?;

    let Value::Object(mut fields) = body else {
        return Err(ApiError::BadRequest("Expected a JSON object".to_string()));
    };

    if let Some(missing) = form
        .required_fields()
        .iter()
        .find(|name| !has_text(&fields, name))
    {
        return Err(ApiError::BadRequest(format!(
            "Missing required field: {missing}"
        )));
    }

    let id = Uuid::new_v4().to_string();
    fields.insert("id".to_string(), Value::from(id.clone()));
    fields.insert("form".to_string(), Value::from(form.as_str()));
    fields.insert(
        "createdAt".to_string(),
        Value::from(chrono::Utc::now().to_rfc3339()),
    );

    state
        .storage
        .save_submission(form.as_str(), &id, &Value::Object(fields))
        .await?;

    info!(form = form.as_str(), %id, "Recorded lead");
    Ok(Json(LeadResponse { success: true, id }))
}
