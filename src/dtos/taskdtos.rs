use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::taskmodel::*,
    service::disclosure::{ClientContactView, ProviderContactView},
};

//Task DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskDto {
    pub category: ServiceCategory,

    #[validate(length(min = 20, max = 2000, message = "Description must be between 20 and 2000 characters"))]
    pub description: String,

    #[validate(range(min = 1.0, message = "Budget must be positive"))]
    pub budget: Option<f64>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Range check for optional coordinates; rejected before any state read.
pub fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), String> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err("Latitude must be between -90 and 90".to_string());
        }
    }
    if let Some(lon) = longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err("Longitude must be between -180 and 180".to_string());
        }
    }
    if latitude.is_some() != longitude.is_some() {
        return Err("Latitude and longitude must be provided together".to_string());
    }
    Ok(())
}

//Engagement DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitInterestDto {
    #[validate(length(min = 10, max = 1000, message = "Message must be between 10 and 1000 characters"))]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CallCenterDecisionDto {
    pub approve: bool,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// A disclosure-filtered read of one engagement: what this viewer is
/// allowed to see of the two parties, alongside the public task fields.
#[derive(Debug, Serialize)]
pub struct EngagementViewDto {
    pub engagement: Engagement,
    pub task: TaskSummaryDto,
    pub client: ClientContactView,
    pub provider: ProviderContactView,
}

#[derive(Debug, Serialize)]
pub struct TaskSummaryDto {
    pub id: Uuid,
    pub category: ServiceCategory,
    pub description: String,
    pub budget: Option<f64>,
    pub status: Option<TaskStatus>,
}

impl TaskSummaryDto {
    pub fn from_task(task: &Task) -> Self {
        use num_traits::ToPrimitive;
        Self {
            id: task.id,
            category: task.category,
            description: task.description.clone(),
            budget: task.budget.as_ref().and_then(|b| b.to_f64()),
            status: task.status,
        }
    }
}

//Response wrappers
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}
