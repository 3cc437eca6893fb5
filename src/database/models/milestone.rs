use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{check_title, FieldErrors};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Milestone {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(rename = "project")]
    pub project_id: Uuid,
}

impl Milestone {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_title(&mut errors, "title", &self.title);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMilestone {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(rename = "project")]
    pub project_id: Uuid,
}

impl NewMilestone {
    pub fn into_milestone(self) -> Milestone {
        Milestone {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            project_id: self.project_id,
        }
    }
}

/// Milestones cannot be moved to another project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MilestonePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl MilestonePatch {
    pub fn apply(self, milestone: &mut Milestone) {
        if let Some(title) = self.title {
            milestone.title = title;
        }
        if let Some(description) = self.description {
            milestone.description = description;
        }
        if let Some(due_date) = self.due_date {
            milestone.due_date = due_date;
        }
    }
}
