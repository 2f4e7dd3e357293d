use serde::Serialize;

use crate::AppError;

/// Alert shown above a page's content.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Bootstrap alert level.
    pub level: &'static str,
    pub text: String,
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Message {
            level: "success",
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Message {
            level: "info",
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Message {
            level: "warning",
            text: text.into(),
        }
    }

    pub fn danger(text: impl Into<String>) -> Self {
        Message {
            level: "danger",
            text: text.into(),
        }
    }

    /// Turns a rejected edit into an alert. Any other error is returned
    /// unchanged so it can become an error page.
    pub fn from_rejection(err: AppError) -> Result<Self, AppError> {
        if err.is_rejection() {
            tracing::info!("edit rejected: {}", err.message());
            Ok(Message::danger(err.message()))
        } else {
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rejections_become_alerts() {
        let rejected = AppError::MissingIdentifier {
            template: "assays".to_string(),
        };
        assert_eq!(
            Message::from_rejection(rejected).unwrap(),
            Message::danger("Cannot add to assays template; an ontology ID is required.")
        );
        assert!(Message::from_rejection(AppError::NotFound).is_err());
    }
}
