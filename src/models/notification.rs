//! Notifications sent to borrowers

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    LoanCreated,
    LoanDue,
    LoanOverdue,
    LoanReturned,
    LoanExtended,
    LoanCancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Body posted to the notification service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

impl Notification {
    pub fn new(
        user_id: i64,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let notification = Notification::new(
            5,
            NotificationType::LoanReturned,
            "Book returned",
            "Fine applied: $7.50",
            Priority::High,
        );
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["userId"], 5);
        assert_eq!(value["type"], "LOAN_RETURNED");
        assert_eq!(value["priority"], "HIGH");
    }
}
