//! Error types for scheduling enrichment.

use thiserror::Error;

/// Result type for scheduling operations.
pub type Result<T> = std::result::Result<T, SchedulingError>;

/// Errors that can occur while building or enriching a resource spec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// A preemption mode outside of `allow`, `constrain`, `prevent` and `none`.
    #[error("invalid preemption mode '{value}', expected one of: allow, constrain, prevent, none")]
    InvalidPreemptionMode {
        /// The rejected value.
        value: String,
    },

    /// Priority class name not in the configured set of valid names.
    #[error("priority class '{name}' not in available priority class names: [{}]", .valid.join(", "))]
    PriorityClassNotAllowed {
        /// The rejected name.
        name: String,
        /// Names that would have been accepted.
        valid: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_preemption_mode() {
        let err = SchedulingError::InvalidPreemptionMode {
            value: "sometimes".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid preemption mode 'sometimes', expected one of: allow, constrain, prevent, none"
        );
    }

    #[test]
    fn error_display_priority_class_not_allowed() {
        let err = SchedulingError::PriorityClassNotAllowed {
            name: "urgent".into(),
            valid: vec!["low".into(), "high".into()],
        };
        assert_eq!(
            err.to_string(),
            "priority class 'urgent' not in available priority class names: [low, high]"
        );
    }

    #[test]
    fn error_display_priority_class_no_valid_names() {
        let err = SchedulingError::PriorityClassNotAllowed {
            name: "urgent".into(),
            valid: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "priority class 'urgent' not in available priority class names: []"
        );
    }

    #[test]
    fn error_clone_and_eq() {
        let err1 = SchedulingError::InvalidPreemptionMode {
            value: "x".into(),
        };
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
