//! Error types for the gany runtime

/// Result type for every fallible runtime operation
pub type GanyResult<T> = Result<T, GanyError>;

/// Runtime error taxonomy
///
/// All errors are raised at the `Any` level. The class parent search and the
/// fuzzy overload pass catch them locally and fold their messages into the
/// error that finally reaches the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GanyError {
    /// Exact extraction failed
    #[error("Can not treat {got} as {expected}")]
    TypeMismatch {
        /// Requested native type name
        expected: String,
        /// Class name of the boxed value
        got: String,
    },

    /// Convertible extraction exhausted every strategy
    #[error("Unable cast {from} to {to}")]
    CastFailure {
        /// Class name of the boxed value
        from: String,
        /// Requested native type name
        to: String,
    },

    /// A user override returned the wrong kind
    #[error("{0}")]
    ContractViolation(String),

    /// Dynamic call resolution exhausted all overloads
    #[error("{0}")]
    NoMatchingOverload(String),

    /// Neither the numeric fast path nor an operator method produced a value
    #[error("{0}")]
    OperatorNotSupported(String),

    /// Malformed registration call
    #[error("{0}")]
    RegistrationError(String),

    /// Attribute or method absent across the whole inheritance chain
    #[error("{0}")]
    MemberNotFound(String),

    /// Error raised from inside a native function body
    #[error("{0}")]
    Runtime(String),
}

impl GanyError {
    /// Short name of the error category
    pub fn category(&self) -> &'static str {
        match self {
            GanyError::TypeMismatch { .. } => "TypeMismatch",
            GanyError::CastFailure { .. } => "CastFailure",
            GanyError::ContractViolation(_) => "ContractViolation",
            GanyError::NoMatchingOverload(_) => "NoMatchingOverload",
            GanyError::OperatorNotSupported(_) => "OperatorNotSupported",
            GanyError::RegistrationError(_) => "RegistrationError",
            GanyError::MemberNotFound(_) => "MemberNotFound",
            GanyError::Runtime(_) => "Runtime",
        }
    }
}

impl From<String> for GanyError {
    fn from(s: String) -> Self {
        GanyError::Runtime(s)
    }
}

impl From<&str> for GanyError {
    fn from(s: &str) -> Self {
        GanyError::Runtime(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = GanyError::TypeMismatch {
            expected: "i32".to_string(),
            got: "string".to_string(),
        };
        assert_eq!(err.to_string(), "Can not treat string as i32");

        let err = GanyError::CastFailure {
            from: "Array".to_string(),
            to: "i64".to_string(),
        };
        assert_eq!(err.to_string(), "Unable cast Array to i64");
    }

    #[test]
    fn test_from_str_is_runtime() {
        let err: GanyError = "boom".into();
        assert_eq!(err, GanyError::Runtime("boom".to_string()));
        assert_eq!(err.category(), "Runtime");
    }
}
