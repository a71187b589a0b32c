//! Protocol status codes and the `ERROR` element

use std::fmt;

use super::object::CimInstance;

/// CIM status condition carried by an `ERROR` element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CimStatus {
    Failed,
    AccessDenied,
    InvalidNamespace,
    InvalidParameter,
    InvalidClass,
    NotFound,
    NotSupported,
    ClassHasChildren,
    ClassHasInstances,
    InvalidSuperclass,
    AlreadyExists,
    NoSuchProperty,
    TypeMismatch,
    QueryLanguageNotSupported,
    InvalidQuery,
    MethodNotAvailable,
    MethodNotFound,
    NamespaceNotEmpty,
    InvalidEnumerationContext,
    InvalidOperationTimeout,
    PullHasBeenAbandoned,
    PullCannotBeAbandoned,
    FilteredEnumerationNotSupported,
    ContinuationOnErrorNotSupported,
    ServerLimitsExceeded,
    ServerIsShuttingDown,
    /// Any code without a name of its own
    Other(u32),
}

const NAMED: [(u32, CimStatus, &str); 26] = [
    (1, CimStatus::Failed, "CIM_ERR_FAILED"),
    (2, CimStatus::AccessDenied, "CIM_ERR_ACCESS_DENIED"),
    (3, CimStatus::InvalidNamespace, "CIM_ERR_INVALID_NAMESPACE"),
    (4, CimStatus::InvalidParameter, "CIM_ERR_INVALID_PARAMETER"),
    (5, CimStatus::InvalidClass, "CIM_ERR_INVALID_CLASS"),
    (6, CimStatus::NotFound, "CIM_ERR_NOT_FOUND"),
    (7, CimStatus::NotSupported, "CIM_ERR_NOT_SUPPORTED"),
    (8, CimStatus::ClassHasChildren, "CIM_ERR_CLASS_HAS_CHILDREN"),
    (9, CimStatus::ClassHasInstances, "CIM_ERR_CLASS_HAS_INSTANCES"),
    (10, CimStatus::InvalidSuperclass, "CIM_ERR_INVALID_SUPERCLASS"),
    (11, CimStatus::AlreadyExists, "CIM_ERR_ALREADY_EXISTS"),
    (12, CimStatus::NoSuchProperty, "CIM_ERR_NO_SUCH_PROPERTY"),
    (13, CimStatus::TypeMismatch, "CIM_ERR_TYPE_MISMATCH"),
    (14, CimStatus::QueryLanguageNotSupported, "CIM_ERR_QUERY_LANGUAGE_NOT_SUPPORTED"),
    (15, CimStatus::InvalidQuery, "CIM_ERR_INVALID_QUERY"),
    (16, CimStatus::MethodNotAvailable, "CIM_ERR_METHOD_NOT_AVAILABLE"),
    (17, CimStatus::MethodNotFound, "CIM_ERR_METHOD_NOT_FOUND"),
    (20, CimStatus::NamespaceNotEmpty, "CIM_ERR_NAMESPACE_NOT_EMPTY"),
    (21, CimStatus::InvalidEnumerationContext, "CIM_ERR_INVALID_ENUMERATION_CONTEXT"),
    (22, CimStatus::InvalidOperationTimeout, "CIM_ERR_INVALID_OPERATION_TIMEOUT"),
    (23, CimStatus::PullHasBeenAbandoned, "CIM_ERR_PULL_HAS_BEEN_ABANDONED"),
    (24, CimStatus::PullCannotBeAbandoned, "CIM_ERR_PULL_CANNOT_BE_ABANDONED"),
    (25, CimStatus::FilteredEnumerationNotSupported, "CIM_ERR_FILTERED_ENUMERATION_NOT_SUPPORTED"),
    (26, CimStatus::ContinuationOnErrorNotSupported, "CIM_ERR_CONTINUATION_ON_ERROR_NOT_SUPPORTED"),
    (27, CimStatus::ServerLimitsExceeded, "CIM_ERR_SERVER_LIMITS_EXCEEDED"),
    (28, CimStatus::ServerIsShuttingDown, "CIM_ERR_SERVER_IS_SHUTTING_DOWN"),
];

impl CimStatus {
    pub fn from_code(code: u32) -> Self {
        NAMED
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, status, _)| *status)
            .unwrap_or(CimStatus::Other(code))
    }

    pub fn code(self) -> u32 {
        match self {
            CimStatus::Other(code) => code,
            status => NAMED
                .iter()
                .find(|(_, s, _)| *s == status)
                .map(|(c, _, _)| *c)
                .unwrap_or(0),
        }
    }

    /// Symbolic name, e.g. `CIM_ERR_NOT_FOUND`
    pub fn name(self) -> &'static str {
        NAMED
            .iter()
            .find(|(_, s, _)| *s == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("CIM_ERR_UNKNOWN")
    }
}

impl fmt::Display for CimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Protocol-level error returned inside a well-formed response
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{status}{}", suffix(.description))]
pub struct CimError {
    pub status: CimStatus,
    pub description: Option<String>,
    /// Extended error instances (`CIM_Error`)
    pub instances: Vec<CimInstance>,
}

impl CimError {
    pub fn new(status: CimStatus) -> Self {
        CimError {
            status,
            description: None,
            instances: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

fn suffix(description: &Option<String>) -> String {
    description.as_deref().map(|d| format!(": {}", d)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in 0..40 {
            assert_eq!(CimStatus::from_code(code).code(), code);
        }
        assert_eq!(CimStatus::from_code(6), CimStatus::NotFound);
        assert_eq!(CimStatus::from_code(18), CimStatus::Other(18));
    }

    #[test]
    fn test_error_display() {
        let err = CimError::new(CimStatus::NotFound).with_description("no such instance");
        assert_eq!(err.to_string(), "CIM_ERR_NOT_FOUND (6): no such instance");
        assert_eq!(CimError::new(CimStatus::Other(99)).to_string(), "CIM_ERR_UNKNOWN (99)");
    }
}
