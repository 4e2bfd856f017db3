//! Core error types.

use thiserror::Error;

use crate::criteria::NodeId;
use crate::mapper::MappingError;

/// Broad classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Defect in a shape, registry or filter declaration.
    Configuration,
    /// A query could not be resolved against the entity model.
    Resolution,
    /// A result row could not be bound to its target shape.
    Mapping,
    /// The backend failed while executing a built query.
    Execution,
}

/// Core projection engine errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Shape metadata is missing or inconsistent.
    #[error("malformed shape {shape}: {reason}")]
    MalformedShape { shape: String, reason: String },

    /// An operator name was registered twice.
    #[error("operator already registered: {0}")]
    DuplicateOperator(String),

    /// A selector kind was registered twice.
    #[error("select operator already registered: {0}")]
    DuplicateSelector(String),

    /// An alias has the same text as a declared path.
    #[error("alias '{alias}' cannot be equal to a path")]
    AmbiguousAlias { alias: String },

    /// Two join declarations share an alias.
    #[error("duplicate alias detected: {alias}")]
    DuplicateAlias { alias: String },

    /// Alias rewriting did not reach a fixpoint.
    #[error("alias cycle detected at '{alias}' while resolving '{path}'")]
    AliasCycle { alias: String, path: String },

    /// No handler for a selector kind.
    #[error("select operator not found: {kind}; available select operators: [{}]", .available.join(", "))]
    UnknownSelector { kind: String, available: Vec<String> },

    /// The entity is not part of the catalog.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// A filter value could not be constructed.
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] projql_proto::Error),

    /// Fixture data does not match the catalog.
    #[error("invalid fixture: {0}")]
    Fixture(String),

    /// A node id that was not created by the query it was used with.
    #[error("unknown query node: {0}")]
    UnknownNode(NodeId),

    /// A path contains an empty segment.
    #[error("invalid attribute path: '{0}'")]
    InvalidPath(String),

    /// The attribute does not exist on the entity.
    #[error("unknown attribute '{attribute}' on entity {entity}")]
    UnknownAttribute { entity: String, attribute: String },

    /// A join was requested through a scalar attribute.
    #[error("attribute '{attribute}' on entity {entity} is not a relation")]
    NotARelation { entity: String, attribute: String },

    /// A selection, filter or order addressed a relation as a value.
    #[error("attribute '{attribute}' on entity {entity} is a relation, not a value")]
    NotAValue { entity: String, attribute: String },

    /// No handler for an operator name.
    #[error("operator not found: {name}\navailable operators: [{}]", .available.join(", "))]
    UnknownOperator { name: String, available: Vec<String> },

    /// An operator was invoked with a value of the wrong shape.
    #[error("{operator} operator requires {expected}. Provided: {value}")]
    InvalidArgument {
        operator: String,
        expected: &'static str,
        value: String,
    },

    /// A row could not be mapped onto its shape.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Backend execution failure.
    #[error("execution error: {0}")]
    Execution(String),
}

impl Error {
    /// Category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MalformedShape { .. }
            | Error::DuplicateOperator(_)
            | Error::DuplicateSelector(_)
            | Error::AmbiguousAlias { .. }
            | Error::DuplicateAlias { .. }
            | Error::AliasCycle { .. }
            | Error::UnknownSelector { .. }
            | Error::UnknownEntity(_)
            | Error::InvalidFilter(_)
            | Error::Fixture(_) => ErrorCategory::Configuration,
            Error::InvalidPath(_)
            | Error::UnknownNode(_)
            | Error::UnknownAttribute { .. }
            | Error::NotARelation { .. }
            | Error::NotAValue { .. }
            | Error::UnknownOperator { .. }
            | Error::InvalidArgument { .. } => ErrorCategory::Resolution,
            Error::Mapping(_) => ErrorCategory::Mapping,
            Error::Execution(_) => ErrorCategory::Execution,
        }
    }
}

/// Result type for the projection engine.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_operator_lists_available() {
        let err = Error::UnknownOperator {
            name: "SIMILAR".into(),
            available: vec!["EQUAL".into(), "LIKE".into()],
        };
        assert_eq!(
            err.to_string(),
            "operator not found: SIMILAR\navailable operators: [EQUAL, LIKE]"
        );
        assert_eq!(err.category(), ErrorCategory::Resolution);
    }

    #[test]
    fn test_proto_errors_are_configuration() {
        let err: Error = projql_proto::BetweenValues::new(projql_proto::Value::Null, 1)
            .unwrap_err()
            .into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
