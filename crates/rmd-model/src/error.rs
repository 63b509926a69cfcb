use thiserror::Error;

use crate::reference::ReferenceKind;

/// Input-integrity errors raised while building or resolving records.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An element lacks an attribute the pipeline has to read.
    #[error("<{element}> element is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// A surrogate id was looked up before it was added to the dictionary.
    #[error("unresolved {kind} reference: surrogate id '{id}' is not known")]
    UnresolvedReference { kind: ReferenceKind, id: String },

    /// A record points at a concept id that is not loaded in the batch.
    #[error("unknown concept id '{concept_id}' referenced by {referrer}")]
    UnknownConcept { concept_id: String, referrer: String },
}

impl ModelError {
    pub(crate) fn missing(element: &str, attribute: &str) -> Self {
        Self::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::UnresolvedReference {
            kind: ReferenceKind::Source,
            id: "7".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unresolved Source reference: surrogate id '7' is not known"
        );

        let err = ModelError::missing("concept_name", "locale");
        assert_eq!(
            err.to_string(),
            "<concept_name> element is missing required attribute 'locale'"
        );
    }
}
