//! Record types for Reference Metadata conversion.
//!
//! Flat XML dataset elements are turned into tagged records here: concept
//! graph records ([`ConceptBatch`]) and reference metadata
//! ([`ReferenceMetadata`]). The [`ReferenceDictionary`] accumulates surrogate
//! id lookups across every batch of a run.

pub mod attributes;
pub mod concept;
pub mod dictionary;
pub mod error;
pub mod reference;
pub mod table;

pub use attributes::Attributes;
pub use concept::{
    Concept, ConceptAnswer, ConceptBatch, ConceptDescription, ConceptName, ConceptReferenceMap,
    ConceptSetMember, NameType, NumericConcept, NumericRange,
};
pub use dictionary::ReferenceDictionary;
pub use error::{ModelError, Result};
pub use reference::{MetadataRecord, ReferenceKind, ReferenceMetadata};
pub use table::{Keyed, RecordTable};
