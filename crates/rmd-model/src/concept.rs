//! Concept records and the per-batch concept graph.

use tracing::debug;

use crate::attributes::Attributes;
use crate::error::{ModelError, Result};
use crate::table::{Keyed, RecordTable};

/// Numeric-only concept attributes, shared by `concept` and `concept_numeric` rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumericRange {
    pub hi_absolute: Option<String>,
    pub hi_critical: Option<String>,
    pub hi_normal: Option<String>,
    pub low_absolute: Option<String>,
    pub low_critical: Option<String>,
    pub low_normal: Option<String>,
    pub units: Option<String>,
    pub allow_decimal: Option<String>,
    pub precise: Option<String>,
    pub display_precision: Option<String>,
}

impl NumericRange {
    pub fn from_attributes(attributes: &Attributes) -> Self {
        Self {
            hi_absolute: attributes.get_owned("hi_absolute"),
            hi_critical: attributes.get_owned("hi_critical"),
            hi_normal: attributes.get_owned("hi_normal"),
            low_absolute: attributes.get_owned("low_absolute"),
            low_critical: attributes.get_owned("low_critical"),
            low_normal: attributes.get_owned("low_normal"),
            units: attributes.get_owned("units"),
            allow_decimal: attributes.get_owned("allow_decimal"),
            precise: attributes.get_owned("precise"),
            display_precision: attributes.get_owned("display_precision"),
        }
    }

    /// Overwrites every field that `other` carries.
    pub fn merge(&mut self, other: &NumericRange) {
        fn take(target: &mut Option<String>, value: &Option<String>) {
            if value.is_some() {
                target.clone_from(value);
            }
        }
        take(&mut self.hi_absolute, &other.hi_absolute);
        take(&mut self.hi_critical, &other.hi_critical);
        take(&mut self.hi_normal, &other.hi_normal);
        take(&mut self.low_absolute, &other.low_absolute);
        take(&mut self.low_critical, &other.low_critical);
        take(&mut self.low_normal, &other.low_normal);
        take(&mut self.units, &other.units);
        take(&mut self.allow_decimal, &other.allow_decimal);
        take(&mut self.precise, &other.precise);
        take(&mut self.display_precision, &other.display_precision);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    pub concept_id: String,
    pub uuid: String,
    pub datatype_id: Option<String>,
    pub class_id: Option<String>,
    pub retired: Option<String>,
    pub numeric: NumericRange,
    /// Attribute names in source order, extended by merged numeric rows.
    pub attribute_order: Vec<String>,
}

impl Concept {
    pub const ELEMENT: &'static str = "concept";

    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        Ok(Self {
            concept_id: attributes.require(Self::ELEMENT, "concept_id")?,
            uuid: attributes.require(Self::ELEMENT, "uuid")?,
            datatype_id: attributes.get_owned("datatype_id"),
            class_id: attributes.get_owned("class_id"),
            retired: attributes.get_owned("retired"),
            numeric: NumericRange::from_attributes(attributes),
            attribute_order: attribute_names(attributes),
        })
    }
}

impl Keyed for Concept {
    fn key(&self) -> &str {
        &self.concept_id
    }
}

fn attribute_names(attributes: &Attributes) -> Vec<String> {
    attributes.iter().map(|(name, _)| name.to_string()).collect()
}

/// A `concept_numeric` row from the companion numeric-concepts file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericConcept {
    pub concept_id: String,
    pub range: NumericRange,
    pub attribute_order: Vec<String>,
}

impl NumericConcept {
    pub const ELEMENT: &'static str = "concept_numeric";

    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        Ok(Self {
            concept_id: attributes.require(Self::ELEMENT, "concept_id")?,
            range: NumericRange::from_attributes(attributes),
            attribute_order: attribute_names(attributes),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptDescription {
    pub uuid: String,
    pub concept_id: String,
    pub locale: String,
    pub description: String,
}

impl ConceptDescription {
    pub const ELEMENT: &'static str = "concept_description";

    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        Ok(Self {
            uuid: attributes.require(Self::ELEMENT, "uuid")?,
            concept_id: attributes.require(Self::ELEMENT, "concept_id")?,
            locale: attributes.require(Self::ELEMENT, "locale")?,
            description: attributes.get_owned("description").unwrap_or_default(),
        })
    }
}

impl Keyed for ConceptDescription {
    fn key(&self) -> &str {
        &self.uuid
    }
}

/// Name type as it matters for the CSV columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameType {
    FullySpecified,
    Short,
}

impl NameType {
    /// Only an explicit `SHORT` makes a short name.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("SHORT") => NameType::Short,
            _ => NameType::FullySpecified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptName {
    pub uuid: String,
    pub concept_id: String,
    pub locale: String,
    pub name: String,
    pub name_type: NameType,
}

impl ConceptName {
    pub const ELEMENT: &'static str = "concept_name";

    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        Ok(Self {
            uuid: attributes.require(Self::ELEMENT, "uuid")?,
            concept_id: attributes.require(Self::ELEMENT, "concept_id")?,
            locale: attributes.require(Self::ELEMENT, "locale")?,
            name: attributes.get_owned("name").unwrap_or_default(),
            name_type: NameType::from_attribute(attributes.get("concept_name_type")),
        })
    }
}

impl Keyed for ConceptName {
    fn key(&self) -> &str {
        &self.uuid
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptAnswer {
    pub uuid: String,
    pub concept_id: String,
    pub answer_concept: String,
}

impl ConceptAnswer {
    pub const ELEMENT: &'static str = "concept_answer";

    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        Ok(Self {
            uuid: attributes.require(Self::ELEMENT, "uuid")?,
            concept_id: attributes.require(Self::ELEMENT, "concept_id")?,
            answer_concept: attributes.require(Self::ELEMENT, "answer_concept")?,
        })
    }
}

impl Keyed for ConceptAnswer {
    fn key(&self) -> &str {
        &self.uuid
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptReferenceMap {
    pub uuid: String,
    pub concept_id: String,
    pub reference_term_id: String,
}

impl ConceptReferenceMap {
    pub const ELEMENT: &'static str = "concept_reference_map";

    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        Ok(Self {
            uuid: attributes.require(Self::ELEMENT, "uuid")?,
            concept_id: attributes.require(Self::ELEMENT, "concept_id")?,
            reference_term_id: attributes.require(Self::ELEMENT, "concept_reference_term_id")?,
        })
    }
}

impl Keyed for ConceptReferenceMap {
    fn key(&self) -> &str {
        &self.uuid
    }
}

/// Membership of `concept_id` in the set owned by `concept_set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptSetMember {
    pub uuid: String,
    pub concept_set: String,
    pub concept_id: String,
}

impl ConceptSetMember {
    pub const ELEMENT: &'static str = "concept_set";

    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        Ok(Self {
            uuid: attributes.require(Self::ELEMENT, "uuid")?,
            concept_set: attributes.require(Self::ELEMENT, "concept_set")?,
            concept_id: attributes.require(Self::ELEMENT, "concept_id")?,
        })
    }
}

impl Keyed for ConceptSetMember {
    fn key(&self) -> &str {
        &self.uuid
    }
}

/// All concept records loaded from one batch file.
#[derive(Debug, Clone, Default)]
pub struct ConceptBatch {
    pub concepts: RecordTable<Concept>,
    pub descriptions: RecordTable<ConceptDescription>,
    pub answers: RecordTable<ConceptAnswer>,
    pub names: RecordTable<ConceptName>,
    pub reference_maps: RecordTable<ConceptReferenceMap>,
    pub set_members: RecordTable<ConceptSetMember>,
}

impl ConceptBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a concept, reporting `referrer` when it is missing.
    pub fn concept(&self, concept_id: &str, referrer: &str) -> Result<&Concept> {
        self.concepts
            .get(concept_id)
            .ok_or_else(|| ModelError::UnknownConcept {
                concept_id: concept_id.to_string(),
                referrer: referrer.to_string(),
            })
    }

    /// Merges numeric attributes into the matching concepts.
    ///
    /// Returns the number of rows merged.
    pub fn merge_numeric<'a, I>(&mut self, numeric: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a NumericConcept>,
    {
        let mut merged = 0usize;
        for row in numeric {
            let concept = self.concepts.get_mut(&row.concept_id).ok_or_else(|| {
                ModelError::UnknownConcept {
                    concept_id: row.concept_id.clone(),
                    referrer: NumericConcept::ELEMENT.to_string(),
                }
            })?;
            concept.numeric.merge(&row.range);
            for name in &row.attribute_order {
                if !concept.attribute_order.contains(name) {
                    concept.attribute_order.push(name.clone());
                }
            }
            merged += 1;
        }
        debug!(merged, "merged numeric concept attributes");
        Ok(merged)
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}
