//! Measures, populations, and cross-population queries

use crate::clause::LogicalClause;
use crate::element::DataElement;
use indexmap::IndexSet;
use octofhir_measure_types::{ComponentId, MeasureId, ValueSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a population plays in measure scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PopulationKind {
    InitialPopulation,
    Denominator,
    DenominatorExclusion,
    DenominatorException,
    Numerator,
    NumeratorExclusion,
    MeasurePopulation,
    StratificationCriteria,
}

impl fmt::Display for PopulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InitialPopulation => "initial population",
            Self::Denominator => "denominator",
            Self::DenominatorExclusion => "denominator exclusion",
            Self::DenominatorException => "denominator exception",
            Self::Numerator => "numerator",
            Self::NumeratorExclusion => "numerator exclusion",
            Self::MeasurePopulation => "measure population",
            Self::StratificationCriteria => "stratification criteria",
        };
        write!(f, "{label}")
    }
}

/// One population with its criteria tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Population {
    /// Population id, unique within its measure
    pub id: String,
    /// Scoring role
    pub kind: PopulationKind,
    /// Optional narrative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Root of this population's criteria tree
    pub criteria: LogicalClause,
}

impl Population {
    /// Create a population around a criteria tree
    pub fn new(id: impl Into<String>, kind: PopulationKind, criteria: LogicalClause) -> Self {
        Self {
            id: id.into(),
            kind,
            description: None,
            criteria,
        }
    }

    /// Set the narrative
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Descriptive measure fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureMetadata {
    /// Measure title
    pub title: String,
    /// Measure steward organization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steward: Option<String>,
    /// CMS identifier, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cms_id: Option<String>,
    /// Narrative description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Measurement period label, e.g. "January 1 - December 31, 2025"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_period: Option<String>,
}

/// A clinical quality measure: metadata plus a forest of population trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    /// Measure id, unique across the library
    pub id: MeasureId,
    /// Descriptive fields
    pub metadata: MeasureMetadata,
    /// Populations, each with its own criteria tree
    #[serde(default)]
    pub populations: Vec<Population>,
    /// Measure-level value sets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_sets: Vec<ValueSet>,
}

impl Measure {
    /// Create a measure with no populations
    pub fn new(id: impl Into<MeasureId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: MeasureMetadata {
                title: title.into(),
                ..MeasureMetadata::default()
            },
            populations: Vec::new(),
            value_sets: Vec::new(),
        }
    }

    /// Append a population
    pub fn with_population(mut self, population: Population) -> Self {
        self.populations.push(population);
        self
    }

    /// Visit every leaf element across all populations
    pub fn for_each_element<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a DataElement),
    {
        for population in &self.populations {
            population.criteria.for_each_element(f);
        }
    }

    /// Visit every leaf element across all populations, mutably
    pub fn for_each_element_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut DataElement),
    {
        for population in &mut self.populations {
            population.criteria.for_each_element_mut(f);
        }
    }

    /// All leaf elements across all populations, in tree order
    pub fn elements(&self) -> Vec<&DataElement> {
        let mut out = Vec::new();
        self.for_each_element(&mut |el| out.push(el));
        out
    }

    /// Number of leaf elements across all populations
    pub fn element_count(&self) -> usize {
        let mut count = 0;
        self.for_each_element(&mut |_| count += 1);
        count
    }

    /// Find a leaf element by id across all populations
    pub fn find_element(&self, element_id: &str) -> Option<&DataElement> {
        self.populations
            .iter()
            .find_map(|p| p.criteria.find_element(element_id))
    }

    /// Find a leaf element by id across all populations, mutably
    pub fn find_element_mut(&mut self, element_id: &str) -> Option<&mut DataElement> {
        self.populations
            .iter_mut()
            .find_map(|p| p.criteria.find_element_mut(element_id))
    }

    /// Whether any element links to the given component
    pub fn references_component(&self, component_id: &str) -> bool {
        let mut found = false;
        self.for_each_element(&mut |el| {
            found |= el.library_component_id.as_deref() == Some(component_id);
        });
        found
    }

    /// Distinct component ids linked from this measure, in tree order
    pub fn linked_component_ids(&self) -> IndexSet<ComponentId> {
        let mut ids = IndexSet::new();
        self.for_each_element(&mut |el| {
            if let Some(id) = &el.library_component_id {
                ids.insert(id.clone());
            }
        });
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::CriteriaNode;
    use octofhir_measure_types::{LogicalOperator, ResourceType};

    fn sample_measure() -> Measure {
        let numerator_tree = LogicalClause::new("num-root", LogicalOperator::And)
            .with_element(
                DataElement::new("el-hba1c", ResourceType::Observation, "HbA1c result")
                    .with_component("comp-hba1c"),
            )
            .with_clause(
                LogicalClause::new("num-or", LogicalOperator::Or)
                    .with_element(DataElement::new(
                        "el-visit",
                        ResourceType::Encounter,
                        "Office visit",
                    ))
                    .with_element(
                        DataElement::new("el-tele", ResourceType::Encounter, "Telehealth visit")
                            .with_component("comp-visit"),
                    ),
            );
        let denominator_tree = LogicalClause::new("den-root", LogicalOperator::And).with_element(
            DataElement::new("el-diabetes", ResourceType::Condition, "Diabetes diagnosis")
                .with_component("comp-hba1c"),
        );

        Measure::new("m-1", "Diabetes: HbA1c Poor Control")
            .with_population(Population::new(
                "pop-den",
                PopulationKind::Denominator,
                denominator_tree,
            ))
            .with_population(Population::new(
                "pop-num",
                PopulationKind::Numerator,
                numerator_tree,
            ))
    }

    #[test]
    fn test_elements_span_populations() {
        let measure = sample_measure();
        assert_eq!(measure.element_count(), 4);
        let ids: Vec<_> = measure.elements().iter().map(|el| el.id.clone()).collect();
        assert_eq!(ids, vec!["el-diabetes", "el-hba1c", "el-visit", "el-tele"]);
    }

    #[test]
    fn test_linked_component_ids_distinct() {
        let measure = sample_measure();
        let linked = measure.linked_component_ids();
        assert_eq!(linked.len(), 2);
        assert!(linked.contains("comp-hba1c"));
        assert!(linked.contains("comp-visit"));
        assert!(measure.references_component("comp-hba1c"));
        assert!(!measure.references_component("comp-gone"));
    }

    #[test]
    fn test_find_element_mut_across_populations() {
        let mut measure = sample_measure();
        let element = measure.find_element_mut("el-tele").unwrap();
        element.library_component_id = None;
        assert!(!measure.references_component("comp-visit"));
    }

    #[test]
    fn test_serde_round_trip() {
        let measure = sample_measure();
        let json = serde_json::to_string_pretty(&measure).unwrap();
        let back: Measure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, measure);
        assert!(matches!(
            back.populations[1].criteria.children[1],
            CriteriaNode::Clause(_)
        ));
    }
}
