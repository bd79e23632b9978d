//! Criteria tree interior nodes and the tree fold

use crate::element::DataElement;
use octofhir_measure_types::LogicalOperator;
use serde::{Deserialize, Serialize};

/// Per-pair operator override between two adjacent siblings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingConnection {
    /// Id of the left sibling
    pub left_id: String,
    /// Id of the right sibling
    pub right_id: String,
    /// Operator joining the pair, overriding the clause operator
    pub operator: LogicalOperator,
}

/// A criteria tree node: an interior clause or a leaf element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "camelCase")]
pub enum CriteriaNode {
    /// Interior node combining children with a logical operator
    Clause(LogicalClause),
    /// Leaf criterion
    Element(DataElement),
}

impl CriteriaNode {
    /// Id of the underlying clause or element
    pub fn id(&self) -> &str {
        match self {
            Self::Clause(clause) => &clause.id,
            Self::Element(element) => &element.id,
        }
    }
}

/// A criteria tree interior node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalClause {
    /// Clause id, unique within its measure
    pub id: String,
    /// Operator joining the children
    pub operator: LogicalOperator,
    /// Child nodes, in authored order
    #[serde(default)]
    pub children: Vec<CriteriaNode>,
    /// Per-pair operator overrides between adjacent children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sibling_connections: Vec<SiblingConnection>,
}

impl LogicalClause {
    /// Create an empty clause
    pub fn new(id: impl Into<String>, operator: LogicalOperator) -> Self {
        Self {
            id: id.into(),
            operator,
            children: Vec::new(),
            sibling_connections: Vec::new(),
        }
    }

    /// Append a child node
    pub fn with_child(mut self, child: CriteriaNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append a leaf element
    pub fn with_element(self, element: DataElement) -> Self {
        self.with_child(CriteriaNode::Element(element))
    }

    /// Append a nested clause
    pub fn with_clause(self, clause: LogicalClause) -> Self {
        self.with_child(CriteriaNode::Clause(clause))
    }

    /// Visit every leaf element in depth-first authored order
    pub fn for_each_element<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a DataElement),
    {
        for child in &self.children {
            match child {
                CriteriaNode::Clause(clause) => clause.for_each_element(f),
                CriteriaNode::Element(element) => f(element),
            }
        }
    }

    /// Visit every leaf element mutably in depth-first authored order
    pub fn for_each_element_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut DataElement),
    {
        for child in &mut self.children {
            match child {
                CriteriaNode::Clause(clause) => clause.for_each_element_mut(f),
                CriteriaNode::Element(element) => f(element),
            }
        }
    }

    /// Number of leaf elements in this subtree
    pub fn element_count(&self) -> usize {
        let mut count = 0;
        self.for_each_element(&mut |_| count += 1);
        count
    }

    /// Find a leaf element by id
    pub fn find_element(&self, element_id: &str) -> Option<&DataElement> {
        for child in &self.children {
            match child {
                CriteriaNode::Clause(clause) => {
                    if let Some(found) = clause.find_element(element_id) {
                        return Some(found);
                    }
                }
                CriteriaNode::Element(element) if element.id == element_id => {
                    return Some(element);
                }
                CriteriaNode::Element(_) => {}
            }
        }
        None
    }

    /// Find a leaf element by id, mutably
    pub fn find_element_mut(&mut self, element_id: &str) -> Option<&mut DataElement> {
        for child in &mut self.children {
            match child {
                CriteriaNode::Clause(clause) => {
                    if let Some(found) = clause.find_element_mut(element_id) {
                        return Some(found);
                    }
                }
                CriteriaNode::Element(element) if element.id == element_id => {
                    return Some(element);
                }
                CriteriaNode::Element(_) => {}
            }
        }
        None
    }

    /// Remove a leaf element by id, returning it
    ///
    /// Sibling connections mentioning the removed element are dropped from
    /// its parent clause.
    pub fn remove_element(&mut self, element_id: &str) -> Option<DataElement> {
        let position = self.children.iter().position(
            |child| matches!(child, CriteriaNode::Element(element) if element.id == element_id),
        );
        if let Some(position) = position {
            self.sibling_connections
                .retain(|conn| conn.left_id != element_id && conn.right_id != element_id);
            if let CriteriaNode::Element(element) = self.children.remove(position) {
                return Some(element);
            }
        }
        for child in &mut self.children {
            if let CriteriaNode::Clause(clause) = child {
                if let Some(removed) = clause.remove_element(element_id) {
                    return Some(removed);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_measure_types::ResourceType;

    fn element(id: &str) -> DataElement {
        DataElement::new(id, ResourceType::Condition, format!("criterion {id}"))
    }

    fn nested_tree() -> LogicalClause {
        LogicalClause::new("root", LogicalOperator::And)
            .with_element(element("a"))
            .with_clause(
                LogicalClause::new("inner", LogicalOperator::Or)
                    .with_element(element("b"))
                    .with_element(element("c")),
            )
            .with_element(element("d"))
    }

    #[test]
    fn test_fold_visits_every_leaf_once() {
        let tree = nested_tree();
        let mut visited = Vec::new();
        tree.for_each_element(&mut |el| visited.push(el.id.clone()));
        assert_eq!(visited, vec!["a", "b", "c", "d"]);
        assert_eq!(tree.element_count(), 4);
    }

    #[test]
    fn test_fold_mut_reaches_nested_leaves() {
        let mut tree = nested_tree();
        tree.for_each_element_mut(&mut |el| el.negation = true);
        let mut all_negated = true;
        tree.for_each_element(&mut |el| all_negated &= el.negation);
        assert!(all_negated);
    }

    #[test]
    fn test_find_element_in_nested_clause() {
        let mut tree = nested_tree();
        assert!(tree.find_element("c").is_some());
        assert!(tree.find_element("missing").is_none());

        let found = tree.find_element_mut("b").unwrap();
        found.description = "rewritten".into();
        assert_eq!(tree.find_element("b").unwrap().description, "rewritten");
    }

    #[test]
    fn test_remove_element_cleans_connections() {
        let mut tree = nested_tree();
        tree.sibling_connections.push(SiblingConnection {
            left_id: "a".into(),
            right_id: "inner".into(),
            operator: LogicalOperator::Or,
        });

        let removed = tree.remove_element("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(tree.sibling_connections.is_empty());
        assert_eq!(tree.element_count(), 3);

        // removal descends into nested clauses too
        assert!(tree.remove_element("c").is_some());
        assert_eq!(tree.element_count(), 2);
        assert!(tree.remove_element("c").is_none());
    }

    #[test]
    fn test_serde_node_tag() {
        let tree = nested_tree();
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.contains("\"nodeType\":\"clause\""));
        assert!(json.contains("\"nodeType\":\"element\""));

        let back: LogicalClause = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
