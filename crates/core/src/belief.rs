//! Belief Model
//!
//! Structured representation of a creative prompt: the entities the prompt
//! implies, their attributes with ranked candidate values, and the
//! relationships between them. Produced wholesale by a structure-analysis
//! call; entities may additionally be appended locally (user-added) without
//! a remote round trip.
//!
//! Invariant: every entity carries an `existence` attribute whose ranked
//! values are `"true"` / `"false"`. Setting it to `"false"` during a
//! refinement instructs the remote service to remove the entity from the
//! narrative entirely.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Name of the attribute every entity must carry.
pub const EXISTENCE_ATTRIBUTE: &str = "existence";

/// A named attribute with a ranked list of candidate values.
///
/// The first value is the currently preferred one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// The mandatory existence attribute, defaulting to present.
    pub fn existence() -> Self {
        Self::new(
            EXISTENCE_ATTRIBUTE,
            vec!["true".to_string(), "false".to_string()],
        )
    }

    /// The currently preferred (top-ranked) value, if any.
    pub fn preferred(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// An entity recognized in (or added to) the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    /// Whether the entity is explicitly named in the prompt text, as
    /// opposed to inferred by the analysis.
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub description: String,
    /// Ranked alternative names.
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Entity {
    /// Create an entity carrying the mandatory existence attribute.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            explicit: false,
            description: String::new(),
            alternatives: Vec::new(),
            attributes: vec![Attribute::existence()],
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Insert or replace an attribute's ranked values.
    pub fn set_attribute(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.values = values,
            None => self.attributes.push(Attribute::new(name, values)),
        }
    }

    /// Restore the existence invariant after deserializing remote output.
    fn ensure_existence(&mut self) {
        if self.attribute(EXISTENCE_ATTRIBUTE).is_none() {
            self.attributes.push(Attribute::existence());
        }
    }
}

/// A labeled, directed relationship between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub label: String,
    /// Ranked alternative labels.
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl Relationship {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.into(),
            alternatives: Vec::new(),
        }
    }
}

/// The structured belief model for one analyzed prompt.
///
/// Replaced wholesale by each successful, still-current analysis; never
/// partially merged by the orchestration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefModel {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl BeliefModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a locally created entity (user-added, no remote call).
    pub fn add_entity(&mut self, mut entity: Entity) {
        entity.ensure_existence();
        self.entities.push(entity);
    }

    /// Append a locally created entity, rejecting duplicate names.
    pub fn try_add_entity(&mut self, entity: Entity) -> CoreResult<()> {
        if self.contains_entity(&entity.name) {
            return Err(CoreError::validation(format!(
                "entity already exists: {}",
                entity.name
            )));
        }
        self.add_entity(entity);
        Ok(())
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn contains_entity(&self, name: &str) -> bool {
        self.entity(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    /// Restore the existence invariant on every entity. Applied once to
    /// each model received from the remote analysis before publishing.
    pub fn normalize(&mut self) {
        for entity in &mut self.entities {
            entity.ensure_existence();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_carries_existence() {
        let entity = Entity::new("Dog");
        let attr = entity.attribute(EXISTENCE_ATTRIBUTE).unwrap();
        assert_eq!(attr.values, vec!["true", "false"]);
        assert_eq!(attr.preferred(), Some("true"));
    }

    #[test]
    fn test_set_attribute_replaces_and_appends() {
        let mut entity = Entity::new("Dog");
        entity.set_attribute("color", vec!["brown".into(), "black".into()]);
        assert_eq!(entity.attribute("color").unwrap().preferred(), Some("brown"));

        entity.set_attribute("color", vec!["black".into()]);
        assert_eq!(entity.attribute("color").unwrap().values, vec!["black"]);
    }

    #[test]
    fn test_normalize_restores_existence() {
        // Simulates a remote payload that omitted the existence attribute.
        let mut model: BeliefModel = serde_json::from_str(
            r#"{"entities":[{"name":"Dog","attributes":[{"name":"color","values":["brown"]}]}]}"#,
        )
        .unwrap();
        assert!(model.entities[0].attribute(EXISTENCE_ATTRIBUTE).is_none());

        model.normalize();
        assert!(model.entities[0].attribute(EXISTENCE_ATTRIBUTE).is_some());
    }

    #[test]
    fn test_try_add_entity_rejects_duplicates() {
        let mut model = BeliefModel::new();
        model.try_add_entity(Entity::new("Moon")).unwrap();
        let err = model.try_add_entity(Entity::new("Moon")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(model.entities.len(), 1);
    }

    #[test]
    fn test_add_local_entity() {
        let mut model = BeliefModel::new();
        model.add_entity(Entity::new("Moon").with_description("a full moon"));
        assert!(model.contains_entity("Moon"));
        assert!(model
            .entity("Moon")
            .unwrap()
            .attribute(EXISTENCE_ATTRIBUTE)
            .is_some());
    }
}
