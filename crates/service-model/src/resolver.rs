//! Named shape resolver for service models

use indexmap::IndexMap;

use crate::error::{ModelError, ModelResult};
use crate::types::{Member, RawShape, RawShapeRef, Shape};

/// Resolves shape references into self-contained [`Shape`] trees
pub struct ShapeResolver<'a> {
    /// Named shapes from the model
    shapes: &'a IndexMap<String, RawShape>,
    /// Maximum nesting depth before a shape is left unresolved
    max_depth: usize,
}

impl<'a> ShapeResolver<'a> {
    pub fn new(shapes: &'a IndexMap<String, RawShape>) -> Self {
        Self {
            shapes,
            max_depth: 10,
        }
    }

    /// Resolve a named shape
    pub fn resolve(&self, name: &str) -> ModelResult<Shape> {
        self.resolve_with_depth(name, 0)
    }

    /// Resolve the members of a named structure shape
    pub fn resolve_members(&self, name: &str) -> ModelResult<Vec<Member>> {
        match self.resolve(name)? {
            Shape::Structure { members } => Ok(members),
            other => Err(ModelError::InvalidFormat(format!(
                "shape {} is a {}, expected a structure",
                name,
                other.type_name()
            ))),
        }
    }

    fn resolve_with_depth(&self, name: &str, depth: usize) -> ModelResult<Shape> {
        if depth > self.max_depth {
            return Ok(Shape::Unresolved);
        }

        let raw = self.lookup(name)?;

        let shape = match raw.shape_type.as_str() {
            "string" => Shape::String {
                enum_values: raw.enum_values.clone(),
            },
            "integer" => Shape::Integer,
            "long" => Shape::Long,
            "float" => Shape::Float,
            "double" => Shape::Double,
            "boolean" => Shape::Boolean,
            "timestamp" => Shape::Timestamp,
            "blob" => Shape::Blob,
            "list" => {
                let member_ref = raw.member.as_ref().ok_or_else(|| {
                    ModelError::InvalidFormat(format!("list shape {} has no member", name))
                })?;
                Shape::List {
                    member: Box::new(self.resolve_with_depth(&member_ref.shape, depth + 1)?),
                    member_name: member_ref
                        .location_name
                        .clone()
                        .unwrap_or_else(|| "member".to_string()),
                    flattened: raw.flattened,
                }
            }
            "map" => {
                let (key_ref, value_ref) = raw.key.as_ref().zip(raw.value.as_ref()).ok_or_else(
                    || ModelError::InvalidFormat(format!("map shape {} needs key and value", name)),
                )?;
                Shape::Map {
                    key: Box::new(self.resolve_with_depth(&key_ref.shape, depth + 1)?),
                    value: Box::new(self.resolve_with_depth(&value_ref.shape, depth + 1)?),
                    key_name: key_ref
                        .location_name
                        .clone()
                        .unwrap_or_else(|| "key".to_string()),
                    value_name: value_ref
                        .location_name
                        .clone()
                        .unwrap_or_else(|| "value".to_string()),
                    flattened: raw.flattened,
                }
            }
            "structure" => {
                let mut members = Vec::with_capacity(raw.members.len());
                for (member_name, member_ref) in &raw.members {
                    members.push(self.resolve_member(
                        member_name,
                        member_ref,
                        raw.required.contains(member_name),
                        depth,
                    )?);
                }
                Shape::Structure { members }
            }
            other => {
                return Err(ModelError::InvalidFormat(format!(
                    "shape {} has unsupported type {}",
                    name, other
                )))
            }
        };

        Ok(shape)
    }

    fn resolve_member(
        &self,
        name: &str,
        member_ref: &RawShapeRef,
        required: bool,
        depth: usize,
    ) -> ModelResult<Member> {
        let shape = self.resolve_with_depth(&member_ref.shape, depth + 1)?;

        // Member docs win; fall back to the target shape's own docs
        let documentation = member_ref.documentation.clone().or_else(|| {
            self.shapes
                .get(&member_ref.shape)
                .and_then(|s| s.documentation.clone())
        });

        Ok(Member {
            name: name.to_string(),
            shape,
            required,
            default: member_ref.default.clone(),
            documentation,
            location_name: member_ref.location_name.clone(),
        })
    }

    fn lookup(&self, name: &str) -> ModelResult<&RawShape> {
        self.shapes
            .get(name)
            .ok_or_else(|| ModelError::MissingShape(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawServiceModel;

    fn shapes(json: serde_json::Value) -> IndexMap<String, RawShape> {
        let raw: RawServiceModel = serde_json::from_value(serde_json::json!({
            "metadata": {
                "apiVersion": "2010-03-31",
                "endpointPrefix": "test",
                "protocol": "query",
                "serviceId": "Test"
            },
            "shapes": json
        }))
        .unwrap();
        raw.shapes
    }

    #[test]
    fn test_resolve_structure_members() {
        let shapes = shapes(serde_json::json!({
            "Input": {
                "type": "structure",
                "required": ["Name"],
                "members": {
                    "Name": {"shape": "String", "documentation": "The name."},
                    "Count": {"shape": "Int"}
                }
            },
            "String": {"type": "string"},
            "Int": {"type": "integer", "documentation": "A count."}
        }));

        let resolver = ShapeResolver::new(&shapes);
        let members = resolver.resolve_members("Input").unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "Name");
        assert!(members[0].required);
        assert_eq!(members[0].documentation.as_deref(), Some("The name."));
        assert_eq!(members[1].shape, Shape::Integer);
        assert!(!members[1].required);
        assert_eq!(members[1].documentation.as_deref(), Some("A count."));
    }

    #[test]
    fn test_resolve_map_location_names() {
        let shapes = shapes(serde_json::json!({
            "Attrs": {
                "type": "map",
                "key": {"shape": "String", "locationName": "Name"},
                "value": {"shape": "String", "locationName": "Value"}
            },
            "String": {"type": "string"}
        }));

        let resolver = ShapeResolver::new(&shapes);
        match resolver.resolve("Attrs").unwrap() {
            Shape::Map {
                key_name,
                value_name,
                ..
            } => {
                assert_eq!(key_name, "Name");
                assert_eq!(value_name, "Value");
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_recursive_shape_terminates() {
        let shapes = shapes(serde_json::json!({
            "Node": {
                "type": "structure",
                "members": {"Child": {"shape": "Node"}}
            }
        }));

        let resolver = ShapeResolver::new(&shapes);
        let shape = resolver.resolve("Node").unwrap();

        let mut depth = 0;
        let mut current = &shape;
        while let Shape::Structure { members } = current {
            current = &members[0].shape;
            depth += 1;
        }
        assert_eq!(current, &Shape::Unresolved);
        assert!(depth > 5);
    }

    #[test]
    fn test_resolve_missing_shape() {
        let shapes = shapes(serde_json::json!({
            "Input": {"type": "structure", "members": {"X": {"shape": "Nope"}}}
        }));

        let resolver = ShapeResolver::new(&shapes);
        let err = resolver.resolve("Input").unwrap_err();
        assert!(matches!(err, ModelError::MissingShape(ref s) if s == "Nope"));
    }
}
