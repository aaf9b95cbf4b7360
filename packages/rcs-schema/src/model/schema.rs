//! Schema, its declarations and the builder that assembles it.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ModelError;
use crate::model::field::{
    is_identifier, is_reserved, is_reserved_type_name, FieldSet, FieldSetKind,
};
use crate::model::types::{Primitive, TypeInfo, ARRAY_SUFFIX, ENUM_SIZE, STRING_TYPE};

/// Suffixes of the items generated next to each resource's marker type.
pub const GENERATED_SUFFIXES: &[&str] = &["Builder", "View", "Loader"];

/// Whether a resource has received its field block yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    /// Named ahead of its definition
    Declared,
    /// Field block parsed
    Complete,
}

/// A binary record type with a length header and fixed field slots.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    name: String,
    #[serde(skip)]
    state: ResourceState,
    fields: FieldSet,
}

impl Resource {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == ResourceState::Complete
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }
}

/// A flat value type declared with `data`.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeType {
    name: String,
    fields: FieldSet,
}

impl CompositeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn size(&self) -> u32 {
        self.fields.size()
    }
}

/// An enumeration stored as a 32-bit unsigned integer.
#[derive(Debug, Clone, Serialize)]
pub struct EnumType {
    name: String,
    values: Vec<String>,
}

impl EnumType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enumerators in declaration order; each one's value is its index.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn value_of(&self, enumerator: &str) -> Option<u32> {
        self.values
            .iter()
            .position(|v| v == enumerator)
            .map(|i| i as u32)
    }
}

/// What a resolved type is, for code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Builtin(Primitive),
    Enum,
    Data,
    String,
    Resource,
    Array,
}

/// A closed set of declarations read from one schema file.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    name: String,
    resources: Vec<Resource>,
    #[serde(rename = "data")]
    composites: Vec<CompositeType>,
    enums: Vec<EnumType>,
    /// User-defined type names: resources, data and enums
    #[serde(skip)]
    types: HashMap<String, TypeInfo>,
}

impl Schema {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            composites: Vec::new(),
            enums: Vec::new(),
            types: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resources in declaration order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn composites(&self) -> &[CompositeType] {
        &self.composites
    }

    pub fn enums(&self) -> &[EnumType] {
        &self.enums
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn composite(&self, name: &str) -> Option<&CompositeType> {
        self.composites.iter().find(|c| c.name == name)
    }

    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn is_resource(&self, name: &str) -> bool {
        self.resource(name).is_some()
    }

    /// Returns `true` if `name` names any type, built-in or declared.
    pub fn is_type(&self, name: &str) -> bool {
        Primitive::from_name(name).is_some() || name == STRING_TYPE || self.types.contains_key(name)
    }

    /// Resolves a type name as written in a field declaration.
    ///
    /// `Base[]` resolves to an array of `Base`; arrays of arrays are
    /// rejected.
    pub fn type_info(&self, type_name: &str) -> Result<TypeInfo, ModelError> {
        if let Some(base) = type_name.strip_suffix(ARRAY_SUFFIX) {
            if base.ends_with(ARRAY_SUFFIX) {
                return Err(ModelError::NestedArray {
                    type_name: type_name.to_string(),
                });
            }
            return Ok(TypeInfo::array_of(self.type_info(base)?));
        }

        if let Some(primitive) = Primitive::from_name(type_name) {
            return Ok(TypeInfo::primitive(primitive));
        }
        if type_name == STRING_TYPE {
            return Ok(TypeInfo::string());
        }
        self.types
            .get(type_name)
            .cloned()
            .ok_or_else(|| ModelError::UndefinedType {
                type_name: type_name.to_string(),
            })
    }

    /// Classifies a resolved type.
    pub fn kind_of(&self, ty: &TypeInfo) -> TypeKind {
        if ty.is_array() {
            TypeKind::Array
        } else if ty.is_string() {
            TypeKind::String
        } else if ty.is_resource() {
            TypeKind::Resource
        } else if let Some(primitive) = Primitive::from_name(&ty.name) {
            TypeKind::Builtin(primitive)
        } else if self.enum_type(&ty.name).is_some() {
            TypeKind::Enum
        } else {
            TypeKind::Data
        }
    }

    /// Like [`Schema::is_type`], but a resource that is only declared does
    /// not count until it is defined.
    fn is_defined_type(&self, name: &str) -> bool {
        if Primitive::from_name(name).is_some() || name == STRING_TYPE {
            return true;
        }
        match self.types.get(name) {
            Some(info) if info.is_resource() => {
                self.resource(name).is_some_and(Resource::is_complete)
            }
            Some(_) => true,
            None => false,
        }
    }

    fn check_new_type_name(&self, name: &str) -> Result<(), ModelError> {
        if !is_identifier(name) {
            return Err(ModelError::InvalidIdentifier {
                name: name.to_string(),
            });
        }
        if is_reserved_type_name(name) {
            return Err(ModelError::ReservedName {
                owner: self.name.clone(),
                name: name.to_string(),
            });
        }
        if self.is_defined_type(name) {
            return Err(ModelError::DuplicateType {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Rejects `name` if it equals the builder, view or loader generated
    /// for a defined resource, or, for a resource, if one of its own
    /// generated names is already taken.
    fn check_generated_names(&self, name: &str, is_resource: bool) -> Result<(), ModelError> {
        for suffix in GENERATED_SUFFIXES {
            if let Some(owner) = name.strip_suffix(suffix) {
                if self.resource(owner).is_some_and(Resource::is_complete) {
                    return Err(ModelError::GeneratedNameClash {
                        name: name.to_string(),
                        resource: owner.to_string(),
                    });
                }
            }
            if is_resource {
                let generated = format!("{name}{suffix}");
                if self.is_defined_type(&generated) {
                    return Err(ModelError::GeneratedNameClash {
                        name: generated,
                        resource: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// An open schema being assembled one declaration at a time.
///
/// [`SchemaBuilder::finish`] closes it into an immutable [`Schema`]. A
/// builder whose declarations failed is simply dropped, so no partial
/// schema ever escapes.
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Schema::new(name),
        }
    }

    /// The declarations made so far, for type lookups.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Names a resource ahead of its definition so fields can refer to it.
    ///
    /// Declaring an already declared resource is a no-op. A declared name
    /// only conflicts with other types once the resource is defined.
    pub fn declare_resource(&mut self, name: &str) -> Result<(), ModelError> {
        if self.schema.is_resource(name) {
            return Ok(());
        }
        self.schema.check_new_type_name(name)?;

        tracing::debug!("Declared resource '{}'", name);
        self.schema.resources.push(Resource {
            name: name.to_string(),
            state: ResourceState::Declared,
            fields: FieldSet::new(name, FieldSetKind::Resource),
        });
        self.schema
            .types
            .insert(name.to_string(), TypeInfo::resource(name));
        Ok(())
    }

    /// Gives a resource its fields. The resource is named by the field
    /// set's owner.
    pub fn define_resource(&mut self, fields: FieldSet) -> Result<(), ModelError> {
        let name = fields.owner().to_string();
        self.declare_resource(&name)?;
        if self.schema.is_defined_type(&name) {
            return Err(ModelError::DuplicateType { name });
        }
        self.schema.check_generated_names(&name, true)?;

        let Some(resource) = self.schema.resources.iter_mut().find(|r| r.name == name) else {
            return Err(ModelError::UndefinedResource { name });
        };

        tracing::debug!(
            "Defined resource '{}' ({} fields, {} bytes)",
            name,
            fields.len(),
            fields.size()
        );
        resource.fields = fields;
        resource.state = ResourceState::Complete;
        Ok(())
    }

    /// Defines a flat `data` type. Reference fields are rejected.
    pub fn define_data(&mut self, fields: FieldSet) -> Result<(), ModelError> {
        let name = fields.owner().to_string();
        self.schema.check_new_type_name(&name)?;
        self.schema.check_generated_names(&name, false)?;

        if let Some(field) = fields.iter().find(|f| f.ty.is_reference()) {
            return Err(ModelError::ReferenceInData {
                owner: name,
                field: field.name.clone(),
                type_name: field.ty.name.clone(),
            });
        }

        tracing::debug!("Defined data type '{}' ({} bytes)", name, fields.size());
        self.schema
            .types
            .insert(name.clone(), TypeInfo::value(name.as_str(), fields.size()));
        self.schema.composites.push(CompositeType { name, fields });
        Ok(())
    }

    /// Defines an enum; enumerators take the values 0, 1, 2, ...
    pub fn define_enum(&mut self, name: &str, values: Vec<String>) -> Result<(), ModelError> {
        self.schema.check_new_type_name(name)?;
        self.schema.check_generated_names(name, false)?;

        if values.is_empty() {
            return Err(ModelError::EmptyEnum {
                name: name.to_string(),
            });
        }
        for (i, value) in values.iter().enumerate() {
            if !is_identifier(value) {
                return Err(ModelError::InvalidIdentifier {
                    name: value.clone(),
                });
            }
            if is_reserved(value) {
                return Err(ModelError::ReservedName {
                    owner: name.to_string(),
                    name: value.clone(),
                });
            }
            if values[..i].contains(value) {
                return Err(ModelError::DuplicateEnumerator {
                    name: name.to_string(),
                    value: value.clone(),
                });
            }
        }

        tracing::debug!("Defined enum '{}' ({} values)", name, values.len());
        self.schema
            .types
            .insert(name.to_string(), TypeInfo::value(name, ENUM_SIZE));
        self.schema.enums.push(EnumType {
            name: name.to_string(),
            values,
        });
        Ok(())
    }

    /// Closes the schema. Fails if a declared resource was never defined.
    pub fn finish(self) -> Result<Schema, ModelError> {
        if let Some(resource) = self.schema.resources.iter().find(|r| !r.is_complete()) {
            return Err(ModelError::UndefinedResource {
                name: resource.name.clone(),
            });
        }
        Ok(self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(
        builder: &SchemaBuilder,
        owner: &str,
        kind: FieldSetKind,
        decls: &[(&str, &str)],
    ) -> FieldSet {
        let mut set = FieldSet::new(owner, kind);
        for (ty, name) in decls {
            set.add(builder.schema(), name, ty).unwrap();
        }
        set
    }

    #[test]
    fn resolves_builtin_and_declared_types() {
        let mut builder = SchemaBuilder::new("test");
        builder.define_enum("Stage", vec!["Vertex".into(), "Pixel".into()]).unwrap();
        let vec3 = fields(
            &builder,
            "Vector3",
            FieldSetKind::Data,
            &[("float32", "x"), ("float32", "y"), ("float32", "z")],
        );
        builder.define_data(vec3).unwrap();
        builder.declare_resource("Shader").unwrap();

        let schema = builder.schema();
        assert_eq!(schema.type_info("Vector3").unwrap().size, 12);
        assert_eq!(schema.type_info("Stage").unwrap().size, 4);
        assert!(schema.type_info("Shader").unwrap().is_resource());
        assert!(schema.type_info("string[]").unwrap().is_array());
        assert_eq!(
            schema.kind_of(&schema.type_info("Stage").unwrap()),
            TypeKind::Enum
        );
        assert_eq!(
            schema.kind_of(&schema.type_info("Vector3").unwrap()),
            TypeKind::Data
        );
        assert!(matches!(
            schema.type_info("float32[][]"),
            Err(ModelError::NestedArray { .. })
        ));
        assert!(matches!(
            schema.type_info("Matrix"),
            Err(ModelError::UndefinedType { .. })
        ));
    }

    #[test]
    fn type_names_are_unique_across_tables() {
        let mut builder = SchemaBuilder::new("test");
        builder.define_enum("Kind", vec!["A".into()]).unwrap();
        assert_eq!(
            builder.declare_resource("Kind"),
            Err(ModelError::DuplicateType { name: "Kind".into() })
        );
        assert!(builder.define_enum("uint32", vec!["A".into()]).is_err());
        assert!(builder
            .define_data(FieldSet::new("string", FieldSetKind::Data))
            .is_err());
        assert!(matches!(
            builder.declare_resource("Self"),
            Err(ModelError::ReservedName { .. })
        ));
    }

    #[test]
    fn rust_primitive_names_are_reserved() {
        let mut builder = SchemaBuilder::new("test");
        for name in ["u32", "str", "bool", "usize"] {
            assert!(matches!(
                builder.define_enum(name, vec!["A".into()]),
                Err(ModelError::ReservedName { .. })
            ));
        }
        // Prelude names are emitted fully qualified, so they stay usable
        builder.define_enum("Default", vec!["A".into()]).unwrap();
        builder
            .define_resource(FieldSet::new("Ok", FieldSetKind::Resource))
            .unwrap();
    }

    #[test]
    fn declared_resource_clashes_where_defined() {
        let mut builder = SchemaBuilder::new("test");
        builder.declare_resource("Kind").unwrap();
        builder.define_enum("Kind", vec!["A".into()]).unwrap();
        assert_eq!(
            builder.define_resource(FieldSet::new("Kind", FieldSetKind::Resource)),
            Err(ModelError::DuplicateType { name: "Kind".into() })
        );
    }

    #[test]
    fn generated_names_cannot_be_taken() {
        let mut builder = SchemaBuilder::new("test");
        builder
            .define_resource(FieldSet::new("Mesh", FieldSetKind::Resource))
            .unwrap();
        assert_eq!(
            builder.define_data(FieldSet::new("MeshView", FieldSetKind::Data)),
            Err(ModelError::GeneratedNameClash {
                name: "MeshView".into(),
                resource: "Mesh".into(),
            })
        );
        assert!(matches!(
            builder.define_enum("MeshLoader", vec!["A".into()]),
            Err(ModelError::GeneratedNameClash { .. })
        ));

        builder.define_enum("ShapeBuilder", vec!["A".into()]).unwrap();
        assert_eq!(
            builder.define_resource(FieldSet::new("Shape", FieldSetKind::Resource)),
            Err(ModelError::GeneratedNameClash {
                name: "ShapeBuilder".into(),
                resource: "Shape".into(),
            })
        );
        // Suffix alone is an ordinary name
        builder
            .define_resource(FieldSet::new("View", FieldSetKind::Resource))
            .unwrap();
    }

    #[test]
    fn resource_defined_twice_is_rejected() {
        let mut builder = SchemaBuilder::new("test");
        builder
            .define_resource(FieldSet::new("Mesh", FieldSetKind::Resource))
            .unwrap();
        assert_eq!(
            builder.define_resource(FieldSet::new("Mesh", FieldSetKind::Resource)),
            Err(ModelError::DuplicateType { name: "Mesh".into() })
        );
    }

    #[test]
    fn forward_declared_resource_must_be_defined() {
        let mut builder = SchemaBuilder::new("test");
        builder.declare_resource("Later").unwrap();
        let set = fields(&builder, "Now", FieldSetKind::Resource, &[("Later", "next")]);
        builder.define_resource(set).unwrap();
        assert_eq!(
            builder.finish().unwrap_err(),
            ModelError::UndefinedResource { name: "Later".into() }
        );
    }

    #[test]
    fn enum_checks() {
        let mut builder = SchemaBuilder::new("test");
        assert!(matches!(
            builder.define_enum("Empty", vec![]),
            Err(ModelError::EmptyEnum { .. })
        ));
        assert!(matches!(
            builder.define_enum("Twice", vec!["A".into(), "B".into(), "A".into()]),
            Err(ModelError::DuplicateEnumerator { .. })
        ));
        builder.define_enum("Ok", vec!["A".into(), "B".into()]).unwrap();
        let schema = builder.finish().unwrap();
        assert_eq!(schema.enum_type("Ok").unwrap().value_of("B"), Some(1));
    }

    #[test]
    fn data_type_with_reference_is_rejected() {
        let mut builder = SchemaBuilder::new("test");
        // Built as a resource field set, so the string is accepted here
        let set = fields(&builder, "Named", FieldSetKind::Resource, &[("string", "name")]);
        assert!(matches!(
            builder.define_data(set),
            Err(ModelError::ReferenceInData { .. })
        ));
        assert!(builder.schema().composite("Named").is_none());
    }
}
