use crate::core::data_type::{PropertyType, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A plain column of an entity's table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: ValueType,
}

/// How an association reaches its target entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AssociationKind {
    /// The owning side holds the foreign key (`relationships.company_id`).
    BelongsTo {
        foreign_key: String,
        /// Key on the target; defaults to the target's primary key.
        target_key: Option<String>,
        polymorphic: bool,
    },
    /// The target holds the foreign key; covers has-one and has-many.
    Has {
        foreign_key: String,
        /// Key on the owning side; defaults to the primary key.
        source_key: Option<String>,
        /// Polymorphic scope name: join on `{as}_id` with a `{as}_type`
        /// discriminator equal to the owning entity's name.
        polymorphic_as: Option<String>,
    },
    /// Has-many-through: the `through` association on this entity followed
    /// by the `source` association on the through target.
    Through { through: String, source: String },
    /// Many-to-many over an unmapped join table.
    ManyToMany {
        join_table: String,
        foreign_key: String,
        association_foreign_key: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Association {
    pub name: String,
    /// Target entity name.
    pub target: String,
    pub kind: AssociationKind,
}

/// Where an explicitly declared property's column lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DeclaredAttribute {
    /// A column on the entity's own table.
    Column(String),
    /// A column reached through a chain of named associations.
    JoinedColumn {
        associations: Vec<String>,
        column: String,
    },
}

/// An explicitly declared property. Declared properties take precedence over
/// field- and association-derived ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeclaredProperty {
    pub name: String,
    pub ty: PropertyType,
    pub attribute: DeclaredAttribute,
}

/// Filterable entity metadata: table, primary key, fields and association
/// edges. Immutable once handed to the planner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityType {
    pub name: String,
    pub table: String,
    pub primary_key: String,
    pub fields: Vec<Field>,
    pub associations: Vec<Association>,
    pub properties: Vec<DeclaredProperty>,
}

impl EntityType {
    pub fn new(name: &str, table: &str) -> Self {
        EntityType {
            name: name.to_string(),
            table: table.to_string(),
            primary_key: "id".to_string(),
            fields: Vec::new(),
            associations: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn primary_key(mut self, key: &str) -> Self {
        self.primary_key = key.to_string();
        self
    }

    pub fn field(mut self, name: &str, ty: ValueType) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            ty,
        });
        self
    }

    pub fn belongs_to(mut self, name: &str, target: &str, foreign_key: &str) -> Self {
        self.associations.push(Association {
            name: name.to_string(),
            target: target.to_string(),
            kind: AssociationKind::BelongsTo {
                foreign_key: foreign_key.to_string(),
                target_key: None,
                polymorphic: false,
            },
        });
        self
    }

    pub fn belongs_to_polymorphic(mut self, name: &str, target: &str, foreign_key: &str) -> Self {
        self.associations.push(Association {
            name: name.to_string(),
            target: target.to_string(),
            kind: AssociationKind::BelongsTo {
                foreign_key: foreign_key.to_string(),
                target_key: None,
                polymorphic: true,
            },
        });
        self
    }

    pub fn has_many(mut self, name: &str, target: &str, foreign_key: &str) -> Self {
        self.associations.push(Association {
            name: name.to_string(),
            target: target.to_string(),
            kind: AssociationKind::Has {
                foreign_key: foreign_key.to_string(),
                source_key: None,
                polymorphic_as: None,
            },
        });
        self
    }

    pub fn has_many_as(mut self, name: &str, target: &str, scope: &str) -> Self {
        self.associations.push(Association {
            name: name.to_string(),
            target: target.to_string(),
            kind: AssociationKind::Has {
                foreign_key: format!("{scope}_id"),
                source_key: None,
                polymorphic_as: Some(scope.to_string()),
            },
        });
        self
    }

    pub fn has_many_through(mut self, name: &str, target: &str, through: &str, source: &str) -> Self {
        self.associations.push(Association {
            name: name.to_string(),
            target: target.to_string(),
            kind: AssociationKind::Through {
                through: through.to_string(),
                source: source.to_string(),
            },
        });
        self
    }

    pub fn many_to_many(
        mut self,
        name: &str,
        target: &str,
        join_table: &str,
        foreign_key: &str,
        association_foreign_key: &str,
    ) -> Self {
        self.associations.push(Association {
            name: name.to_string(),
            target: target.to_string(),
            kind: AssociationKind::ManyToMany {
                join_table: join_table.to_string(),
                foreign_key: foreign_key.to_string(),
                association_foreign_key: association_foreign_key.to_string(),
            },
        });
        self
    }

    pub fn property(mut self, name: &str, ty: PropertyType, attribute: DeclaredAttribute) -> Self {
        self.properties.push(DeclaredProperty {
            name: name.to_string(),
            ty,
            attribute,
        });
        self
    }

    pub fn field_named(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn association_named(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }

    pub fn declared_property_named(&self, name: &str) -> Option<&DeclaredProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// The metadata provider: every filterable entity, by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    entities: HashMap<String, EntityType>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    pub fn add(&mut self, entity: EntityType) {
        self.entities.insert(entity.name.clone(), entity);
    }

    pub fn with(mut self, entity: EntityType) -> Self {
        self.add(entity);
        self
    }

    pub fn entity(&self, name: &str) -> Option<&EntityType> {
        self.entities.get(name)
    }
}
