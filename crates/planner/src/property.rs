//! Property and property-path resolution against the entity graph.

use crate::error::FilterError;
use crate::query::ast::common::TableRef;
use crate::query::ast::expr::{Attribute, Expr};
use crate::query::ast::relation::Relation;
use crate::query::transform::{prefix, rebind_table, replace};
use model::{Association, AssociationKind, DeclaredAttribute, EntityType, PropertyType, Schema};
use std::sync::OnceLock;

/// Where a property's column comes from.
#[derive(Debug, Clone)]
enum AttributeSource {
    /// A column on the owning entity's own table.
    Column(String),
    /// The primary key of the named association's target, reached via the
    /// association join (association-as-property).
    AssociationKey(String),
    /// An explicitly declared column behind a chain of associations.
    Declared {
        associations: Vec<String>,
        column: String,
    },
}

/// A named, typed reference to a column of an entity or of an associated
/// entity. The attribute is resolved lazily on first use and cached on
/// success only, so a failing resolution propagates and can be retried.
#[derive(Debug)]
pub struct Property {
    /// Owning entity name.
    pub model: String,
    pub name: String,
    pub ty: PropertyType,
    source: AttributeSource,
    cache: OnceLock<Attribute>,
}

impl Property {
    fn new(entity: &EntityType, name: &str, ty: PropertyType, source: AttributeSource) -> Self {
        Property {
            model: entity.name.clone(),
            name: name.to_string(),
            ty,
            source,
            cache: OnceLock::new(),
        }
    }

    /// Resolve the property to a bound column and its join requirement.
    pub fn attribute(&self, schema: &Schema) -> Result<Attribute, FilterError> {
        if let Some(attr) = self.cache.get() {
            return Ok(attr.clone());
        }
        let attr = self.resolve(schema)?;
        let _ = self.cache.set(attr.clone());
        Ok(attr)
    }

    fn resolve(&self, schema: &Schema) -> Result<Attribute, FilterError> {
        let entity = schema
            .entity(&self.model)
            .ok_or_else(|| FilterError::UnknownEntity(self.model.clone()))?;
        match &self.source {
            AttributeSource::Column(column) => Ok(Attribute::column_ref(
                TableRef::new(&entity.table),
                column,
            )),
            AttributeSource::AssociationKey(name) => {
                let (relation, table, target) =
                    association_relation(schema, entity, std::slice::from_ref(name))?;
                let column = target.primary_key.clone();
                Ok(Attribute {
                    relation,
                    table,
                    column,
                })
            }
            AttributeSource::Declared {
                associations,
                column,
            } => {
                let (relation, table, _) = association_relation(schema, entity, associations)?;
                Ok(Attribute {
                    relation,
                    table,
                    column: column.clone(),
                })
            }
        }
    }
}

/// Resolve `name` on `entity`: explicitly declared properties win, then
/// direct fields, then associations (typed by the target entity, filtering
/// on its primary key). `None` when nothing matches.
pub fn property_named(entity: &EntityType, name: &str) -> Option<Property> {
    if let Some(declared) = entity.declared_property_named(name) {
        let source = match &declared.attribute {
            DeclaredAttribute::Column(column) => AttributeSource::Column(column.clone()),
            DeclaredAttribute::JoinedColumn {
                associations,
                column,
            } => AttributeSource::Declared {
                associations: associations.clone(),
                column: column.clone(),
            },
        };
        return Some(Property::new(entity, name, declared.ty.clone(), source));
    }
    if let Some(field) = entity.field_named(name) {
        return Some(Property::new(
            entity,
            name,
            PropertyType::Scalar(field.ty),
            AttributeSource::Column(name.to_string()),
        ));
    }
    if let Some(assoc) = entity.association_named(name) {
        return Some(Property::new(
            entity,
            name,
            PropertyType::Entity(assoc.target.clone()),
            AttributeSource::AssociationKey(name.to_string()),
        ));
    }
    None
}

/// Build the left-outer join chain for a sequence of association names
/// starting at `entity`. Returns the relation, the table the chain lands
/// on, and the target entity.
pub fn association_relation<'a>(
    schema: &'a Schema,
    entity: &'a EntityType,
    segments: &[String],
) -> Result<(Relation, TableRef, &'a EntityType), FilterError> {
    let mut current = entity;
    let mut relation = Relation::table(&entity.table);
    let mut table = TableRef::new(&entity.table);
    for segment in segments {
        let assoc = current.association_named(segment).ok_or_else(|| {
            FilterError::UnknownProperty {
                model: current.name.clone(),
                property: segment.clone(),
            }
        })?;
        (relation, table, current) = apply_association(schema, current, assoc, relation)?;
    }
    Ok((relation, table, current))
}

fn column(table: &TableRef, name: &str) -> Expr {
    Expr::attribute(Attribute::column_ref(table.clone(), name))
}

fn apply_association<'a>(
    schema: &'a Schema,
    owner: &'a EntityType,
    assoc: &Association,
    relation: Relation,
) -> Result<(Relation, TableRef, &'a EntityType), FilterError> {
    let target = schema
        .entity(&assoc.target)
        .ok_or_else(|| FilterError::UnknownEntity(assoc.target.clone()))?;
    let owner_table = TableRef::new(&owner.table);
    let target_table = TableRef::new(&target.table);

    match &assoc.kind {
        AssociationKind::Through { through, source } => {
            let through_assoc = owner.association_named(through).ok_or_else(|| {
                FilterError::UnknownProperty {
                    model: owner.name.clone(),
                    property: through.clone(),
                }
            })?;
            let (relation, _, mid) = apply_association(schema, owner, through_assoc, relation)?;
            let source_assoc = mid.association_named(source).ok_or_else(|| {
                FilterError::UnknownProperty {
                    model: mid.name.clone(),
                    property: source.clone(),
                }
            })?;
            apply_association(schema, mid, source_assoc, relation)
        }
        AssociationKind::BelongsTo {
            foreign_key,
            target_key,
            polymorphic,
        } => {
            if *polymorphic {
                return Err(FilterError::PolymorphicAssociation(assoc.name.clone()));
            }
            let target_key = target_key.as_deref().unwrap_or(&target.primary_key);
            let on = Expr::eq(
                column(&owner_table, foreign_key),
                column(&target_table, target_key),
            );
            Ok((
                relation.outer_join(target_table.clone(), on),
                target_table,
                target,
            ))
        }
        AssociationKind::Has {
            foreign_key,
            source_key,
            polymorphic_as,
        } => {
            let source_key = source_key.as_deref().unwrap_or(&owner.primary_key);
            let mut on = Expr::eq(
                column(&owner_table, source_key),
                column(&target_table, foreign_key),
            );
            if let Some(scope) = polymorphic_as {
                // Discriminator keeps rows of other owning entities out.
                on = Expr::and(
                    on,
                    Expr::eq(
                        column(&target_table, &format!("{scope}_type")),
                        Expr::Value(model::Value::String(owner.name.clone())),
                    ),
                );
            }
            Ok((
                relation.outer_join(target_table.clone(), on),
                target_table,
                target,
            ))
        }
        AssociationKind::ManyToMany {
            join_table,
            foreign_key,
            association_foreign_key,
        } => {
            let join_ref = TableRef::new(join_table);
            let hop = Expr::eq(
                column(&owner_table, &owner.primary_key),
                column(&join_ref, foreign_key),
            );
            let land = Expr::eq(
                column(&join_ref, association_foreign_key),
                column(&target_table, &target.primary_key),
            );
            let relation = relation
                .outer_join(join_ref, hop)
                .outer_join(target_table.clone(), land);
            Ok((relation, target_table, target))
        }
    }
}

/// A chain of properties realizing a dotted cross-association reference.
#[derive(Debug)]
pub struct PropertyPath {
    /// Root entity name.
    pub model: String,
    pub name: String,
    pub path: Vec<Property>,
    cache: OnceLock<Attribute>,
}

impl PropertyPath {
    pub fn new(
        schema: &Schema,
        entity: &EntityType,
        segments: &[String],
    ) -> Result<Self, FilterError> {
        if segments.is_empty() {
            return Err(FilterError::MalformedPayload(
                "empty property path".to_string(),
            ));
        }
        let mut path = Vec::with_capacity(segments.len());
        let mut current: Option<&EntityType> = Some(entity);
        let mut current_name = entity.name.clone();
        for (i, segment) in segments.iter().enumerate() {
            let Some(model) = current else {
                // A scalar property cannot be traversed further.
                return Err(FilterError::UnknownProperty {
                    model: current_name,
                    property: segment.clone(),
                });
            };
            let property = property_named(model, segment).ok_or_else(|| {
                FilterError::UnknownProperty {
                    model: model.name.clone(),
                    property: segment.clone(),
                }
            })?;
            match &property.ty {
                PropertyType::Entity(name) => {
                    current = schema.entity(name);
                    if current.is_none() && i + 1 < segments.len() {
                        return Err(FilterError::UnknownEntity(name.clone()));
                    }
                    current_name = name.clone();
                }
                PropertyType::Scalar(ty) => {
                    current = None;
                    current_name = ty.name().to_string();
                }
            }
            path.push(property);
        }
        Ok(PropertyPath {
            model: entity.name.clone(),
            name: segments.join("_"),
            path,
        cache: OnceLock::new(),
        })
    }

    fn last(&self) -> &Property {
        self.path.last().expect("property path is never empty")
    }

    /// The path's value type: its last property's type.
    pub fn ty(&self) -> &PropertyType {
        &self.last().ty
    }

    /// Resolve the path to a bound column plus the aliased join requirement
    /// covering every traversed association. Cached on first success.
    pub fn attribute(&self, schema: &Schema) -> Result<Attribute, FilterError> {
        if let Some(attr) = self.cache.get() {
            return Ok(attr.clone());
        }
        let attr = self.resolve_attribute(schema)?;
        let _ = self.cache.set(attr.clone());
        Ok(attr)
    }

    fn resolve_attribute(&self, schema: &Schema) -> Result<Attribute, FilterError> {
        let root = schema
            .entity(&self.model)
            .ok_or_else(|| FilterError::UnknownEntity(self.model.clone()))?;
        let mut acc = Relation::table(&root.table);
        // Names of join-traversing segments so far; their concatenation
        // scopes every table the path pulls in, so the same association
        // name used from two different contexts cannot collide.
        let mut alias_segments: Vec<&str> = Vec::new();
        // Rename log of the most recent aliasing pass. Each pass re-walks
        // the whole accumulated tree and records every joined table it
        // visits, so the log is complete on its own; carrying entries over
        // from earlier passes would rebind condition references that
        // legitimately point at the unaliased root when a joined table
        // shares the root's table name.
        let mut renames: Vec<TableRef> = Vec::new();
        let mut bound_table = TableRef::new(&root.table);
        let mut bound_column = root.primary_key.clone();

        let count = self.path.len();
        for (i, property) in self.path.iter().enumerate() {
            let attr = property.attribute(schema)?;
            let mut rel = attr.relation.clone();
            if rel.is_join() {
                alias_segments.push(&property.name);
            }
            bound_table = attr.table.clone();
            bound_column = attr.column.clone();

            if i + 1 < count {
                if let PropertyType::Entity(target_name) = &property.ty {
                    let target = schema
                        .entity(target_name)
                        .ok_or_else(|| FilterError::UnknownEntity(target_name.clone()))?;
                    // Foreign-key hop: when the property's column is not
                    // already the target's primary key, join the target so
                    // the next segment has a table to resolve against.
                    if !(bound_table.table == target.table && bound_column == target.primary_key) {
                        let target_table = TableRef::new(&target.table);
                        let on = Expr::eq(
                            column(&bound_table, &bound_column),
                            column(&target_table, &target.primary_key),
                        );
                        rel = rel.outer_join(target_table.clone(), on);
                        bound_table = target_table;
                        bound_column = target.primary_key.clone();
                    }
                }
            }

            // Graft onto what the previous segments built by substituting
            // this property's own base table.
            let owner = schema
                .entity(&property.model)
                .ok_or_else(|| FilterError::UnknownEntity(property.model.clone()))?;
            rel = replace(&rel, &Relation::table(&owner.table), &acc);
            if !alias_segments.is_empty() {
                let scope = alias_segments.join("_");
                renames.clear();
                rel = prefix(&rel, &scope, &mut renames);
            }
            acc = rel;
        }

        Ok(Attribute {
            relation: acc,
            table: rebind_table(&bound_table, &renames),
            column: bound_column,
        })
    }
}
