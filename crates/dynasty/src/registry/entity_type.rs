use super::Record;

use dynasty_core::{
    schema::{EntityDescriptor, FieldKind, ID_PROPERTY, VERSION_PROPERTY},
    stmt::{self, Value},
    Error, Result,
};
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, OnceLock, Weak},
};

/// A record type synthesized from a finalized [`EntityDescriptor`].
///
/// Cloning is cheap and every clone is the same type: equality is identity.
/// Property lookups by name go through a table built once at synthesis.
#[derive(Clone)]
pub struct EntityType {
    inner: Arc<TypeInner>,
}

pub(crate) struct TypeInner {
    descriptor: EntityDescriptor,
    properties: Vec<Property>,
    by_name: HashMap<String, usize>,
    id: usize,
    version_no: Option<usize>,
    child_slots: usize,
}

/// One named slot of a synthesized type.
#[derive(Debug)]
pub struct Property {
    name: String,
    ty: stmt::Type,
    scale: Option<u32>,
    nullable: bool,
    default: Option<Value>,
    pub(crate) kind: PropertyKind,
}

#[derive(Debug)]
pub(crate) enum PropertyKind {
    /// Stored in a column of the type's table.
    Column { column: String },

    /// Kept on the record only.
    Transient,

    /// Read through the foreign key in slot `key` from `column` of the
    /// referenced table.
    ListOnly {
        key: usize,
        target: EntityDescriptor,
        column: String,
    },

    /// Owned child records, found through their `back_reference` property.
    Children {
        slot: usize,
        target: String,
        back_reference: String,
        link: OnceLock<Weak<TypeInner>>,
    },
}

impl EntityType {
    /// Builds the property table for `descriptor`. Child collection links are
    /// left empty; the registry fills them once every sibling exists.
    pub(crate) fn synthesize(descriptor: &EntityDescriptor) -> Result<EntityType> {
        let resolved = descriptor.resolved()?;
        let entity = descriptor.qualified_name();

        let mut properties = Vec::with_capacity(resolved.fields().len());
        let mut by_name = HashMap::with_capacity(resolved.fields().len());
        let mut child_slots = 0;

        for (index, field) in resolved.fields().enumerate() {
            let kind = match &field.kind {
                FieldKind::ChildCollection {
                    target,
                    back_reference,
                } => {
                    let slot = child_slots;
                    child_slots += 1;
                    PropertyKind::Children {
                        slot,
                        target: target.qualified_name().to_string(),
                        back_reference: back_reference.clone(),
                        link: OnceLock::new(),
                    }
                }
                FieldKind::ListOnly { key, property } => {
                    let target = descriptor.reference_target(field)?;

                    let key = match (resolved.field(key), resolved.field_index(key)) {
                        (Some(key_field), Some(index)) if key_field.is_column() => index,
                        _ => {
                            return Err(Error::invalid_field(
                                entity,
                                format!(
                                    "list-only field `{}` needs a stored foreign key `{key}`",
                                    field.property_name
                                ),
                            ))
                        }
                    };

                    let column = match target.field(property)? {
                        Some(source) if source.is_column() => source.column_name.clone(),
                        _ => {
                            return Err(Error::invalid_field(
                                entity,
                                format!(
                                    "list-only field `{}` reads `{property}`, which is not stored by `{}`",
                                    field.property_name,
                                    target.qualified_name()
                                ),
                            ))
                        }
                    };

                    PropertyKind::ListOnly {
                        key,
                        target,
                        column,
                    }
                }
                _ if field.is_column() => PropertyKind::Column {
                    column: field.column_name.clone(),
                },
                _ => PropertyKind::Transient,
            };

            by_name.insert(field.property_name.clone(), index);
            properties.push(Property {
                name: field.property_name.clone(),
                ty: field.data_type.ty(),
                scale: field.scale,
                nullable: field.nullable,
                default: field.default_value.clone(),
                kind,
            });
        }

        let id = by_name
            .get(ID_PROPERTY)
            .copied()
            .ok_or_else(|| Error::invalid_field(entity, "descriptor has no identity field"))?;

        Ok(EntityType {
            inner: Arc::new(TypeInner {
                descriptor: descriptor.clone(),
                version_no: by_name.get(VERSION_PROPERTY).copied(),
                properties,
                by_name,
                id,
                child_slots,
            }),
        })
    }

    /// Points child collection properties at their element types.
    ///
    /// `lookup` resolves a qualified name to a type known to the caller.
    pub(crate) fn link(&self, lookup: impl Fn(&str) -> Option<EntityType>) -> Result<()> {
        for property in &self.inner.properties {
            if let PropertyKind::Children { target, link, .. } = &property.kind {
                let ty = if target == self.qualified_name() {
                    self.clone()
                } else {
                    lookup(target).ok_or_else(|| {
                        Error::dangling_reference(self.qualified_name(), target)
                    })?
                };
                let _ = link.set(Arc::downgrade(&ty.inner));
            }
        }
        Ok(())
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.inner.descriptor
    }

    pub fn qualified_name(&self) -> &str {
        self.inner.descriptor.qualified_name()
    }

    pub fn version(&self) -> u32 {
        // Synthesis only accepts finalized descriptors.
        self.inner.descriptor.version().unwrap_or_default()
    }

    pub fn table_name(&self) -> &str {
        self.inner.descriptor.table_name().unwrap_or_default()
    }

    pub fn properties(&self) -> &[Property] {
        &self.inner.properties
    }

    /// Position of `name` in the property table.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.inner.by_name.get(name).copied()
    }

    pub(crate) fn property_index_or_err(&self, name: &str) -> Result<usize> {
        self.property_index(name)
            .ok_or_else(|| Error::unknown_property(self.qualified_name(), name))
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.property_index(name)
            .map(|index| &self.inner.properties[index])
    }

    pub(crate) fn id_index(&self) -> usize {
        self.inner.id
    }

    pub(crate) fn version_no_index(&self) -> Option<usize> {
        self.inner.version_no
    }

    pub(crate) fn child_slots(&self) -> usize {
        self.inner.child_slots
    }

    /// The element type of the child collection `property`.
    pub fn child_type(&self, property: &str) -> Result<EntityType> {
        match &self.inner.properties[self.property_index_or_err(property)?].kind {
            PropertyKind::Children { target, link, .. } => link
                .get()
                .and_then(Weak::upgrade)
                .map(|inner| EntityType { inner })
                .ok_or_else(|| Error::dangling_reference(self.qualified_name(), target)),
            _ => Err(Error::invalid_field(
                self.qualified_name(),
                format!("`{property}` is not a child collection"),
            )),
        }
    }

    /// A fresh record with every declared default applied.
    pub fn new_record(&self) -> Record {
        let values = self
            .inner
            .properties
            .iter()
            .map(|property| property.default.clone().unwrap_or_default())
            .collect();
        Record::new(self.clone(), values)
    }

    pub fn ptr_eq(&self, other: &EntityType) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether this type was synthesized from a descriptor with the same
    /// shape as `descriptor`.
    pub(crate) fn matches(&self, descriptor: &EntityDescriptor) -> Result<bool> {
        self.inner.descriptor.same_shape(descriptor)
    }
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> stmt::Type {
        self.ty
    }

    pub fn scale(&self) -> Option<u32> {
        self.scale
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The column backing this property in its own table, if any.
    pub fn column(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::Column { column } => Some(column),
            _ => None,
        }
    }

    pub fn is_list_only(&self) -> bool {
        matches!(self.kind, PropertyKind::ListOnly { .. })
    }

    pub fn is_child_collection(&self) -> bool {
        matches!(self.kind, PropertyKind::Children { .. })
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityType {}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.qualified_name())
            .field("version", &self.version())
            .field(
                "properties",
                &self
                    .inner
                    .properties
                    .iter()
                    .map(|property| property.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
