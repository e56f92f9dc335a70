use super::{entity_type::PropertyKind, EntityType};

use dynasty_core::{stmt::Value, Error, Result};
use std::fmt;

/// An instance of a synthesized [`EntityType`].
///
/// Values live in a vector indexed by the type's property table. Child
/// collections are held separately, one list per child collection property.
#[derive(Clone)]
pub struct Record {
    ty: EntityType,
    values: Vec<Value>,
    children: Vec<Vec<Record>>,
}

impl Record {
    pub(crate) fn new(ty: EntityType, values: Vec<Value>) -> Record {
        let children = vec![vec![]; ty.child_slots()];
        Record {
            ty,
            values,
            children,
        }
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.ty
    }

    pub fn get(&self, property: &str) -> Result<&Value> {
        let index = self.ty.property_index_or_err(property)?;
        if let PropertyKind::Children { .. } = self.ty.properties()[index].kind {
            return Err(self.not_a_value(property));
        }
        Ok(&self.values[index])
    }

    /// Writes `value`, converting it to the property's type. Integer and
    /// decimal widenings are accepted; anything lossy is rejected.
    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let index = self.ty.property_index_or_err(property)?;
        let target = &self.ty.properties()[index];

        match target.kind {
            PropertyKind::ListOnly { .. } => {
                return Err(Error::read_only_property(
                    self.ty.qualified_name(),
                    property,
                ))
            }
            PropertyKind::Children { .. } => return Err(self.not_a_value(property)),
            _ => {}
        }

        self.values[index] = value.into().cast(target.ty())?;
        Ok(self)
    }

    /// The identity assigned when the record was created, if any.
    pub fn id(&self) -> Option<i64> {
        self.values[self.ty.id_index()].as_i64()
    }

    /// The optimistic-lock version, for managed types.
    pub fn version_no(&self) -> Option<i64> {
        self.ty
            .version_no_index()
            .and_then(|index| self.values[index].as_i64())
    }

    pub fn children(&self, property: &str) -> Result<&[Record]> {
        let slot = self.child_slot(property)?;
        Ok(&self.children[slot])
    }

    pub fn set_children(&mut self, property: &str, children: Vec<Record>) -> Result<&mut Self> {
        let slot = self.child_slot(property)?;
        let element = self.ty.child_type(property)?;
        for child in &children {
            self.check_child(property, &element, child)?;
        }
        self.children[slot] = children;
        Ok(self)
    }

    pub fn push_child(&mut self, property: &str, child: Record) -> Result<&mut Self> {
        let slot = self.child_slot(property)?;
        let element = self.ty.child_type(property)?;
        self.check_child(property, &element, &child)?;
        self.children[slot].push(child);
        Ok(self)
    }

    pub(crate) fn value_at(&self, index: usize) -> &Value {
        &self.values[index]
    }

    /// Stores a value read from the database without conversion.
    pub(crate) fn load(&mut self, index: usize, value: Value) {
        self.values[index] = value;
    }

    pub(crate) fn children_at_mut(&mut self, slot: usize) -> &mut Vec<Record> {
        &mut self.children[slot]
    }

    fn child_slot(&self, property: &str) -> Result<usize> {
        let index = self.ty.property_index_or_err(property)?;
        match self.ty.properties()[index].kind {
            PropertyKind::Children { slot, .. } => Ok(slot),
            _ => Err(Error::invalid_field(
                self.ty.qualified_name(),
                format!("`{property}` is not a child collection"),
            )),
        }
    }

    fn check_child(&self, property: &str, element: &EntityType, child: &Record) -> Result<()> {
        if child.ty == *element {
            Ok(())
        } else {
            Err(Error::invalid_field(
                self.ty.qualified_name(),
                format!(
                    "`{property}` holds `{}` records, not `{}`",
                    element.qualified_name(),
                    child.ty.qualified_name()
                ),
            ))
        }
    }

    fn not_a_value(&self, property: &str) -> Error {
        Error::invalid_field(
            self.ty.qualified_name(),
            format!("`{property}` is a child collection"),
        )
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (property, value) in self.ty.properties().iter().zip(&self.values) {
            match &property.kind {
                PropertyKind::Children { slot, .. } => {
                    map.entry(&property.name(), &self.children[*slot]);
                }
                _ => {
                    map.entry(&property.name(), value);
                }
            }
        }
        map.finish()
    }
}
