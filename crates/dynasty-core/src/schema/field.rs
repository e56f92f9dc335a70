use super::{DataType, EntityDescriptor, WeakDescriptor, ID_PROPERTY, VERSION_PROPERTY};
use crate::stmt::Value;

/// One field of an entity descriptor.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Name used to get and set the value on records
    pub property_name: String,

    /// Physical column name. Only meaningful for fields that
    /// [`materialize`](Self::is_column) a column.
    pub column_name: String,

    /// For child collections this is the type of the child identity.
    pub data_type: DataType,

    pub length: Option<u32>,

    pub precision: Option<u32>,

    pub scale: Option<u32>,

    pub nullable: bool,

    /// Value written for new rows and used to backfill existing rows when the
    /// column is added to a live table.
    pub default_value: Option<Value>,

    pub kind: FieldKind,

    pub generation: GenerationMode,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Plain,

    /// Stores the identity of a row in `target`'s table.
    ForeignKey { target: EntityDescriptor },

    /// Stores the identity of another row in the owning descriptor's table.
    SelfReferenceForeignKey,

    /// Read-only value of `property` on the row referenced by the foreign
    /// key field `key` of the same descriptor.
    ListOnly { key: String, property: String },

    /// Rows of `target` whose `back_reference` foreign key points at the
    /// owning row. Owned: they are written, replaced and deleted with it.
    ChildCollection {
        target: WeakDescriptor,
        back_reference: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Participates in physical column synthesis
    #[default]
    Generation,

    /// Descriptive only
    InfoOnly,
}

impl FieldDescriptor {
    /// Returns `true` if the field is backed by a column of the entity's
    /// table.
    pub fn is_column(&self) -> bool {
        self.generation == GenerationMode::Generation
            && matches!(
                self.kind,
                FieldKind::Plain | FieldKind::ForeignKey { .. } | FieldKind::SelfReferenceForeignKey
            )
    }

    pub fn is_identity(&self) -> bool {
        self.property_name == ID_PROPERTY
    }

    pub fn is_version(&self) -> bool {
        self.property_name == VERSION_PROPERTY
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::ForeignKey { .. } | FieldKind::SelfReferenceForeignKey
        )
    }

    pub fn is_list_only(&self) -> bool {
        matches!(self.kind, FieldKind::ListOnly { .. })
    }

    pub fn is_child_collection(&self) -> bool {
        matches!(self.kind, FieldKind::ChildCollection { .. })
    }

    /// Structural equality, comparing referenced descriptors by name.
    pub(crate) fn same_shape(&self, other: &FieldDescriptor) -> bool {
        let kind_eq = match (&self.kind, &other.kind) {
            (FieldKind::Plain, FieldKind::Plain) => true,
            (FieldKind::SelfReferenceForeignKey, FieldKind::SelfReferenceForeignKey) => true,
            (FieldKind::ForeignKey { target: a }, FieldKind::ForeignKey { target: b }) => {
                a.qualified_name() == b.qualified_name()
            }
            (
                FieldKind::ListOnly {
                    key: ak,
                    property: ap,
                },
                FieldKind::ListOnly {
                    key: bk,
                    property: bp,
                },
            ) => ak == bk && ap == bp,
            (
                FieldKind::ChildCollection {
                    target: at,
                    back_reference: ab,
                },
                FieldKind::ChildCollection {
                    target: bt,
                    back_reference: bb,
                },
            ) => at.qualified_name() == bt.qualified_name() && ab == bb,
            _ => false,
        };

        kind_eq
            && self.property_name == other.property_name
            && self.column_name.eq_ignore_ascii_case(&other.column_name)
            && self.data_type == other.data_type
            && self.length == other.length
            && self.precision == other.precision
            && self.scale == other.scale
            && self.nullable == other.nullable
            && self.default_value == other.default_value
            && self.generation == other.generation
    }
}
