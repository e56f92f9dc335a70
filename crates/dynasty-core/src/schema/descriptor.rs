use super::{FieldDescriptor, FieldKind};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::{
    fmt,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, OnceLock, Weak,
    },
};

/// Runtime description of one record shape and its physical binding.
///
/// A descriptor is a cheap handle. Its identity is fixed when its builder is
/// created; its contents are filled in exactly once, by
/// [`DescriptorBuilder::finalize_resolution`](super::DescriptorBuilder::finalize_resolution).
/// Until then every read of the contents fails with an unresolved descriptor
/// error.
#[derive(Clone)]
pub struct EntityDescriptor {
    inner: Arc<DescriptorInner>,
}

/// A non-owning reference to a descriptor, used by child collections so a
/// parent and its children do not keep each other alive.
#[derive(Clone)]
pub struct WeakDescriptor {
    inner: Weak<DescriptorInner>,
    qualified_name: Arc<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagementMode {
    /// The table is defined elsewhere; the engine only reads and writes rows.
    Adhoc,

    /// The engine creates and extends the table.
    Managed,
}

/// A named group of properties backed by an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub properties: Vec<String>,
    pub unique: bool,
}

/// The contents of a finalized descriptor.
#[derive(Debug)]
pub struct Resolved {
    pub(crate) table_name: String,
    pub(crate) version: u32,
    pub(crate) base: Option<EntityDescriptor>,
    pub(crate) fields: IndexMap<String, FieldDescriptor>,
    pub(crate) indices: Vec<IndexSpec>,
}

struct DescriptorInner {
    qualified_name: Arc<str>,
    management: ManagementMode,
    state: AtomicU8,
    resolved: OnceLock<Resolved>,
}

const BUILDING: u8 = 0;
const PREFETCHED: u8 = 1;
const ABANDONED: u8 = 2;

impl EntityDescriptor {
    pub(crate) fn new(qualified_name: String, management: ManagementMode) -> Self {
        Self {
            inner: Arc::new(DescriptorInner {
                qualified_name: qualified_name.into(),
                management,
                state: AtomicU8::new(BUILDING),
                resolved: OnceLock::new(),
            }),
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.inner.qualified_name
    }

    pub fn management_mode(&self) -> ManagementMode {
        self.inner.management
    }

    pub fn is_managed(&self) -> bool {
        self.inner.management == ManagementMode::Managed
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.get().is_some()
    }

    /// A prefetched stub whose builder may still finalize it.
    pub(crate) fn is_pending(&self) -> bool {
        !self.is_resolved() && self.inner.state.load(Ordering::Acquire) == PREFETCHED
    }

    pub(crate) fn mark_prefetched(&self) {
        let _ = self.inner.state.compare_exchange(
            BUILDING,
            PREFETCHED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub(crate) fn mark_abandoned(&self) {
        self.inner.state.store(ABANDONED, Ordering::Release);
    }

    pub(crate) fn fill(&self, resolved: Resolved) -> Result<()> {
        self.inner
            .resolved
            .set(resolved)
            .map_err(|_| Error::already_finalized(self.qualified_name()))
    }

    /// The finalized contents of this descriptor.
    pub fn resolved(&self) -> Result<&Resolved> {
        self.inner
            .resolved
            .get()
            .ok_or_else(|| Error::unresolved_descriptor(self.qualified_name(), ""))
    }

    pub fn table_name(&self) -> Result<&str> {
        Ok(&self.resolved()?.table_name)
    }

    pub fn version(&self) -> Result<u32> {
        Ok(self.resolved()?.version)
    }

    pub fn base(&self) -> Result<Option<&EntityDescriptor>> {
        Ok(self.resolved()?.base.as_ref())
    }

    pub fn fields(&self) -> Result<impl ExactSizeIterator<Item = &FieldDescriptor> + '_> {
        Ok(self.resolved()?.fields())
    }

    pub fn field(&self, property: &str) -> Result<Option<&FieldDescriptor>> {
        Ok(self.resolved()?.field(property))
    }

    pub fn indices(&self) -> Result<&[IndexSpec]> {
        Ok(&self.resolved()?.indices)
    }

    /// The descriptor a reference field of this descriptor points at.
    ///
    /// Self references resolve to `self`. List-only fields resolve through
    /// their key field.
    pub fn reference_target(&self, field: &FieldDescriptor) -> Result<EntityDescriptor> {
        match &field.kind {
            FieldKind::ForeignKey { target } => Ok(target.clone()),
            FieldKind::SelfReferenceForeignKey => Ok(self.clone()),
            FieldKind::ChildCollection { target, .. } => target.upgrade(),
            FieldKind::ListOnly { key, .. } => match self.field(key)? {
                Some(key_field) if key_field.is_foreign_key() => self.reference_target(key_field),
                _ => Err(Error::invalid_field(
                    self.qualified_name(),
                    format!(
                        "list-only field `{}` has no foreign key `{}`",
                        field.property_name, key
                    ),
                )),
            },
            FieldKind::Plain => Err(Error::invalid_field(
                self.qualified_name(),
                format!("`{}` is not a reference field", field.property_name),
            )),
        }
    }

    /// Structural equality of two finalized descriptors.
    pub fn same_shape(&self, other: &EntityDescriptor) -> Result<bool> {
        let a = self.resolved()?;
        let b = other.resolved()?;

        Ok(self.qualified_name() == other.qualified_name()
            && self.management_mode() == other.management_mode()
            && a.version == b.version
            && a.table_name.eq_ignore_ascii_case(&b.table_name)
            && a.base.as_ref().map(|d| d.qualified_name())
                == b.base.as_ref().map(|d| d.qualified_name())
            && a.indices == b.indices
            && a.fields.len() == b.fields.len()
            && a.fields()
                .zip(b.fields())
                .all(|(fa, fb)| fa.same_shape(fb)))
    }

    pub fn downgrade(&self) -> WeakDescriptor {
        WeakDescriptor {
            inner: Arc::downgrade(&self.inner),
            qualified_name: self.inner.qualified_name.clone(),
        }
    }

    pub fn ptr_eq(&self, other: &EntityDescriptor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Resolved {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = &FieldDescriptor> + '_ {
        self.fields.values()
    }

    pub fn field(&self, property: &str) -> Option<&FieldDescriptor> {
        self.fields.get(property)
    }

    pub fn field_index(&self, property: &str) -> Option<usize> {
        self.fields.get_index_of(property)
    }

    pub fn columns(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.fields().filter(|field| field.is_column())
    }
}

impl WeakDescriptor {
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn upgrade(&self) -> Result<EntityDescriptor> {
        self.inner
            .upgrade()
            .map(|inner| EntityDescriptor { inner })
            .ok_or_else(|| Error::dangling_reference("<child collection>", &self.qualified_name))
    }
}

impl PartialEq for EntityDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityDescriptor {}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("EntityDescriptor");
        s.field("qualified_name", &self.qualified_name());
        match self.inner.resolved.get() {
            Some(resolved) => s
                .field("table_name", &resolved.table_name)
                .field("version", &resolved.version)
                .field("fields", &resolved.fields.keys().collect::<Vec<_>>())
                .finish(),
            None => s.field("resolved", &false).finish(),
        }
    }
}

impl fmt::Debug for WeakDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakDescriptor")
            .field(&self.qualified_name)
            .finish()
    }
}
