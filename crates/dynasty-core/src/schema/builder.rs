use super::{
    DataType, EntityDescriptor, FieldDescriptor, FieldKind, GenerationMode, IndexSpec,
    ManagementMode, Resolved, ID_COLUMN, ID_PROPERTY, VERSION_COLUMN, VERSION_PROPERTY,
};
use crate::{stmt::Value, Error, Result};

use indexmap::IndexMap;
use std_util::str;

/// Two-phase construction of an [`EntityDescriptor`].
///
/// Descriptors that refer to each other are built by calling
/// [`prefetch`](Self::prefetch) on every builder first, using the returned
/// stubs as reference targets while adding fields, and then calling
/// [`finalize_resolution`](Self::finalize_resolution) on each builder. The
/// stubs are filled in place, so every holder observes the finished
/// descriptor.
///
/// ```
/// use dynasty_core::schema::{DataType, DescriptorBuilder, FieldSpec, ManagementMode};
///
/// let mut author = DescriptorBuilder::new("lib.Author", ManagementMode::Managed);
/// let mut book = DescriptorBuilder::new("lib.Book", ManagementMode::Managed);
/// let author_stub = author.prefetch();
/// let book_stub = book.prefetch();
///
/// author
///     .add_field(FieldSpec::new(DataType::String, "name").length(64))?
///     .add_child_list_field("books", &book_stub, "author")?;
/// book
///     .add_field(FieldSpec::new(DataType::String, "title"))?
///     .add_foreign_key_field(FieldSpec::new(DataType::Long, "author"), &author_stub)?
///     .add_list_only_field(FieldSpec::new(DataType::String, "authorName"), "author", "name")?;
///
/// author.finalize_resolution()?;
/// book.finalize_resolution()?;
/// assert!(author_stub.is_resolved() && book_stub.is_resolved());
/// # Ok::<(), dynasty_core::Error>(())
/// ```
#[derive(Debug)]
pub struct DescriptorBuilder {
    handle: EntityDescriptor,
    table_name: Option<String>,
    version: u32,
    base: Option<EntityDescriptor>,
    fields: IndexMap<String, FieldDescriptor>,
    indices: Vec<IndexSpec>,
    finalized: bool,
}

/// Declaration of one field, passed to the builder's `add_*` verbs.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    property_name: String,
    column_name: Option<String>,
    data_type: DataType,
    length: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
    nullable: bool,
    default_value: Option<Value>,
    generation: GenerationMode,
}

impl FieldSpec {
    pub fn new(data_type: DataType, property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            column_name: None,
            data_type,
            length: None,
            precision: None,
            scale: None,
            nullable: false,
            default_value: None,
            generation: GenerationMode::Generation,
        }
    }

    /// Overrides the snake_case column name derived from the property.
    pub fn column(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = Some(column_name.into());
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn info_only(mut self) -> Self {
        self.generation = GenerationMode::InfoOnly;
        self
    }
}

impl DescriptorBuilder {
    pub fn new(qualified_name: impl Into<String>, management: ManagementMode) -> Self {
        Self {
            handle: EntityDescriptor::new(qualified_name.into(), management),
            table_name: None,
            version: 0,
            base: None,
            fields: IndexMap::new(),
            indices: vec![],
            finalized: false,
        }
    }

    /// Returns the descriptor this builder fills, usable as a forward
    /// reference target before any field is declared.
    pub fn prefetch(&mut self) -> EntityDescriptor {
        self.handle.mark_prefetched();
        self.handle.clone()
    }

    pub fn table_name(&mut self, table_name: impl Into<String>) -> &mut Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn version(&mut self, version: u32) -> &mut Self {
        self.version = version;
        self
    }

    /// Makes this descriptor an extension of `base`. The extension shares the
    /// base's table and inherits its fields.
    pub fn extends(&mut self, base: &EntityDescriptor) -> Result<&mut Self> {
        let resolved = base.resolved().map_err(|err| {
            err.context(Error::invalid_field(
                self.name(),
                format!("base `{}` must be finalized first", base.qualified_name()),
            ))
        })?;

        for field in resolved.fields() {
            if self.fields.contains_key(&field.property_name) {
                return Err(Error::duplicate_property(self.name(), &field.property_name));
            }
        }

        self.base = Some(base.clone());
        Ok(self)
    }

    pub fn unique_constraint<I, S>(&mut self, name: impl Into<String>, properties: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_index(name.into(), properties, true);
        self
    }

    pub fn index<I, S>(&mut self, name: impl Into<String>, properties: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_index(name.into(), properties, false);
        self
    }

    pub fn add_field(&mut self, spec: FieldSpec) -> Result<&mut Self> {
        let field = self.field_from_spec(spec, FieldKind::Plain)?;
        self.push_field(field)
    }

    /// Adds a field holding the identity of a row of `target`.
    ///
    /// Passing this builder's own stub declares a self reference.
    pub fn add_foreign_key_field(
        &mut self,
        spec: FieldSpec,
        target: &EntityDescriptor,
    ) -> Result<&mut Self> {
        if target.ptr_eq(&self.handle) {
            return self.add_self_reference_field(spec);
        }

        self.check_target(target)?;
        self.check_key_type(&spec)?;
        let field = self.field_from_spec(
            spec,
            FieldKind::ForeignKey {
                target: target.clone(),
            },
        )?;
        self.push_field(field)
    }

    pub fn add_self_reference_field(&mut self, spec: FieldSpec) -> Result<&mut Self> {
        self.check_key_type(&spec)?;
        let field = self.field_from_spec(spec, FieldKind::SelfReferenceForeignKey)?;
        self.push_field(field)
    }

    /// Adds a read-only field surfacing `property` of the row referenced by
    /// the foreign key field `key`.
    pub fn add_list_only_field(
        &mut self,
        spec: FieldSpec,
        key: &str,
        property: &str,
    ) -> Result<&mut Self> {
        let is_foreign_key = self
            .lookup(key)
            .map(FieldDescriptor::is_foreign_key)
            .unwrap_or(false);

        if !is_foreign_key {
            return Err(Error::invalid_field(
                self.name(),
                format!(
                    "key `{key}` of list-only field `{}` must be a foreign key field",
                    spec.property_name
                ),
            ));
        }

        let mut field = self.field_from_spec(
            spec,
            FieldKind::ListOnly {
                key: key.to_string(),
                property: property.to_string(),
            },
        )?;
        field.generation = GenerationMode::InfoOnly;
        field.nullable = true;
        field.default_value = None;
        self.push_field(field)
    }

    /// Adds an owned one-to-many collection of `target` rows whose
    /// `back_reference` foreign key points at this descriptor's rows.
    pub fn add_child_list_field(
        &mut self,
        property: impl Into<String>,
        target: &EntityDescriptor,
        back_reference: impl Into<String>,
    ) -> Result<&mut Self> {
        self.check_target(target)?;

        let property = property.into();
        let field = FieldDescriptor {
            column_name: str::snake_case(&property),
            property_name: property,
            data_type: DataType::Long,
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            default_value: None,
            kind: FieldKind::ChildCollection {
                target: target.downgrade(),
                back_reference: back_reference.into(),
            },
            generation: GenerationMode::InfoOnly,
        };
        self.push_field(field)
    }

    /// Fills the descriptor handed out by [`prefetch`](Self::prefetch).
    ///
    /// Every reference target must by now be finalized or be a prefetched
    /// stub whose builder is still alive. Fails when called a second time.
    pub fn finalize_resolution(&mut self) -> Result<EntityDescriptor> {
        if self.finalized {
            return Err(Error::already_finalized(self.name()));
        }

        for field in self.fields.values() {
            let target = match &field.kind {
                FieldKind::ForeignKey { target } => target.clone(),
                FieldKind::ChildCollection { target, .. } => target
                    .upgrade()
                    .map_err(|_| Error::dangling_reference(self.name(), target.qualified_name()))?,
                _ => continue,
            };

            if !target.is_resolved() && !target.is_pending() && !target.ptr_eq(&self.handle) {
                return Err(Error::dangling_reference(
                    self.name(),
                    target.qualified_name(),
                ));
            }
        }

        let resolved = self.resolve()?;
        self.handle.fill(resolved)?;
        self.finalized = true;

        tracing::debug!(
            descriptor = self.name(),
            version = self.version,
            "descriptor finalized"
        );

        Ok(self.handle.clone())
    }

    fn resolve(&self) -> Result<Resolved> {
        let mut fields = IndexMap::new();
        let mut indices = vec![];

        let table_name = match &self.base {
            Some(base) => {
                let base = base.resolved()?;
                for field in base.fields() {
                    fields.insert(field.property_name.clone(), field.clone());
                }
                indices.extend(base.indices.iter().cloned());
                base.table_name.clone()
            }
            None => {
                fields.insert(ID_PROPERTY.to_string(), implicit_id());
                if self.handle.is_managed() {
                    fields.insert(VERSION_PROPERTY.to_string(), implicit_version());
                }
                self.table_name.clone().unwrap_or_else(|| {
                    str::pluralize(&str::snake_case(str::last_segment(self.name())))
                })
            }
        };

        for (name, field) in &self.fields {
            fields.insert(name.clone(), field.clone());
        }

        for index in &self.indices {
            for property in &index.properties {
                match fields.get(property) {
                    Some(field) if field.is_column() => {}
                    _ => {
                        return Err(Error::invalid_field(
                            self.name(),
                            format!(
                                "index `{}` names `{property}`, which is not a column property",
                                index.name
                            ),
                        ))
                    }
                }
            }
            indices.push(index.clone());
        }

        Ok(Resolved {
            table_name,
            version: self.version,
            base: self.base.clone(),
            fields,
            indices,
        })
    }

    fn name(&self) -> &str {
        self.handle.qualified_name()
    }

    fn lookup(&self, property: &str) -> Option<&FieldDescriptor> {
        self.fields.get(property).or_else(|| {
            self.base
                .as_ref()
                .and_then(|base| base.resolved().ok())
                .and_then(|base| base.field(property))
        })
    }

    fn check_target(&self, target: &EntityDescriptor) -> Result<()> {
        if target.ptr_eq(&self.handle) || target.is_resolved() || target.is_pending() {
            Ok(())
        } else {
            Err(Error::dangling_reference(
                self.name(),
                target.qualified_name(),
            ))
        }
    }

    fn check_key_type(&self, spec: &FieldSpec) -> Result<()> {
        if spec.data_type.is_integral() {
            Ok(())
        } else {
            Err(Error::invalid_field(
                self.name(),
                format!(
                    "foreign key `{}` must be an integer field, found {:?}",
                    spec.property_name, spec.data_type
                ),
            ))
        }
    }

    fn field_from_spec(&self, spec: FieldSpec, kind: FieldKind) -> Result<FieldDescriptor> {
        if spec.property_name.is_empty() {
            return Err(Error::invalid_field(self.name(), "empty property name"));
        }

        if let (Some(precision), Some(scale)) = (spec.precision, spec.scale) {
            if scale > precision {
                return Err(Error::invalid_field(
                    self.name(),
                    format!(
                        "`{}` has scale {scale} greater than precision {precision}",
                        spec.property_name
                    ),
                ));
            }
        }

        if spec.length == Some(0) {
            return Err(Error::invalid_field(
                self.name(),
                format!("`{}` has zero length", spec.property_name),
            ));
        }

        let default_value = match spec.default_value {
            Some(value) => Some(value.cast(spec.data_type.ty()).map_err(|err| {
                err.context(Error::invalid_field(
                    self.name(),
                    format!("default of `{}`", spec.property_name),
                ))
            })?),
            None => None,
        };

        Ok(FieldDescriptor {
            column_name: spec
                .column_name
                .unwrap_or_else(|| str::snake_case(&spec.property_name)),
            property_name: spec.property_name,
            data_type: spec.data_type,
            length: spec.length,
            precision: spec.precision,
            scale: spec.scale,
            nullable: spec.nullable,
            default_value,
            kind,
            generation: spec.generation,
        })
    }

    fn push_field(&mut self, field: FieldDescriptor) -> Result<&mut Self> {
        if self.finalized {
            return Err(Error::already_finalized(self.name()));
        }

        let reserved = field.property_name == ID_PROPERTY
            || (field.property_name == VERSION_PROPERTY && self.handle.is_managed());
        if reserved || self.lookup(&field.property_name).is_some() {
            return Err(Error::duplicate_property(self.name(), &field.property_name));
        }

        if field.is_column() {
            let implicit = match self.base {
                Some(_) => &[][..],
                None if self.handle.is_managed() => &[ID_COLUMN, VERSION_COLUMN][..],
                None => &[ID_COLUMN][..],
            };
            let inherited = self
                .base
                .iter()
                .filter_map(|base| base.resolved().ok())
                .flat_map(|base| base.columns());

            let clash = implicit
                .iter()
                .any(|column| column.eq_ignore_ascii_case(&field.column_name))
                || self
                    .fields
                    .values()
                    .filter(|other| other.is_column())
                    .chain(inherited)
                    .any(|other| other.column_name.eq_ignore_ascii_case(&field.column_name));

            if clash {
                return Err(Error::invalid_field(
                    self.name(),
                    format!(
                        "column `{}` of `{}` is already mapped",
                        field.column_name, field.property_name
                    ),
                ));
            }
        }

        self.fields.insert(field.property_name.clone(), field);
        Ok(self)
    }

    fn push_index<I, S>(&mut self, name: String, properties: I, unique: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indices.push(IndexSpec {
            name,
            properties: properties.into_iter().map(Into::into).collect(),
            unique,
        });
    }
}

impl Drop for DescriptorBuilder {
    fn drop(&mut self) {
        if !self.finalized {
            self.handle.mark_abandoned();
        }
    }
}

fn implicit_id() -> FieldDescriptor {
    FieldDescriptor {
        property_name: ID_PROPERTY.to_string(),
        column_name: ID_COLUMN.to_string(),
        data_type: DataType::Long,
        length: None,
        precision: None,
        scale: None,
        nullable: false,
        default_value: None,
        kind: FieldKind::Plain,
        generation: GenerationMode::Generation,
    }
}

fn implicit_version() -> FieldDescriptor {
    FieldDescriptor {
        property_name: VERSION_PROPERTY.to_string(),
        column_name: VERSION_COLUMN.to_string(),
        data_type: DataType::Long,
        length: None,
        precision: None,
        scale: None,
        nullable: false,
        default_value: Some(Value::I64(0)),
        kind: FieldKind::Plain,
        generation: GenerationMode::Generation,
    }
}
