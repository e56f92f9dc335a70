#![allow(dead_code)]

use dynasty::{DataType, DescriptorBuilder, EntityDescriptor, FieldSpec, ManagementMode};
use std::path::Path;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// URL of a file database inside `dir`.
pub fn sqlite_url(dir: &Path, file: &str) -> String {
    format!("sqlite:{}", dir.join(file).display())
}

/// Equipment as first deployed.
pub fn equipment_v1() -> EntityDescriptor {
    equipment(1, vec![])
}

/// Equipment after a reference number and an active flag were added.
pub fn equipment_v2() -> EntityDescriptor {
    equipment(
        2,
        vec![
            FieldSpec::new(DataType::String, "refNo").length(20).nullable(),
            FieldSpec::new(DataType::Boolean, "active").default_value(false),
        ],
    )
}

fn equipment(version: u32, extra: Vec<FieldSpec>) -> EntityDescriptor {
    let mut builder = DescriptorBuilder::new("com.acme.Equipment", ManagementMode::Managed);
    builder
        .table_name("EQUIPMENT")
        .version(version)
        .unique_constraint("uq_equipment_serial", ["serialNo"]);
    builder
        .add_field(FieldSpec::new(DataType::String, "name").length(32))
        .unwrap()
        .add_field(FieldSpec::new(DataType::String, "serialNo").length(16))
        .unwrap()
        .add_field(FieldSpec::new(DataType::Decimal, "price").precision(18).scale(2))
        .unwrap()
        .add_field(FieldSpec::new(DataType::Date, "expiryDt").nullable())
        .unwrap()
        .add_field(FieldSpec::new(DataType::Integer, "hours").default_value(0))
        .unwrap();
    for field in extra {
        builder.add_field(field).unwrap();
    }
    builder.finalize_resolution().unwrap()
}

/// Authors owning books; each book points back at its author and shows the
/// author's name.
pub fn library() -> (EntityDescriptor, EntityDescriptor) {
    let mut author = DescriptorBuilder::new("lib.Author", ManagementMode::Managed);
    let mut book = DescriptorBuilder::new("lib.Book", ManagementMode::Managed);
    let author_stub = author.prefetch();
    let book_stub = book.prefetch();

    author
        .add_field(FieldSpec::new(DataType::String, "name").length(64))
        .unwrap()
        .add_child_list_field("books", &book_stub, "author")
        .unwrap();
    book.add_field(FieldSpec::new(DataType::String, "title"))
        .unwrap()
        .add_foreign_key_field(FieldSpec::new(DataType::Long, "author"), &author_stub)
        .unwrap()
        .add_list_only_field(FieldSpec::new(DataType::String, "authorName"), "author", "name")
        .unwrap();

    (
        author.finalize_resolution().unwrap(),
        book.finalize_resolution().unwrap(),
    )
}
