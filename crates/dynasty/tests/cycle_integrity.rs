mod support;

use dynasty::{DataSourceConfig, DataSourceManager, Db, TypeRegistry, Value};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn author_with_books_round_trips() {
    support::init_tracing();

    let (author_descriptor, book_descriptor) = support::library();
    let registry = TypeRegistry::new();
    let types = registry
        .synthesize_all(&[author_descriptor.clone(), book_descriptor.clone()])
        .unwrap();
    let (author, book) = (types[0].clone(), types[1].clone());
    assert!(author.child_type("books").unwrap().ptr_eq(&book));

    let manager = DataSourceManager::new();
    manager
        .configure(
            DataSourceConfig::new("library", "sqlite::memory:")
                .entities([author_descriptor, book_descriptor]),
        )
        .await
        .unwrap();
    let db = Db::new(&manager, "library");

    let mut tolkien = author.new_record();
    tolkien.set("name", "J. R. R. Tolkien").unwrap();
    for title in ["The Hobbit", "The Silmarillion"] {
        let mut volume = book.new_record();
        volume.set("title", title).unwrap();
        tolkien.push_child("books", volume).unwrap();
    }

    let id = db.create(&mut tolkien).await.unwrap();
    assert_eq!(tolkien.id(), Some(id));
    assert_eq!(tolkien.version_no(), Some(0));
    for volume in tolkien.children("books").unwrap() {
        assert_eq!(volume.get("author").unwrap(), &Value::I64(id));
        assert!(volume.id().is_some());
    }

    let found = db.find(&author, id).await.unwrap();
    assert_eq!(found.get("name").unwrap(), &Value::from("J. R. R. Tolkien"));

    let books = found.children("books").unwrap();
    let titles: Vec<_> = books
        .iter()
        .map(|volume| volume.get("title").unwrap().clone())
        .collect();
    assert_eq!(
        titles,
        [Value::from("The Hobbit"), Value::from("The Silmarillion")]
    );

    for volume in books {
        assert_eq!(volume.get("author").unwrap(), &Value::I64(id));
        assert_eq!(
            volume.get("authorName").unwrap(),
            &Value::from("J. R. R. Tolkien")
        );
    }

    // A book read on its own carries the author's name too.
    let first = db.find(&book, books[0].id().unwrap()).await.unwrap();
    assert_eq!(
        first.get("authorName").unwrap(),
        &Value::from("J. R. R. Tolkien")
    );
}

#[test]
fn list_only_values_are_read_only() {
    let (author_descriptor, book_descriptor) = support::library();
    let registry = TypeRegistry::new();
    registry
        .synthesize_all(&[author_descriptor, book_descriptor])
        .unwrap();

    let book = registry.get("lib.Book").unwrap();
    let mut volume = book.new_record();
    let err = volume.set("authorName", "someone").unwrap_err();
    assert!(err.is_unknown_property());
    assert!(volume.get("authorName").unwrap().is_null());
}

#[test]
fn children_must_match_the_collection_type() {
    let (author_descriptor, book_descriptor) = support::library();
    let registry = TypeRegistry::new();
    let types = registry
        .synthesize_all(&[author_descriptor, book_descriptor])
        .unwrap();
    let author = &types[0];

    let mut parent = author.new_record();
    let stranger = author.new_record();
    assert!(parent
        .push_child("books", stranger)
        .unwrap_err()
        .is_invalid_field());
    assert!(parent.children("books").unwrap().is_empty());
}
