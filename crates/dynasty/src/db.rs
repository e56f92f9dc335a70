use crate::{
    registry::{Property, PropertyKind},
    DataSourceManager, EntityType, PooledConnection, Query, Record,
};

use dynasty_core::{
    driver::operation::{QuerySql, Transaction},
    schema::{ID_COLUMN, VERSION_COLUMN},
    stmt::{
        self, Assignment, Delete, Expr, Insert, Join, OrderByExpr, Select, TableRef, Update, Value,
    },
    Connection, Error, Result,
};
use std::{future::Future, pin::Pin};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const ROOT: &str = "t0";

/// Record persistence against one named data source.
///
/// Every operation checks a connection out of the data source's pool and
/// restores it before returning, whether the operation succeeded or not.
/// Writes run in a transaction that is committed before the connection goes
/// back.
#[derive(Debug, Clone)]
pub struct Db {
    manager: DataSourceManager,
    name: String,
}

impl Db {
    /// Binds to the data source `name`. The name does not have to be
    /// configured yet; operations fail with `not_configured` until it is.
    pub fn new(manager: &DataSourceManager, name: impl Into<String>) -> Db {
        Db {
            manager: manager.clone(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts `record` and its child records, returning the new identity.
    ///
    /// Once committed, the identity, a version of 0 and every child's back
    /// reference are written back into the records. A failed create leaves
    /// `record` as it was.
    pub async fn create(&self, record: &mut Record) -> Result<i64> {
        let mut staged = record.clone();
        let mut connection = self.checkout().await?;
        let result = async {
            begin(&mut **connection).await?;
            let created = create_in(&mut **connection, &mut staged).await;
            finish(&mut **connection, created).await
        }
        .await;
        self.restore(connection);

        let id = result?;
        *record = staged;
        Ok(id)
    }

    /// Loads the record of `ty` with identity `id`, with its child records
    /// and list-only values.
    pub async fn find(&self, ty: &EntityType, id: i64) -> Result<Record> {
        let mut connection = self.checkout().await?;
        let filter = Expr::eq(Expr::qualified(ROOT, ID_COLUMN), Expr::value(id));
        let result = select_in(&mut **connection, ty, Some(filter), vec![], None).await;
        self.restore(connection);

        result?
            .pop()
            .ok_or_else(|| {
                Error::record_not_found(format!("`{}` with id {id}", ty.qualified_name()))
            })
    }

    /// Loads every record of `ty` matching `query`.
    ///
    /// A query without criteria is rejected unless it allows an unrestricted
    /// scan.
    pub async fn list_all(&self, ty: &EntityType, query: &Query) -> Result<Vec<Record>> {
        query.check_criteria(ty)?;
        let filter = query.filter(ty, ROOT)?;
        let order_by = query.order_by(ty, ROOT)?;

        let mut connection = self.checkout().await?;
        let result = select_in(
            &mut **connection,
            ty,
            filter,
            order_by,
            query.limit_value(),
        )
        .await;
        self.restore(connection);
        result
    }

    /// Counts the records of `ty` matching `query`. An empty query counts
    /// every record.
    pub async fn count_all(&self, ty: &EntityType, query: &Query) -> Result<u64> {
        let mut select = Select::new(
            TableRef::aliased(ty.table_name(), ROOT),
            vec![Expr::CountStar],
        );
        select.filter = query.filter(ty, ROOT)?;

        let mut connection = self.checkout().await?;
        let result = connection
            .exec(QuerySql::new(select, Some(vec![stmt::Type::I64])).into())
            .await;
        self.restore(connection);

        let count = result?
            .rows
            .into_values()
            .into_iter()
            .next()
            .and_then(|row| row.first().and_then(Value::as_i64))
            .unwrap_or_default();
        Ok(count as u64)
    }

    /// Writes every stored property of `record` and bumps its version.
    ///
    /// Child collections are left untouched.
    pub async fn update_by_id(&self, record: &mut Record) -> Result<()> {
        self.update(record, None).await
    }

    /// Like [`update_by_id`](Self::update_by_id), but only if the stored
    /// version still equals the version `record` was read with.
    ///
    /// Fails with `version_mismatch` when another writer got there first and
    /// with `record_not_found` when the row is gone.
    pub async fn update_by_id_version(&self, record: &mut Record) -> Result<()> {
        let expected = match record.entity_type().version_no_index() {
            Some(_) => record.version_no().ok_or_else(|| {
                Error::invalid_field(
                    record.entity_type().qualified_name(),
                    "record has no version to compare",
                )
            })?,
            None => {
                return Err(Error::unsupported_feature(format!(
                    "`{}` is ad-hoc and has no version column",
                    record.entity_type().qualified_name()
                )))
            }
        };

        self.update(record, Some(expected)).await
    }

    /// Deletes the record of `ty` with identity `id` along with all of its
    /// child records.
    pub async fn delete(&self, ty: &EntityType, id: i64) -> Result<()> {
        let mut connection = self.checkout().await?;
        let result = async {
            begin(&mut **connection).await?;
            let deleted = delete_in(&mut **connection, ty, id).await;
            finish(&mut **connection, deleted).await
        }
        .await;
        self.restore(connection);

        match result? {
            0 => Err(Error::record_not_found(format!(
                "`{}` with id {id}",
                ty.qualified_name()
            ))),
            _ => Ok(()),
        }
    }

    /// Deletes every record of `ty` matching `query`, cascading to child
    /// records. Returns how many records of `ty` were deleted.
    pub async fn delete_all(&self, ty: &EntityType, query: &Query) -> Result<u64> {
        query.check_criteria(ty)?;

        let mut select = Select::new(
            TableRef::aliased(ty.table_name(), ROOT),
            vec![Expr::qualified(ROOT, ID_COLUMN)],
        );
        select.filter = query.filter(ty, ROOT)?;
        select.order_by = query.order_by(ty, ROOT)?;
        select.limit = query.limit_value();

        let mut connection = self.checkout().await?;
        let result = async {
            begin(&mut **connection).await?;
            let deleted = async {
                let mut deleted = 0;
                for id in select_ids(&mut **connection, select).await? {
                    deleted += delete_in(&mut **connection, ty, id).await?;
                }
                Ok::<_, Error>(deleted)
            }
            .await;
            finish(&mut **connection, deleted).await
        }
        .await;
        self.restore(connection);
        result
    }

    async fn update(&self, record: &mut Record, expected: Option<i64>) -> Result<()> {
        let mut connection = self.checkout().await?;
        let result = async {
            begin(&mut **connection).await?;
            let updated = update_in(&mut **connection, record, expected).await;
            finish(&mut **connection, updated).await
        }
        .await;
        self.restore(connection);

        // The new version only sticks once the transaction has committed.
        let version = result?;
        if let (Some(index), Some(version)) = (record.entity_type().version_no_index(), version) {
            record.load(index, Value::I64(version));
        }
        Ok(())
    }

    async fn checkout(&self) -> Result<PooledConnection> {
        self.manager.get_connection(&self.name).await
    }

    fn restore(&self, connection: PooledConnection) {
        self.manager.release(&self.name, connection);
    }
}

async fn begin(connection: &mut dyn Connection) -> Result<()> {
    connection.exec(Transaction::Start.into()).await.map(|_| ())
}

/// Commits if `result` is a success and rolls back otherwise, including when
/// the commit itself fails.
async fn finish<T>(connection: &mut dyn Connection, result: Result<T>) -> Result<T> {
    let err = match result {
        Ok(value) => match connection.exec(Transaction::Commit.into()).await {
            Ok(_) => return Ok(value),
            Err(err) => err,
        },
        Err(err) => err,
    };

    if let Err(rollback) = connection.exec(Transaction::Rollback.into()).await {
        tracing::warn!(error = %rollback, "rollback failed");
    }
    Err(err)
}

fn create_in<'a>(
    connection: &'a mut dyn Connection,
    record: &'a mut Record,
) -> BoxFuture<'a, Result<i64>> {
    Box::pin(async move {
        let ty = record.entity_type().clone();

        if let Some(index) = ty.version_no_index() {
            record.load(index, Value::I64(0));
        }

        let mut insert = Insert {
            table: ty.table_name().to_string(),
            columns: vec![],
            values: vec![],
            returning: vec![ID_COLUMN.to_string()],
        };

        for (index, property) in ty.properties().iter().enumerate() {
            let Some(column) = property.column() else {
                continue;
            };
            let value = record.value_at(index);
            if index == ty.id_index() || value.is_null() {
                continue;
            }
            insert.columns.push(column.to_string());
            insert.values.push(Expr::value(value.clone()));
        }

        let response = connection
            .exec(QuerySql::new(insert, Some(vec![stmt::Type::I64])).into())
            .await?;

        let id = response
            .rows
            .into_values()
            .into_iter()
            .next()
            .and_then(|row| row.first().and_then(Value::as_i64))
            .ok_or_else(|| {
                dynasty_core::err!("insert into `{}` returned no identity", ty.table_name())
            })?;
        record.load(ty.id_index(), Value::I64(id));

        tracing::debug!(entity = ty.qualified_name(), id, "record created");

        for property in ty.properties() {
            let PropertyKind::Children {
                slot,
                back_reference,
                ..
            } = &property.kind
            else {
                continue;
            };

            for child in record.children_at_mut(*slot) {
                let back = child.entity_type().property_index_or_err(back_reference)?;
                child.load(back, Value::I64(id));
                create_in(&mut *connection, child).await?;
            }
        }

        Ok(id)
    })
}

/// Returns the version the row now carries, if the entity is versioned.
async fn update_in(
    connection: &mut dyn Connection,
    record: &Record,
    expected: Option<i64>,
) -> Result<Option<i64>> {
    let ty = record.entity_type().clone();
    let id = record
        .id()
        .ok_or_else(|| Error::invalid_field(ty.qualified_name(), "record has not been created"))?;

    let mut filter = vec![Expr::eq(Expr::column(ID_COLUMN), Expr::value(id))];
    let mut assignments = vec![];

    for (index, property) in ty.properties().iter().enumerate() {
        if Some(index) == ty.version_no_index() || index == ty.id_index() {
            continue;
        }
        if let Some(column) = property.column() {
            let value = Expr::value(record.value_at(index).clone());
            assignments.push(Assignment::new(column, value));
        }
    }

    let next_version = match (ty.version_no_index(), expected) {
        (Some(_), Some(expected)) => {
            filter.push(Expr::eq(Expr::column(VERSION_COLUMN), Expr::value(expected)));
            Some(expected + 1)
        }
        (Some(_), None) => {
            let current = stored_version(connection, &ty, id).await?;
            Some(current + 1)
        }
        (None, _) => None,
    };

    if let Some(version) = next_version {
        assignments.push(Assignment::new(VERSION_COLUMN, Expr::value(version)));
    }

    let update = Update {
        table: ty.table_name().to_string(),
        assignments,
        filter: Some(Expr::and_from_vec(filter)),
    };

    let updated = connection
        .exec(QuerySql::new(update, None).into())
        .await?
        .rows
        .count();

    if updated == 0 {
        let still_exists = match expected {
            Some(_) => exists(connection, &ty, id).await?,
            None => false,
        };
        return Err(match expected {
            Some(expected) if still_exists => {
                Error::version_mismatch(ty.table_name(), id, expected)
            }
            _ => Error::record_not_found(format!("`{}` with id {id}", ty.qualified_name())),
        });
    }

    tracing::debug!(
        entity = ty.qualified_name(),
        id,
        version = ?next_version,
        "record updated"
    );
    Ok(next_version)
}

/// Deletes the row `id` of `ty` after its child rows. Returns the number of
/// rows of `ty` deleted, 0 or 1.
fn delete_in<'a>(
    connection: &'a mut dyn Connection,
    ty: &'a EntityType,
    id: i64,
) -> BoxFuture<'a, Result<u64>> {
    Box::pin(async move {
        for property in ty.properties() {
            let PropertyKind::Children { back_reference, .. } = &property.kind else {
                continue;
            };

            let child_ty = ty.child_type(property.name())?;
            let back_column = back_reference_column(&child_ty, back_reference)?;

            let select = Select {
                filter: Some(Expr::eq(Expr::qualified(ROOT, back_column), Expr::value(id))),
                ..Select::new(
                    TableRef::aliased(child_ty.table_name(), ROOT),
                    vec![Expr::qualified(ROOT, ID_COLUMN)],
                )
            };

            for child_id in select_ids(&mut *connection, select).await? {
                delete_in(&mut *connection, &child_ty, child_id).await?;
            }
        }

        let delete = Delete {
            table: ty.table_name().to_string(),
            filter: Some(Expr::eq(Expr::column(ID_COLUMN), Expr::value(id))),
        };
        let deleted = connection
            .exec(QuerySql::new(delete, None).into())
            .await?
            .rows
            .count();

        tracing::debug!(entity = ty.qualified_name(), id, deleted, "record deleted");
        Ok(deleted)
    })
}

/// Selects records of `ty` with their list-only values joined in, then loads
/// their child records.
fn select_in<'a>(
    connection: &'a mut dyn Connection,
    ty: &'a EntityType,
    filter: Option<Expr>,
    order_by: Vec<OrderByExpr>,
    limit: Option<u64>,
) -> BoxFuture<'a, Result<Vec<Record>>> {
    Box::pin(async move {
        let mut select = Select::new(TableRef::aliased(ty.table_name(), ROOT), vec![]);
        let mut slots = vec![];
        let mut ret = vec![];

        for (index, property) in ty.properties().iter().enumerate() {
            match &property.kind {
                PropertyKind::Column { column } => {
                    select.columns.push(Expr::qualified(ROOT, column));
                }
                PropertyKind::ListOnly { key, target, column } => {
                    let key_column = ty.properties()[*key].column().ok_or_else(|| {
                        Error::invalid_field(
                            ty.qualified_name(),
                            format!("`{}` has no stored key", property.name()),
                        )
                    })?;
                    let alias = format!("t{}", select.joins.len() + 1);
                    select.joins.push(Join {
                        table: TableRef::aliased(target.table_name()?, &alias),
                        on: Expr::eq(
                            Expr::qualified(&alias, ID_COLUMN),
                            Expr::qualified(ROOT, key_column),
                        ),
                    });
                    select.columns.push(Expr::qualified(&alias, column));
                }
                PropertyKind::Transient | PropertyKind::Children { .. } => continue,
            }
            slots.push(index);
            ret.push(property.ty());
        }

        select.filter = filter;
        select.order_by = order_by;
        select.limit = limit;

        let rows = connection
            .exec(QuerySql::new(select, Some(ret)).into())
            .await?
            .rows
            .into_values();

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = ty.new_record();
            for (index, value) in slots.iter().zip(row) {
                record.load(*index, loaded(&ty.properties()[*index], value));
            }
            records.push(record);
        }

        for record in &mut records {
            let Some(id) = record.id() else {
                continue;
            };

            for property in ty.properties() {
                let PropertyKind::Children {
                    slot,
                    back_reference,
                    ..
                } = &property.kind
                else {
                    continue;
                };

                let child_ty = ty.child_type(property.name())?;
                let back_column = back_reference_column(&child_ty, back_reference)?;
                let filter = Expr::eq(Expr::qualified(ROOT, back_column), Expr::value(id));

                let children = select_in(
                    &mut *connection,
                    &child_ty,
                    Some(filter),
                    vec![OrderByExpr::asc(Expr::qualified(ROOT, ID_COLUMN))],
                    None,
                )
                .await?;
                *record.children_at_mut(*slot) = children;
            }
        }

        Ok(records)
    })
}

async fn select_ids(connection: &mut dyn Connection, select: Select) -> Result<Vec<i64>> {
    let rows = connection
        .exec(QuerySql::new(select, Some(vec![stmt::Type::I64])).into())
        .await?
        .rows
        .into_values();

    Ok(rows
        .iter()
        .filter_map(|row| row.first().and_then(Value::as_i64))
        .collect())
}

async fn stored_version(connection: &mut dyn Connection, ty: &EntityType, id: i64) -> Result<i64> {
    let select = Select {
        filter: Some(Expr::eq(Expr::qualified(ROOT, ID_COLUMN), Expr::value(id))),
        ..Select::new(
            TableRef::aliased(ty.table_name(), ROOT),
            vec![Expr::qualified(ROOT, VERSION_COLUMN)],
        )
    };

    select_ids(connection, select)
        .await?
        .first()
        .copied()
        .ok_or_else(|| Error::record_not_found(format!("`{}` with id {id}", ty.qualified_name())))
}

async fn exists(connection: &mut dyn Connection, ty: &EntityType, id: i64) -> Result<bool> {
    let select = Select {
        filter: Some(Expr::eq(Expr::qualified(ROOT, ID_COLUMN), Expr::value(id))),
        ..Select::new(
            TableRef::aliased(ty.table_name(), ROOT),
            vec![Expr::qualified(ROOT, ID_COLUMN)],
        )
    };
    Ok(!select_ids(connection, select).await?.is_empty())
}

fn back_reference_column<'a>(child_ty: &'a EntityType, back_reference: &str) -> Result<&'a str> {
    child_ty
        .property(back_reference)
        .and_then(Property::column)
        .ok_or_else(|| {
            Error::invalid_field(
                child_ty.qualified_name(),
                format!("back reference `{back_reference}` is not stored"),
            )
        })
}

/// Decimals come back from loosely typed storage without their declared
/// scale.
fn loaded(property: &Property, value: Value) -> Value {
    match (value, property.scale()) {
        (Value::Decimal(mut decimal), Some(scale)) => {
            decimal.rescale(scale);
            Value::Decimal(decimal)
        }
        (value, _) => value,
    }
}
