use dynasty_core::{
    driver::Driver,
    schema::db::{ColumnMismatch, Table, TableDiff},
    Connection, EntityDescriptor, Error, Result,
};

/// What reconciling one descriptor did to its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The table did not exist and was created with its indices.
    Created,

    /// Missing columns and indices were added to the live table.
    Altered {
        added_columns: Vec<String>,
        added_indices: Vec<String>,
    },

    /// The live table already had every declared column and index.
    Unchanged,

    /// The descriptor is ad-hoc; its table is never touched.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub entity: String,
    pub table: String,
    pub outcome: ReconcileOutcome,

    /// Columns whose live type or nullability differs from the declaration.
    /// These are reported only; nothing is altered to fix them.
    pub mismatches: Vec<ColumnMismatch>,
}

impl ReconcileReport {
    pub fn is_unchanged(&self) -> bool {
        matches!(
            self.outcome,
            ReconcileOutcome::Unchanged | ReconcileOutcome::Skipped
        )
    }
}

/// Brings the live table of `descriptor` in line with it, additively.
///
/// A missing table is created. An existing table gains the columns and
/// indices it lacks; new not-null columns are added with their declared
/// default, or the type's zero value, so existing rows stay valid. Nothing is
/// dropped or altered.
///
/// DDL must not run while the same connection has an uncommitted write
/// pending. Callers commit first.
pub async fn reconcile(
    driver: &dyn Driver,
    connection: &mut dyn Connection,
    descriptor: &EntityDescriptor,
) -> Result<ReconcileReport> {
    let entity = descriptor.qualified_name().to_string();
    let table_name = descriptor.table_name()?.to_string();

    if !descriptor.is_managed() {
        tracing::debug!(entity = %entity, table = %table_name, "ad-hoc entity; table left alone");
        return Ok(ReconcileReport {
            entity,
            table: table_name,
            outcome: ReconcileOutcome::Skipped,
            mismatches: vec![],
        });
    }

    let desired = Table::from_descriptor(descriptor, driver.capability())?;
    let live = connection.describe_table(&desired.name).await?;
    let diff = TableDiff::from(live.as_ref(), &desired);

    for mismatch in diff.mismatches() {
        tracing::warn!(
            table = %desired.name,
            column = %mismatch.column,
            live = ?mismatch.live_ty,
            declared = ?mismatch.declared_ty,
            live_nullable = mismatch.live_nullable,
            declared_nullable = mismatch.declared_nullable,
            "column differs from its declaration; left unchanged"
        );
    }

    let outcome = match &diff {
        TableDiff::CreateTable(_) => ReconcileOutcome::Created,
        TableDiff::AlterTable {
            add_columns,
            add_indices,
            ..
        } => ReconcileOutcome::Altered {
            added_columns: add_columns.iter().map(|c| c.name.clone()).collect(),
            added_indices: add_indices.iter().map(|i| i.name.clone()).collect(),
        },
        TableDiff::Unchanged { .. } => ReconcileOutcome::Unchanged,
    };

    if outcome != ReconcileOutcome::Unchanged {
        let migration = driver.generate_migration(&diff)?;

        connection
            .apply_migration(&migration)
            .await
            .map_err(|err| {
                err.context(Error::schema_migration(
                    &desired.name,
                    "applying migration failed",
                ))
            })?;
    }

    match &outcome {
        ReconcileOutcome::Created => {
            tracing::info!(entity = %entity, table = %desired.name, "table created");
        }
        ReconcileOutcome::Altered {
            added_columns,
            added_indices,
        } => {
            tracing::info!(
                entity = %entity,
                table = %desired.name,
                columns = ?added_columns,
                indices = ?added_indices,
                "table altered"
            );
        }
        _ => {
            tracing::debug!(entity = %entity, table = %desired.name, "table up to date");
        }
    }

    Ok(ReconcileReport {
        mismatches: diff.mismatches().to_vec(),
        entity,
        table: desired.name.clone(),
        outcome,
    })
}

/// Reconciles several descriptors on one connection.
///
/// Tables are handled so that extension bases and foreign key targets come
/// before the descriptors that depend on them. Reports follow input order.
pub async fn reconcile_all(
    driver: &dyn Driver,
    connection: &mut dyn Connection,
    descriptors: &[EntityDescriptor],
) -> Result<Vec<ReconcileReport>> {
    let order = dependency_order(descriptors)?;
    let mut reports: Vec<Option<ReconcileReport>> = vec![None; descriptors.len()];

    for index in order {
        reports[index] = Some(reconcile(driver, connection, &descriptors[index]).await?);
    }

    Ok(reports.into_iter().flatten().collect())
}

/// Indices of `descriptors` with dependencies first. Cycles keep input order.
fn dependency_order(descriptors: &[EntityDescriptor]) -> Result<Vec<usize>> {
    fn visit(
        index: usize,
        descriptors: &[EntityDescriptor],
        state: &mut [u8],
        order: &mut Vec<usize>,
    ) -> Result<()> {
        if state[index] != 0 {
            return Ok(());
        }
        state[index] = 1;

        let descriptor = &descriptors[index];
        let mut depends_on = vec![];
        if let Some(base) = descriptor.base()? {
            depends_on.push(base.clone());
        }
        for field in descriptor.fields()? {
            if field.is_foreign_key() && field.is_column() {
                depends_on.push(descriptor.reference_target(field)?);
            }
        }

        for target in depends_on {
            if let Some(next) = descriptors.iter().position(|d| d.ptr_eq(&target)) {
                visit(next, descriptors, state, order)?;
            }
        }

        state[index] = 2;
        order.push(index);
        Ok(())
    }

    let mut state = vec![0; descriptors.len()];
    let mut order = Vec::with_capacity(descriptors.len());
    for index in 0..descriptors.len() {
        visit(index, descriptors, &mut state, &mut order)?;
    }
    Ok(order)
}
