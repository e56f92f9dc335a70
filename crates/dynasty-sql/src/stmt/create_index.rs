use super::Statement;

use dynasty_core::schema::db::Index;

#[derive(Debug, Clone)]
pub struct CreateIndex {
    pub name: String,

    /// Table the index is created on
    pub on: String,

    pub columns: Vec<String>,

    pub unique: bool,
}

impl Statement {
    pub fn create_index(table: &str, index: &Index) -> Self {
        CreateIndex {
            name: index.name.clone(),
            on: table.to_string(),
            columns: index.columns.clone(),
            unique: index.unique,
        }
        .into()
    }
}

impl From<CreateIndex> for Statement {
    fn from(value: CreateIndex) -> Self {
        Self::CreateIndex(value)
    }
}
