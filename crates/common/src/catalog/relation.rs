/// Column types usable in scratch relations; both backends accept these names
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Text,
}

impl ColumnType {
    fn sql(self) -> &'static str {
        match self {
            ColumnType::BigInt => "BIGINT",
            ColumnType::Text => "TEXT",
        }
    }
}

/// A named, transaction-scoped intermediate table built by one
/// pipeline stage and read by the ones after it.
#[derive(Debug, PartialEq, Eq)]
pub struct Relation {
    pub name: &'static str,
    pub columns: &'static [(&'static str, ColumnType)],
    pub indexes: &'static [(&'static str, &'static [&'static str])],
}

impl Relation {
    pub(crate) fn create_statements(&self) -> Vec<String> {
        let columns = self
            .columns
            .iter()
            .map(|(name, ty)| format!("{} {}", name, ty.sql()))
            .collect::<Vec<_>>()
            .join(", ");

        let mut statements = vec![format!(
            "CREATE TEMPORARY TABLE {} ({})",
            self.name, columns
        )];
        statements.extend(self.indexes.iter().map(|(index, columns)| {
            format!("CREATE INDEX {} ON {} ({})", index, self.name, columns.join(", "))
        }));
        statements
    }

    pub(crate) fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }
}
