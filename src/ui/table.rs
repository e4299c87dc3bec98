use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Collection")]
    pub collection: String,
    #[tabled(rename = "Documents")]
    pub documents: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, collection: &str, documents: impl ToString) {
        self.rows.push(TableRow {
            collection: collection.to_string(),
            documents: documents.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &crate::storage::StoreStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row(crate::Collection::References.as_str(), stats.references);
    builder.add_row(crate::Collection::Verbs.as_str(), stats.verbs);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreStats;

    #[test]
    fn test_stats_table_lists_both_collections() {
        let table = stats_table(&StoreStats { references: 12, verbs: 340 });
        assert!(table.contains("references"));
        assert!(table.contains("340"));
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        assert!(TableBuilder::new().build().is_empty());
    }
}
