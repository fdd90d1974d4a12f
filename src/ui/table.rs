use crate::relationship::Relationship;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct RelationshipRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Left")]
    pub left: String,
    #[tabled(rename = "Right")]
    pub right: String,
}

impl From<&Relationship> for RelationshipRow {
    fn from(rel: &Relationship) -> Self {
        Self {
            id: rel.id,
            left: rel.left.to_string(),
            right: rel.right.to_string(),
        }
    }
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

pub fn relationships_table(relationships: &[Relationship]) -> String {
    if relationships.is_empty() {
        return String::new();
    }
    let rows: Vec<RelationshipRow> = relationships.iter().map(RelationshipRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
