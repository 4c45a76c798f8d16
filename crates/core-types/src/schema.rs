use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

/// A single column as reported by the catalog at reflection time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// The engine's own spelling of the type, e.g. `character varying(45)`.
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
        }
    }
}

/// The referenced side of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct ForeignKeyTarget {
    pub table: String,
    pub column: String,
}

/// One `(source column, target table, target column)` reference.
///
/// Many rows of the owning table point at one row of `references.table`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub references: ForeignKeyTarget,
}

impl ForeignKey {
    pub fn new(
        column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            references: ForeignKeyTarget {
                table: target_table.into(),
                column: target_column.into(),
            },
        }
    }
}

/// A reflected table. Serializes as the table descriptor (the name is the key
/// of the enclosing schema map, so it is not repeated in the body).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Table {
    #[serde(skip)]
    pub name: String,
    pub columns: Vec<Column>,
    /// Empty when the table has no primary key.
    pub primary_keys: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

/// A derived, borrowed view of one foreign key. It has no identity beyond the
/// constraint it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipEdge<'a> {
    pub from_table: &'a str,
    pub from_column: &'a str,
    pub to_table: &'a str,
    pub to_column: &'a str,
}

/// Table name -> `Table`, kept in catalog listing order.
///
/// Foreign-key targets are not checked against the model: a reference to a
/// table that was filtered out of the listing stays as the catalog reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaModel {
    tables: Vec<Table>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table, or replaces the table of the same name in place.
    pub fn insert(&mut self, table: Table) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Every foreign key in the model, in table order and then in the order
    /// the catalog listed the table's constraints.
    pub fn relationship_edges(&self) -> impl Iterator<Item = RelationshipEdge<'_>> {
        self.tables.iter().flat_map(|table| {
            table.foreign_keys.iter().map(move |fk| RelationshipEdge {
                from_table: &table.name,
                from_column: &fk.column,
                to_table: &fk.references.table,
                to_column: &fk.references.column,
            })
        })
    }

    pub fn foreign_key_count(&self) -> usize {
        self.tables.iter().map(|t| t.foreign_keys.len()).sum()
    }
}

impl Serialize for SchemaModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for table in &self.tables {
            map.serialize_entry(&table.name, table)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, fks: Vec<ForeignKey>) -> Table {
        Table {
            name: name.to_string(),
            columns: vec![Column::new(format!("{name}_id"), "integer", false)],
            primary_keys: vec![format!("{name}_id")],
            foreign_keys: fks,
        }
    }

    #[test]
    fn serializes_tables_in_insertion_order() {
        let mut model = SchemaModel::new();
        model.insert(table("film", vec![ForeignKey::new("language_id", "language", "language_id")]));
        model.insert(table("actor", vec![]));

        let json = serde_json::to_string(&model).unwrap();
        assert!(json.find("\"film\"").unwrap() < json.find("\"actor\"").unwrap());

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["film"]["columns"][0]["type"], "integer");
        assert_eq!(value["film"]["primary_keys"][0], "film_id");
        assert_eq!(value["film"]["foreign_keys"][0]["references"]["table"], "language");
        assert!(value["film"].get("name").is_none());
    }

    #[test]
    fn insert_replaces_a_table_of_the_same_name_in_place() {
        let mut model = SchemaModel::new();
        model.insert(table("actor", vec![]));
        model.insert(table("film", vec![]));
        model.insert(table("actor", vec![ForeignKey::new("x", "film", "film_id")]));

        assert_eq!(model.table_names().collect::<Vec<_>>(), vec!["actor", "film"]);
        assert_eq!(model.foreign_key_count(), 1);
    }

    #[test]
    fn edges_follow_table_then_constraint_order_and_keep_dangling_targets() {
        let mut model = SchemaModel::new();
        model.insert(table(
            "address",
            vec![ForeignKey::new("city_id", "city", "city_id")],
        ));
        model.insert(table(
            "customer",
            vec![
                ForeignKey::new("address_id", "address", "address_id"),
                ForeignKey::new("store_id", "store", "store_id"),
            ],
        ));

        let edges: Vec<_> = model.relationship_edges().collect();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].from_table, "address");
        assert_eq!(edges[1].to_table, "address");
        assert_eq!(edges[2].to_table, "store");
        assert!(!model.contains("store"));
    }
}
