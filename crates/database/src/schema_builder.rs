use crate::catalog::CatalogReader;
use crate::error::DbError;
use core_types::{SchemaModel, Table};

/// Assembles catalog listings into a `SchemaModel`.
///
/// The build is all-or-nothing: if any listing for any table fails, the error
/// is returned and no model is produced.
pub struct SchemaModelBuilder<R> {
    reader: R,
}

impl<R: CatalogReader> SchemaModelBuilder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    #[tracing::instrument(name = "schema_build", skip(self))]
    pub async fn build(&mut self) -> Result<SchemaModel, DbError> {
        let table_names = self.reader.list_tables().await?;
        let mut model = SchemaModel::new();

        for name in table_names {
            let columns = self.reader.list_columns(&name).await?;
            let primary_keys = self.reader.list_primary_key(&name).await?;
            let foreign_keys = self.reader.list_foreign_keys(&name).await?;

            tracing::debug!(
                table = %name,
                columns = columns.len(),
                foreign_keys = foreign_keys.len(),
                "Reflected table."
            );
            model.insert(Table {
                name,
                columns,
                primary_keys,
                foreign_keys,
            });
        }

        tracing::info!(
            tables = model.len(),
            foreign_keys = model.foreign_key_count(),
            "Schema reflection complete."
        );
        Ok(model)
    }

    pub fn into_reader(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_types::{Column, ForeignKey};
    use std::collections::BTreeMap;

    #[derive(Clone, Default)]
    struct FakeTable {
        pub columns: Vec<Column>,
        pub primary_key: Vec<String>,
        pub foreign_keys: Vec<ForeignKey>,
    }

    /// An in-memory catalog. `fail_columns_for` makes the column listing of
    /// one table fail, as if the connection dropped mid-build.
    #[derive(Default)]
    struct FakeCatalog {
        pub tables: BTreeMap<String, FakeTable>,
        pub fail_columns_for: Option<String>,
        pub calls: Vec<String>,
    }

    impl FakeCatalog {
        pub fn pagila_subset() -> Self {
            let mut tables = BTreeMap::new();
            tables.insert(
                "address".to_string(),
                FakeTable {
                    columns: vec![
                        Column::new("address_id", "integer", false),
                        Column::new("address", "text", false),
                        Column::new("city_id", "integer", false),
                    ],
                    primary_key: vec!["address_id".into()],
                    foreign_keys: vec![ForeignKey::new("city_id", "city", "city_id")],
                },
            );
            tables.insert(
                "customer".to_string(),
                FakeTable {
                    columns: vec![
                        Column::new("customer_id", "integer", false),
                        Column::new("store_id", "integer", false),
                        Column::new("first_name", "text", false),
                        Column::new("last_name", "text", false),
                        Column::new("email", "text", true),
                        Column::new("address_id", "integer", false),
                    ],
                    primary_key: vec!["customer_id".into()],
                    foreign_keys: vec![
                        ForeignKey::new("address_id", "address", "address_id"),
                        ForeignKey::new("store_id", "store", "store_id"),
                    ],
                },
            );
            tables.insert(
                "film_actor".to_string(),
                FakeTable {
                    columns: vec![
                        Column::new("actor_id", "integer", false),
                        Column::new("film_id", "integer", false),
                        Column::new("last_update", "timestamp with time zone", false),
                    ],
                    primary_key: vec!["actor_id".into(), "film_id".into()],
                    foreign_keys: vec![
                        ForeignKey::new("actor_id", "actor", "actor_id"),
                        ForeignKey::new("film_id", "film", "film_id"),
                    ],
                },
            );
            Self {
                tables,
                ..Self::default()
            }
        }

        fn table(&self, name: &str) -> Result<&FakeTable, DbError> {
            self.tables
                .get(name)
                .ok_or_else(|| DbError::CatalogUnavailable(format!("no such table {name}")))
        }
    }

    #[async_trait]
    impl CatalogReader for FakeCatalog {
        async fn list_tables(&mut self) -> Result<Vec<String>, DbError> {
            self.calls.push("tables".into());
            Ok(self.tables.keys().cloned().collect())
        }

        async fn list_columns(&mut self, table: &str) -> Result<Vec<Column>, DbError> {
            self.calls.push(format!("columns:{table}"));
            if self.fail_columns_for.as_deref() == Some(table) {
                return Err(DbError::CatalogUnavailable("connection reset by peer".into()));
            }
            Ok(self.table(table)?.columns.clone())
        }

        async fn list_primary_key(&mut self, table: &str) -> Result<Vec<String>, DbError> {
            self.calls.push(format!("pk:{table}"));
            Ok(self.table(table)?.primary_key.clone())
        }

        async fn list_foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>, DbError> {
            self.calls.push(format!("fk:{table}"));
            Ok(self.table(table)?.foreign_keys.clone())
        }
    }

    #[tokio::test]
    async fn builds_tables_in_listing_order_with_three_calls_each() {
        let mut builder = SchemaModelBuilder::new(FakeCatalog::pagila_subset());
        let model = builder.build().await.unwrap();

        assert_eq!(
            model.table_names().collect::<Vec<_>>(),
            vec!["address", "customer", "film_actor"]
        );
        assert_eq!(builder.into_reader().calls.len(), 1 + 3 * 3);
    }

    #[tokio::test]
    async fn column_order_survives_the_build() {
        let catalog = FakeCatalog::pagila_subset();
        let expected = catalog.tables["customer"].columns.clone();

        let model = SchemaModelBuilder::new(catalog).build().await.unwrap();
        let customer = model.get("customer").unwrap();
        assert_eq!(customer.columns, expected);
        assert_eq!(customer.primary_keys, vec!["customer_id"]);

        let json = serde_json::to_value(&model).unwrap();
        let names: Vec<_> = json["customer"]["columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            expected.iter().map(|c| c.name.clone()).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn composite_primary_key_keeps_key_order() {
        let model = SchemaModelBuilder::new(FakeCatalog::pagila_subset())
            .build()
            .await
            .unwrap();
        assert_eq!(
            model.get("film_actor").unwrap().primary_keys,
            vec!["actor_id", "film_id"]
        );
    }

    #[tokio::test]
    async fn failure_mid_build_returns_no_partial_model() {
        let mut catalog = FakeCatalog::pagila_subset();
        catalog.fail_columns_for = Some("customer".into());

        let mut builder = SchemaModelBuilder::new(catalog);
        let result = builder.build().await;

        assert!(matches!(result, Err(DbError::CatalogUnavailable(_))));
        // Nothing past the failing listing was attempted.
        let calls = builder.into_reader().calls;
        assert_eq!(calls.last().map(String::as_str), Some("columns:customer"));
        assert!(!calls.iter().any(|c| c.ends_with(":film_actor")));
    }

    #[tokio::test]
    async fn rebuilding_an_unchanged_catalog_is_idempotent() {
        let first = SchemaModelBuilder::new(FakeCatalog::pagila_subset())
            .build()
            .await
            .unwrap();
        let second = SchemaModelBuilder::new(FakeCatalog::pagila_subset())
            .build()
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn empty_catalog_builds_an_empty_model() {
        let model = SchemaModelBuilder::new(FakeCatalog::default())
            .build()
            .await
            .unwrap();
        assert!(model.is_empty());
    }
}
