use core_types::{RelationshipEdge, SchemaModel};

/// First line of every diagram.
pub const HEADER: &str = "erDiagram";

/// Zero-or-more source rows reference exactly one target row.
pub const MANY_TO_ONE: &str = "}o--||";

/// Renders the header plus one line per foreign key, in table order and then
/// in each table's constraint order. Lines are joined with `\n` and there is
/// no trailing newline.
///
/// Targets are written as the catalog reported them, even when the target
/// table is not part of `model`.
pub fn render(model: &SchemaModel) -> String {
    let mut output = String::from(HEADER);
    for edge in model.relationship_edges() {
        output.push('\n');
        output.push_str(&relationship_line(&edge));
    }
    output
}

/// `    <from_table> }o--|| <to_table> : "<from_column>"`
pub fn relationship_line(edge: &RelationshipEdge<'_>) -> String {
    format!(
        "    {} {} {} : \"{}\"",
        edge.from_table, MANY_TO_ONE, edge.to_table, edge.from_column
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Column, ForeignKey, Table};

    fn table(name: &str, fks: &[(&str, &str)]) -> Table {
        Table {
            name: name.to_string(),
            columns: vec![Column::new(format!("{name}_id"), "integer", false)],
            primary_keys: vec![format!("{name}_id")],
            foreign_keys: fks
                .iter()
                .map(|(column, target)| ForeignKey::new(*column, *target, *column))
                .collect(),
        }
    }

    fn pagila_model() -> SchemaModel {
        let mut model = SchemaModel::new();
        model.insert(table("actor", &[]));
        model.insert(table("address", &[("city_id", "city")]));
        model.insert(table("city", &[("country_id", "country")]));
        model.insert(table("country", &[]));
        model.insert(table(
            "customer",
            &[("address_id", "address"), ("store_id", "store")],
        ));
        model.insert(table("film_actor", &[("actor_id", "actor"), ("film_id", "film")]));
        model
    }

    #[test]
    fn renders_exact_lines_in_model_order() {
        let expected = [
            "erDiagram",
            "    address }o--|| city : \"city_id\"",
            "    city }o--|| country : \"country_id\"",
            "    customer }o--|| address : \"address_id\"",
            "    customer }o--|| store : \"store_id\"",
            "    film_actor }o--|| actor : \"actor_id\"",
            "    film_actor }o--|| film : \"film_id\"",
        ]
        .join("\n");

        assert_eq!(render(&pagila_model()), expected);
    }

    #[test]
    fn line_count_is_header_plus_foreign_keys() {
        let model = pagila_model();
        let diagram = render(&model);
        assert_eq!(diagram.lines().count(), 1 + model.foreign_key_count());
        assert!(!diagram.ends_with('\n'));
    }

    #[test]
    fn every_line_names_an_existing_foreign_key() {
        let model = pagila_model();
        for line in render(&model).lines().skip(1) {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let (from, marker, to, label) = (parts[0], parts[1], parts[2], parts[4]);
            assert_eq!(marker, MANY_TO_ONE);

            let source = model.get(from).expect("source table is in the model");
            let column = label.trim_matches('"');
            assert!(source
                .foreign_keys
                .iter()
                .any(|fk| fk.column == column && fk.references.table == to));
        }
    }

    #[test]
    fn dangling_targets_are_rendered_literally() {
        let model = pagila_model();
        assert!(!model.contains("store"));
        assert!(render(&model).contains("customer }o--|| store : \"store_id\""));
    }

    #[test]
    fn schema_without_foreign_keys_is_only_the_header() {
        let mut model = SchemaModel::new();
        model.insert(table("actor", &[]));
        assert_eq!(render(&model), HEADER);
        assert_eq!(render(&SchemaModel::new()), HEADER);
    }
}
