use dbq_core::{ColumnInfo, TableInfo};

/// One row per column, plus one column-less row for relations without any.
///
/// Casts to `text` because the `information_schema` domains
/// (`sql_identifier`, `character_data`) do not decode as strings.
pub const INTROSPECT_SQL: &str = r#"
    select
      t.table_schema::text as table_schema,
      t.table_name::text as table_name,
      t.table_type::text as table_type,
      c.column_name::text as column_name,
      c.data_type::text as data_type
    from information_schema.tables t
    left join information_schema.columns c
      on c.table_schema = t.table_schema
     and c.table_name = t.table_name
    where t.table_schema not in ('pg_catalog', 'information_schema')
      and t.table_schema not like 'pg_toast%'
      and t.table_schema not like 'pg_temp%'
      and t.table_type in ('BASE TABLE', 'VIEW', 'FOREIGN')
    order by t.table_schema, t.table_name, c.ordinal_position
"#;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct IntrospectRow {
    pub table_schema: String,
    pub table_name: String,
    pub table_type: String,
    pub column_name: Option<String>,
    pub data_type: Option<String>,
}

/// Fold ordered introspection rows into one [`TableInfo`] per relation.
///
/// Rows must already be ordered by schema, table, then column position;
/// consecutive rows with the same `(schema, table)` form one group.
pub fn group_rows(rows: Vec<IntrospectRow>) -> Vec<TableInfo> {
    let mut tables: Vec<TableInfo> = Vec::new();

    for row in rows {
        let same_table = tables
            .last()
            .is_some_and(|t| t.schema == row.table_schema && t.name == row.table_name);

        if !same_table {
            tables.push(TableInfo {
                is_view: row.table_type.eq_ignore_ascii_case("VIEW"),
                schema: row.table_schema,
                name: row.table_name,
                columns: Vec::new(),
            });
        }

        if let (Some(name), Some(data_type), Some(table)) =
            (row.column_name, row.data_type, tables.last_mut())
        {
            table.columns.push(ColumnInfo::new(name, data_type));
        }
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(schema: &str, table: &str, kind: &str, column: Option<(&str, &str)>) -> IntrospectRow {
        IntrospectRow {
            table_schema: schema.to_string(),
            table_name: table.to_string(),
            table_type: kind.to_string(),
            column_name: column.map(|(n, _)| n.to_string()),
            data_type: column.map(|(_, t)| t.to_string()),
        }
    }

    #[test]
    fn test_groups_columns_in_order() {
        let tables = group_rows(vec![
            row("public", "users", "BASE TABLE", Some(("id", "integer"))),
            row("public", "users", "BASE TABLE", Some(("name", "text"))),
        ]);

        assert_eq!(
            tables,
            vec![TableInfo {
                schema: "public".to_string(),
                name: "users".to_string(),
                is_view: false,
                columns: vec![ColumnInfo::new("id", "integer"), ColumnInfo::new("name", "text")],
            }]
        );
    }

    #[test]
    fn test_view_detection_ignores_case() {
        let tables = group_rows(vec![
            row("public", "active_users", "view", Some(("id", "integer"))),
            row("public", "users", "BASE TABLE", Some(("id", "integer"))),
            row("reporting", "daily", "VIEW", Some(("day", "date"))),
        ]);

        let flags: Vec<_> = tables
            .iter()
            .map(|t| (t.qualified_name(), t.is_view))
            .collect();
        assert_eq!(
            flags,
            vec![
                ("public.active_users".to_string(), true),
                ("public.users".to_string(), false),
                ("reporting.daily".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_foreign_tables_are_tables() {
        assert!(INTROSPECT_SQL.contains("'FOREIGN'"));
        let tables = group_rows(vec![row("remote", "events", "FOREIGN", Some(("id", "bigint")))]);
        assert_eq!(tables.len(), 1);
        assert!(!tables[0].is_view);
    }

    #[test]
    fn test_same_name_in_two_schemas_stays_separate() {
        let tables = group_rows(vec![
            row("a", "t", "BASE TABLE", Some(("x", "integer"))),
            row("b", "t", "BASE TABLE", Some(("y", "text"))),
        ]);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].columns, vec![ColumnInfo::new("x", "integer")]);
        assert_eq!(tables[1].columns, vec![ColumnInfo::new("y", "text")]);
    }

    #[test]
    fn test_table_without_columns() {
        let tables = group_rows(vec![row("public", "empty", "BASE TABLE", None)]);
        assert_eq!(tables.len(), 1);
        assert!(tables[0].columns.is_empty());
    }

    #[test]
    fn test_no_rows() {
        assert!(group_rows(Vec::new()).is_empty());
    }
}
