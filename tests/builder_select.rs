use vantage_db::prelude::*;

#[test]
fn bare_select_star() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .select(&["*"])
        .from("users")
        .to_query()
        .unwrap();
    assert_eq!(q.sql, "SELECT * FROM users");
    assert!(q.params.is_empty());
}

#[test]
fn empty_select_defaults_to_star() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .from("users")
        .to_query()
        .unwrap();
    assert_eq!(q.sql, "SELECT * FROM users");
}

#[test]
fn single_where_binds_first_placeholder() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .select(&["*"])
        .from("users")
        .where_clause("status = ?", &[SqlValue::Text("active".into())])
        .to_query()
        .unwrap();
    assert_eq!(q.sql, "SELECT * FROM users WHERE (status = $1)");
    assert_eq!(q.params, vec![SqlValue::Text("active".into())]);
}

#[test]
fn chained_where_and_continues_numbering() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .select(&["*"])
        .from("users")
        .where_clause("status = ?", &[SqlValue::Text("active".into())])
        .and("age > ?", &[SqlValue::Int(18)])
        .to_query()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM users WHERE (status = $1) AND (age > $2)"
    );
    assert_eq!(
        q.params,
        vec![SqlValue::Text("active".into()), SqlValue::Int(18)]
    );
}

#[test]
fn placeholder_count_always_matches_value_count() {
    // Any sequence of where/and calls with N total values renders exactly N
    // placeholders numbered 1..N in call order.
    let mut builder = QueryBuilder::new(Dialect::Postgres).from("invoices");
    for i in 0..7 {
        builder = builder.and(&format!("c{i} = ?"), &[SqlValue::Int(i)]);
    }
    let q = builder.to_query().unwrap();
    assert_eq!(q.params.len(), 7);
    for n in 1..=7 {
        assert!(q.sql.contains(&format!("${n}")), "missing ${n} in {}", q.sql);
    }
    assert!(!q.sql.contains("$8"));
}

#[test]
fn or_merges_with_immediately_preceding_predicate_only() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .from("users")
        .where_clause("a = ?", &[SqlValue::Int(1)])
        .and("b = ?", &[SqlValue::Int(2)])
        .or("c = ?", &[SqlValue::Int(3)])
        .to_query()
        .unwrap();
    // OR binds to `b = ?` alone; `a = ?` stays ANDed.
    assert_eq!(
        q.sql,
        "SELECT * FROM users WHERE (a = $1) AND ((b = $2) OR (c = $3))"
    );
    assert_eq!(
        q.params,
        vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
    );
}

#[test]
fn or_without_prior_predicate_acts_as_where() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .from("users")
        .or("a = ?", &[SqlValue::Int(1)])
        .to_query()
        .unwrap();
    assert_eq!(q.sql, "SELECT * FROM users WHERE (a = $1)");
}

#[test]
fn joins_group_having_order_limit_offset_render_in_fixed_order() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .select(&["u.id", "COUNT(o.id) AS orders"])
        .from_as("users", "u")
        .inner_join_as("orders", "o", "o.user_id = u.id")
        .left_join("payments", "payments.order_id = o.id")
        .where_clause("u.tenant_id = ?", &[SqlValue::Int(42)])
        .group_by(&["u.id"])
        .having("COUNT(o.id) > ?", &[SqlValue::Int(5)])
        .order_by("orders", "desc")
        .limit(10)
        .offset(20)
        .to_query()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT u.id, COUNT(o.id) AS orders FROM users u \
         INNER JOIN orders o ON o.user_id = u.id \
         LEFT JOIN payments ON payments.order_id = o.id \
         WHERE (u.tenant_id = $1) \
         GROUP BY u.id \
         HAVING (COUNT(o.id) > $2) \
         ORDER BY orders DESC \
         LIMIT 10 OFFSET 20"
    );
    assert_eq!(q.params, vec![SqlValue::Int(42), SqlValue::Int(5)]);
}

#[test]
fn having_placeholders_continue_after_where_values() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .from("orders")
        .where_clause("tenant_id = ?", &[SqlValue::Int(1)])
        .group_by(&["customer_id"])
        .having("SUM(total) > ?", &[SqlValue::Float(100.0)])
        .to_query()
        .unwrap();
    assert!(q.sql.contains("WHERE (tenant_id = $1)"));
    assert!(q.sql.contains("HAVING (SUM(total) > $2)"));
}

#[test]
fn missing_from_fails() {
    let err = QueryBuilder::new(Dialect::Postgres)
        .select(&["*"])
        .to_query()
        .unwrap_err();
    assert!(matches!(err, DbError::MissingFromClause));
}

#[test]
fn negative_limit_fails() {
    let err = QueryBuilder::new(Dialect::Postgres)
        .from("users")
        .limit(-1)
        .to_query()
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidLimit(-1)));
}

#[test]
fn negative_offset_fails() {
    let err = QueryBuilder::new(Dialect::Postgres)
        .from("users")
        .offset(-5)
        .to_query()
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidOffset(-5)));
}

#[test]
fn sideways_order_direction_fails() {
    let err = QueryBuilder::new(Dialect::Postgres)
        .from("users")
        .order_by("x", "SIDEWAYS")
        .to_query()
        .unwrap_err();
    match err {
        DbError::InvalidOrderDirection(dir) => assert_eq!(dir, "SIDEWAYS"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn order_direction_is_case_normalized() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .from("users")
        .order_by("name", "aSc")
        .to_query()
        .unwrap();
    assert!(q.sql.ends_with("ORDER BY name ASC"));
}

#[test]
fn first_validation_error_wins() {
    let err = QueryBuilder::new(Dialect::Postgres)
        .from("users")
        .limit(-1)
        .offset(-2)
        .to_query()
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidLimit(-1)));
}

#[test]
fn clone_is_independent_of_original() {
    let original = QueryBuilder::new(Dialect::Postgres)
        .from("users")
        .where_clause("status = ?", &[SqlValue::Text("active".into())]);
    let before = original.to_query().unwrap();

    let modified = original
        .clone()
        .and("age > ?", &[SqlValue::Int(18)])
        .to_query()
        .unwrap();
    assert_ne!(before.sql, modified.sql);

    // Mutating the clone left the original's rendering unchanged.
    assert_eq!(original.to_query().unwrap(), before);
}

#[test]
fn reset_clears_all_state_for_reuse() {
    let mut builder = QueryBuilder::new(Dialect::Postgres)
        .select(&["id"])
        .from("users")
        .where_clause("status = ?", &[SqlValue::Text("active".into())])
        .limit(-1);
    builder.reset();
    assert!(builder.values().is_empty());

    let q = builder.from("accounts").to_query().unwrap();
    assert_eq!(q.sql, "SELECT * FROM accounts");
    assert!(q.params.is_empty());
}

#[test]
fn sqlite_and_mysql_placeholder_styles() {
    let sqlite = QueryBuilder::new(Dialect::Sqlite)
        .from("t")
        .where_clause("a = ?", &[SqlValue::Int(1)])
        .and("b = ?", &[SqlValue::Int(2)])
        .to_query()
        .unwrap();
    assert_eq!(sqlite.sql, "SELECT * FROM t WHERE (a = ?1) AND (b = ?2)");

    let mysql = QueryBuilder::new(Dialect::Mysql)
        .from("t")
        .where_clause("a = ?", &[SqlValue::Int(1)])
        .and("b = ?", &[SqlValue::Int(2)])
        .to_query()
        .unwrap();
    assert_eq!(mysql.sql, "SELECT * FROM t WHERE (a = ?) AND (b = ?)");

    let mssql = QueryBuilder::new(Dialect::Mssql)
        .from("t")
        .where_clause("a = ?", &[SqlValue::Int(1)])
        .to_query()
        .unwrap();
    assert_eq!(mssql.sql, "SELECT * FROM t WHERE (a = @p1)");
}

#[test]
fn multibyte_condition_text_is_preserved() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .from("customers")
        .where_clause(
            "name = ? AND city = 'München'",
            &[SqlValue::Text("café".into())],
        )
        .to_query()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT * FROM customers WHERE (name = $1 AND city = 'München')"
    );
}

#[test]
fn condition_without_values_is_not_rewritten() {
    let q = QueryBuilder::new(Dialect::Postgres)
        .from("t")
        .where_clause("deleted_at IS NULL", &[])
        .to_query()
        .unwrap();
    assert_eq!(q.sql, "SELECT * FROM t WHERE (deleted_at IS NULL)");
}
