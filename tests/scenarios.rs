use querysift::{
    FilterDefinition, FilterEngine, FilterRegistry, FilterRequest, Operator, Predicate,
    PredicateGroup, QueryBuilder, QueryError, SortDirection, Stage,
};
use serde_json::{Value, json};

/// Fake collaborator recording everything the engine applies, in order.
#[derive(Debug, Default)]
struct RecordingQuery {
    predicates: Vec<Predicate>,
    groups: Vec<PredicateGroup>,
    orderings: Vec<(String, SortDirection)>,
    joins: Vec<String>,
}

impl QueryBuilder for RecordingQuery {
    fn add_predicate(&mut self, predicate: Predicate) -> Result<(), QueryError> {
        self.predicates.push(predicate);
        Ok(())
    }

    fn add_predicate_group(&mut self, group: PredicateGroup) -> Result<(), QueryError> {
        self.groups.push(group);
        Ok(())
    }

    fn add_ordering(&mut self, column: &str, direction: SortDirection) -> Result<(), QueryError> {
        self.orderings.push((column.to_string(), direction));
        Ok(())
    }

    fn joined_tables(&self) -> Vec<String> {
        self.joins.clone()
    }
}

fn request(value: Value) -> FilterRequest {
    match value {
        Value::Object(map) => map,
        other => panic!("request fixtures are json objects, got {other}"),
    }
}

fn run(definition: &FilterDefinition<RecordingQuery>, request: &FilterRequest) -> RecordingQuery {
    FilterEngine::new(RecordingQuery::default(), definition, request).finish()
}

#[test]
fn filter_and_multi_key_sort() {
    let definition = FilterDefinition::new()
        .filterable(["name"])
        .sortable(["age", "name"]);
    let query = run(&definition, &request(json!({"name": "john", "sort": "-age,name"})));

    assert_eq!(
        query.predicates,
        vec![Predicate::contains("name", "john")]
    );
    assert_eq!(
        query.orderings,
        vec![
            ("age".to_string(), SortDirection::Desc),
            ("name".to_string(), SortDirection::Asc),
        ]
    );
}

#[test]
fn default_sort_applies_on_empty_request() {
    let definition = FilterDefinition::new().sortable(["id"]).default_sort("id");
    let query = run(&definition, &request(json!({})));

    assert!(query.predicates.is_empty());
    assert_eq!(query.orderings, vec![("id".to_string(), SortDirection::Asc)]);
}

#[test]
fn engine_default_sort_overrides_definition() {
    let definition = FilterDefinition::new()
        .sortable(["id", "name"])
        .default_sort("id");
    let request = request(json!({}));
    let engine = FilterEngine::new(RecordingQuery::default(), &definition, &request)
        .with_default_sort("-name");
    let query = engine.finish();

    assert_eq!(
        query.orderings,
        vec![("name".to_string(), SortDirection::Desc)]
    );
}

#[test]
fn no_sort_sentinel_keeps_only_the_mandatory_clause() {
    let definition = FilterDefinition::new()
        .sortable(["age"])
        .default_sort("age")
        .mandatory_sort("id", SortDirection::Asc);
    let query = run(&definition, &request(json!({"sort": "NO_SORT"})));

    assert_eq!(query.orderings, vec![("id".to_string(), SortDirection::Asc)]);
}

#[test]
fn mandatory_clause_is_always_last() {
    let definition = FilterDefinition::new()
        .sortable(["age", "id"])
        .mandatory_sort("id", SortDirection::Desc);
    let query = run(&definition, &request(json!({"sort": "id,-age"})));

    assert_eq!(
        query.orderings,
        vec![
            ("id".to_string(), SortDirection::Asc),
            ("age".to_string(), SortDirection::Desc),
            // appended even though it duplicates an explicit clause
            ("id".to_string(), SortDirection::Desc),
        ]
    );
}

#[test]
fn filtering_by_alias_matches_filtering_by_column() {
    let definition = FilterDefinition::new()
        .filterable(["email"])
        .alias("mail", "email");

    let by_alias = run(&definition, &request(json!({"mail": "x@y.com"})));
    let by_column = run(&definition, &request(json!({"email": "x@y.com"})));

    assert_eq!(by_alias.predicates, vec![Predicate::contains("email", "x@y.com")]);
    assert_eq!(by_alias.predicates, by_column.predicates);
}

#[test]
fn sort_alias_resolves_before_eligibility() {
    let definition = FilterDefinition::new()
        .sortable(["created_at"])
        .alias("created", "created_at");
    let query = run(&definition, &request(json!({"sort": "-created"})));

    assert_eq!(
        query.orderings,
        vec![("created_at".to_string(), SortDirection::Desc)]
    );
}

#[test]
fn undeclared_keys_leave_the_query_unchanged() {
    let definition = FilterDefinition::new().filterable(["name"]);
    let query = run(
        &definition,
        &request(json!({"password": "hunter2", "name": "jo"})),
    );

    assert_eq!(query.predicates, vec![Predicate::contains("name", "jo")]);
    assert!(query.groups.is_empty());
    assert!(query.orderings.is_empty());
}

#[test]
fn sort_key_is_excluded_from_filtering() {
    let definition = FilterDefinition::new().filterable(["sort", "name"]);
    let query = run(&definition, &request(json!({"sort": "name"})));

    assert!(query.predicates.is_empty());
    assert_eq!(query.orderings.len(), 0);
}

#[test]
fn sort_override_replaces_generic_ordering() {
    let definition = FilterDefinition::new()
        .sortable(["priority"])
        .on_sort("priority", |query: &mut RecordingQuery, direction| {
            query.add_ordering("priority_rank", direction)?;
            Ok(())
        });
    let query = run(&definition, &request(json!({"sort": "priority"})));

    assert_eq!(
        query.orderings,
        vec![("priority_rank".to_string(), SortDirection::Asc)]
    );
}

#[test]
fn qualified_sort_tokens_are_stripped_before_eligibility() {
    let definition = FilterDefinition::new().sortable(["name"]);
    let query = run(&definition, &request(json!({"sort": "users.name,name!"})));

    // `users.name` collapses to `usersname` (not sortable); `name!` to `name`
    assert_eq!(
        query.orderings,
        vec![("name".to_string(), SortDirection::Asc)]
    );
}

#[test]
fn failing_segment_does_not_block_later_segments() {
    let definition = FilterDefinition::new()
        .sortable(["age"])
        .on_sort("broken", |_query, _direction| anyhow::bail!("no index"))
        .mandatory_sort("id", SortDirection::Asc);

    let request = request(json!({"sort": "broken,-age"}));
    let engine = FilterEngine::new(RecordingQuery::default(), &definition, &request);
    let (query, diagnostics) = engine.finish_with_diagnostics();

    assert_eq!(
        query.orderings,
        vec![
            ("age".to_string(), SortDirection::Desc),
            ("id".to_string(), SortDirection::Asc),
        ]
    );
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].stage, Stage::Sort);
    assert_eq!(diagnostics[0].field, "broken");
}

#[test]
fn failing_filter_field_does_not_block_later_fields() {
    let definition = FilterDefinition::new()
        .filterable(["name", "status"])
        .on_filter("status", |_query, _value| anyhow::bail!("bad status"));

    let request = request(json!({"status": "zzz", "name": "jo"}));
    let engine = FilterEngine::new(RecordingQuery::default(), &definition, &request);
    let (query, diagnostics) = engine.finish_with_diagnostics();

    assert_eq!(query.predicates, vec![Predicate::contains("name", "jo")]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].field, "status");
}

#[test]
fn structured_value_on_a_generic_field_is_skipped() {
    let definition = FilterDefinition::new().filterable(["name", "age"]);
    let request = request(json!({"name": {"nested": true}, "age": 30}));
    let engine = FilterEngine::new(RecordingQuery::default(), &definition, &request);
    let (query, diagnostics) = engine.finish_with_diagnostics();

    // numbers stringify; structured values fail and are isolated
    assert_eq!(query.predicates, vec![Predicate::contains("age", "30")]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].field, "name");
}

#[test]
fn search_key_builds_one_or_group_over_filterable_columns() {
    let definition = FilterDefinition::new()
        .filterable(["name", "email"])
        .search_key("q");
    let query = run(&definition, &request(json!({"q": "jo"})));

    assert!(query.predicates.is_empty());
    assert_eq!(query.groups.len(), 1);
    assert_eq!(
        query.groups[0].predicates(),
        &[
            Predicate::contains("name", "jo"),
            Predicate::contains("email", "jo"),
        ]
    );
}

#[test]
fn initial_hook_runs_before_request_fields() {
    let definition = FilterDefinition::new()
        .filterable(["name"])
        .initial(|query: &mut RecordingQuery| {
            query.add_predicate(Predicate::new("deleted", Operator::Eq, json!(false)))?;
            Ok(())
        });
    let query = run(&definition, &request(json!({"name": "jo"})));

    assert_eq!(query.predicates.len(), 2);
    assert_eq!(query.predicates[0].column, "deleted");
    assert_eq!(query.predicates[1].column, "name");
}

#[test]
fn join_guard_matches_exact_table_names() {
    let mut query = RecordingQuery::default();
    query.joins.push("roles".to_string());

    assert!(query.is_joined("roles"));
    assert!(!query.is_joined("role"));
}

#[test]
fn registry_resolves_and_applies_by_subject() {
    let registry = FilterRegistry::new().register(
        "users",
        FilterDefinition::new()
            .filterable(["name"])
            .mandatory_sort("id", SortDirection::Asc),
    );

    let query = registry
        .apply("users", RecordingQuery::default(), &request(json!({"name": "jo"})))
        .expect("subject is registered");
    assert_eq!(query.predicates, vec![Predicate::contains("name", "jo")]);
    assert_eq!(query.orderings, vec![("id".to_string(), SortDirection::Asc)]);

    let err = registry
        .apply("ghosts", RecordingQuery::default(), &request(json!({})))
        .unwrap_err();
    assert!(err.to_string().contains("ghosts"));
}
