//! End-to-end projection queries against the in-memory backend.

use projql_core::criteria::Comparison;
use projql_core::proto::{filters, FilterOperator, FilterValue, JoinKind, OrderDirection, SelectorKind, Value};
use projql_core::{
    spec_fn, Arguments, Catalog, EntityDef, Error, ErrorCategory, Expr, FieldDef, JoinDeclaration,
    MappingError, Materializer, MemoryBackend, NodeId, Predicate, ProcessorConfig, Projection,
    ProjectionProcessor, ProjectionQuery, RelationDef, Row, ScalarType, SchemaBundle,
    SelectionField, Shape, ShapeKind, ShapeMetadata,
};

fn catalog() -> Catalog {
    let customer = EntityDef::new("Customer", "id")
        .with_field(FieldDef::scalar("id", ScalarType::Int64))
        .with_field(FieldDef::scalar("name", ScalarType::String))
        .with_field(FieldDef::scalar("age", ScalarType::Int32))
        .with_field(FieldDef::scalar("points", ScalarType::Int64))
        .with_field(FieldDef::optional_scalar("address_id", ScalarType::Int64));
    let address = EntityDef::new("Address", "id")
        .with_field(FieldDef::scalar("id", ScalarType::Int64))
        .with_field(FieldDef::scalar("city", ScalarType::String));
    let order = EntityDef::new("Order", "id")
        .with_field(FieldDef::scalar("id", ScalarType::Int64))
        .with_field(FieldDef::optional_scalar("customer_id", ScalarType::Int64))
        .with_field(FieldDef::scalar("total", ScalarType::Int64));

    Catalog::new(
        SchemaBundle::new(1)
            .with_entity(customer)
            .with_entity(address)
            .with_entity(order)
            .with_relation(RelationDef::many_to_one(
                "customer",
                "Order",
                "customer_id",
                "Customer",
                "id",
            ))
            .with_relation(RelationDef::many_to_one(
                "address",
                "Customer",
                "address_id",
                "Address",
                "id",
            ))
            .with_relation(RelationDef::one_to_many(
                "orders",
                "Customer",
                "id",
                "Order",
                "customer_id",
            )),
    )
    .unwrap()
}

fn customer(id: i64, name: &str, age: i32, points: i64, address: Option<i64>) -> Row {
    Row::new()
        .with("id", id)
        .with("name", name)
        .with("age", age)
        .with("points", points)
        .with("address_id", address.map(Value::Int64).unwrap_or(Value::Null))
}

fn order(id: i64, customer: Option<i64>, total: i64) -> Row {
    Row::new()
        .with("id", id)
        .with("customer_id", customer.map(Value::Int64).unwrap_or(Value::Null))
        .with("total", total)
}

fn backend() -> MemoryBackend {
    MemoryBackend::new(catalog())
        .with_records(
            "Customer",
            vec![
                customer(7, "Ann", 10, 5, Some(100)),
                customer(8, "Bob", 10, 7, None),
                customer(9, "Cy", 20, 9, Some(101)),
            ],
        )
        .unwrap()
        .with_records(
            "Address",
            vec![
                Row::new().with("id", 100i64).with("city", "Oslo"),
                Row::new().with("id", 101i64).with("city", "Rome"),
            ],
        )
        .unwrap()
        .with_records(
            "Order",
            vec![
                order(1, Some(7), 50),
                order(2, Some(7), 20),
                order(3, Some(9), 5),
                order(4, None, 1),
            ],
        )
        .unwrap()
}

fn processor() -> ProjectionProcessor<MemoryBackend> {
    ProjectionProcessor::new(backend())
}

#[derive(Debug, PartialEq)]
struct AgeCount {
    count: i64,
    age: i32,
}

impl Projection for AgeCount {
    fn shape() -> Shape<Self> {
        let metadata = ShapeMetadata::new("AgeCount", "Customer", ShapeKind::Constructor)
            .with_field(SelectionField::typed::<i64>("count", "id").with_selector(SelectorKind::COUNT))
            .with_field(SelectionField::typed::<i32>("age", "age"));
        Shape::new(
            metadata,
            Materializer::Constructor {
                construct: |values| {
                    let mut args = Arguments::new(values, 2)?;
                    Ok(AgeCount {
                        count: args.next()?,
                        age: args.next()?,
                    })
                },
            },
        )
    }
}

#[derive(Debug, PartialEq)]
struct CustomerRef {
    id: i64,
    name: String,
}

impl Projection for CustomerRef {
    fn shape() -> Shape<Self> {
        let metadata = ShapeMetadata::new("CustomerRef", "Customer", ShapeKind::Constructor)
            .with_field(SelectionField::typed::<i64>("id", "id"))
            .with_field(SelectionField::typed::<String>("name", "name"));
        Shape::new(
            metadata,
            Materializer::Constructor {
                construct: |values| {
                    let mut args = Arguments::new(values, 2)?;
                    Ok(CustomerRef {
                        id: args.next()?,
                        name: args.next()?,
                    })
                },
            },
        )
    }
}

/// Declares `name` as a string but reads an integer column.
#[derive(Debug)]
struct MisreadRef {
    #[allow(dead_code)]
    id: i64,
    #[allow(dead_code)]
    name: String,
}

impl Projection for MisreadRef {
    fn shape() -> Shape<Self> {
        let metadata = ShapeMetadata::new("MisreadRef", "Customer", ShapeKind::Constructor)
            .with_field(SelectionField::typed::<i64>("id", "id"))
            .with_field(SelectionField::typed::<String>("name", "points"));
        Shape::new(
            metadata,
            Materializer::Constructor {
                construct: |values| {
                    let mut args = Arguments::new(values, 2)?;
                    Ok(MisreadRef {
                        id: args.next()?,
                        name: args.next()?,
                    })
                },
            },
        )
    }
}

fn row_query(metadata: ShapeMetadata) -> ProjectionQuery<Row> {
    ProjectionQuery::with_shape(Row::shape(metadata))
}

fn column(rows: &[Row], name: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
        .collect()
}

fn is_null(path: Expr, _: &FilterValue) -> projql_core::Result<Predicate> {
    Ok(Predicate::IsNull(path))
}

#[test]
fn test_count_by_age() {
    let processor = processor();
    let query = ProjectionQuery::<AgeCount>::new().order("age", OrderDirection::Asc);

    let (_, criteria) = processor.prepare(&query).unwrap();
    assert_eq!(criteria.group_by, vec![Expr::attribute(NodeId::ROOT, "age")]);

    let results = processor.execute(&query).unwrap();
    assert_eq!(
        results,
        vec![AgeCount { count: 2, age: 10 }, AgeCount { count: 1, age: 20 }]
    );
}

#[test]
fn test_constructor_round_trip() {
    let processor = processor();
    let results = processor
        .execute(&ProjectionQuery::<CustomerRef>::new().filter_expr(filters::eq("id", 7i64)))
        .unwrap();
    assert_eq!(
        results,
        vec![CustomerRef {
            id: 7,
            name: "Ann".into()
        }]
    );
    assert_eq!(processor.shapes().len(), 1);
}

#[test]
fn test_constructor_mismatch_diagnostics() {
    let err = processor()
        .execute(&ProjectionQuery::<MisreadRef>::new())
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Mapping);
    match err {
        Error::Mapping(MappingError::ConstructorMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, vec!["i64", "String"]);
            assert_eq!(actual, vec!["i64", "i64"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_alias_and_expanded_path_share_join() {
    let processor = processor();
    let metadata = ShapeMetadata::new("OrderCustomer", "Order", ShapeKind::Fields)
        .with_field(SelectionField::new("id", "id"))
        .with_field(SelectionField::new("customerName", "c.name"))
        .with_join(JoinDeclaration::aliased("c", "customer", JoinKind::Left));
    let query = row_query(metadata)
        .filter_expr(filters::like("customer.name", "A%"))
        .order("id", OrderDirection::Asc);

    let (_, criteria) = processor.prepare(&query).unwrap();
    assert_eq!(criteria.join_count(), 1);

    let rows = processor.execute(&query).unwrap();
    assert_eq!(column(&rows, "id"), vec![Value::Int64(1), Value::Int64(2)]);
    assert_eq!(column(&rows, "customerName"), vec![Value::from("Ann"), Value::from("Ann")]);
}

#[test]
fn test_shared_prefix_is_joined_once() {
    let metadata = ShapeMetadata::new("OrderDetail", "Order", ShapeKind::Fields)
        .with_field(SelectionField::new("name", "customer.name"))
        .with_field(SelectionField::new("age", "customer.age"))
        .with_field(SelectionField::new("city", "customer.address.city"));
    let processor = processor();
    let (_, criteria) = processor.prepare(&row_query(metadata)).unwrap();
    assert_eq!(criteria.join_count(), 2);
}

#[test]
fn test_left_join_kind_is_inherited() {
    let processor = processor();
    let metadata = ShapeMetadata::new("OrderCity", "Order", ShapeKind::Fields)
        .with_field(SelectionField::new("id", "id"))
        .with_field(SelectionField::new("city", "customer.address.city"))
        .with_join(JoinDeclaration::new("customer", JoinKind::Left));
    let query = row_query(metadata).order("id", OrderDirection::Asc);

    let (_, criteria) = processor.prepare(&query).unwrap();
    let kinds: Vec<JoinKind> = criteria
        .nodes()
        .iter()
        .filter_map(|node| node.edge.as_ref().map(|edge| edge.kind))
        .collect();
    assert_eq!(kinds, vec![JoinKind::Left, JoinKind::Left]);

    let rows = processor.execute(&query).unwrap();
    assert_eq!(
        column(&rows, "city"),
        vec![Value::from("Oslo"), Value::from("Oslo"), Value::from("Rome"), Value::Null]
    );
}

#[test]
fn test_default_inner_join_drops_unmatched() {
    let metadata = ShapeMetadata::new("OrderCity", "Order", ShapeKind::Fields)
        .with_field(SelectionField::new("city", "customer.address.city"));
    let rows = processor().execute(&row_query(metadata)).unwrap();
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_identifier_read_through_foreign_key() {
    let processor =
        ProjectionProcessor::new(backend()).with_config(ProcessorConfig::new().with_skip_identifier_joins(true));
    let metadata = ShapeMetadata::new("OrderCustomerId", "Order", ShapeKind::Fields)
        .with_field(SelectionField::new("customerId", "customer.id"))
        .with_join(JoinDeclaration::new("customer", JoinKind::Left));
    let query = row_query(metadata).order("id", OrderDirection::Asc);

    let (_, criteria) = processor.prepare(&query).unwrap();
    assert_eq!(criteria.join_count(), 0);

    let rows = processor.execute(&query).unwrap();
    assert_eq!(
        column(&rows, "customerId"),
        vec![Value::Int64(7), Value::Int64(7), Value::Int64(9), Value::Null]
    );
}

#[test]
fn test_custom_operator_registration() {
    let processor = processor();
    processor.operators().register("is_null", is_null).unwrap();
    assert!(matches!(
        processor.operators().register("IS_NULL", is_null),
        Err(Error::DuplicateOperator(_))
    ));

    let metadata = ShapeMetadata::new("Names", "Customer", ShapeKind::Fields)
        .with_field(SelectionField::new("name", "name"));
    let query = row_query(metadata).filter("address_id", "Is_Null", Value::Null);
    let rows = processor.execute(&query).unwrap();
    assert_eq!(column(&rows, "name"), vec![Value::from("Bob")]);
}

#[test]
fn test_between_requires_range() {
    let processor = processor();
    let err = processor
        .execute(&ProjectionQuery::<CustomerRef>::new().filter("age", FilterOperator::Between, 5))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Resolution);
    assert_eq!(err.to_string(), "BETWEEN operator requires a range value. Provided: 5");

    let results = processor
        .execute(&ProjectionQuery::<CustomerRef>::new().filter_expr(filters::between("age", 15, 25).unwrap()))
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Cy");
}

#[test]
fn test_unknown_operator_is_resolution_error() {
    let err = processor()
        .execute(&ProjectionQuery::<CustomerRef>::new().filter("name", "SOUNDS_LIKE", "Ann"))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownOperator { .. }));
    assert!(err.to_string().contains("available operators"));
}

#[test]
fn test_page_of_results() {
    let processor = processor();
    let page = processor
        .execute_page(
            &ProjectionQuery::<CustomerRef>::new()
                .order("id", OrderDirection::Asc)
                .paging(1, 1),
        )
        .unwrap();
    assert_eq!(page.content, vec![CustomerRef { id: 8, name: "Bob".into() }]);
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.page_number, 1);
    assert_eq!(page.total_pages(), 3);
    assert!(page.has_next());
    assert!(page.has_previous());
}

#[test]
fn test_specification_and_filters_are_combined() {
    let processor = processor();
    let adults = spec_fn(|ctx| Ok(Predicate::compare(ctx.path("age")?, Comparison::Ge, 18)));
    let results = processor
        .execute(&ProjectionQuery::<CustomerRef>::new().specification(adults))
        .unwrap();
    assert_eq!(results, vec![CustomerRef { id: 9, name: "Cy".into() }]);

    let nobody = spec_fn(|ctx| Ok(Predicate::compare(ctx.path("age")?, Comparison::Ge, 18)));
    let results = processor
        .execute(
            &ProjectionQuery::<CustomerRef>::new()
                .specification(nobody)
                .filter_expr(filters::eq("name", "Ann")),
        )
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_compound_filter_over_relation() {
    let metadata = ShapeMetadata::new("OrderIds", "Order", ShapeKind::Fields)
        .with_field(SelectionField::new("id", "id"));
    let query = row_query(metadata)
        .filter_expr(
            filters::or(vec![
                filters::eq("customer.name", "Cy"),
                filters::gt("total", 30i64),
            ])
            .unwrap(),
        )
        .order("id", OrderDirection::Desc);
    let rows = processor().execute(&query).unwrap();
    assert_eq!(column(&rows, "id"), vec![Value::Int64(3), Value::Int64(1)]);
}

#[test]
fn test_aggregate_over_relation() {
    let metadata = ShapeMetadata::new("Spend", "Order", ShapeKind::Fields)
        .with_field(SelectionField::new("name", "customer.name"))
        .with_field(SelectionField::new("spent", "total").with_selector(SelectorKind::SUM))
        .with_field(SelectionField::new("orders", "id").with_selector(SelectorKind::COUNT));
    let query = row_query(metadata).order("customer.name", OrderDirection::Asc);
    let rows = processor().execute(&query).unwrap();
    assert_eq!(column(&rows, "name"), vec![Value::from("Ann"), Value::from("Cy")]);
    assert_eq!(column(&rows, "spent"), vec![Value::Int64(70), Value::Int64(5)]);
    assert_eq!(column(&rows, "orders"), vec![Value::Int64(2), Value::Int64(1)]);

    // orders resolve from the query root like any other path
    let metadata = ShapeMetadata::new("Spend", "Order", ShapeKind::Fields)
        .with_field(SelectionField::new("name", "customer.name"));
    let err = processor()
        .execute(&row_query(metadata).order("name", OrderDirection::Asc))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownAttribute { ref entity, ref attribute } if entity == "Order" && attribute == "name"
    ));
}

#[test]
fn test_execute_shape_and_entity_override() {
    let processor = processor();
    assert_eq!(processor.execute_shape::<CustomerRef>().unwrap().len(), 3);

    let err = processor
        .execute(&ProjectionQuery::<CustomerRef>::for_entity("Supplier"))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownEntity(ref name) if name == "Supplier"));
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn test_alias_cycle_is_configuration_error() {
    let metadata = ShapeMetadata::new("Cyclic", "Order", ShapeKind::Fields)
        .with_field(SelectionField::new("name", "a.name"))
        .with_join(JoinDeclaration::aliased("a", "b.customer", JoinKind::Inner))
        .with_join(JoinDeclaration::aliased("b", "a.orders", JoinKind::Inner));
    let err = processor().execute(&row_query(metadata)).unwrap_err();
    assert!(matches!(err, Error::AliasCycle { .. }));
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn test_distinct_rows() {
    let metadata = ShapeMetadata::new("Ages", "Customer", ShapeKind::Fields)
        .with_field(SelectionField::new("age", "age"));
    let query = row_query(metadata).order("age", OrderDirection::Asc).distinct(true);
    let rows = processor().execute(&query).unwrap();
    assert_eq!(column(&rows, "age"), vec![Value::Int32(10), Value::Int32(20)]);
}
