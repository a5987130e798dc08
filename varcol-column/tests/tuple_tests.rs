use arrow::array::{Array, Float64Array, Int64Array, ListArray, StringArray};
use varcol_column::{require_reorderable, tuple, Column, ColumnTypeId, ObjectColumn};
use varcol_result::{Error, Result};
use varcol_types::Field;

fn doc(entries: Vec<(&str, Field)>) -> Field {
    Field::object(entries)
}

#[test]
fn finalized_column_materializes_as_a_record_batch() -> Result<()> {
    let mut column = ObjectColumn::new(true);
    column.try_insert(doc(vec![
        ("id", Field::from(1i64)),
        ("name", Field::from("alpha")),
    ]))?;
    column.try_insert(doc(vec![
        ("id", Field::from(2i64)),
        ("score", Field::from(0.5f64)),
    ]))?;

    column.finalize()?;
    let batch = tuple::to_record_batch(&column)?;
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), 3);

    let schema = batch.schema();
    assert_eq!(schema.field(0).name(), "id");
    assert_eq!(schema.field(1).name(), "name");
    assert_eq!(schema.field(2).name(), "score");

    let ids = batch
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(ids.value(0), 1);
    assert_eq!(ids.value(1), 2);

    let names = batch
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(names.value(0), "alpha");
    assert!(names.is_null(1));

    let scores = batch
        .column(2)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert!(scores.is_null(0));
    assert_eq!(scores.value(1), 0.5);
    Ok(())
}

#[test]
fn promoted_subcolumns_materialize_under_the_final_type() -> Result<()> {
    let mut column = ObjectColumn::new(true);
    column.try_insert(doc(vec![("v", Field::from(1i64))]))?;
    column.try_insert(doc(vec![("v", Field::from("x"))]))?;
    column.finalize()?;

    let batch = tuple::to_record_batch(&column)?;
    let values = batch
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(values.value(0), "1");
    assert_eq!(values.value(1), "x");
    Ok(())
}

#[test]
fn arrays_materialize_as_lists() -> Result<()> {
    let mut column = ObjectColumn::new(true);
    column.try_insert(doc(vec![(
        "v",
        Field::Array(vec![Field::from(1i64), Field::from(2i64)]),
    )]))?;
    column.try_insert(doc(vec![("v", Field::Array(vec![Field::from(3i64)]))]))?;
    column.finalize()?;

    let batch = tuple::to_record_batch(&column)?;
    let lists = batch
        .column(0)
        .as_any()
        .downcast_ref::<ListArray>()
        .unwrap();
    assert_eq!(lists.len(), 2);
    let first = lists.value(0);
    let first = first.as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first.value(1), 2);
    let second = lists.value(1);
    let second = second.as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(second.value(0), 3);
    Ok(())
}

#[test]
fn conversion_requires_a_finalized_column() -> Result<()> {
    let mut column = ObjectColumn::new(true);
    column.try_insert(doc(vec![("a", Field::from(1i64))]))?;
    column.try_insert(doc(vec![("a", Field::from("x"))]))?;
    assert!(matches!(
        tuple::to_record_batch(&column),
        Err(Error::InvalidArgumentError(_))
    ));
    Ok(())
}

#[test]
fn empty_column_converts_to_an_empty_batch() -> Result<()> {
    let column = ObjectColumn::new(true);
    let batch = tuple::to_record_batch(&column)?;
    assert_eq!(batch.num_rows(), 0);
    assert_eq!(batch.num_columns(), 0);
    Ok(())
}

#[test]
fn object_columns_expose_the_narrow_surface_only() -> Result<()> {
    let mut column = ObjectColumn::new(true);
    column.try_insert(doc(vec![("a", Field::from(1i64))]))?;

    let dynamic: &dyn Column = &column;
    assert_eq!(dynamic.family_name(), "Variant");
    assert_eq!(dynamic.type_id(), ColumnTypeId::Variant);
    assert_eq!(dynamic.size(), 1);
    assert!(dynamic.as_reorderable().is_none());
    assert!(matches!(
        require_reorderable(dynamic),
        Err(Error::Unsupported(_))
    ));
    Ok(())
}

#[test]
fn narrow_surface_mutators_work_through_dynamic_dispatch() -> Result<()> {
    let mut column = ObjectColumn::new(true);
    column.try_insert(doc(vec![("a", Field::from(1i64))]))?;

    let dynamic: &mut dyn Column = &mut column;
    dynamic.insert_default();
    assert_eq!(dynamic.size(), 2);
    dynamic.pop_back(1);
    assert_eq!(dynamic.size(), 1);

    let resized = dynamic.clone_resized(3);
    assert_eq!(resized.size(), 3);
    let row = resized.field_at(2)?;
    let Field::Object(entries) = row else {
        panic!("expected an object row");
    };
    assert_eq!(entries[0], ("a".to_string(), Field::Null));
    Ok(())
}
