use varcol_column::Subcolumn;
use varcol_result::Result;
use varcol_types::{get_field_info, DataType, Field};

#[test]
fn defaults_before_first_insert_stay_symbolic() -> Result<()> {
    let mut subcolumn = Subcolumn::new(false);
    subcolumn.insert_default();
    subcolumn.insert_many_defaults(2);
    assert_eq!(subcolumn.size(), 3);
    assert_eq!(subcolumn.defaults_in_prefix(), 3);
    assert_eq!(subcolumn.num_parts(), 0);
    assert_eq!(subcolumn.least_common_type().get(), &DataType::Nothing);

    subcolumn.insert(Field::from(7i64))?;
    assert_eq!(subcolumn.size(), 4);
    assert_eq!(subcolumn.defaults_in_prefix(), 0);
    assert_eq!(subcolumn.num_parts(), 1);
    assert_eq!(subcolumn.field_at(0), Field::Int64(0));
    assert_eq!(subcolumn.field_at(3), Field::Int64(7));
    Ok(())
}

#[test]
fn bare_nulls_take_the_default_path() -> Result<()> {
    let mut subcolumn = Subcolumn::new(true);
    subcolumn.insert(Field::Null)?;
    assert_eq!(subcolumn.num_parts(), 0);
    assert_eq!(subcolumn.defaults_in_prefix(), 1);

    subcolumn.insert(Field::from(1i64))?;
    subcolumn.insert(Field::Null)?;
    assert_eq!(subcolumn.num_parts(), 1);
    assert_eq!(subcolumn.size(), 3);
    assert_eq!(subcolumn.field_at(0), Field::Null);
    assert_eq!(subcolumn.field_at(1), Field::Int64(1));
    assert_eq!(subcolumn.field_at(2), Field::Null);
    Ok(())
}

#[test]
fn conflicting_types_grow_promoted_parts() -> Result<()> {
    let mut subcolumn = Subcolumn::new(false);
    subcolumn.insert(Field::from(1i64))?;
    subcolumn.insert(Field::from(2i64))?;
    assert_eq!(subcolumn.num_parts(), 1);

    subcolumn.insert(Field::from("x"))?;
    assert_eq!(subcolumn.num_parts(), 2);
    assert_eq!(subcolumn.least_common_type().get(), &DataType::String);
    subcolumn.check_types()?;

    // Values stored before the promotion keep their original type.
    assert_eq!(subcolumn.field_at(0), Field::Int64(1));
    assert_eq!(subcolumn.field_at(2), Field::String("x".to_string()));
    Ok(())
}

#[test]
fn compatible_inserts_reuse_the_newest_part() -> Result<()> {
    let mut subcolumn = Subcolumn::new(false);
    subcolumn.insert(Field::from(1i64))?;
    subcolumn.insert(Field::from("x"))?;
    subcolumn.insert(Field::from(9i64))?;
    // The integer coerces into the string part instead of growing another.
    assert_eq!(subcolumn.num_parts(), 2);
    assert_eq!(subcolumn.field_at(2), Field::String("9".to_string()));
    Ok(())
}

#[test]
fn rank_mismatch_is_rejected() -> Result<()> {
    let mut subcolumn = Subcolumn::new(false);
    subcolumn.insert(Field::Array(vec![Field::from(1i64), Field::from(2i64)]))?;
    let err = subcolumn.insert(Field::from(3i64)).unwrap_err();
    assert!(matches!(
        err,
        varcol_result::Error::InvalidArgumentError(_)
    ));
    assert_eq!(subcolumn.size(), 1);
    Ok(())
}

#[test]
fn null_only_arrays_do_not_collapse_into_scalars() -> Result<()> {
    let mut subcolumn = Subcolumn::new(true);
    subcolumn.insert(Field::from(1i64))?;
    // An array of nulls is still an array; its rank conflicts with the
    // scalar column even though its scalar type is undetermined.
    let err = subcolumn
        .insert(Field::Array(vec![Field::Null]))
        .unwrap_err();
    assert!(matches!(
        err,
        varcol_result::Error::InvalidArgumentError(_)
    ));

    // The other way around, empty arrays adopt the column's rank.
    let mut arrays = Subcolumn::new(true);
    arrays.insert(Field::Array(vec![Field::Array(vec![Field::from(1i64)])]))?;
    arrays.insert(Field::Array(Vec::new()))?;
    assert_eq!(arrays.size(), 2);
    assert_eq!(arrays.field_at(1), Field::Array(Vec::new()));
    Ok(())
}

#[test]
fn mixed_scalars_inside_one_array_are_unified() -> Result<()> {
    let mut subcolumn = Subcolumn::new(false);
    subcolumn.insert(Field::Array(vec![Field::from(1i64), Field::from(2.5f64)]))?;
    assert_eq!(
        subcolumn.least_common_type().get(),
        &DataType::array_of(DataType::Float64, 1)
    );
    assert_eq!(
        subcolumn.field_at(0),
        Field::Array(vec![Field::Float64(1.0), Field::Float64(2.5)])
    );
    Ok(())
}

#[test]
fn finalize_collapses_history_and_is_idempotent() -> Result<()> {
    let mut subcolumn = Subcolumn::new(false);
    subcolumn.insert_many_defaults(2);
    subcolumn.insert(Field::from(1i64))?;
    subcolumn.insert(Field::from("x"))?;
    assert!(!subcolumn.is_finalized());

    subcolumn.finalize()?;
    assert!(subcolumn.is_finalized());
    assert_eq!(subcolumn.num_parts(), 1);
    assert_eq!(subcolumn.defaults_in_prefix(), 0);
    assert_eq!(subcolumn.size(), 4);
    assert_eq!(subcolumn.field_at(0), Field::String("0".to_string()));
    assert_eq!(subcolumn.field_at(2), Field::String("1".to_string()));
    assert_eq!(subcolumn.field_at(3), Field::String("x".to_string()));

    let before = subcolumn.field_at(1);
    subcolumn.finalize()?;
    assert_eq!(subcolumn.num_parts(), 1);
    assert_eq!(subcolumn.field_at(1), before);
    Ok(())
}

#[test]
fn finalized_subcolumn_accepts_further_growth() -> Result<()> {
    let mut subcolumn = Subcolumn::new(false);
    subcolumn.insert(Field::from(1i64))?;
    subcolumn.finalize()?;
    assert_eq!(subcolumn.num_parts(), 1);

    subcolumn.insert(Field::from(2i64))?;
    assert_eq!(subcolumn.num_parts(), 1);
    assert!(subcolumn.is_finalized());

    subcolumn.insert(Field::from(0.5f64))?;
    assert_eq!(subcolumn.num_parts(), 2);
    assert!(!subcolumn.is_finalized());
    assert_eq!(subcolumn.least_common_type().get(), &DataType::Float64);
    Ok(())
}

#[test]
fn pop_back_peels_parts_and_prefix() -> Result<()> {
    let mut subcolumn = Subcolumn::new(false);
    subcolumn.insert_many_defaults(2);
    subcolumn.insert(Field::from(1i64))?;
    subcolumn.insert(Field::from("x"))?;
    assert_eq!(subcolumn.size(), 4);
    assert_eq!(subcolumn.num_parts(), 2);

    subcolumn.pop_back(1);
    assert_eq!(subcolumn.size(), 3);
    assert_eq!(subcolumn.num_parts(), 1);
    // The promotion history survives the drop of the newest part.
    assert_eq!(subcolumn.least_common_type().get(), &DataType::String);

    subcolumn.pop_back(3);
    assert_eq!(subcolumn.size(), 0);
    assert_eq!(subcolumn.num_parts(), 0);
    assert_eq!(subcolumn.defaults_in_prefix(), 0);
    Ok(())
}

#[test]
fn get_last_field_reads_the_tail_part() -> Result<()> {
    let mut subcolumn = Subcolumn::new(false);
    assert_eq!(subcolumn.get_last_field(), Field::Null);
    subcolumn.insert_default();
    assert_eq!(subcolumn.get_last_field(), Field::Null);
    subcolumn.insert(Field::from(3i64))?;
    assert_eq!(subcolumn.get_last_field(), Field::Int64(3));
    subcolumn.insert(Field::from("y"))?;
    assert_eq!(subcolumn.get_last_field(), Field::String("y".to_string()));
    Ok(())
}

#[test]
fn insert_range_from_promotes_the_receiver() -> Result<()> {
    let mut src = Subcolumn::new(false);
    src.insert_many_defaults(1);
    src.insert(Field::from(10i64))?;
    src.insert(Field::from("s"))?;

    let mut dst = Subcolumn::new(false);
    dst.insert(Field::from(5i64))?;
    dst.insert_range_from(&src, 0, 3)?;

    assert_eq!(dst.size(), 4);
    assert_eq!(dst.least_common_type().get(), &DataType::String);
    assert_eq!(dst.field_at(0), Field::Int64(5));
    // Row 0 of `src` was a default flushed into the integer part, so it
    // renders as "0" once copied under the promoted type.
    assert_eq!(dst.field_at(1), Field::String("0".to_string()));
    assert_eq!(dst.field_at(2), Field::String("10".to_string()));
    assert_eq!(dst.field_at(3), Field::String("s".to_string()));
    dst.check_types()?;
    Ok(())
}

#[test]
fn insert_range_from_within_the_default_prefix() -> Result<()> {
    let mut src = Subcolumn::new(false);
    src.insert_many_defaults(4);

    let mut dst = Subcolumn::new(false);
    dst.insert_range_from(&src, 1, 2)?;
    assert_eq!(dst.size(), 2);
    assert_eq!(dst.defaults_in_prefix(), 2);
    assert_eq!(dst.num_parts(), 0);
    Ok(())
}

#[test]
fn insert_range_from_rejects_rank_mismatch() -> Result<()> {
    let mut src = Subcolumn::new(false);
    src.insert(Field::Array(vec![Field::from(1i64)]))?;

    let mut dst = Subcolumn::new(false);
    dst.insert(Field::from(1i64))?;
    assert!(dst.insert_range_from(&src, 0, 1).is_err());
    assert_eq!(dst.size(), 1);
    Ok(())
}

#[test]
fn recreate_with_default_values_keeps_array_shapes() -> Result<()> {
    let mut subcolumn = Subcolumn::new(false);
    subcolumn.insert(Field::Array(vec![Field::from(1i64), Field::from(2i64)]))?;
    subcolumn.insert(Field::Array(vec![Field::from(3i64)]))?;

    let info = get_field_info(&Field::Array(vec![Field::from("x")]))?;
    let recreated = subcolumn.recreate_with_default_values(&info)?;
    assert_eq!(recreated.size(), 2);
    assert_eq!(
        recreated.least_common_type().get(),
        &DataType::array_of(DataType::String, 1)
    );
    assert_eq!(
        recreated.field_at(0),
        Field::Array(vec![
            Field::String(String::new()),
            Field::String(String::new())
        ])
    );
    assert_eq!(
        recreated.field_at(1),
        Field::Array(vec![Field::String(String::new())])
    );
    Ok(())
}

#[test]
fn nullable_subcolumns_wrap_every_part() -> Result<()> {
    let mut subcolumn = Subcolumn::new(true);
    subcolumn.insert(Field::from(1i64))?;
    subcolumn.insert(Field::from("x"))?;
    subcolumn.check_types()?;
    assert_eq!(
        subcolumn.least_common_type().get(),
        &DataType::String.wrap_nullable()
    );
    subcolumn.finalize()?;
    assert_eq!(subcolumn.field_at(0), Field::String("1".to_string()));
    Ok(())
}

#[test]
fn arrays_of_nulls_adopt_later_types() -> Result<()> {
    let mut subcolumn = Subcolumn::new(true);
    subcolumn.insert(Field::Array(vec![Field::Null]))?;
    assert_eq!(
        subcolumn.least_common_type().get(),
        &DataType::array_of(DataType::Nothing.wrap_nullable(), 1)
    );

    subcolumn.insert(Field::Array(vec![Field::from(2i64)]))?;
    assert_eq!(subcolumn.num_parts(), 2);
    subcolumn.finalize()?;
    assert_eq!(subcolumn.field_at(0), Field::Array(vec![Field::Null]));
    assert_eq!(
        subcolumn.field_at(1),
        Field::Array(vec![Field::Int64(2)])
    );
    Ok(())
}
