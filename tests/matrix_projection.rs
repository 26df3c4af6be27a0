use asistencia_core::db::open_db_in_memory;
use asistencia_core::{
    IncidenceStore, MatrixCell, MatrixProjector, NewIncidence, SqliteIncidenceStore, StateCatalog,
    StateCode, TargetIdentity,
};
use chrono::NaiveDate;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn saturday_cell_materializes_rest_state_exactly_once() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteIncidenceStore::try_new(&conn).unwrap();
    let catalog = StateCatalog::standard();
    let projector = MatrixProjector::new(&store, &catalog);

    let targets = vec![TargetIdentity::from_name("Ana Pérez")];
    let dates = vec![date(2024, 6, 15)]; // Saturday

    let first = projector.project(&targets, &dates, "D-1").unwrap();
    let first_record = match &first.rows[0].cells[0] {
        MatrixCell::Recorded { record } => record.clone(),
        MatrixCell::NotRecorded => panic!("weekend cell should show the rest state"),
    };
    assert_eq!(first_record.state, catalog.rest_day().clone());

    let second = projector.project(&targets, &dates, "D-1").unwrap();
    match &second.rows[0].cells[0] {
        MatrixCell::Recorded { record } => {
            assert_eq!(record.id, first_record.id);
            assert_eq!(record.state, first_record.state);
        }
        MatrixCell::NotRecorded => panic!("materialized cell should stay recorded"),
    }

    // Exactly one row exists for the cell.
    assert_eq!(
        store
            .count_existing("D-1", date(2024, 6, 15), date(2024, 6, 15))
            .unwrap(),
        1
    );
}

#[test]
fn sunday_cell_also_gets_the_rest_state() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteIncidenceStore::try_new(&conn).unwrap();
    let catalog = StateCatalog::standard();
    let projector = MatrixProjector::new(&store, &catalog);

    let targets = vec![TargetIdentity::from_name("Ana Pérez")];
    let dates = vec![date(2024, 6, 16)]; // Sunday

    let matrix = projector.project(&targets, &dates, "D-1").unwrap();
    match &matrix.rows[0].cells[0] {
        MatrixCell::Recorded { record } => assert_eq!(record.state, catalog.rest_day().clone()),
        MatrixCell::NotRecorded => panic!("weekend cell should show the rest state"),
    }
}

#[test]
fn weekday_cell_shows_sentinel_first_then_the_materialized_present_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteIncidenceStore::try_new(&conn).unwrap();
    let catalog = StateCatalog::standard();
    let projector = MatrixProjector::new(&store, &catalog);

    let targets = vec![TargetIdentity::from_name("Ana Pérez")];
    let dates = vec![date(2024, 6, 12)]; // Wednesday

    let first = projector.project(&targets, &dates, "D-1").unwrap();
    assert_eq!(first.rows[0].cells[0], MatrixCell::NotRecorded);

    // The default-present record was materialized behind the sentinel.
    let stored = store
        .find_by_key("Ana Pérez", date(2024, 6, 12))
        .unwrap()
        .unwrap();
    assert_eq!(stored.state, catalog.default_present().clone());

    let second = projector.project(&targets, &dates, "D-1").unwrap();
    match &second.rows[0].cells[0] {
        MatrixCell::Recorded { record } => assert_eq!(record.id, stored.id),
        MatrixCell::NotRecorded => panic!("second projection should show the record"),
    }
}

#[test]
fn projection_never_clobbers_an_edited_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteIncidenceStore::try_new(&conn).unwrap();
    let catalog = StateCatalog::standard();
    let projector = MatrixProjector::new(&store, &catalog);

    store
        .insert_if_absent(&NewIncidence {
            target_key: "Ana Pérez".to_string(),
            display_name: "Ana Pérez".to_string(),
            date: date(2024, 6, 15), // Saturday, but hand-edited to vacation
            state: StateCode::new("V"),
            area_code: "D-1".to_string(),
        })
        .unwrap();

    let targets = vec![TargetIdentity::from_name("Ana Pérez")];
    let matrix = projector
        .project(&targets, &[date(2024, 6, 15)], "D-1")
        .unwrap();

    match &matrix.rows[0].cells[0] {
        MatrixCell::Recorded { record } => assert_eq!(record.state, StateCode::new("V")),
        MatrixCell::NotRecorded => panic!("edited cell should stay recorded"),
    }
}

#[test]
fn matrix_axes_are_dense_and_ordered() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteIncidenceStore::try_new(&conn).unwrap();
    let catalog = StateCatalog::standard();
    let projector = MatrixProjector::new(&store, &catalog);

    let targets = vec![
        TargetIdentity::from_name("Ana Pérez"),
        TargetIdentity::from_name("Luis Soto"),
    ];
    let dates: Vec<NaiveDate> = (10..=16).map(|day| date(2024, 6, day)).collect();

    let matrix = projector.project(&targets, &dates, "D-1").unwrap();
    assert_eq!(matrix.dates, dates);
    assert_eq!(matrix.rows.len(), 2);
    for row in &matrix.rows {
        assert_eq!(row.cells.len(), dates.len());
    }
}

#[test]
fn empty_axes_produce_an_empty_matrix_without_writes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteIncidenceStore::try_new(&conn).unwrap();
    let catalog = StateCatalog::standard();
    let projector = MatrixProjector::new(&store, &catalog);

    let matrix = projector.project(&[], &[date(2024, 6, 12)], "D-1").unwrap();
    assert!(matrix.rows.is_empty());

    assert_eq!(
        store
            .count_existing("D-1", date(2024, 6, 1), date(2024, 6, 30))
            .unwrap(),
        0
    );
}
