use std::collections::BTreeMap;

use boq_sync::key::NumberPolicy;
use boq_sync::model::{AttrValue, JsonElement};
use boq_sync::schema::{ColumnSpec, SchemaConfig, ValueColumn};
use boq_sync::store::{Cell, MemoryWorkbook, Sheet};
use boq_sync::sync::run_export_passes;
use boq_sync::{catalog, logging};

fn pipe_schema() -> SchemaConfig {
    catalog::builtin_schemas()
        .into_iter()
        .find(|schema| schema.name == "pipes")
        .expect("pipes schema in catalog")
}

fn pipe(id: &str, type_name: &str, diameter: &str, description: &str) -> JsonElement {
    let mut attributes = BTreeMap::new();
    attributes.insert("Type Name".to_string(), AttrValue::Text(type_name.into()));
    attributes.insert("Diameter".to_string(), AttrValue::Text(diameter.into()));
    if !description.is_empty() {
        attributes.insert(
            "Type Description".to_string(),
            AttrValue::Text(description.into()),
        );
    }
    attributes.insert("Product Code".to_string(), AttrValue::Text(String::new()));
    attributes.insert("BoQ Units".to_string(), AttrValue::Text(String::new()));
    JsonElement {
        id: id.to_string(),
        category: "Pipes".to_string(),
        type_id: Some(type_name.to_string()),
        attributes,
        read_only: Default::default(),
    }
}

fn data_rows(workbook: &MemoryWorkbook) -> Vec<(String, String)> {
    let sheet = workbook.sheet("Pipes").expect("pipes sheet");
    let mut rows = Vec::new();
    for row in 5..40 {
        let name = sheet.read_cell(row, 2).to_text();
        let diameter = sheet.read_cell(row, 4).to_text();
        if name.is_empty() && diameter.is_empty() {
            continue;
        }
        rows.push((name, diameter));
    }
    rows
}

#[test]
fn export_populates_an_empty_workbook() {
    logging::init_test();
    let schema = pipe_schema();
    let mut workbook = MemoryWorkbook::new();
    let elements = vec![
        pipe("p1", "Steel", "110", "welded steel"),
        pipe("p2", "PVC", "50,0", "pvc-u"),
    ];

    let summaries = run_export_passes(&mut workbook, &[&schema], &elements, None);

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].appended, 2);
    assert_eq!(summaries[0].deleted, 0);
    assert!(summaries[0].skipped.is_none());

    let sheet = workbook.sheet("Pipes").expect("sheet created");
    // Headers on row 3, data from row 5.
    assert_eq!(sheet.read_cell(3, 1).to_text(), "Category");
    assert_eq!(sheet.read_cell(3, 2).to_text(), "Type Name");
    assert_eq!(sheet.read_cell(3, 4).to_text(), "Diameter");
    assert!(sheet.read_cell(4, 2).is_blank());

    // Sorted by type name; numeric cells written as numbers.
    assert_eq!(sheet.read_cell(5, 2).to_text(), "PVC");
    assert_eq!(sheet.read_cell(5, 4), Cell::Number(50.0));
    assert_eq!(sheet.read_cell(6, 2).to_text(), "Steel");
    assert_eq!(sheet.read_cell(6, 1).to_text(), "Pipes");
    assert_eq!(sheet.read_cell(6, 3).to_text(), "welded steel");
}

#[test]
fn second_run_with_unchanged_elements_is_idempotent() {
    logging::init_test();
    let schema = pipe_schema();
    let mut workbook = MemoryWorkbook::new();
    let elements = vec![
        pipe("p1", "Steel", "110", "welded steel"),
        pipe("p2", "PVC", "50", ""),
        pipe("p3", "Copper", "22", ""),
    ];

    run_export_passes(&mut workbook, &[&schema], &elements, None);
    let before = data_rows(&workbook);
    let summaries = run_export_passes(&mut workbook, &[&schema], &elements, None);

    assert_eq!(summaries[0].updated, 3);
    assert_eq!(summaries[0].appended, 0);
    assert_eq!(summaries[0].deleted, 0);
    assert_eq!(data_rows(&workbook), before);
}

#[test]
fn vanished_and_new_keys_produce_exact_operations() {
    logging::init_test();
    let schema = pipe_schema();
    let mut workbook = MemoryWorkbook::new();

    let initial = vec![pipe("p1", "A", "10", ""), pipe("p2", "B", "20", "")];
    run_export_passes(&mut workbook, &[&schema], &initial, None);

    let current = vec![pipe("p1", "A", "10", ""), pipe("p3", "C", "30", "")];
    let summaries = run_export_passes(&mut workbook, &[&schema], &current, None);

    assert_eq!(summaries[0].updated, 1);
    assert_eq!(summaries[0].deleted, 1);
    assert_eq!(summaries[0].appended, 1);

    // Final row count equals the fresh set's cardinality, keys A and C.
    let rows = data_rows(&workbook);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, "A");
    assert_eq!(rows[1].0, "C");
}

#[test]
fn elements_sharing_a_key_collapse_into_one_record() {
    logging::init_test();
    let schema = pipe_schema();
    let mut workbook = MemoryWorkbook::new();
    // Same type and diameter; only the second carries a description, which
    // backfills the record.
    let elements = vec![
        pipe("p1", "Steel", "110", ""),
        pipe("p2", "Steel", "110.0", "welded steel"),
    ];

    let summaries = run_export_passes(&mut workbook, &[&schema], &elements, None);

    assert_eq!(summaries[0].records, 1);
    assert_eq!(summaries[0].appended, 1);
    let sheet = workbook.sheet("Pipes").expect("sheet");
    assert_eq!(sheet.read_cell(5, 3).to_text(), "welded steel");
}

#[test]
fn value_columns_survive_updates() {
    logging::init_test();
    let schema = pipe_schema();
    let mut workbook = MemoryWorkbook::new();
    let elements = vec![pipe("p1", "Steel", "110", "")];
    run_export_passes(&mut workbook, &[&schema], &elements, None);

    // A hand-maintained product code next to the exported columns.
    {
        let sheet = workbook.sheet_mut("Pipes").expect("sheet");
        sheet.write_cell(3, 5, Cell::Text("Product Code".into()));
        sheet.write_cell(5, 5, Cell::Text("STL-110".into()));
    }

    let summaries = run_export_passes(&mut workbook, &[&schema], &elements, None);

    assert_eq!(summaries[0].updated, 1);
    let sheet = workbook.sheet("Pipes").expect("sheet");
    assert_eq!(sheet.read_cell(5, 5).to_text(), "STL-110");
}

#[test]
fn filtered_out_elements_do_not_reach_the_sheet() {
    logging::init_test();
    let schema = pipe_schema();
    let mut workbook = MemoryWorkbook::new();
    let mut duct = pipe("d1", "Rect", "200", "");
    duct.category = "Ducts".to_string();
    let elements = vec![pipe("p1", "Steel", "110", ""), duct];

    let summaries = run_export_passes(&mut workbook, &[&schema], &elements, None);

    assert_eq!(summaries[0].records, 1);
    assert_eq!(data_rows(&workbook).len(), 1);
}

#[test]
fn existing_headers_are_reused_wherever_they_sit() {
    logging::init_test();
    let mut schema = pipe_schema();
    schema.columns = vec![
        ColumnSpec::display("Category", None),
        ColumnSpec::text_key("Type Name", "Type Name"),
        ColumnSpec::number_key("Diameter", "Diameter", NumberPolicy::default()),
    ];
    schema.value_columns = vec![ValueColumn::new("Product Code", &[], "Product Code")];

    let mut workbook = MemoryWorkbook::new();
    {
        let sheet = workbook.ensure_sheet("Pipes");
        // Pre-existing layout with Diameter ahead of Type Name.
        sheet.write_cell(3, 1, Cell::Text("Diameter".into()));
        sheet.write_cell(3, 2, Cell::Text("Type Name".into()));
    }

    let elements = vec![pipe("p1", "Steel", "110", "")];
    run_export_passes(&mut workbook, &[&schema], &elements, None);

    let sheet = workbook.sheet("Pipes").expect("sheet");
    assert_eq!(sheet.read_cell(5, 1), Cell::Number(110.0));
    assert_eq!(sheet.read_cell(5, 2).to_text(), "Steel");
    // The missing Category header was appended after the last used one.
    assert_eq!(sheet.read_cell(3, 3).to_text(), "Category");
}
