use std::collections::BTreeMap;

use boq_sync::logging;
use boq_sync::model::{AttrValue, JsonElement};
use boq_sync::store::{Cell, MemoryWorkbook, Sheet, xlsx};
use boq_sync::{catalog, sync};

fn pipe(id: &str, type_name: &str, diameter: &str) -> JsonElement {
    let mut attributes = BTreeMap::new();
    attributes.insert("Type Name".to_string(), AttrValue::Text(type_name.into()));
    attributes.insert("Diameter".to_string(), AttrValue::Text(diameter.into()));
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

#[test]
fn xlsx_round_trip_preserves_absolute_positions() {
    logging::init_test();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("positions.xlsx");

    let mut workbook = MemoryWorkbook::new();
    {
        let sheet = workbook.ensure_sheet("Pipes");
        // Nothing above row 3; the reader must not shift the rectangle up.
        sheet.write_cell(3, 2, Cell::Text("Type Name".into()));
        sheet.write_cell(5, 4, Cell::Number(110.5));
        sheet.write_cell(7, 1, Cell::Bool(true));
    }
    workbook.ensure_sheet("Notes").write_cell(1, 1, Cell::Text("scratch".into()));

    xlsx::save_workbook(&path, &workbook).expect("workbook saved");
    let restored = xlsx::load_workbook(&path).expect("workbook loaded");

    let names: Vec<&str> = restored.sheet_names().collect();
    assert_eq!(names, vec!["Notes", "Pipes"]);
    let sheet = restored.sheet("Pipes").expect("pipes sheet");
    assert!(sheet.read_cell(1, 1).is_blank());
    assert!(sheet.read_cell(2, 2).is_blank());
    assert_eq!(sheet.read_cell(3, 2).to_text(), "Type Name");
    assert_eq!(sheet.read_cell(5, 4), Cell::Number(110.5));
    assert_eq!(sheet.read_cell(7, 1), Cell::Bool(true));
}

#[test]
fn export_and_import_run_end_to_end_through_files() {
    logging::init_test();
    let dir = tempfile::tempdir().expect("temp dir");
    let workbook_path = dir.path().join("boq.xlsx");
    let elements_path = dir.path().join("elements.json");

    let mut seed = MemoryWorkbook::new();
    seed.ensure_sheet("Pipes");
    xlsx::save_workbook(&workbook_path, &seed).expect("seed workbook saved");

    let elements = vec![pipe("p1", "Steel", "110"), pipe("p2", "PVC", "50")];
    sync::save_elements(&elements_path, &elements).expect("snapshot saved");

    let schemas = catalog::builtin_schemas();
    let pipes = schemas.iter().find(|s| s.name == "pipes").unwrap();

    let summaries =
        sync::export_files(&workbook_path, &elements_path, &[pipes]).expect("export run");
    assert_eq!(summaries[0].appended, 2);

    // A planner fills in product codes before the values travel back.
    let mut workbook = xlsx::load_workbook(&workbook_path).expect("exported workbook");
    {
        let sheet = workbook.sheet_mut("Pipes").expect("pipes sheet");
        sheet.write_cell(3, 5, Cell::Text("Product Code".into()));
        sheet.write_cell(5, 5, Cell::Text("PVC-50".into()));
        sheet.write_cell(6, 5, Cell::Text("STL-110".into()));
    }
    xlsx::save_workbook(&workbook_path, &workbook).expect("workbook rewritten");

    let summaries =
        sync::import_files(&workbook_path, &elements_path, &[pipes]).expect("import run");
    assert_eq!(summaries[0].matched_keys, 2);
    assert_eq!(summaries[0].updated_elements, 2);

    let elements = sync::load_elements(&elements_path).expect("snapshot reloaded");
    let code = |id: &str| {
        elements
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.attributes.get("Product Code"))
            .map(|v| v.to_text())
            .unwrap_or_default()
    };
    assert_eq!(code("p1"), "STL-110");
    assert_eq!(code("p2"), "PVC-50");
}
