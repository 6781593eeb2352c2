//! The shipped schema catalog.
//!
//! One [`SchemaConfig`] per synchronized category, replacing what used to be
//! a near-identical code block per category. A custom catalog file with the
//! same JSON shape can replace the built-in set at invocation time.

use std::fs;
use std::path::Path;

use crate::error::{Result, SyncError};
use crate::key::{NumberPolicy, UnitRule};
use crate::model::ElementFilter;
use crate::schema::{ColumnSpec, SchemaConfig, ValueColumn};

/// Glyph/suffix stripping for sizes typed as text ("Ø110 mm").
const STRIPPED: NumberPolicy = NumberPolicy {
    strip_units: true,
    unit: UnitRule::None,
};

/// Host-internal lengths exported in millimetres.
const FEET_MM: NumberPolicy = NumberPolicy {
    strip_units: false,
    unit: UnitRule::FeetToMillimetres,
};

fn value_columns() -> Vec<ValueColumn> {
    vec![
        ValueColumn::new(
            "Product Code",
            &["ProductCode", "MAN_ProductCode"],
            "Product Code",
        ),
        ValueColumn::new("BoQ Units", &["BoQ_Units", "MAN_BoQ_Units"], "BoQ Units"),
    ]
}

fn description_column() -> ColumnSpec {
    let mut spec = ColumnSpec::display("Type Description", Some("Type Description"));
    spec.fallback_attributes = vec!["Description".to_string()];
    spec.memoize_by_type = true;
    spec
}

fn category_column() -> ColumnSpec {
    ColumnSpec::display("Category", None)
}

fn type_name_key() -> ColumnSpec {
    ColumnSpec::text_key("Type Name", "Type Name").with_synonyms(&["Type", "TypeName"])
}

fn family_name_key() -> ColumnSpec {
    ColumnSpec::text_key("Family Name", "Family Name").with_synonyms(&["Family", "FamilyName"])
}

/// Builds the default category set.
pub fn builtin_schemas() -> Vec<SchemaConfig> {
    vec![
        SchemaConfig {
            name: "pipes".into(),
            sheet: "Pipes".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter::for_category("Pipes"),
            columns: vec![
                category_column(),
                type_name_key(),
                description_column(),
                ColumnSpec::number_key("Diameter", "Diameter", STRIPPED),
            ],
            value_columns: value_columns(),
        },
        SchemaConfig {
            name: "pipe-insulation".into(),
            sheet: "Pipe Insulation".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter::for_category("Pipe Insulation"),
            columns: vec![
                category_column(),
                type_name_key(),
                description_column(),
                ColumnSpec::number_key("Insulation Thickness", "Insulation Thickness", STRIPPED),
                ColumnSpec::number_key("Pipe Size", "Pipe Size", STRIPPED),
            ],
            value_columns: value_columns(),
        },
        SchemaConfig {
            name: "pipe-fittings".into(),
            sheet: "Pipe Fittings".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter::for_category("Pipe Fittings"),
            columns: vec![
                category_column(),
                family_name_key(),
                type_name_key(),
                description_column(),
                ColumnSpec::number_key("Max Size", "Max Size", STRIPPED)
                    .with_synonyms(&["MaxSize", "Max Size mm", "MAN_Fittings_MaxSize"]),
            ],
            value_columns: value_columns(),
        },
        SchemaConfig {
            name: "ducts".into(),
            sheet: "Ducts".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter::for_category("Ducts"),
            columns: vec![
                category_column(),
                type_name_key(),
                description_column(),
                ColumnSpec::number_key("Width", "Width", FEET_MM),
                ColumnSpec::number_key("Height", "Height", FEET_MM),
            ],
            value_columns: value_columns(),
        },
        SchemaConfig {
            name: "duct-insulation".into(),
            sheet: "Duct Insulation".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter::for_category("Duct Insulation"),
            columns: vec![
                category_column(),
                type_name_key(),
                description_column(),
                ColumnSpec::number_key("Insulation Thickness", "Insulation Thickness", FEET_MM),
            ],
            value_columns: value_columns(),
        },
        SchemaConfig {
            name: "duct-fittings".into(),
            sheet: "Duct Fittings".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter::for_category("Duct Fittings"),
            columns: vec![
                category_column(),
                family_name_key(),
                type_name_key(),
                description_column(),
                ColumnSpec::number_key("Max Size", "Max Size", STRIPPED)
                    .with_synonyms(&["MaxSize", "Max Size mm", "MAN_Fittings_MaxSize"]),
            ],
            value_columns: value_columns(),
        },
        SchemaConfig {
            name: "flex-ducts".into(),
            sheet: "Flex Ducts".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter::for_category("Flex Ducts"),
            columns: vec![
                category_column(),
                type_name_key(),
                description_column(),
                ColumnSpec::number_key("Diameter", "Diameter", FEET_MM)
                    .with_synonyms(&["Width/Height - Diameter"]),
            ],
            value_columns: value_columns(),
        },
        SchemaConfig {
            name: "mechanical-equipment".into(),
            sheet: "Mechanical Equipment".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter::for_category("Mechanical Equipment"),
            columns: vec![
                category_column(),
                family_name_key(),
                type_name_key(),
                description_column(),
                ColumnSpec::text_key("Type Code", "Type Code")
                    .with_synonyms(&["MAN_Type_Code", "TypeCode"]),
            ],
            value_columns: value_columns(),
        },
        SchemaConfig {
            name: "cable-trays".into(),
            sheet: "Cable Trays".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter::for_category("Cable Trays"),
            columns: vec![
                category_column(),
                type_name_key(),
                description_column(),
                ColumnSpec::number_key("Height", "Height", FEET_MM)
                    .with_synonyms(&["Height mm"]),
            ],
            value_columns: value_columns(),
        },
        SchemaConfig {
            name: "conduits".into(),
            sheet: "Conduits".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter {
                include_contains: vec!["ThermoCable".into(), "AirSampling".into()],
                ..ElementFilter::for_category("Conduits")
            },
            columns: vec![
                category_column(),
                type_name_key(),
                ColumnSpec::number_key("Outside Diameter", "Outside Diameter", FEET_MM)
                    .with_synonyms(&["OutsideDiameter", "Outside Dia", "OD", "OD mm"]),
            ],
            value_columns: value_columns(),
        },
        SchemaConfig {
            name: "general".into(),
            sheet: "General".into(),
            header_row: 3,
            min_data_row: 5,
            empty_run_stop: 20,
            filter: ElementFilter {
                categories: vec![
                    "Communication Devices".into(),
                    "Data Devices".into(),
                    "Fire Alarm Devices".into(),
                    "Security Devices".into(),
                    "Nurse Call Devices".into(),
                    "Electrical Equipment".into(),
                ],
                ..ElementFilter::default()
            },
            columns: vec![
                category_column(),
                family_name_key(),
                type_name_key(),
                description_column(),
            ],
            value_columns: value_columns(),
        },
    ]
}

/// Loads a catalog file with the same shape as the built-in set.
pub fn load_catalog(path: &Path) -> Result<Vec<SchemaConfig>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Picks the schemas a run selected, by name or all of them.
pub fn select<'a>(
    catalog: &'a [SchemaConfig],
    names: &[String],
    all: bool,
) -> Result<Vec<&'a SchemaConfig>> {
    if all {
        return Ok(catalog.iter().collect());
    }
    names
        .iter()
        .map(|name| {
            catalog
                .iter()
                .find(|schema| &schema.name == name)
                .ok_or_else(|| SyncError::UnknownSchema(name.clone()))
        })
        .collect()
}
