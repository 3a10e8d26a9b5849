use std::fs;

use pim_master::PimError;
use pim_master::config::{EnrichmentConfig, PipelineConfig};
use pim_master::join::JoinKind;
use pim_master::model::Table;
use pim_master::normalize::KeyKind;
use pim_master::pipeline::{self, MasterInputs};
use pim_master::{io, report::CoverageReport};
use tempfile::tempdir;

fn write(dir: &std::path::Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("fixture written");
    path
}

#[test]
fn master_files_write_csv_and_report() {
    let temp_dir = tempdir().expect("temporary directory");
    let dir = temp_dir.path();
    let inputs = MasterInputs {
        entities: write(
            dir,
            "api_entities.csv",
            "upc,itemCode,sku,name,unused\n0123-45,B1,S1,Sofa,\n0000000,,,Chair,\n",
        ),
        storis: write(
            dir,
            "storis_product.csv",
            "UPCNbr,BarCodeNbr,name\n12345,,STORIS sofa\n12345,,late duplicate\n",
        ),
        via_product: write(dir, "via_product.csv", "BarCodeNbr,ItemNumber\n777,X\n"),
        translator: write(
            dir,
            "via_tagging_translator.csv",
            "ItemNumber,FDE SKU,Series ID\nb1,s1,S-1\n",
        ),
    };
    let output = dir.join("master.csv");

    let report = pipeline::build_master_files(&inputs, &output, &PipelineConfig::default())
        .expect("master written");

    assert_eq!(report.total_rows, 2);
    assert!(report.dropped_columns.contains(&"unused".to_string()));
    assert_eq!(report.source("storis").map(|s| s.indicator_hits), Some(1));
    assert_eq!(report.source("via_upc").map(|s| s.indicator_hits), Some(0));

    let written = io::read_table(&output).expect("master read back");
    assert_eq!(written.row_count(), 2);
    assert_eq!(written.column_count(), report.column_count);
    assert_eq!(written.get(0, "name_storis"), Some("STORIS sofa"));
    assert_eq!(written.get(1, "name"), Some("Chair"));
    assert_eq!(written.get(1, "name_storis"), None);
    assert!(!written.has_column("BarCodeNbr_viaUPC"));
    assert_eq!(written.get(0, "Series ID_translatorByFDE"), Some("S-1"));
}

#[test]
fn master_files_reject_missing_input_before_reading() {
    let temp_dir = tempdir().expect("temporary directory");
    let dir = temp_dir.path();
    let entities = write(dir, "entities.csv", "upc\n1\n");
    let inputs = MasterInputs {
        entities: entities.clone(),
        storis: dir.join("absent.csv"),
        via_product: entities.clone(),
        translator: entities,
    };

    let output = dir.join("out.csv");

    let error = pipeline::build_master_files(&inputs, &output, &PipelineConfig::default())
        .expect_err("missing storis export");

    assert!(matches!(error, PimError::MissingInput(path) if path.ends_with("absent.csv")));
    assert!(!output.exists());
}

#[test]
fn csv_reader_keeps_text_and_disambiguates_headers() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = write(
        temp_dir.path(),
        "input.csv",
        "code,name,name,\n007,\"a, b\",x,y,overflow\n1.50,,z\n",
    );

    let table = io::read_table(&path).expect("table read");

    assert_eq!(table.columns(), ["code", "name", "name.1", "Unnamed: 3"]);
    assert_eq!(table.get(0, "code"), Some("007"));
    assert_eq!(table.get(0, "name"), Some("a, b"));
    assert_eq!(table.get(0, "Unnamed: 3"), Some("y"));
    assert_eq!(table.get(1, "code"), Some("1.50"));
    assert_eq!(table.get(1, "name"), None);
    assert_eq!(table.get(1, "Unnamed: 3"), None);
}

#[test]
fn csv_reader_decodes_windows_1252() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("latin.csv");
    fs::write(&path, b"name\ncaf\xe9\n").expect("fixture written");

    let table = io::read_table(&path).expect("table read");

    assert_eq!(table.get(0, "name"), Some("café"));
}

#[test]
fn tsv_and_xlsx_outputs_read_back() {
    let temp_dir = tempdir().expect("temporary directory");
    let table = Table::from_rows(
        ["upc", "name", "note"],
        [vec!["00123", "Sofa", ""], vec!["", "Chair", "tab\there"]],
    );

    for name in ["out.tsv", "out.xlsx"] {
        let path = temp_dir.path().join(name);
        io::write_table(&path, &table).expect("table written");
        let restored = io::read_table(&path).expect("table read");
        assert_eq!(restored, table, "{name} changed the table");
    }
}

#[test]
fn unknown_extension_is_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = write(temp_dir.path(), "data.parquet", "x");

    assert!(matches!(
        io::read_table(&path),
        Err(PimError::UnsupportedFormat(_))
    ));
}

#[test]
fn pipeline_config_parses_yaml_plan() {
    let yaml = r#"
stages:
  - tag: erp
    source: storis
    suffix: _erp
    left_key: { kind: numeric_code, columns: [upc] }
    right_key: { kind: numeric_code, columns: [UPCNbr, BarCodeNbr] }
    indicator: UPCNbr
  - tag: translator
    source: translator
    suffix: _erp
    kind: inner
    left_key: { kind: alphanumeric, columns: [sku] }
    right_key: { kind: alphanumeric, columns: ["FDE SKU"] }
"#;

    let config = PipelineConfig::from_yaml(yaml).expect("plan parsed");

    assert_eq!(config.stages.len(), 2);
    assert_eq!(config.stages[0].kind, JoinKind::Left);
    assert_eq!(config.stages[0].right_key.columns, ["UPCNbr", "BarCodeNbr"]);
    assert_eq!(config.stages[1].kind, JoinKind::Inner);
    assert_eq!(config.stages[1].left_key.kind, KeyKind::Alphanumeric);
    assert_eq!(config.indicators().len(), 1);
}

#[test]
fn pipeline_config_rejects_duplicate_tags_and_empty_keys() {
    let duplicate = r#"
stages:
  - { tag: a, source: s, suffix: _a, left_key: { kind: alphanumeric, columns: [x] }, right_key: { kind: alphanumeric, columns: [y] } }
  - { tag: a, source: s, suffix: _b, left_key: { kind: alphanumeric, columns: [x] }, right_key: { kind: alphanumeric, columns: [y] } }
"#;
    let empty_key = r#"
stages:
  - { tag: a, source: s, suffix: _a, left_key: { kind: alphanumeric, columns: [] }, right_key: { kind: alphanumeric, columns: [y] } }
"#;

    assert!(matches!(
        PipelineConfig::from_yaml(duplicate),
        Err(PimError::InvalidConfig(_))
    ));
    assert!(matches!(
        PipelineConfig::from_yaml(empty_key),
        Err(PimError::InvalidConfig(_))
    ));
    assert!(PipelineConfig::default().validate().is_ok());
}

#[test]
fn bronze_ingest_inner_joins_and_renames() {
    let afi = Table::from_rows(
        ["sku", "itemName", "itemCode", "color"],
        [
            vec!["p-1", "Sofa", "B1", "Grey"],
            vec!["p-2", "Chair", "B2", "Red"],
        ],
    );
    let storis = Table::from_rows(
        ["ProductID", "color", "importDomestic"],
        [vec!["P-1", "Gray", "Import"]],
    );

    let bronze = pipeline::bronze_ingest(&afi, &storis);

    assert_eq!(bronze.row_count(), 1);
    assert_eq!(bronze.column_count(), pipeline::BRONZE_COLUMNS.len());
    assert_eq!(bronze.get(0, "item_name"), Some("Sofa"));
    assert_eq!(bronze.get(0, "color"), Some("Grey"));
    assert_eq!(bronze.get(0, "import_domestic"), Some("Import"));
    assert_eq!(bronze.get(0, "seo_features_and_keywords"), None);
}

#[test]
fn silver_files_clean_named_columns() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = write(
        temp_dir.path(),
        "bronze.csv",
        "name,description_a\n\"  Sofa   ® Deluxe \",Soft & warm!\n",
    );
    let output = temp_dir.path().join("silver.csv");

    let columns = ["name", "description_a", "description_b"];

    let rows = pipeline::silver_files(&input, &output, &columns).expect("silver written");
    let silver = io::read_table(&output).expect("silver read");

    assert_eq!(rows, 1);
    assert_eq!(silver.get(0, "name"), Some("Sofa  Deluxe"));
    assert_eq!(silver.get(0, "description_a"), Some("Soft  warm!"));
    assert!(silver.has_column("description_b"));
    assert_eq!(silver.get(0, "description_b"), None);
}

#[test]
fn gold_files_append_generated_versions() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = write(
        temp_dir.path(),
        "silver.csv",
        "afi_product_description\nA grey sofa\nA red chair\n",
    );
    let output = temp_dir.path().join("gold.csv");
    let yaml = "model: llama3\nprompt_template: \"{desc_a} / {desc_b}\"\n";
    let config = EnrichmentConfig::from_yaml(yaml).expect("config parsed");
    let generator = |desc_a: &str, desc_b: &str| -> pim_master::Result<String> {
        assert_eq!(desc_b, "");
        Ok(format!(
            "Creative: {desc_a}!\nProfessional: {desc_a}.\nGeneral: {desc_a}\nNoise without label"
        ))
    };
    let mut calls = Vec::new();

    let rows = pipeline::gold_files(&input, &output, &config, &generator, |done, total| {
        calls.push((done, total))
    })
    .expect("gold written");
    let gold = io::read_table(&output).expect("gold read");

    assert_eq!(rows, 2);
    assert_eq!(calls, vec![(1, 2), (2, 2)]);
    assert_eq!(gold.get(1, "Creative"), Some("A red chair!"));
    assert_eq!(gold.get(0, "Professional"), Some("A grey sofa."));
    assert_eq!(gold.get(0, "General"), Some("A grey sofa"));
    assert!(gold.has_column("via_product_description"));
}

#[test]
fn coverage_report_serialises_to_json() {
    let report = CoverageReport {
        total_rows: 3,
        column_count: 5,
        dropped_columns: vec!["Empty".into()],
        sources: Vec::new(),
    };

    let json = serde_json::to_value(&report).expect("report serialised");

    assert_eq!(json["total_rows"], 3);
    assert_eq!(json["dropped_columns"][0], "Empty");
    assert!(report.to_string().starts_with("Rows: 3\n"));
}
