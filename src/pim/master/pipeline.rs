use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::pim::master::clean::silver_transform;
use crate::pim::master::config::{
    EnrichmentConfig, PipelineConfig, STORIS_SOURCE, TRANSLATOR_SOURCE, VIA_PRODUCT_SOURCE,
};
use crate::pim::master::dedup::LookupTable;
use crate::pim::master::enrich::{DescriptionGenerator, gold_enrich};
use crate::pim::master::error::{PimError, Result};
use crate::pim::master::io;
use crate::pim::master::join::{JoinKind, JoinSequencer, JoinStage, StageSummary};
use crate::pim::master::model::Table;
use crate::pim::master::normalize::KeySpec;
use crate::pim::master::prune::prune_empty_columns;
use crate::pim::master::report::CoverageReport;

/// Columns kept by the bronze ingest, with their output names.
pub const BRONZE_COLUMNS: [(&str, &str); 11] = [
    ("itemName", "item_name"),
    ("itemSeriesName", "item_series_name"),
    ("color", "color"),
    ("consumerAssembly", "consumer_assembly"),
    ("detailedDescription", "detailed_description"),
    ("friendlyDescription", "friendly_description"),
    ("itemCode", "item_code"),
    ("itemGeneralLongDescription", "item_general_description"),
    ("seriesFeatures", "seo_features_and_keywords"),
    ("homestoreProductLine", "homestore_product_line"),
    ("importDomestic", "import_domestic"),
];

/// Output of an in-memory master build.
#[derive(Debug, Clone)]
pub struct MasterBuild {
    pub table: Table,
    pub stages: Vec<StageSummary>,
    pub report: CoverageReport,
}

/// Paths of the four sources feeding the master table.
#[derive(Debug, Clone)]
pub struct MasterInputs {
    pub entities: PathBuf,
    pub storis: PathBuf,
    pub via_product: PathBuf,
    pub translator: PathBuf,
}

impl MasterInputs {
    fn sources(&self) -> [(&'static str, &Path); 3] {
        [
            (STORIS_SOURCE, self.storis.as_path()),
            (VIA_PRODUCT_SOURCE, self.via_product.as_path()),
            (TRANSLATOR_SOURCE, self.translator.as_path()),
        ]
    }
}

/// Reconciles `entities` with the named `sources` following `config`.
///
/// Each stage gets its own lookup, deduplicated on the stage's right key, so
/// one source can be joined several times on different keys. The result is
/// pruned of all-absent columns before the coverage report is computed.
pub fn build_master(
    entities: &Table,
    sources: &BTreeMap<String, Table>,
    config: &PipelineConfig,
) -> Result<MasterBuild> {
    config.validate()?;

    let mut sequencer = JoinSequencer::new();
    for stage in &config.stages {
        let source = sources
            .get(&stage.source)
            .ok_or_else(|| PimError::UnknownSource {
                stage: stage.tag.clone(),
                source_name: stage.source.clone(),
            })?;
        sequencer.push(JoinStage {
            tag: stage.tag.clone(),
            suffix: stage.suffix.clone(),
            kind: stage.kind,
            left_key: stage.left_key.clone(),
            lookup: LookupTable::build(source, &stage.right_key),
        });
    }

    let outcome = sequencer.run(entities);
    if config.stages.iter().all(|stage| stage.kind == JoinKind::Left) {
        debug_assert_eq!(outcome.table.row_count(), entities.row_count());
    }

    let pruned = prune_empty_columns(&outcome.table);
    let report = CoverageReport::compute(
        &pruned.table,
        &outcome.stages,
        &config.indicators(),
        &pruned.dropped,
    );

    Ok(MasterBuild {
        table: pruned.table,
        stages: outcome.stages,
        report,
    })
}

/// Loads the four sources, builds the master table and writes it to `output`.
#[instrument(
    level = "info",
    skip_all,
    fields(entities = %inputs.entities.display(), output = %output.display())
)]
pub fn build_master_files(
    inputs: &MasterInputs,
    output: &Path,
    config: &PipelineConfig,
) -> Result<CoverageReport> {
    // Every input must exist before anything is read.
    for path in std::iter::once(inputs.entities.as_path())
        .chain(inputs.sources().into_iter().map(|(_, path)| path))
    {
        if !path.exists() {
            return Err(PimError::MissingInput(path.to_path_buf()));
        }
    }

    let entities = io::read_table(&inputs.entities)?;
    let mut sources = BTreeMap::new();
    for (name, path) in inputs.sources() {
        sources.insert(name.to_string(), io::read_table(path)?);
    }

    let build = build_master(&entities, &sources, config)?;
    info!(
        rows = build.report.total_rows,
        columns = build.report.column_count,
        dropped = build.report.dropped_columns.len(),
        "master table built"
    );
    io::write_table(output, &build.table)?;
    Ok(build.report)
}

/// Inner-joins AFI rows to STORIS products on `sku` = `ProductID` and keeps
/// the [`BRONZE_COLUMNS`] under their snake_case names.
pub fn bronze_ingest(afi: &Table, storis: &Table) -> Table {
    let mut sequencer = JoinSequencer::new();
    sequencer.push(JoinStage {
        tag: "storis".into(),
        suffix: "_storis".into(),
        kind: JoinKind::Inner,
        left_key: KeySpec::alphanumeric(["sku"]),
        lookup: LookupTable::build(storis, &KeySpec::alphanumeric(["ProductID"])),
    });
    let outcome = sequencer.run(afi);
    debug!(rows = outcome.table.row_count(), "bronze join complete");
    project(&outcome.table, &BRONZE_COLUMNS)
}

/// Reads both bronze inputs, ingests them and writes the result.
#[instrument(
    level = "info",
    skip_all,
    fields(afi = %afi.display(), storis = %storis.display(), output = %output.display())
)]
pub fn bronze_files(afi: &Path, storis: &Path, output: &Path) -> Result<usize> {
    let afi = io::read_table(afi)?;
    let storis = io::read_table(storis)?;
    let table = bronze_ingest(&afi, &storis);
    info!(rows = table.row_count(), "bronze table built");
    io::write_table(output, &table)?;
    Ok(table.row_count())
}

/// Cleans the listed text columns of `input` and writes the result.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn silver_files<S: AsRef<str>>(input: &Path, output: &Path, columns: &[S]) -> Result<usize> {
    let table = io::read_table(input)?;
    let cleaned = silver_transform(&table, columns);
    io::write_table(output, &cleaned)?;
    Ok(cleaned.row_count())
}

/// Generates copy for every row of `input` and writes the enriched table.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display(), model = %config.model)
)]
pub fn gold_files<G, P>(
    input: &Path,
    output: &Path,
    config: &EnrichmentConfig,
    generator: &G,
    progress: P,
) -> Result<usize>
where
    G: DescriptionGenerator + ?Sized,
    P: FnMut(usize, usize),
{
    let table = io::read_table(input)?;
    let [first, second] = &config.source_columns;
    let enriched = gold_enrich(&table, generator, [first.as_str(), second.as_str()], progress)?;
    io::write_table(output, &enriched)?;
    Ok(enriched.row_count())
}

/// Picks `(source, output)` columns in order. A missing source column becomes
/// an all-absent output column.
pub fn project(table: &Table, columns: &[(&str, &str)]) -> Table {
    let mut projected = Table::new(columns.iter().map(|(_, to)| to.to_string()).collect());
    let indices: Vec<Option<usize>> = columns
        .iter()
        .map(|(from, _)| {
            let index = table.column_index(from);
            if index.is_none() {
                warn!(column = %from, "projected column missing from table");
            }
            index
        })
        .collect();

    for row in table.rows() {
        projected.push_row(
            indices
                .iter()
                .map(|index| index.and_then(|index| row[index].clone()))
                .collect(),
        );
    }
    projected
}
