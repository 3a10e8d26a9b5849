//! YAML-backed configuration for the join plan and the enrichment service.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pim::master::error::{PimError, Result};
use crate::pim::master::join::JoinKind;
use crate::pim::master::normalize::KeySpec;
use crate::pim::master::report::MatchIndicator;

/// Source name under which the ERP (STORIS) export is registered.
pub const STORIS_SOURCE: &str = "storis";
/// Source name under which the storefront (VIA) product export is registered.
pub const VIA_PRODUCT_SOURCE: &str = "via_product";
/// Source name under which the tagging translator is registered.
pub const TRANSLATOR_SOURCE: &str = "translator";

/// One join stage of the master plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Unique name of the stage, used in logs and the coverage report.
    pub tag: String,
    /// Name of the source table joined in this stage.
    pub source: String,
    /// Appended to incoming column names that are already taken.
    pub suffix: String,
    #[serde(default)]
    pub kind: JoinKind,
    /// Key derived from the primary table.
    pub left_key: KeySpec,
    /// Key derived from the source table.
    pub right_key: KeySpec,
    /// Source column whose presence marks a match in the coverage report.
    #[serde(default)]
    pub indicator: Option<String>,
}

/// The full master join plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub stages: Vec<StageConfig>,
}

impl Default for PipelineConfig {
    /// STORIS and VIA by barcode, then the translator by item code and by SKU.
    fn default() -> Self {
        let upc = || KeySpec::numeric(["upc"]);
        Self {
            stages: vec![
                StageConfig {
                    tag: "storis".into(),
                    source: STORIS_SOURCE.into(),
                    suffix: "_storis".into(),
                    kind: JoinKind::Left,
                    left_key: upc(),
                    right_key: KeySpec::numeric(["UPCNbr", "BarCodeNbr"]),
                    indicator: Some("UPCNbr".into()),
                },
                StageConfig {
                    tag: "via_upc".into(),
                    source: VIA_PRODUCT_SOURCE.into(),
                    suffix: "_viaUPC".into(),
                    kind: JoinKind::Left,
                    left_key: upc(),
                    right_key: KeySpec::numeric(["BarCodeNbr"]),
                    indicator: Some("BarCodeNbr".into()),
                },
                StageConfig {
                    tag: "translator_by_item".into(),
                    source: TRANSLATOR_SOURCE.into(),
                    suffix: "_translatorByItem".into(),
                    kind: JoinKind::Left,
                    left_key: KeySpec::alphanumeric(["itemCode"]),
                    right_key: KeySpec::alphanumeric(["ItemNumber"]),
                    indicator: Some("Series ID".into()),
                },
                StageConfig {
                    tag: "translator_by_sku".into(),
                    source: TRANSLATOR_SOURCE.into(),
                    suffix: "_translatorByFDE".into(),
                    kind: JoinKind::Left,
                    left_key: KeySpec::alphanumeric(["sku"]),
                    right_key: KeySpec::alphanumeric(["FDE SKU"]),
                    indicator: Some("Series ID".into()),
                },
            ],
        }
    }
}

impl PipelineConfig {
    /// Parses and validates a plan from YAML text.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a plan from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PimError::MissingInput(path.to_path_buf()));
        }
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Checks the plan for inconsistencies that would make a build ambiguous.
    ///
    /// Stages may share a suffix; column naming still keeps them apart.
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(PimError::InvalidConfig("plan declares no stages".into()));
        }

        let mut tags = HashSet::new();
        for stage in &self.stages {
            if stage.tag.trim().is_empty() {
                return Err(PimError::InvalidConfig("stage tag must not be empty".into()));
            }
            if !tags.insert(stage.tag.as_str()) {
                return Err(PimError::InvalidConfig(format!(
                    "duplicate stage tag '{}'",
                    stage.tag
                )));
            }
            if stage.suffix.is_empty() {
                return Err(PimError::InvalidConfig(format!(
                    "stage '{}' has an empty collision suffix",
                    stage.tag
                )));
            }
            for (side, key) in [("left", &stage.left_key), ("right", &stage.right_key)] {
                if key.columns.is_empty() {
                    return Err(PimError::InvalidConfig(format!(
                        "stage '{}' {side} key names no columns",
                        stage.tag
                    )));
                }
            }
        }
        Ok(())
    }

    /// Indicator columns declared by the stages.
    pub fn indicators(&self) -> Vec<MatchIndicator> {
        self.stages
            .iter()
            .filter_map(|stage| {
                stage.indicator.as_ref().map(|column| MatchIndicator {
                    stage: stage.tag.clone(),
                    column: column.clone(),
                })
            })
            .collect()
    }
}

/// Settings for the text-generation service used by the gold pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    pub model: String,
    #[serde(default)]
    pub system_prompt: String,
    /// Template with `{desc_a}` and `{desc_b}` placeholders.
    pub prompt_template: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_source_columns")]
    pub source_columns: [String; 2],
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_source_columns() -> [String; 2] {
    [
        "afi_product_description".to_string(),
        "via_product_description".to_string(),
    ]
}

impl EnrichmentConfig {
    pub fn from_yaml(source: &str) -> Result<Self> {
        let config: EnrichmentConfig = serde_yaml::from_str(source)?;
        if config.model.trim().is_empty() {
            return Err(PimError::InvalidConfig("enrichment model must be set".into()));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PimError::MissingInput(path.to_path_buf()));
        }
        Self::from_yaml(&fs::read_to_string(path)?)
    }
}
