use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Variant reference as read from the input file, e.g. `rs429358`
pub type Rsid = String;

/// Brain tissues screened by the GTEx pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrainTissue {
    #[serde(rename = "Brain_Anterior_cingulate_cortex_BA24")]
    AnteriorCingulateCortex,
    #[serde(rename = "Brain_Cortex")]
    Cortex,
    #[serde(rename = "Brain_Frontal_Cortex_BA9")]
    FrontalCortex,
    #[serde(rename = "Brain_Hippocampus")]
    Hippocampus,
    #[serde(rename = "Brain_Hypothalamus")]
    Hypothalamus,
}

impl BrainTissue {
    pub const ALL: [BrainTissue; 5] = [
        BrainTissue::AnteriorCingulateCortex,
        BrainTissue::Cortex,
        BrainTissue::FrontalCortex,
        BrainTissue::Hippocampus,
        BrainTissue::Hypothalamus,
    ];

    /// GTEx tissue site detail id
    pub fn site_detail_id(&self) -> &'static str {
        match self {
            BrainTissue::AnteriorCingulateCortex => "Brain_Anterior_cingulate_cortex_BA24",
            BrainTissue::Cortex => "Brain_Cortex",
            BrainTissue::FrontalCortex => "Brain_Frontal_Cortex_BA9",
            BrainTissue::Hippocampus => "Brain_Hippocampus",
            BrainTissue::Hypothalamus => "Brain_Hypothalamus",
        }
    }

    /// Label the GTEx portal shows in its result tables
    pub fn display_name(&self) -> &'static str {
        match self {
            BrainTissue::AnteriorCingulateCortex => "Brain - Anterior cingulate cortex (BA24)",
            BrainTissue::Cortex => "Brain - Cortex",
            BrainTissue::FrontalCortex => "Brain - Frontal Cortex (BA9)",
            BrainTissue::Hippocampus => "Brain - Hippocampus",
            BrainTissue::Hypothalamus => "Brain - Hypothalamus",
        }
    }
}

impl fmt::Display for BrainTissue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.site_detail_id())
    }
}

impl FromStr for BrainTissue {
    type Err = String;

    /// Accepts either the site detail id or the portal display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        BrainTissue::ALL
            .into_iter()
            .find(|t| t.site_detail_id() == s || t.display_name() == s)
            .ok_or_else(|| format!("unknown brain tissue '{s}'"))
    }
}

/// Converts a portal tissue label to its site detail id. Labels outside the
/// brain panel are returned unchanged.
pub fn normalize_tissue_label(label: &str) -> String {
    match label.parse::<BrainTissue>() {
        Ok(tissue) => tissue.site_detail_id().to_string(),
        Err(_) => label.trim().to_string(),
    }
}

/// One eQTL association returned by GTEx
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionHit {
    pub rsid: Rsid,
    pub p_value: f64,
    pub tissue: String,
}

/// Row of the GTEx output file: `rsid, gene, tissue`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GtexRecord {
    pub rsid: Rsid,
    pub gene: String,
    pub tissue: String,
}

impl GtexRecord {
    pub fn from_hit(hit: &ExpressionHit, gene: &str) -> Self {
        Self {
            rsid: hit.rsid.trim().to_string(),
            gene: gene.to_string(),
            tissue: normalize_tissue_label(&hit.tissue),
        }
    }
}

impl fmt::Display for GtexRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.rsid, self.gene, self.tissue)
    }
}

/// Which unordered pairs the LD pipeline compares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PairBounds {
    /// Every pair of still-retained identifiers
    #[default]
    All,
    /// The last retained identifier is never the second member of a pair
    ExcludeLast,
}
