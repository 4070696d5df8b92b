//! End-to-end clustering: parse, encode, cluster, assemble.

use crate::assembler::{assemble, ClusteringResult};
use crate::catalog::HierarchyCatalog;
use crate::cluster::KMeans;
use crate::config::{ClusterConfig, EncoderConfig, DEFAULT_SEED, MAX_SEED};
use crate::diagnostics::Diagnostics;
use crate::encoder::FeatureEncoder;
use crate::error::{Result, SortError};
use crate::parser::{InputFormat, ParsedInventory};

/// A configured clustering pipeline over one hierarchy catalog.
#[derive(Debug, Clone)]
pub struct Pipeline<'a> {
    catalog: &'a HierarchyCatalog,
    encoder: EncoderConfig,
    cluster: ClusterConfig,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline with default settings.
    pub fn new(catalog: &'a HierarchyCatalog) -> Self {
        Self {
            catalog,
            encoder: EncoderConfig::default(),
            cluster: ClusterConfig::default(),
        }
    }

    pub fn with_encoder_config(mut self, config: EncoderConfig) -> Self {
        self.encoder = config;
        self
    }

    pub fn with_cluster_config(mut self, config: ClusterConfig) -> Self {
        self.cluster = config;
        self
    }

    /// Parse `raw` as `format` and cluster it into at most `k` bins.
    ///
    /// `k` is checked before the input is touched.
    pub fn run(
        &self,
        raw: &[u8],
        format: InputFormat,
        k: usize,
        seed: Option<u64>,
    ) -> Result<ClusteringResult> {
        validate_k(k)?;
        let parsed = format.parse(raw)?;
        self.run_parsed(parsed, k, seed)
    }

    /// Cluster an inventory that was already parsed.
    pub fn run_parsed(
        &self,
        parsed: ParsedInventory,
        k: usize,
        seed: Option<u64>,
    ) -> Result<ClusteringResult> {
        validate_k(k)?;
        let ParsedInventory {
            inventory,
            warnings,
        } = parsed;
        if inventory.is_empty() {
            return Err(SortError::EmptyInventory);
        }
        let seed = seed.unwrap_or(DEFAULT_SEED);

        let mut diagnostics = Diagnostics::from(warnings);
        let encoder = FeatureEncoder::new(self.catalog, self.encoder);
        let encoded = encoder.encode_all(&inventory)?;
        diagnostics.extend(encoded.warnings);

        let fit = KMeans::new(self.cluster).fit(&encoded.matrix, k, seed)?;

        tracing::info!(
            "Clustered {} part(s) into {} bin(s) (requested {}, seed {})",
            inventory.len(),
            fit.effective_k,
            k,
            seed
        );
        if diagnostics.unresolved_count() > 0 {
            tracing::info!(
                "{} part(s) not found in the hierarchy",
                diagnostics.unresolved_count()
            );
        }

        Ok(assemble(inventory, &encoded.nodes, fit, diagnostics))
    }
}

/// Cluster `raw` with default settings.
pub fn cluster_inventory(
    raw: &[u8],
    format: InputFormat,
    catalog: &HierarchyCatalog,
    k: usize,
    seed: Option<u64>,
) -> Result<ClusteringResult> {
    Pipeline::new(catalog).run(raw, format, k, seed)
}

/// Parse a seed typed by a user. Accepts `0..=u32::MAX`.
pub fn parse_seed(text: &str) -> Result<u64> {
    let text = text.trim();
    let seed: u64 = text.parse().map_err(|_| {
        SortError::invalid_parameter("seed", format!("'{}' is not a whole number", text))
    })?;
    if seed > MAX_SEED {
        return Err(SortError::invalid_parameter(
            "seed",
            format!("{} is outside 0..={}", seed, MAX_SEED),
        ));
    }
    Ok(seed)
}

fn validate_k(k: usize) -> Result<()> {
    if k < 1 {
        return Err(SortError::invalid_parameter(
            "k",
            "cluster count must be at least 1",
        ));
    }
    Ok(())
}
