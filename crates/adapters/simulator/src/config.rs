//! Simulator configuration — the farms and beds to seed, and the RNG seed.

use serde::Deserialize;

/// Configuration for the simulated installation.
///
/// The default is the demo installation: three farms with two beds each.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Fixed seed for reproducible readings. Random when absent.
    pub seed: Option<u64>,
    pub farms: Vec<FarmSeed>,
    pub beds: Vec<BedSeed>,
}

/// A farm to create at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FarmSeed {
    pub id: String,
    pub name: String,
}

/// A bed to create at startup. Crop fields fall back to the bed defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BedSeed {
    pub id: String,
    pub farm_id: String,
    pub name: String,
    #[serde(default)]
    pub crop_name: Option<String>,
    #[serde(default)]
    pub growing_method: Option<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        let farms = (1..=3)
            .map(|n| FarmSeed {
                id: format!("farm_{n:03}"),
                name: format!("Farm {n}"),
            })
            .collect();
        let beds = (1..=6)
            .map(|n| BedSeed {
                id: format!("bed_{n:03}"),
                farm_id: format!("farm_{:03}", (n + 1) / 2),
                name: format!("Bed {}", 2 - n % 2),
                crop_name: None,
                growing_method: None,
            })
            .collect();
        Self {
            seed: None,
            farms,
            beds,
        }
    }
}

impl SimulatorConfig {
    /// An installation with no farms, for callers that add their own.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            seed: None,
            farms: Vec::new(),
            beds: Vec::new(),
        }
    }
}
