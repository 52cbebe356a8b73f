//! Score Scaler & Classifiers.
//!
//! Maps the raw PCA-weighted score (nominally in [-2, 2]) onto the
//! 0–1000 FinScore scale and classifies it into the five ordered risk
//! bands. A second, independent classifier maps the externally supplied
//! bureau score onto its four bands.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Upper bound of the adjusted score scale.
pub const SCORE_CEILING: Decimal = dec!(1000);

/// `((raw + 2) / 4) * 1000`, clamped to [0, 1000], rounded to 2 decimals.
pub fn scale(raw: Decimal) -> Decimal {
    let scaled = (raw + dec!(2)) / dec!(4) * SCORE_CEILING;
    scaled.clamp(Decimal::ZERO, SCORE_CEILING).round_dp(2)
}

/// FinScore risk bands, best to worst. Labels match the report wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    #[serde(rename = "Muito Abaixo do Risco")]
    MuitoAbaixoDoRisco,
    #[serde(rename = "Levemente Abaixo do Risco")]
    LevementeAbaixoDoRisco,
    #[serde(rename = "Neutro")]
    Neutro,
    #[serde(rename = "Levemente Acima do Risco")]
    LevementeAcimaDoRisco,
    #[serde(rename = "Muito Acima do Risco")]
    MuitoAcimaDoRisco,
}

impl RiskBand {
    /// 1 = best, 5 = worst.
    pub fn rank(&self) -> u8 {
        match self {
            RiskBand::MuitoAbaixoDoRisco => 1,
            RiskBand::LevementeAbaixoDoRisco => 2,
            RiskBand::Neutro => 3,
            RiskBand::LevementeAcimaDoRisco => 4,
            RiskBand::MuitoAcimaDoRisco => 5,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskBand::MuitoAbaixoDoRisco => "Muito Abaixo do Risco",
            RiskBand::LevementeAbaixoDoRisco => "Levemente Abaixo do Risco",
            RiskBand::Neutro => "Neutro",
            RiskBand::LevementeAcimaDoRisco => "Levemente Acima do Risco",
            RiskBand::MuitoAcimaDoRisco => "Muito Acima do Risco",
        };
        write!(f, "{label}")
    }
}

/// Threshold bands over the adjusted score, boundary semantics exactly:
/// `>875`, `(750, 875]`, `[250, 750]`, `(125, 250)`, `<=125`.
pub fn classify_finscore(adjusted: Decimal) -> RiskBand {
    if adjusted > dec!(875) {
        RiskBand::MuitoAbaixoDoRisco
    } else if adjusted > dec!(750) {
        RiskBand::LevementeAbaixoDoRisco
    } else if adjusted >= dec!(250) {
        RiskBand::Neutro
    } else if adjusted > dec!(125) {
        RiskBand::LevementeAcimaDoRisco
    } else {
        RiskBand::MuitoAcimaDoRisco
    }
}

/// Bureau (external credit-history) score bands, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BureauBand {
    #[serde(rename = "Excelente")]
    Excelente,
    #[serde(rename = "Bom")]
    Bom,
    #[serde(rename = "Baixo")]
    Baixo,
    #[serde(rename = "Muito Baixo")]
    MuitoBaixo,
}

impl BureauBand {
    /// 1 = best, 4 = worst.
    pub fn rank(&self) -> u8 {
        match self {
            BureauBand::Excelente => 1,
            BureauBand::Bom => 2,
            BureauBand::Baixo => 3,
            BureauBand::MuitoBaixo => 4,
        }
    }
}

impl std::fmt::Display for BureauBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BureauBand::Excelente => "Excelente",
            BureauBand::Bom => "Bom",
            BureauBand::Baixo => "Baixo",
            BureauBand::MuitoBaixo => "Muito Baixo",
        };
        write!(f, "{label}")
    }
}

/// Bands: `>700` Excelente, `(500, 700]` Bom, `(300, 500]` Baixo,
/// `<=300` Muito Baixo.
pub fn classify_bureau(score: Decimal) -> BureauBand {
    if score > dec!(700) {
        BureauBand::Excelente
    } else if score > dec!(500) {
        BureauBand::Bom
    } else if score > dec!(300) {
        BureauBand::Baixo
    } else {
        BureauBand::MuitoBaixo
    }
}
