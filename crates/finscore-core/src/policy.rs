//! Policy Engine: turns the classified scores into an approve / reject
//! recommendation with justifications and covenants.
//!
//! Pure function of its inputs: no I/O, no mutation, and never an error;
//! missing optional inputs default conservatively (a missing bureau score
//! is treated as the worst band) and raise the incomplete-data flag
//! instead of failing. Rule order matters and is fixed, so identical
//! inputs always produce the identical decision, justification list, and
//! covenant set.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::score::{classify_bureau, classify_finscore, BureauBand, RiskBand};

/// The three possible recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "aprovar")]
    Approve,
    #[serde(rename = "aprovar_com_ressalvas")]
    ApproveWithReservations,
    #[serde(rename = "nao_aprovar")]
    Reject,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Decision::Approve => "aprovar",
            Decision::ApproveWithReservations => "aprovar_com_ressalvas",
            Decision::Reject => "nao_aprovar",
        };
        write!(f, "{label}")
    }
}

/// Optional individual ratios used for the qualitative indicator critique.
/// Missing indicators are skipped, never defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_ratio: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_ratio: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_margin: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roe: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebitda_margin: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_to_assets: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_debt_to_ebitda: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_coverage: Option<Decimal>,
}

/// Everything the policy engine consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyInputs {
    pub adjusted_score: Decimal,
    pub risk_band: RiskBand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bureau_score: Option<Decimal>,
    pub bureau_band: BureauBand,
    #[serde(default)]
    pub indicators: IndicatorSet,
    #[serde(default)]
    pub dados_incompletos: bool,
}

impl PolicyInputs {
    /// Build inputs from the computed scores, classifying both and
    /// defaulting a missing bureau score to the worst band with the
    /// incomplete-data flag raised.
    pub fn from_scores(
        adjusted_score: Decimal,
        bureau_score: Option<Decimal>,
        indicators: IndicatorSet,
        dados_incompletos: bool,
    ) -> Self {
        let bureau_band = match bureau_score {
            Some(score) => classify_bureau(score),
            None => BureauBand::MuitoBaixo,
        };
        PolicyInputs {
            adjusted_score,
            risk_band: classify_finscore(adjusted_score),
            bureau_score,
            bureau_band,
            indicators,
            dados_incompletos: dados_incompletos || bureau_score.is_none(),
        }
    }
}

/// The recommendation plus its ordered justifications and covenants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub decision: Decision,
    pub motivos: Vec<String>,
    pub covenants: Vec<String>,
}

// Covenant texts, fixed so the covenant set is deterministic.
const COV_QUARTERLY_STATEMENTS: &str =
    "Envio de balancetes trimestrais durante a vigência da operação";
const COV_SEMIANNUAL_REVIEW: &str = "Revisão semestral do limite de crédito aprovado";
const COV_COLLATERAL: &str = "Exigência de garantia real ou aval adicional dos sócios";
const COV_MONTHLY_BUREAU: &str = "Consulta mensal ao bureau de crédito durante a vigência";
const COV_COMPLETE_DATA: &str =
    "Complementação dos dados cadastrais e contábeis faltantes em até 30 dias";

/// Produce the policy recommendation. Deterministic; rule order matters.
pub fn decide(inputs: &PolicyInputs) -> PolicyDecision {
    let mut motivos = Vec::new();
    let mut covenants = Vec::new();

    // 1. Primary gate on the adjusted score.
    let mut decision = match inputs.risk_band {
        RiskBand::MuitoAbaixoDoRisco => {
            motivos.push(format!(
                "FinScore de {} pontos ({}): perfil de risco muito baixo.",
                inputs.adjusted_score, inputs.risk_band
            ));
            Decision::Approve
        }
        RiskBand::LevementeAbaixoDoRisco => {
            motivos.push(format!(
                "FinScore de {} pontos ({}): perfil de risco abaixo da média.",
                inputs.adjusted_score, inputs.risk_band
            ));
            Decision::Approve
        }
        RiskBand::Neutro => {
            motivos.push(format!(
                "FinScore de {} pontos ({}): perfil intermediário, aprovação condicionada a acompanhamento.",
                inputs.adjusted_score, inputs.risk_band
            ));
            covenants.push(COV_QUARTERLY_STATEMENTS.to_string());
            covenants.push(COV_SEMIANNUAL_REVIEW.to_string());
            Decision::ApproveWithReservations
        }
        RiskBand::LevementeAcimaDoRisco => {
            motivos.push(format!(
                "FinScore de {} pontos ({}): risco acima do apetite da política de crédito.",
                inputs.adjusted_score, inputs.risk_band
            ));
            Decision::Reject
        }
        RiskBand::MuitoAcimaDoRisco => {
            motivos.push(format!(
                "FinScore de {} pontos ({}): risco muito elevado.",
                inputs.adjusted_score, inputs.risk_band
            ));
            Decision::Reject
        }
    };

    // 2. Bureau re-examination, only when the primary gate approved.
    if decision == Decision::Approve {
        let bureau_score_label = inputs
            .bureau_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "não informado".to_string());
        if inputs.bureau_band.rank() >= 3 {
            decision = Decision::ApproveWithReservations;
            motivos.push(format!(
                "Bureau externo classificado como {} (score {}): decisão rebaixada para aprovação com ressalvas.",
                inputs.bureau_band, bureau_score_label
            ));
            covenants.push(COV_COLLATERAL.to_string());
            covenants.push(COV_MONTHLY_BUREAU.to_string());
        } else if inputs.bureau_band.rank() == 1 {
            motivos.push(format!(
                "Bureau externo {} (score {}) corrobora a aprovação.",
                inputs.bureau_band, bureau_score_label
            ));
        } else {
            motivos.push(format!(
                "Bureau externo {} (score {}): sem impedimentos à aprovação.",
                inputs.bureau_band, bureau_score_label
            ));
        }
    }

    // 3. Qualitative indicator critique, phrased against the current
    //    decision.
    if let Some(critique) = indicator_critique(&inputs.indicators, decision) {
        motivos.push(critique);
    }

    // 4. Incomplete data forces at least approval-with-reservations.
    if inputs.dados_incompletos {
        if decision == Decision::Approve {
            decision = Decision::ApproveWithReservations;
        }
        covenants.push(COV_COMPLETE_DATA.to_string());
        motivos.push(
            "Base de dados incompleta: análise conduzida com premissas conservadoras.".to_string(),
        );
    }

    PolicyDecision {
        decision,
        motivos,
        covenants,
    }
}

/// Score each available indicator against its fixed threshold and phrase
/// the result according to the decision: strengths when approving,
/// balance under reservations, weaknesses when rejecting.
fn indicator_critique(indicators: &IndicatorSet, decision: Decision) -> Option<String> {
    let mut strengths: Vec<&str> = Vec::new();
    let mut weaknesses: Vec<&str> = Vec::new();

    let mut judge = |value: Option<Decimal>, favourable: fn(Decimal) -> bool, label: &'static str| {
        if let Some(v) = value {
            if favourable(v) {
                strengths.push(label);
            } else {
                weaknesses.push(label);
            }
        }
    };

    judge(
        indicators.current_ratio,
        |v| v >= dec!(1.5),
        "liquidez corrente",
    );
    judge(indicators.net_margin, |v| v >= dec!(0.05), "margem líquida");
    judge(
        indicators.roe,
        |v| v >= dec!(0.12),
        "retorno sobre patrimônio",
    );
    judge(
        indicators.debt_to_assets,
        |v| v <= dec!(0.60),
        "endividamento sobre ativos",
    );
    judge(
        indicators.net_debt_to_ebitda,
        |v| v <= dec!(2.5),
        "alavancagem (dívida líquida/EBITDA)",
    );

    if strengths.is_empty() && weaknesses.is_empty() {
        return None;
    }

    let critique = match decision {
        Decision::Approve => {
            let mut sentence = if strengths.is_empty() {
                "Indicadores sem destaques positivos relevantes.".to_string()
            } else {
                format!(
                    "Indicadores reforçam a decisão: pontos fortes em {}.",
                    strengths.join(", ")
                )
            };
            if !weaknesses.is_empty() {
                sentence.push_str(&format!(" Atenção a {}.", weaknesses.join(", ")));
            }
            sentence
        }
        Decision::ApproveWithReservations => match (strengths.is_empty(), weaknesses.is_empty()) {
            (false, false) => format!(
                "Indicadores mistos: pontos fortes em {}; fragilidades em {}.",
                strengths.join(", "),
                weaknesses.join(", ")
            ),
            (false, true) => format!(
                "Indicadores equilibrados, com pontos fortes em {}.",
                strengths.join(", ")
            ),
            _ => format!(
                "Indicadores com fragilidades em {}, reforçando as ressalvas.",
                weaknesses.join(", ")
            ),
        },
        Decision::Reject => {
            if weaknesses.is_empty() {
                format!(
                    "Indicadores pontuais favoráveis ({}) não compensam o score insuficiente.",
                    strengths.join(", ")
                )
            } else {
                format!(
                    "Indicadores corroboram a recusa: fragilidades em {}.",
                    weaknesses.join(", ")
                )
            }
        }
    };
    Some(critique)
}
