use std::collections::HashMap;

use clap::Args;
use serde_json::{json, Value};

use etf_advisor_core::allocation::{self, ClientPortfolio, ClientProfile, RecommendInput};
use etf_advisor_core::profile::{self, BucketWeights, RiskTolerance, TimeHorizon};
use etf_advisor_core::scoring;

use crate::commands::score::{load_universe, GroupSourceArg};
use crate::input;
use crate::input::csv_in::ClientRow;

/// Arguments for the end-to-end recommendation pipeline
#[derive(Args)]
pub struct RecommendArgs {
    /// Path to the cleaned ETF CSV
    #[arg(long)]
    pub etfs: Option<String>,

    /// Path to the client CSV
    #[arg(long)]
    pub clients: Option<String>,

    /// Where each ETF's risk group comes from
    #[arg(long, value_enum)]
    pub group_source: Option<GroupSourceArg>,
}

pub fn run_recommend(args: RecommendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut warnings: Vec<String> = Vec::new();

    let recommend_input = if let Some(clients_path) = &args.clients {
        if args.etfs.is_none() {
            return Err("--etfs <file.csv> required alongside --clients".into());
        }

        let (score_input, _dropped) = load_universe(&args.etfs, args.group_source)?;
        let scored = scoring::score_universe(&score_input)?;
        warnings.extend(scored.warnings);

        let clients = input::csv_in::read_clients(clients_path)?
            .into_iter()
            .map(client_profile)
            .collect::<Result<Vec<_>, _>>()?;

        RecommendInput {
            clients,
            universe: scored.result,
        }
    } else if let Some(data) = input::stdin::read_piped_json()? {
        serde_json::from_value(data)?
    } else {
        return Err("--etfs and --clients (or piped JSON) required for recommendations".into());
    };

    let output = allocation::recommend(&recommend_input)?;
    warnings.extend(output.warnings);
    let result = output.result;

    let portfolios: HashMap<&str, &ClientPortfolio> = result
        .clients
        .iter()
        .map(|c| (c.client_id.as_str(), c))
        .collect();

    let rows: Vec<Value> = result
        .allocations
        .iter()
        .map(|a| {
            json!({
                "ClienteID": a.client_id,
                "ETF_Nombre": a.etf_name,
                "ETF_ISIN": a.etf_isin,
                "Grupo": a.group.short_label(),
                "Rank_Grupo": a.group_rank,
                "Peso_Asignado": a.assigned_weight,
                "Rentabilidad_Anual_Predicha": a.predicted_annual_return,
                "Aportación_Rentabilidad": a.return_contribution,
                "Rentabilidad_Esperada_Cliente_%": portfolios
                    .get(a.client_id.as_str())
                    .map(|c| c.expected_annual_return),
            })
        })
        .collect();

    Ok(json!({
        "rows": rows,
        "portfolios": result.clients,
        "warnings": warnings,
        "methodology": output.methodology,
    }))
}

/// Resolve a client row into a profile: explicit Peso_* weights win; otherwise
/// the weights are derived from the questionnaire fields.
fn client_profile(row: ClientRow) -> Result<ClientProfile, Box<dyn std::error::Error>> {
    let weights = match (row.weight_rf, row.weight_rv, row.weight_alt) {
        (Some(rf), Some(rv), Some(alt)) => BucketWeights {
            conservative: rf,
            balanced: rv,
            alternative: alt,
        },
        _ => {
            let tolerance = row.risk_tolerance.as_deref().ok_or_else(|| {
                format!(
                    "Client {}: Tolerancia_Riesgo is required when Peso_* columns are absent",
                    row.client_id
                )
            })?;
            let horizon = row.horizon.as_deref().ok_or_else(|| {
                format!(
                    "Client {}: Horizonte is required when Peso_* columns are absent",
                    row.client_id
                )
            })?;
            profile::bucket_weights(
                RiskTolerance::parse(tolerance)?,
                TimeHorizon::parse(horizon)?,
            )
        }
    };

    Ok(ClientProfile {
        client_id: row.client_id,
        weights,
        age: row.age,
        annual_income: row.annual_income,
    })
}
