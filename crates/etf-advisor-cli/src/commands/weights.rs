use clap::Args;
use serde_json::{json, Value};

use etf_advisor_core::profile::{self, RiskTolerance, TimeHorizon};

use crate::input;

/// Arguments for bucket-weight derivation
#[derive(Args)]
pub struct WeightsArgs {
    /// Risk tolerance: Low/Medium/High (Spanish labels accepted)
    #[arg(long)]
    pub tolerance: Option<String>,

    /// Time horizon: Short/Medium/Long (Spanish labels accepted)
    #[arg(long)]
    pub horizon: Option<String>,

    /// Path to a client CSV; emits one row per client
    #[arg(long)]
    pub clients: Option<String>,
}

pub fn run_weights(args: WeightsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = &args.clients {
        let clients = input::csv_in::read_clients(path)?;
        let mut rows = Vec::with_capacity(clients.len());

        for client in clients {
            let tolerance = client.risk_tolerance.as_deref().ok_or_else(|| {
                format!("Client {}: Tolerancia_Riesgo is required", client.client_id)
            })?;
            let horizon = client
                .horizon
                .as_deref()
                .ok_or_else(|| format!("Client {}: Horizonte is required", client.client_id))?;

            let weights = profile::bucket_weights(
                RiskTolerance::parse(tolerance)?,
                TimeHorizon::parse(horizon)?,
            );

            rows.push(json!({
                "ClienteID": client.client_id,
                "Tolerancia_Riesgo": tolerance,
                "Horizonte": horizon,
                "Peso_RF": weights.conservative,
                "Peso_RV": weights.balanced,
                "Peso_Alt": weights.alternative,
            }));
        }

        return Ok(json!({ "rows": rows }));
    }

    let (tolerance, horizon) = match (&args.tolerance, &args.horizon) {
        (Some(t), Some(h)) => (t, h),
        _ => return Err("--tolerance and --horizon (or --clients <file.csv>) required".into()),
    };

    let weights = profile::bucket_weights(
        RiskTolerance::parse(tolerance)?,
        TimeHorizon::parse(horizon)?,
    );

    Ok(json!({
        "rows": [{
            "Tolerancia_Riesgo": tolerance,
            "Horizonte": horizon,
            "Peso_RF": weights.conservative,
            "Peso_RV": weights.balanced,
            "Peso_Alt": weights.alternative,
        }],
    }))
}
