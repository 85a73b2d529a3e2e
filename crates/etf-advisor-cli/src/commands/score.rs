use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use etf_advisor_core::scoring::{self, GroupSource, ScoreUniverseInput, ScoredEtf};
use etf_advisor_core::types::RiskGroup;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GroupSourceArg {
    /// Trust the Grupo column from ingestion
    Record,
    /// Reclassify from 3-year monthly volatility terciles
    Volatility,
}

impl From<GroupSourceArg> for GroupSource {
    fn from(value: GroupSourceArg) -> Self {
        match value {
            GroupSourceArg::Record => GroupSource::Record,
            GroupSourceArg::Volatility => GroupSource::VolatilityTerciles,
        }
    }
}

/// Arguments for universe scoring
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to the cleaned ETF CSV
    #[arg(long)]
    pub etfs: Option<String>,

    /// Where each ETF's risk group comes from
    #[arg(long, value_enum)]
    pub group_source: Option<GroupSourceArg>,

    /// Keep only ETFs ranked N or better in their group (ties included)
    #[arg(long)]
    pub top: Option<u32>,
}

pub fn run_score(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (score_input, dropped) = load_universe(&args.etfs, args.group_source)?;
    let output = scoring::score_universe(&score_input)?;
    let universe = output.result;

    // Rank-based cut, not positional: every ETF at a qualifying dense rank
    // stays, so tied funds never disappear from the table.
    let mut selected: Vec<&ScoredEtf> = Vec::new();
    for group in RiskGroup::ALL {
        let ranked = universe.group_ranked(group);
        match args.top {
            Some(n) => selected.extend(ranked.into_iter().filter(|e| e.rank <= n)),
            None => selected.extend(ranked),
        }
    }

    let rows: Vec<Value> = selected
        .iter()
        .map(|e| {
            json!({
                "Nombre": e.record.name,
                "ISIN": e.record.isin,
                "Categoría": e.record.category,
                "Grupo": e.group.short_label(),
                "Costes": e.record.cost,
                "Rentabilidad_Anual_Predicha": e.predicted_annual_return,
                "Score_Grupo": e.score,
                "Rank_Grupo": e.rank,
            })
        })
        .collect();

    Ok(json!({
        "rows": rows,
        "summary": {
            "scored": universe.scored,
            "unscored": universe.unscored,
            "dropped_rows": dropped,
        },
        "warnings": output.warnings,
        "methodology": output.methodology,
    }))
}

/// Build the scoring input from --etfs or piped JSON. Returns the input plus
/// the number of CSV rows dropped during ingestion (0 for piped input).
pub(crate) fn load_universe(
    etfs: &Option<String>,
    group_source: Option<GroupSourceArg>,
) -> Result<(ScoreUniverseInput, usize), Box<dyn std::error::Error>> {
    if let Some(path) = etfs {
        let (records, dropped) = input::csv_in::read_etfs(path)?;
        if dropped > 0 {
            eprintln!("note: {dropped} row(s) dropped during ingestion (incomplete or unparseable)");
        }
        Ok((
            ScoreUniverseInput {
                etfs: records,
                group_source: group_source.map(Into::into).unwrap_or_default(),
            },
            dropped,
        ))
    } else if let Some(data) = input::stdin::read_piped_json()? {
        let mut parsed: ScoreUniverseInput = serde_json::from_value(data)?;
        // An explicit flag wins over whatever the piped input carries.
        if let Some(source) = group_source {
            parsed.group_source = source.into();
        }
        Ok((parsed, 0))
    } else {
        Err("--etfs <file.csv> or piped JSON required for scoring".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, contents).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn args(path: String, top: Option<u32>) -> ScoreArgs {
        ScoreArgs {
            etfs: Some(path),
            group_source: None,
            top,
        }
    }

    #[test]
    fn ranked_rows_use_wire_column_names() {
        let path = write_csv(
            "etfa_score_columns.csv",
            "Nombre,ISIN,Categoría,Grupo,Precio,Costes,Patrimonio,Rent_1Año%\n\
             Fondo A,IE00B4L5Y983,Core,2,100,0.20,1000,8\n",
        );
        let value = run_score(args(path, None)).unwrap();
        let row = &value["rows"][0];
        assert!(row.get("Score_Grupo").is_some());
        assert!(row.get("Rank_Grupo").is_some());
        assert!(row.get("Rentabilidad_Anual_Predicha").is_some());
    }

    #[test]
    fn top_filter_keeps_all_etfs_at_a_tied_rank() {
        // Two identical funds share dense rank 1; --top 1 must return both.
        let path = write_csv(
            "etfa_score_top_ties.csv",
            "Nombre,ISIN,Categoría,Grupo,Precio,Costes,Patrimonio,Rent_1Año%\n\
             Fondo A,IE00B4L5Y983,Core,2,100,0.20,1000,8\n\
             Fondo B,IE00B4L5Y984,Core,2,100,0.20,1000,8\n\
             Fondo C,IE00B4L5Y985,Core,2,100,0.20,1000,4\n",
        );
        let value = run_score(args(path, Some(1))).unwrap();
        let rows = value["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        for row in rows {
            assert_eq!(row["Rank_Grupo"], 1);
        }
    }

    #[test]
    fn dropped_rows_are_counted_in_the_summary() {
        let path = write_csv(
            "etfa_score_dropped.csv",
            "Nombre,ISIN,Categoría,Grupo,Precio,Costes,Patrimonio,Rent_1Año%\n\
             Fondo A,IE00B4L5Y983,Core,2,100,0.20,1000,8\n\
             ,IE00B4L5Y984,Core,2,100,0.20,1000,6\n",
        );
        let value = run_score(args(path, None)).unwrap();
        assert_eq!(value["summary"]["dropped_rows"], 1);
        assert_eq!(value["rows"].as_array().unwrap().len(), 1);
    }
}
