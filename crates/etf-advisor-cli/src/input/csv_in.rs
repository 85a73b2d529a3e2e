use rust_decimal::Decimal;
use serde::Deserialize;

use etf_advisor_core::error::AdvisorError;
use etf_advisor_core::scoring::{EtfRecord, HistoricalReturns, RiskMetrics};
use etf_advisor_core::types::RiskGroup;

use crate::input::file::resolve_path;

/// One raw row of the cleaned ETF table. Every field is optional at this
/// layer so that incomplete rows can be dropped instead of failing the
/// whole file; identity columns are enforced at the header level.
#[derive(Debug, Deserialize)]
pub struct EtfRow {
    #[serde(rename = "Nombre")]
    pub name: Option<String>,
    #[serde(rename = "ISIN")]
    pub isin: Option<String>,
    #[serde(rename = "Categoría")]
    pub category: Option<String>,
    #[serde(rename = "Grupo")]
    pub group: Option<u8>,
    #[serde(rename = "Precio")]
    pub price: Option<Decimal>,
    #[serde(rename = "Costes")]
    pub cost: Option<Decimal>,
    #[serde(rename = "Patrimonio")]
    pub aum: Option<Decimal>,
    #[serde(rename = "Rent_1Mes%")]
    pub ret_1m: Option<Decimal>,
    #[serde(rename = "Rent_3Meses%")]
    pub ret_3m: Option<Decimal>,
    #[serde(rename = "Rent_6Meses%")]
    pub ret_6m: Option<Decimal>,
    #[serde(rename = "Rent_1Año%")]
    pub ret_1y: Option<Decimal>,
    #[serde(rename = "Rent_3Años%")]
    pub ret_3y: Option<Decimal>,
    #[serde(rename = "Rent_5Años%")]
    pub ret_5y: Option<Decimal>,
    #[serde(rename = "Rent_10Años%")]
    pub ret_10y: Option<Decimal>,
    #[serde(rename = "KID_SRI")]
    pub kid_sri: Option<u8>,
    #[serde(rename = "Alfa_3Años_Mensual")]
    pub alpha: Option<Decimal>,
    #[serde(rename = "Beta_3Años_Mensual")]
    pub beta: Option<Decimal>,
    #[serde(rename = "R2_3Años_Mensual")]
    pub r_squared: Option<Decimal>,
    #[serde(rename = "Volatilidad_3Años_Mensual")]
    pub volatility: Option<Decimal>,
    #[serde(rename = "Sharpe_3Años_Mensual")]
    pub sharpe: Option<Decimal>,
}

/// One row of the client table. Bucket weights are present only when an
/// upstream run already assigned them.
#[derive(Debug, Deserialize)]
pub struct ClientRow {
    #[serde(rename = "ClienteID")]
    pub client_id: String,
    #[serde(rename = "Edad")]
    pub age: Option<u32>,
    #[serde(rename = "Sueldo_Anual")]
    pub annual_income: Option<Decimal>,
    #[serde(rename = "Sueldo_Mensual")]
    pub monthly_income: Option<Decimal>,
    #[serde(rename = "Horizonte")]
    pub horizon: Option<String>,
    #[serde(rename = "Tolerancia_Riesgo")]
    pub risk_tolerance: Option<String>,
    #[serde(rename = "Peso_RF")]
    pub weight_rf: Option<Decimal>,
    #[serde(rename = "Peso_RV")]
    pub weight_rv: Option<Decimal>,
    #[serde(rename = "Peso_Alt")]
    pub weight_alt: Option<Decimal>,
}

/// Columns without which an ETF table cannot be partitioned or joined at
/// all. Their absence aborts the load; any other column may be missing and
/// simply reads as empty.
const ETF_IDENTITY_COLUMNS: [&str; 3] = ["ISIN", "Categoría", "Grupo"];

/// Load the cleaned ETF table. Returns the usable records plus the number
/// of rows dropped for missing base fields (name, category, group, price,
/// cost, AUM).
pub fn read_etfs(path: &str) -> Result<(Vec<EtfRecord>, usize), Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let mut reader = csv::Reader::from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;

    let headers = reader.headers()?.clone();
    for column in ETF_IDENTITY_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Box::new(AdvisorError::MissingColumn {
                column: column.into(),
            }));
        }
    }

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in reader.deserialize::<EtfRow>() {
        match row {
            Ok(row) => match etf_record(row)? {
                Some(record) => records.push(record),
                None => dropped += 1,
            },
            // Unparseable cells poison only their own row.
            Err(_) => dropped += 1,
        }
    }

    Ok((records, dropped))
}

/// Map a raw row into a core record, or None when a base field is absent.
fn etf_record(row: EtfRow) -> Result<Option<EtfRecord>, Box<dyn std::error::Error>> {
    let (isin, name, category, group_code, price, cost, aum) = match (
        row.isin, row.name, row.category, row.group, row.price, row.cost, row.aum,
    ) {
        (Some(isin), Some(name), Some(category), Some(group), Some(price), Some(cost), Some(aum)) => {
            (isin, name, category, group, price, cost, aum)
        }
        _ => return Ok(None),
    };

    let group = RiskGroup::from_code(group_code)?;

    Ok(Some(EtfRecord {
        isin,
        name,
        category,
        group,
        price,
        cost,
        aum,
        returns: HistoricalReturns {
            one_month: row.ret_1m,
            three_months: row.ret_3m,
            six_months: row.ret_6m,
            one_year: row.ret_1y,
            three_years: row.ret_3y,
            five_years: row.ret_5y,
            ten_years: row.ret_10y,
        },
        risk: RiskMetrics {
            alpha: row.alpha,
            beta: row.beta,
            r_squared: row.r_squared,
            volatility: row.volatility,
            sharpe: row.sharpe,
            kid_sri: row.kid_sri,
        },
    }))
}

/// Load the client table. The ClienteID column is mandatory; everything
/// else is validated where it is used.
pub fn read_clients(path: &str) -> Result<Vec<ClientRow>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let mut reader = csv::Reader::from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;

    if !reader.headers()?.iter().any(|h| h == "ClienteID") {
        return Err(Box::new(AdvisorError::MissingColumn {
            column: "ClienteID".into(),
        }));
    }

    let mut rows = Vec::new();
    for row in reader.deserialize::<ClientRow>() {
        rows.push(row?);
    }
    Ok(rows)
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

    #[test]
    fn unparseable_cells_drop_only_their_row() {
        let path = write_csv(
            "etfa_csv_bad_cell.csv",
            "Nombre,ISIN,Categoría,Grupo,Precio,Costes,Patrimonio,Rent_1Año%\n\
             Fondo A,IE00B4L5Y983,Core,2,100,0.20,1000,8\n\
             Fondo B,IE00B4L5Y984,Core,2,not-a-price,0.20,1000,6\n",
        );
        let (records, dropped) = read_etfs(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(dropped, 1);
        assert_eq!(records[0].isin, "IE00B4L5Y983");
    }

    #[test]
    fn incomplete_rows_are_dropped_not_fatal() {
        let path = write_csv(
            "etfa_csv_missing_base.csv",
            "Nombre,ISIN,Categoría,Grupo,Precio,Costes,Patrimonio\n\
             Fondo A,IE00B4L5Y983,Core,2,100,0.20,1000\n\
             ,IE00B4L5Y984,Core,2,100,0.20,1000\n",
        );
        let (records, dropped) = read_etfs(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn missing_identity_column_is_fatal() {
        let path = write_csv(
            "etfa_csv_no_isin.csv",
            "Nombre,Categoría,Grupo,Precio,Costes,Patrimonio\n\
             Fondo A,Core,2,100,0.20,1000\n",
        );
        assert!(read_etfs(&path).is_err());
    }
}
