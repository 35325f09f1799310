use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{ComplexityLevel, Specialization, TaxProfessional};
use crate::store::Stores;

static DEFAULT_ROSTER: &str = include_str!("../../data/default_roster.csv");

#[derive(Debug, Deserialize)]
struct RosterRow {
    id: String,
    name: String,
    specializations: String,
    max_complexity: String,
    max_daily_appointments: u32,
    rating: f64,
    available: bool,
}

fn parse_row(row: RosterRow, line: usize) -> Result<TaxProfessional, AppError> {
    let specializations = row
        .specializations
        .split('|')
        .map(|s| {
            Specialization::parse(s)
                .ok_or_else(|| AppError::Roster(format!("line {line}: unknown specialization {s:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let max_complexity = ComplexityLevel::parse(&row.max_complexity).ok_or_else(|| {
        AppError::Roster(format!(
            "line {line}: unknown complexity level {:?}",
            row.max_complexity
        ))
    })?;

    if !(0.0..=5.0).contains(&row.rating) {
        return Err(AppError::Roster(format!(
            "line {line}: rating {} out of range",
            row.rating
        )));
    }

    Ok(TaxProfessional {
        id: row.id,
        name: row.name,
        specializations,
        max_complexity,
        current_load: 0,
        max_daily_appointments: row.max_daily_appointments,
        available: row.available,
        rating: row.rating,
    })
}

fn parse_roster(data: &str) -> Result<Vec<TaxProfessional>, AppError> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let mut pros = vec![];
    for (i, result) in reader.deserialize::<RosterRow>().enumerate() {
        // +2: one for the header, one for 1-based numbering
        let line = i + 2;
        let row = result.map_err(|e| AppError::Roster(format!("line {line}: {e}")))?;
        pros.push(parse_row(row, line)?);
    }
    if pros.is_empty() {
        return Err(AppError::Roster("roster has no professionals".to_string()));
    }
    Ok(pros)
}

/// Load the tax-professional roster from `path`, falling back to the
/// embedded default roster when no path is configured.
pub fn load_roster(path: Option<&str>) -> Result<Vec<TaxProfessional>, AppError> {
    match path {
        Some(p) => {
            let data = std::fs::read_to_string(p)
                .map_err(|e| AppError::Roster(format!("cannot read {p}: {e}")))?;
            parse_roster(&data)
        }
        None => parse_roster(DEFAULT_ROSTER),
    }
}

pub fn seed_roster(stores: &Stores, pros: Vec<TaxProfessional>) {
    for pro in pros {
        let id = pro.id.clone();
        stores.tax_pros.put(&id, pro);
    }
    tracing::info!(count = stores.tax_pros.len(), "tax professional roster loaded");
}
