use std::collections::BTreeSet;

use crate::models::{
    ClientProfile, ComplexityLevel, FilingStatus, IncomeKind, SpecialSituation, Specialization,
};

const DEPENDENT_WEIGHT: u32 = 3;
const DEPENDENT_CAP: u32 = 15;
const DEDUCTION_WEIGHT: u32 = 4;
const DEDUCTION_CAP: u32 = 20;

fn filing_status_weight(status: FilingStatus) -> u32 {
    match status {
        FilingStatus::Single => 5,
        FilingStatus::MarriedJoint => 8,
        FilingStatus::HeadOfHousehold => 8,
        FilingStatus::QualifyingWidow => 8,
        FilingStatus::MarriedSeparate => 12,
    }
}

fn income_weight(kind: IncomeKind) -> u32 {
    match kind {
        IncomeKind::W2 => 5,
        IncomeKind::Other => 5,
        IncomeKind::Retirement => 8,
        IncomeKind::Investments => 12,
        IncomeKind::Rental => 15,
        IncomeKind::SelfEmployment => 25,
        IncomeKind::Business => 25,
    }
}

fn situation_weight(situation: SpecialSituation) -> u32 {
    match situation {
        SpecialSituation::MajorInvestments => 35,
        SpecialSituation::RentalProperty => 40,
        SpecialSituation::SelfEmployment => 45,
        SpecialSituation::SmallBusiness => 45,
        SpecialSituation::Crypto => 50,
        SpecialSituation::ForeignAccounts => 55,
        SpecialSituation::EstatePlanning => 55,
        SpecialSituation::AuditHistory => 60,
    }
}

/// Additive 0-100 estimate of how involved the client's return is.
/// Pure and deterministic; adding a qualifying tag never lowers the score.
pub fn complexity_score(client: &ClientProfile) -> u32 {
    let mut score = filing_status_weight(client.filing_status);

    score += (client.dependents * DEPENDENT_WEIGHT).min(DEPENDENT_CAP);

    for kind in &client.income_kinds {
        score += income_weight(*kind);
    }

    score += (client.deductions.len() as u32 * DEDUCTION_WEIGHT).min(DEDUCTION_CAP);

    for situation in &client.special_situations {
        score += situation_weight(*situation);
    }

    score.min(100)
}

/// Tier boundaries: simple [0,20], moderate [21,50], complex [51,80],
/// expert [81,100]. Lower bound of each tier is inclusive.
pub fn complexity_level(score: u32) -> ComplexityLevel {
    match score {
        0..=20 => ComplexityLevel::Simple,
        21..=50 => ComplexityLevel::Moderate,
        51..=80 => ComplexityLevel::Complex,
        _ => ComplexityLevel::Expert,
    }
}

pub fn client_complexity(client: &ClientProfile) -> (u32, ComplexityLevel) {
    let score = complexity_score(client);
    (score, complexity_level(score))
}

/// Which specializations a matching professional must cover. A client with
/// no special situations only needs a generalist.
pub fn required_specializations(client: &ClientProfile) -> BTreeSet<Specialization> {
    let mut required: BTreeSet<Specialization> = client
        .special_situations
        .iter()
        .map(|s| match s {
            SpecialSituation::Crypto => Specialization::Crypto,
            SpecialSituation::ForeignAccounts => Specialization::ForeignIncome,
            SpecialSituation::RentalProperty => Specialization::RealEstate,
            SpecialSituation::SelfEmployment => Specialization::SelfEmployment,
            SpecialSituation::SmallBusiness => Specialization::SmallBusiness,
            SpecialSituation::MajorInvestments => Specialization::Investments,
            SpecialSituation::EstatePlanning => Specialization::EstatePlanning,
            SpecialSituation::AuditHistory => Specialization::AuditRepresentation,
        })
        .collect();

    if required.is_empty() {
        required.insert(Specialization::Individual);
    }
    required
}

/// Base appointment minutes per tier, assuming a completed intake. An
/// incomplete intake costs extra time gathering what intake would have.
pub fn estimated_duration_minutes(level: ComplexityLevel, intake_completed: bool) -> u32 {
    let base = match level {
        ComplexityLevel::Simple => 30,
        ComplexityLevel::Moderate => 45,
        ComplexityLevel::Complex => 60,
        ComplexityLevel::Expert => 90,
    };
    if intake_completed {
        base
    } else {
        base + 30
    }
}
