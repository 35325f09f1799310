use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedJoint,
    MarriedSeparate,
    HeadOfHousehold,
    QualifyingWidow,
}

impl FilingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedJoint => "married_joint",
            FilingStatus::MarriedSeparate => "married_separate",
            FilingStatus::HeadOfHousehold => "head_of_household",
            FilingStatus::QualifyingWidow => "qualifying_widow",
        }
    }

    pub fn parse(s: &str) -> Self {
        let s = s.to_lowercase();
        if s.contains("separate") {
            FilingStatus::MarriedSeparate
        } else if s.contains("married") || s.contains("joint") {
            FilingStatus::MarriedJoint
        } else if s.contains("head") {
            FilingStatus::HeadOfHousehold
        } else if s.contains("widow") {
            FilingStatus::QualifyingWidow
        } else {
            FilingStatus::Single
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IncomeKind {
    W2,
    SelfEmployment,
    Business,
    Investments,
    Rental,
    Retirement,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeductionKind {
    MortgageInterest,
    CharitableDonations,
    MedicalExpenses,
    Education,
    RetirementContributions,
    HomeOffice,
}

/// Situations that bump complexity and demand a matching specialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SpecialSituation {
    Crypto,
    ForeignAccounts,
    RentalProperty,
    SelfEmployment,
    SmallBusiness,
    MajorInvestments,
    EstatePlanning,
    AuditHistory,
}

impl SpecialSituation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialSituation::Crypto => "crypto",
            SpecialSituation::ForeignAccounts => "foreign_accounts",
            SpecialSituation::RentalProperty => "rental_property",
            SpecialSituation::SelfEmployment => "self_employment",
            SpecialSituation::SmallBusiness => "small_business",
            SpecialSituation::MajorInvestments => "major_investments",
            SpecialSituation::EstatePlanning => "estate_planning",
            SpecialSituation::AuditHistory => "audit_history",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    pub id: String,
    pub name: Option<String>,
    pub filing_status: FilingStatus,
    pub dependents: u32,
    pub income_kinds: Vec<IncomeKind>,
    pub deductions: Vec<DeductionKind>,
    pub special_situations: Vec<SpecialSituation>,
    pub intake_completed: bool,
    pub documents_collected: Vec<String>,
    pub documents_pending: Vec<String>,
    pub assigned_tax_pro: Option<String>,
    pub appointment_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ClientProfile {
    pub fn new(id: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            name: None,
            filing_status: FilingStatus::Single,
            dependents: 0,
            income_kinds: vec![],
            deductions: vec![],
            special_situations: vec![],
            intake_completed: false,
            documents_collected: vec![],
            documents_pending: vec![],
            assigned_tax_pro: None,
            appointment_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_situation(&self, situation: SpecialSituation) -> bool {
        self.special_situations.contains(&situation)
    }
}
