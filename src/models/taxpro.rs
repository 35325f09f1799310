use serde::{Deserialize, Serialize};

/// Ordered so that a professional rated for a higher tier covers every
/// lower tier (`max_complexity >= level`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
    Expert,
}

impl ComplexityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityLevel::Simple => "simple",
            ComplexityLevel::Moderate => "moderate",
            ComplexityLevel::Complex => "complex",
            ComplexityLevel::Expert => "expert",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Some(ComplexityLevel::Simple),
            "moderate" => Some(ComplexityLevel::Moderate),
            "complex" => Some(ComplexityLevel::Complex),
            "expert" => Some(ComplexityLevel::Expert),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    Individual,
    SelfEmployment,
    SmallBusiness,
    Investments,
    RealEstate,
    Crypto,
    ForeignIncome,
    EstatePlanning,
    AuditRepresentation,
}

impl Specialization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialization::Individual => "individual",
            Specialization::SelfEmployment => "self_employment",
            Specialization::SmallBusiness => "small_business",
            Specialization::Investments => "investments",
            Specialization::RealEstate => "real_estate",
            Specialization::Crypto => "crypto",
            Specialization::ForeignIncome => "foreign_income",
            Specialization::EstatePlanning => "estate_planning",
            Specialization::AuditRepresentation => "audit_representation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "individual" => Some(Specialization::Individual),
            "self_employment" => Some(Specialization::SelfEmployment),
            "small_business" => Some(Specialization::SmallBusiness),
            "investments" => Some(Specialization::Investments),
            "real_estate" => Some(Specialization::RealEstate),
            "crypto" => Some(Specialization::Crypto),
            "foreign_income" => Some(Specialization::ForeignIncome),
            "estate_planning" => Some(Specialization::EstatePlanning),
            "audit_representation" => Some(Specialization::AuditRepresentation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxProfessional {
    pub id: String,
    pub name: String,
    pub specializations: Vec<Specialization>,
    pub max_complexity: ComplexityLevel,
    pub current_load: u32,
    pub max_daily_appointments: u32,
    pub available: bool,
    pub rating: f64,
}

impl TaxProfessional {
    pub fn has_capacity(&self) -> bool {
        self.current_load < self.max_daily_appointments
    }
}
