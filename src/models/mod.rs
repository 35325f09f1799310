pub mod appointment;
pub mod client;
pub mod flow;
pub mod intake;
pub mod reminder;
pub mod taxpro;

pub use appointment::{Appointment, AppointmentStatus, AppointmentType};
pub use client::{ClientProfile, DeductionKind, FilingStatus, IncomeKind, SpecialSituation};
pub use flow::{ConversationFlowState, FlowStage, SchedulePreferences};
pub use intake::IntakeSession;
pub use reminder::Reminder;
pub use taxpro::{ComplexityLevel, Specialization, TaxProfessional};
