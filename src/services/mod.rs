pub mod appointments;
pub mod checklist;
pub mod complexity;
pub mod flow;
pub mod intake;
pub mod notify;
pub mod reminders;
pub mod roster;
pub mod routing;
pub mod sync;
