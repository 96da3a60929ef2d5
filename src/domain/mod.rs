pub mod dashboard;
pub mod pipeline;
pub mod prospect;

pub use pipeline::{Action, AppointmentCapture, QuickAction};
pub use prospect::{ProjectType, Prospect, ProspectDraft, ProspectPatch, Status};
