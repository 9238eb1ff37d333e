mod classification_service;
mod transcription_service;
mod verification_service;

pub use classification_service::ClassificationService;
pub use transcription_service::TranscriptionService;
pub use verification_service::{VerificationRequest, VerificationService};
