mod transcription;
mod verdict;

pub use transcription::*;
pub use verdict::*;
