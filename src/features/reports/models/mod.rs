mod report;
mod report_image;

pub use report::*;
pub use report_image::*;
