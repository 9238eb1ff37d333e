mod report_image_service;
mod report_service;

pub use report_image_service::{PreparedImage, ReportImageService};
pub use report_service::{ReportService, Resolution};
