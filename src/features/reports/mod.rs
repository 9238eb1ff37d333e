pub mod dtos;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod reference;
pub mod routes;
pub mod services;
pub mod sla;

pub use services::{ReportImageService, ReportService};
