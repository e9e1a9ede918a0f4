pub mod analysis_service;
pub mod chart_service;
pub mod history_service;
pub mod indicator_service;
