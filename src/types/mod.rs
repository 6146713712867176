pub mod errors;
pub mod report;
pub mod scan;
