pub mod download_exporter;
pub mod share_exporter;
