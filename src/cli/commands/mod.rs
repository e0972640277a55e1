pub mod analyze;
pub mod clean;
pub mod config;
pub mod explain;
pub mod init;
pub mod knowledge;
pub mod quick;
pub mod status;
