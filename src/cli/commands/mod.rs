//! Individual CLI commands

pub mod init;
pub mod kinds;
pub mod references;
pub mod run;
pub mod scan;
