pub mod batch;
pub mod eval;
pub mod init;
