pub mod audit;
pub mod capa;
pub mod comment;
pub mod dispatch;
pub mod export;
pub mod incident;
pub mod init;
pub mod label;
pub mod shared;
pub mod source;
pub mod timeline;
