pub mod csv_handler;
pub mod http;
pub mod password;
pub mod time;
pub mod validation;
