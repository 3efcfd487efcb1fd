pub mod busy_time;
pub mod models;
