pub mod client;
pub mod esit;
pub mod provider;
