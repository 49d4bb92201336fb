mod database {
    pub mod actions;
    pub mod error;
    pub mod filter;
    pub mod form;
    pub mod import;
    pub mod schema;
    pub mod setup;
}
mod authentication {
    pub mod jwt;
    pub mod middleware;
}
mod config;
mod constants;

pub use authentication::*;
pub use config::*;
pub use constants::*;
pub use database::*;
