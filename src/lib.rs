pub mod actions;
pub mod app;
pub mod config;
pub mod errors;
pub mod functions;
pub mod handlers;
pub mod journal;
pub mod models;
pub mod reducer;
pub mod state;
pub mod storage;
pub mod store;
pub mod tips;

pub use actions::Action;
pub use app::router;
pub use config::Config;
pub use models::AppData;
pub use reducer::reduce;
pub use state::AppState;
pub use store::Store;
