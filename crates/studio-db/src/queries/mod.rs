pub mod chat_history;
pub mod portfolio;
pub mod preferences;
pub mod projects;
pub mod supplies;
