pub mod history;
pub mod traits;
