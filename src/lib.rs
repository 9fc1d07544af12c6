pub mod app;
pub mod config;
pub mod consensus;
pub mod error;
pub mod state;
pub mod api {
    pub mod auth;
    pub mod categories;
    pub mod errors;
    pub mod questions;
    pub mod response;
    pub mod users;
}
pub mod auth {
    pub mod middleware;
    pub mod models;
    pub mod password;
    pub mod token;
}
pub mod db {
    pub mod category_repository;
    pub mod models;
    pub mod question_repository;
    pub mod user_repository;
}
pub mod llm {
    pub mod client;
    pub mod sse;
}
pub mod models {
    pub mod partition;
}

#[cfg(test)]
pub(crate) mod test_support;
