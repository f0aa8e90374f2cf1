pub mod config;
pub mod error;
pub mod guard;
pub mod state;

pub mod models {
    pub mod blog;
    pub mod session;
    pub mod user;
}

pub mod storage {
    pub mod file;
    pub mod kv;
}

pub mod session {
    pub mod broadcaster;
    pub mod store;
    pub mod token;
}

pub mod remote {
    pub mod auth;
    pub mod blogs;
    pub mod client;
    pub mod profile;
}

pub mod services {
    pub mod auth;
    pub mod blogs;
    pub mod profile;
}

pub mod listing {
    pub mod controller;
    pub mod owned;
}

pub mod validation {
    pub mod rules;
}
