pub mod auth;
pub mod data;
pub mod nav;
pub mod perm;
pub mod routes;
