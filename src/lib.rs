pub mod auth;
pub mod backend;
pub mod calibration;
pub mod db;
pub mod feed;
pub mod logger;
pub mod model;
pub mod overview;
pub mod series;
pub mod settings;
pub mod status;
