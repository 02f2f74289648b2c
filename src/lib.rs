pub mod calendar;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod coverage;
pub mod limits;
pub mod model;
pub mod observability;
pub mod page;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod wire;
