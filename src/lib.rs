#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]

pub mod common;
pub mod config;
pub mod database;
pub mod frame;
pub mod generator;
pub mod normalize;
pub mod pipeline;
pub mod scanner;
pub mod schema;
pub mod table;
pub mod value;
