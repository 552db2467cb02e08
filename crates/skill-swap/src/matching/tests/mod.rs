mod common;
mod connections;
