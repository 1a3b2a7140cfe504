mod error;
mod store;
