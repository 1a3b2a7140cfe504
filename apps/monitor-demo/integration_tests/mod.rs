mod helpers;
mod store;
