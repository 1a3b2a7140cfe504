mod command;
mod config;
mod frame;
mod serializable;
mod session;
