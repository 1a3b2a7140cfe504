mod helpers;
mod monitor;
mod middleware;
