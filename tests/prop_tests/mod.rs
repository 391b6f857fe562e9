mod query;
mod service;
