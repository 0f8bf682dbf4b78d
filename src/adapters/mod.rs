//! Concrete adapters behind the domain ports

pub mod ws;
