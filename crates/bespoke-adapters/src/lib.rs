//! Clientes HTTP hacia los servicios worker y el coordinador.
pub mod coordinator;
mod http;
pub mod worker;

pub use coordinator::CoordinatorClient;
pub use worker::HttpWorkerClient;
