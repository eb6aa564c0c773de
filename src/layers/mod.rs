pub mod activation;
pub mod descriptor;
pub mod manager;
pub mod registry;
