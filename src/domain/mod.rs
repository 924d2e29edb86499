// Domain layer: models, static report schemas and ports (interfaces).

pub mod model;
pub mod ports;
pub mod schema;
pub mod session;
