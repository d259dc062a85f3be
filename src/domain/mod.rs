// Domain layer: core models, wire schemas and ports (interfaces).

pub mod model;
pub mod ports;
pub mod remote;
