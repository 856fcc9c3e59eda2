// Domain layer: models and ports (interfaces) shared by the client and the page controller.

pub mod model;
pub mod ports;
