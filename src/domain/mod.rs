// Domain layer: records, field paths, typed schema shapes and the connector port.

pub mod model;
pub mod path;
pub mod ports;
