pub mod advisors;
pub mod entities;
pub mod ports;
pub mod topology;
pub mod value_objects;
