pub mod cluster;
pub mod consts;
