pub mod control_cmds;

pub use control_cmds::*;
