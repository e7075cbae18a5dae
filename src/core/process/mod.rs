pub mod monitor;
pub mod table;

pub use monitor::{GameProcess, ProcessMonitor, RunningProbe};
pub use table::{ProcessEntry, ProcessTable, SysinfoProcessTable};
