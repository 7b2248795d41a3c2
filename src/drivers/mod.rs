pub mod cruise;
pub mod dynamics;
pub mod load;
pub mod panel;
pub mod pid;
