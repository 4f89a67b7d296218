pub mod decision;
pub mod fuse;
pub mod keeper;
pub mod locked;
pub mod strategy;
pub mod tick_math;
pub mod vault;
pub mod withdraw;
