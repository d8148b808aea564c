pub mod aws;
pub mod compute;
pub mod db;
pub mod identity;
pub mod lookup;
pub mod queue;
pub mod stack;
pub mod storage;
