pub(crate) mod barrier;
pub(crate) mod scheduler;
