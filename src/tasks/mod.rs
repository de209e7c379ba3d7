pub(crate) mod judging;
pub(crate) mod scheduler;
