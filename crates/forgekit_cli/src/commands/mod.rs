pub(crate) mod describe;
pub(crate) mod meta;
pub(crate) mod providers;
pub(crate) mod run;
pub(crate) mod shared;
