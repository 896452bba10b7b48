pub(crate) mod bootstrap;
pub(crate) mod gameplay;
pub(crate) mod layout;
pub(crate) mod loop_runner;
pub(crate) mod overrides;
pub(crate) mod scenes;
