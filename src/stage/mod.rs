pub(crate) mod frame;
pub(crate) mod layout;
pub(crate) mod map;

#[cfg(test)]
#[path = "../../tests/unit/stage/stage.rs"]
mod tests;
