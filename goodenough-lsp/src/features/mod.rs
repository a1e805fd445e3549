pub mod code_actions;
pub mod definition;
pub mod hover;
pub mod workspace_symbols;

#[cfg(test)]
pub(crate) mod test_support;
