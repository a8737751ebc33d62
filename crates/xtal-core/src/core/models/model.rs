use super::ids::ChainId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Model name; in practice the model serial number as text.
    pub name: String,
    pub(crate) chains: Vec<ChainId>,
}

impl Model {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chains: Vec::new(),
        }
    }

    pub fn chains(&self) -> &[ChainId] {
        &self.chains
    }
}
