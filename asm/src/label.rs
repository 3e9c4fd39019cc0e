use crate::error::AsmError;
use crate::token::Pos;
use indexmap::IndexMap;

/// Label name -> (definition site, address). Names are case-sensitive and
/// iteration follows definition order.
#[derive(Debug, Clone, Default)]
pub struct Labels(IndexMap<String, (Pos, u32)>);

impl Labels {
    pub fn new() -> Self {
        Labels(IndexMap::new())
    }

    pub fn define(&mut self, name: &str, pos: Pos, addr: u32) -> Result<(), AsmError> {
        if self.0.contains_key(name) {
            return Err(AsmError::RedefinedLabel(name.to_string()));
        }
        self.0.insert(name.to_string(), (pos, addr));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.0.get(name).map(|(_, addr)| *addr)
    }

    pub fn defined_at(&self, name: &str) -> Option<Pos> {
        self.0.get(name).map(|(pos, _)| *pos)
    }

    /// First label defined at `addr`.
    pub fn name_of(&self, addr: u32) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, (_, a))| *a == addr)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(name, (_, addr))| (name.as_str(), *addr))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
