//! ToolRegistry - tool の登録と名前解決
//!
//! # 内部実装
//! - `register::<T, H>(handler)` で TypedTool にラップして DynTool として保存
//! - HashMap<String, Arc<dyn DynTool>> で管理
//! - 初期化時に構築し、実行時は読み取りのみ（lock 不要）

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::{DynTool, ToolHandler, TypedTool};
use super::tool::ToolInput;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    AlreadyRegistered(String),
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn DynTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: ToolInput, H: ToolHandler<T> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        self.register_dyn(Arc::new(TypedTool::<T, H>::new(handler)))
    }

    /// Register an already type-erased tool.
    pub fn register_dyn(&mut self, tool: Arc<dyn DynTool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynTool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// `(name, description)` pairs, sorted by name.
    pub fn descriptions(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .tools
            .values()
            .map(|t| (t.name().to_string(), t.description().to_string()))
            .collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::handler::fixtures::{EchoHandler, StrictHandler};
    use crate::typed::tool::fixtures::{EchoInput, StrictInput};

    #[test]
    fn register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register::<EchoInput, _>(EchoHandler).unwrap();

        assert!(registry.get(EchoInput::NAME).is_some());
        assert!(registry.get("missing").is_none());
        assert!(registry.contains("echo"));
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register::<EchoInput, _>(EchoHandler).unwrap();

        let result = registry.register::<EchoInput, _>(EchoHandler);
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(name)) if name == "echo"));
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register::<StrictInput, _>(StrictHandler).unwrap();
        registry.register::<EchoInput, _>(EchoHandler).unwrap();

        assert_eq!(registry.names(), vec!["echo".to_string(), "strict".to_string()]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.descriptions()[0].1, EchoInput::DESCRIPTION);
    }
}
