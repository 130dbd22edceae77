//! ToolHandler trait - ToolInput を受け取って JSON を返す
//!
//! # 二層構造
//! - **表層（Typed）**: `ToolHandler<T>` - 入力型が静的に決まる
//! - **内部（Dyn）**: `DynTool` - object-safe、HashMap に格納できる
//! - `TypedTool<T, H>` が JSON parameters を T に decode して橋渡しする

use std::marker::PhantomData;

use async_trait::async_trait;

use super::tool::ToolInput;
use crate::domain::{DecisionContext, ToolError};

/// Runs one tool with typed input.
#[async_trait]
pub trait ToolHandler<T: ToolInput>: Send + Sync {
    async fn invoke(&self, input: T, ctx: &DecisionContext) -> Result<serde_json::Value, ToolError>;
}

/// Object-safe view of a tool, keyed by name in the registry.
#[async_trait]
pub trait DynTool: Send + Sync {
    async fn invoke_dyn(
        &self,
        parameters: &serde_json::Value,
        ctx: &DecisionContext,
    ) -> Result<serde_json::Value, ToolError>;

    fn name(&self) -> &str;

    fn description(&self) -> &str;
}

pub struct TypedTool<T: ToolInput, H: ToolHandler<T>> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ToolInput, H: ToolHandler<T>> TypedTool<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: ToolInput, H: ToolHandler<T>> DynTool for TypedTool<T, H> {
    async fn invoke_dyn(
        &self,
        parameters: &serde_json::Value,
        ctx: &DecisionContext,
    ) -> Result<serde_json::Value, ToolError> {
        // Planners often send null for "no parameters".
        let parameters = match parameters {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other.clone(),
        };
        let input: T = serde_json::from_value(parameters).map_err(|e| {
            ToolError::invalid_parameters(format!("invalid parameters for {}: {e}", T::NAME))
        })?;
        self.handler.invoke(input, ctx).await
    }

    fn name(&self) -> &str {
        T::NAME
    }

    fn description(&self) -> &str {
        T::DESCRIPTION
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{EchoHandler, StrictHandler};
    use super::*;
    use crate::domain::ToolErrorKind;
    use crate::typed::tool::fixtures::{EchoInput, StrictInput};
    use serde_json::json;

    fn ctx() -> DecisionContext {
        DecisionContext::new("u1", "p1", json!({}))
    }

    #[tokio::test]
    async fn typed_tool_decodes_parameters() {
        let tool = TypedTool::<EchoInput, _>::new(EchoHandler);

        let out = tool.invoke_dyn(&json!({ "value": 7 }), &ctx()).await.unwrap();
        assert_eq!(out, json!({ "value": 7, "user": "u1" }));
        assert_eq!(tool.name(), "echo");
    }

    #[tokio::test]
    async fn null_parameters_use_defaults() {
        let tool = TypedTool::<EchoInput, _>::new(EchoHandler);

        let out = tool.invoke_dyn(&serde_json::Value::Null, &ctx()).await.unwrap();
        assert_eq!(out["value"], 0);
    }

    #[tokio::test]
    async fn bad_parameters_are_invalid_parameters_error() {
        let tool = TypedTool::<StrictInput, _>::new(StrictHandler);

        let err = tool.invoke_dyn(&json!({}), &ctx()).await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::InvalidParameters);
        assert!(err.to_string().contains("strict"));
    }
}
