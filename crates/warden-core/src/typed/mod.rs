//! Typed - 型付き Tool API
//!
//! tool 名の typo を型で排除し、入力の decode を一箇所にまとめる。
//! planner が出した `tool_name` は registry で DynTool に解決される。

pub mod handler;
pub mod registry;
pub mod tool;

pub use self::handler::{DynTool, ToolHandler, TypedTool};
pub use self::registry::{RegistryError, ToolRegistry};
pub use self::tool::ToolInput;
