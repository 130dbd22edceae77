//! ToolInput trait - tool 名と入力型を対応付ける
//!
//! # Trait Bounds
//! - `Serialize`: plan の parameters として書き出せるように
//! - `DeserializeOwned`: plan の JSON parameters から復元するため
//! - `Send + Sync + 'static`: Arc<dyn DynTool> に格納するため

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Typed parameters of one tool.
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Default)]
/// #[serde(default)]
/// struct PortScan { ports: Vec<u16> }
///
/// impl ToolInput for PortScan {
///     const NAME: &'static str = "port_scan";
///     const DESCRIPTION: &'static str = "List open ports declared by the endpoint";
/// }
/// ```
pub trait ToolInput: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name the planner uses in `tool_name`.
    const NAME: &'static str;

    /// One-line description shown to the planner.
    const DESCRIPTION: &'static str;
}
