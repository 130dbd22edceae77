//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。engine は trait だけを見て、
//! LLM プロバイダ・履歴ストア・時刻・ID 生成の実装を差し替えられる。

pub mod clock;
pub mod history;
pub mod id_generator;
pub mod llm;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::history::HistoryStore;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::llm::LlmClient;
