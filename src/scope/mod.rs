// src/scope/mod.rs
// 波形坐标、缓冲区与测量子系统
pub mod buffer;
pub mod chart;
pub mod config;
pub mod coords;
pub mod error;
pub mod intersect;
pub mod measure;
pub mod offset;
pub mod range;
pub mod render;
pub mod session;
pub mod source;
// 公开导出界面层直接使用的类型
pub use config::ScopeConfig;
pub use error::ScopeError;
pub use session::ScopeSession;
pub use source::{SignalSource, SyntheticSource};
