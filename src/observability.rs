//! 可观测性：tracing 订阅器初始化
//!
//! 默认 info 级别，RUST_LOG 可按目标覆盖（如 `RUST_LOG=fp_hearing=debug`）。
//! 由装配进程在启动时调用一次。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();
}
