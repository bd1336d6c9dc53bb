//! 基础设施层（Infrastructure Layer）
//!
//! 持有稀缺资源（容器运行时），只暴露能力，不认识业务模型。

pub mod docker_runner;

pub use docker_runner::{DockerRunner, RunSpec};
