//! 生命周期：启动时组装服务，关闭时等待信号

pub mod shutdown;
pub mod startup;
