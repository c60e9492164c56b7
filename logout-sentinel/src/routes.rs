mod gateway;
mod health_check;

pub use gateway::proxy_navigation;
pub use health_check::health_check;
