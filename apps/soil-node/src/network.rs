//! 网络就绪等待：broker 主机名可解析之前不进入控制循环。

use domain::Clock;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

/// 阻塞直到 `host:port` 解析出至少一个地址。
pub async fn wait_for_network(
    host: &str,
    port: u16,
    retry: Duration,
    clock: &dyn Clock,
) -> SocketAddr {
    let mut attempts: u64 = 0;
    loop {
        attempts += 1;
        match tokio::net::lookup_host((host, port)).await {
            Ok(mut addrs) => {
                if let Some(addr) = addrs.next() {
                    info!(
                        target: "soil.node",
                        host = %host,
                        addr = %addr,
                        attempts = attempts,
                        "network_ready"
                    );
                    return addr;
                }
                warn!(target: "soil.node", host = %host, attempts = attempts, "network_no_address");
            }
            Err(err) => {
                warn!(
                    target: "soil.node",
                    host = %host,
                    attempts = attempts,
                    error = %err,
                    "network_not_ready"
                );
            }
        }
        clock.sleep(retry).await;
    }
}
