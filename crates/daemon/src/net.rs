//! LAN address discovery.

use std::net::{IpAddr, Ipv4Addr};

use tracing::warn;

/// Non-loopback IPv4 addresses of this host, in interface order.
///
/// Returns an empty list if interfaces cannot be enumerated.
pub fn local_ipv4_addrs() -> Vec<Ipv4Addr> {
    match local_ip_address::list_afinet_netifas() {
        Ok(interfaces) => filter_lan_ipv4(interfaces.into_iter().map(|(_, ip)| ip)),
        Err(e) => {
            warn!("Failed to enumerate network interfaces: {}", e);
            Vec::new()
        }
    }
}

/// URL clients should open, using the first LAN address or `localhost`.
pub fn share_url(port: u16) -> String {
    let ips = local_ipv4_addrs();
    url_for(ips.first().copied(), port)
}

/// URLs for every LAN address.
pub fn share_urls(port: u16) -> Vec<String> {
    local_ipv4_addrs()
        .into_iter()
        .map(|ip| url_for(Some(ip), port))
        .collect()
}

fn url_for(ip: Option<Ipv4Addr>, port: u16) -> String {
    match ip {
        Some(ip) => format!("http://{}:{}", ip, port),
        None => format!("http://localhost:{}", port),
    }
}

fn filter_lan_ipv4(addrs: impl IntoIterator<Item = IpAddr>) -> Vec<Ipv4Addr> {
    let mut out = Vec::new();
    for addr in addrs {
        if let IpAddr::V4(v4) = addr {
            if !v4.is_loopback() && !v4.is_unspecified() && !out.contains(&v4) {
                out.push(v4);
            }
        }
    }
    out
}
