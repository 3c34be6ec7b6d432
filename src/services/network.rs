use std::net::{IpAddr, Ipv4Addr};

/// Host label used when no LAN address can be found
pub const LOOPBACK_LABEL: &str = "localhost";

/// First non-loopback IPv4 address bound to any interface.
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            tracing::warn!("Failed to enumerate network interfaces: {}", e);
            return None;
        }
    };

    first_lan_ipv4(interfaces.iter().map(|iface| iface.ip()))
}

fn first_lan_ipv4(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|ip| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
        _ => None,
    })
}

/// Base URL other devices on the network can use to reach this server.
///
/// A configured public URL wins over interface introspection.
pub fn access_url(public_base_url: Option<&str>, port: u16) -> String {
    if let Some(url) = public_base_url {
        return url.trim_end_matches('/').to_string();
    }
    let host = local_ipv4()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| LOOPBACK_LABEL.to_string());
    format!("http://{}:{}", host, port)
}
