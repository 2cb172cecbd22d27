//! Runtime target address parsing
//!
//! Operators type targets by hand, so the accepted form is small and strict:
//!
//! - `192.168.0.100` (default port applies)
//! - `192.168.0.100:8101`
//! - `::1` or `[::1]` (default port applies)
//! - `[fe80::1]:8101`
//!
//! Host names are rejected. Resolving them would block the controller loop.

use std::net::{IpAddr, SocketAddr};

use crate::error::{Result, TransportError};

/// Parse `host[:port]` into a socket address
pub fn parse_runtime_address(input: &str, default_port: u16) -> Result<SocketAddr> {
    let input = input.trim();
    if input.is_empty() {
        return Err(invalid(input, "address is empty"));
    }

    // Bare IP literal, which covers unbracketed IPv6 with no port
    if let Ok(ip) = input.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }

    if let Some(rest) = input.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| invalid(input, "missing closing bracket"))?;
        let ip = host
            .parse::<IpAddr>()
            .map_err(|_| invalid(input, "bracketed host is not an IP address"))?;
        let port = match tail {
            "" => default_port,
            _ => {
                let port = tail
                    .strip_prefix(':')
                    .ok_or_else(|| invalid(input, "unexpected text after bracket"))?;
                parse_port(input, port)?
            }
        };
        return Ok(SocketAddr::new(ip, port));
    }

    let (host, port) = input
        .rsplit_once(':')
        .ok_or_else(|| invalid(input, "host is not an IP address"))?;
    let ip = host
        .parse::<IpAddr>()
        .map_err(|_| invalid(input, "host is not an IP address"))?;
    if ip.is_ipv6() {
        return Err(invalid(input, "IPv6 address with port must be bracketed"));
    }
    Ok(SocketAddr::new(ip, parse_port(input, port)?))
}

fn parse_port(input: &str, port: &str) -> Result<u16> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(invalid(input, "port must be a number from 1 to 65535")),
        Ok(port) => Ok(port),
    }
}

fn invalid(input: &str, reason: &str) -> TransportError {
    TransportError::configuration(
        format!("Invalid runtime address '{}': {}", input, reason),
        Some("address"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORT: u16 = 8101;

    #[test]
    fn test_ipv4_without_port_uses_default() {
        let addr = parse_runtime_address("192.168.0.100", PORT).unwrap();
        assert_eq!(addr, "192.168.0.100:8101".parse().unwrap());
    }

    #[test]
    fn test_ipv4_with_port() {
        let addr = parse_runtime_address(" 10.0.0.7:9000 ", PORT).unwrap();
        assert_eq!(addr, "10.0.0.7:9000".parse().unwrap());
    }

    #[test]
    fn test_ipv6_forms() {
        assert_eq!(
            parse_runtime_address("::1", PORT).unwrap(),
            "[::1]:8101".parse().unwrap()
        );
        assert_eq!(
            parse_runtime_address("[::1]", PORT).unwrap(),
            "[::1]:8101".parse().unwrap()
        );
        assert_eq!(
            parse_runtime_address("[fe80::1]:7000", PORT).unwrap(),
            "[fe80::1]:7000".parse().unwrap()
        );
    }

    #[test]
    fn test_rejections() {
        for bad in [
            "",
            "   ",
            "robot.local",
            "robot.local:8101",
            "192.168.0.100:",
            "192.168.0.100:0",
            "192.168.0.100:65536",
            "192.168.0.100:http",
            "300.1.1.1",
            "[::1",
            "[::1]x",
            "[robot]:8101",
        ] {
            let err = parse_runtime_address(bad, PORT).unwrap_err();
            assert_eq!(err.category(), "configuration", "input {:?}", bad);
        }
    }

    #[test]
    fn test_error_names_the_input() {
        let err = parse_runtime_address("robot.local", PORT).unwrap_err();
        assert!(err.to_string().contains("robot.local"));
    }
}
