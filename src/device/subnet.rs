// Subnet spec parsing: "10.0.0.0/24", "10.0.0.5-10.0.0.20" or "10.0.0.7".

use std::net::Ipv4Addr;

use crate::error::DiscoveryError;

/// Upper bound on hosts in one spec (a /16).
pub const MAX_HOSTS: u32 = 1 << 16;

/// Expands a subnet spec into the host addresses to probe.
/// CIDR blocks of /30 or larger exclude the network and broadcast addresses.
pub fn parse_subnet(spec: &str) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
    let spec = spec.trim();
    let invalid = |reason: String| DiscoveryError::InvalidSubnet {
        spec: spec.to_string(),
        reason,
    };

    if let Some((addr, prefix)) = spec.split_once('/') {
        let addr = parse_addr(addr).map_err(invalid)?;
        let prefix: u32 = prefix
            .trim()
            .parse()
            .map_err(|_| invalid(format!("bad prefix length {prefix:?}")))?;
        if prefix > 32 {
            return Err(invalid(format!("prefix length {prefix} exceeds 32")));
        }
        let size = 1u64 << (32 - prefix);
        if size > MAX_HOSTS as u64 {
            return Err(invalid(format!("/{prefix} is larger than {MAX_HOSTS} hosts")));
        }
        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
        let network = u32::from(addr) & mask;
        let last = network + (size as u32 - 1);
        let (first, last) = if size > 2 {
            (network + 1, last - 1)
        } else {
            (network, last)
        };
        return Ok((first..=last).map(Ipv4Addr::from).collect());
    }

    if let Some((start, end)) = spec.split_once('-') {
        let start = u32::from(parse_addr(start).map_err(invalid)?);
        let end = u32::from(parse_addr(end).map_err(invalid)?);
        if start > end {
            return Err(invalid("range start is after range end".into()));
        }
        if end - start >= MAX_HOSTS {
            return Err(invalid(format!("range is larger than {MAX_HOSTS} hosts")));
        }
        return Ok((start..=end).map(Ipv4Addr::from).collect());
    }

    let addr = parse_addr(spec).map_err(invalid)?;
    Ok(vec![addr])
}

fn parse_addr(s: &str) -> Result<Ipv4Addr, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("bad IPv4 address {:?}", s.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cidr_24_excludes_network_and_broadcast() {
        let hosts = parse_subnet("192.168.1.0/24").unwrap();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts[0], Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(hosts[253], Ipv4Addr::new(192, 168, 1, 254));
    }

    #[test]
    fn cidr_masks_host_bits() {
        let hosts = parse_subnet("10.0.0.77/30").unwrap();
        assert_eq!(
            hosts,
            vec![Ipv4Addr::new(10, 0, 0, 77), Ipv4Addr::new(10, 0, 0, 78)]
        );
    }

    #[test]
    fn cidr_32_is_single_host() {
        let hosts = parse_subnet("10.1.2.3/32").unwrap();
        assert_eq!(hosts, vec![Ipv4Addr::new(10, 1, 2, 3)]);
    }

    #[test]
    fn inclusive_range() {
        let hosts = parse_subnet("10.0.0.250 - 10.0.1.2").unwrap();
        assert_eq!(hosts.len(), 9);
        assert_eq!(hosts[8], Ipv4Addr::new(10, 0, 1, 2));
    }

    #[test]
    fn single_address() {
        assert_eq!(
            parse_subnet(" 172.16.0.9 ").unwrap(),
            vec![Ipv4Addr::new(172, 16, 0, 9)]
        );
    }

    #[test]
    fn rejects_malformed_specs() {
        for spec in [
            "",
            "not-an-ip",
            "10.0.0.0/33",
            "10.0.0.0/abc",
            "10.0.0.0/8",
            "10.0.0.9-10.0.0.1",
            "300.1.1.1",
        ] {
            let err = parse_subnet(spec).unwrap_err();
            assert!(
                matches!(err, DiscoveryError::InvalidSubnet { .. }),
                "{spec:?} should be invalid"
            );
        }
    }
}
