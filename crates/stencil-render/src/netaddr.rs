//! String and IPv4 helpers exposed to templates.
//!
//! These are plain Rust functions; [`crate::template::functions`] binds them
//! into the template environment. All IPv4 helpers accept an address with an
//! optional prefix (`10.0.0.1/24`) or an address followed by an extended mask
//! (`10.0.0.1 255.255.255.0`). An address without either is a host (`/32`).
//!
//! Arithmetic is plain `u32` arithmetic on the address, so offsets carry
//! across octets: `ip4("10.0.0.0", 256)` is `10.0.1.0`.

use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::FuncError;

/// An IPv4 address together with its prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ipv4Net {
    addr: u32,
    prefix: u8,
}

impl Ipv4Net {
    fn parse(function: &'static str, input: &str) -> Result<Self, FuncError> {
        let trimmed = input.trim();
        let (addr_part, prefix) = if let Some((addr, prefix)) = trimmed.split_once('/') {
            (addr, parse_prefix(function, input, prefix)?)
        } else if let Some((addr, mask)) = trimmed.split_once(char::is_whitespace) {
            let mask = parse_addr(function, input, mask.trim())?;
            let prefix = mask_prefix(u32::from(mask))
                .ok_or_else(|| FuncError::parse(function, input, "netmask is not contiguous"))?;
            (addr, prefix)
        } else {
            (trimmed, 32)
        };

        let addr = parse_addr(function, input, addr_part)?;
        Ok(Self {
            addr: u32::from(addr),
            prefix,
        })
    }

    fn netmask(&self) -> u32 {
        prefix_mask(self.prefix)
    }

    fn network(&self) -> u32 {
        self.addr & self.netmask()
    }
}

fn parse_addr(function: &'static str, input: &str, addr: &str) -> Result<Ipv4Addr, FuncError> {
    Ipv4Addr::from_str(addr.trim())
        .map_err(|_| FuncError::parse(function, input, "not a dotted-quad IPv4 address"))
}

fn parse_prefix(function: &'static str, input: &str, prefix: &str) -> Result<u8, FuncError> {
    let prefix = prefix.trim();
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FuncError::parse(function, input, "prefix length is not a number"));
    }
    match prefix.parse::<u8>() {
        Ok(p) if p <= 32 => Ok(p),
        _ => Err(FuncError::parse(function, input, "prefix length must be 0-32")),
    }
}

fn prefix_mask(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p => u32::MAX << (32 - u32::from(p.min(32))),
    }
}

/// Prefix length of a contiguous mask, `None` when the mask has holes.
fn mask_prefix(mask: u32) -> Option<u8> {
    let ones = mask.leading_ones();
    if ones + mask.trailing_zeros() == 32 {
        Some(ones as u8)
    } else {
        None
    }
}

/// Splits `s` by `sep` and returns the `index`-th part.
///
/// Out-of-range indices yield an empty string. An empty separator splits
/// between characters.
///
/// ```rust
/// use stencil_render::netaddr::split;
///
/// assert_eq!(split("10.0.0.0/24", "/", 1), "24");
/// assert_eq!(split("10.0.0.0/24", "/", 2), "");
/// ```
pub fn split(s: &str, sep: &str, index: usize) -> String {
    if sep.is_empty() {
        return s.chars().nth(index).map(String::from).unwrap_or_default();
    }
    s.split(sep).nth(index).unwrap_or_default().to_string()
}

/// Advances an address by `offset` addresses.
///
/// With a prefix the count starts at the network address, otherwise at the
/// address itself. Negative offsets are rejected.
pub fn ip4(addr: &str, offset: i64) -> Result<String, FuncError> {
    if offset < 0 {
        return Err(FuncError::argument(
            "ip4",
            "negative value of argument passed to ip4 func not allowed",
        ));
    }
    let net = Ipv4Net::parse("ip4", addr)?;
    // Reduced modulo 2^32 so very large offsets wrap like repeated increments.
    let step = (offset as u64 & u64::from(u32::MAX)) as u32;
    Ok(Ipv4Addr::from(net.network().wrapping_add(step)).to_string())
}

/// Returns the netmask of an address in dotted-quad form.
pub fn ip4mask(addr: &str) -> Result<String, FuncError> {
    let net = Ipv4Net::parse("ip4mask", addr)?;
    Ok(Ipv4Addr::from(net.netmask()).to_string())
}

/// Returns the prefix length of an address as a decimal string.
pub fn ip4cidr(addr: &str) -> Result<String, FuncError> {
    let net = Ipv4Net::parse("ip4cidr", addr)?;
    Ok(net.prefix.to_string())
}

/// Converts a dotted-quad netmask to its prefix length.
pub fn ip4mask_to_cidr(mask: &str) -> Result<String, FuncError> {
    let parsed = parse_addr("ip4mask_to_cidr", mask, mask)?;
    mask_prefix(u32::from(parsed))
        .map(|prefix| prefix.to_string())
        .ok_or_else(|| {
            FuncError::argument(
                "ip4mask_to_cidr",
                format!("'{}' is not a contiguous netmask", mask),
            )
        })
}

/// Converts a prefix length (0-32) to a dotted-quad netmask.
pub fn ip4cidr_to_mask(cidr: &str) -> Result<String, FuncError> {
    if cidr.is_empty() || !cidr.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FuncError::argument(
            "ip4cidr_to_mask",
            format!("'{}' is not a number", cidr),
        ));
    }
    match cidr.parse::<u8>() {
        Ok(prefix) if prefix <= 32 => Ok(Ipv4Addr::from(prefix_mask(prefix)).to_string()),
        _ => Err(FuncError::argument(
            "ip4cidr_to_mask",
            format!("prefix length {} is out of range 0-32", cidr),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ip4() {
        let cases = [
            ("10.0.0.1/24", 0, "10.0.0.0"),
            ("10.0.0.1", 0, "10.0.0.1"),
            ("10.0.0.2", 1, "10.0.0.3"),
            ("10.0.0.0", 256, "10.0.1.0"),
            ("10.0.0.0/32", 2, "10.0.0.2"),
            ("10.0.0.1 255.255.255.0", 5, "10.0.0.5"),
            ("255.255.255.255", 1, "0.0.0.0"),
        ];
        for (addr, offset, expected) in cases {
            assert_eq!(ip4(addr, offset).unwrap(), expected, "ip4({addr}, {offset})");
        }
    }

    #[test]
    fn test_ip4_negative_offset() {
        let err = ip4("10.0.0.1", -1).unwrap_err();
        assert!(matches!(err, FuncError::Argument { function: "ip4", .. }));
    }

    #[test]
    fn test_ip4_parse_errors() {
        for bad in ["", "10.0.0", "10.0.0.256", "10.0.0.1/33", "10.0.0.1/x", "host-a"] {
            let err = ip4(bad, 0).unwrap_err();
            assert!(matches!(err, FuncError::Parse { .. }), "{bad}: {err:?}");
        }
    }

    #[test]
    fn test_ip4mask() {
        assert_eq!(ip4mask("10.0.0.0/24").unwrap(), "255.255.255.0");
        assert_eq!(ip4mask("10.0.0.0/32").unwrap(), "255.255.255.255");
        assert_eq!(ip4mask("10.0.0.0/26").unwrap(), "255.255.255.192");
        assert_eq!(ip4mask("10.0.0.0/0").unwrap(), "0.0.0.0");
        assert_eq!(ip4mask("10.0.0.7").unwrap(), "255.255.255.255");
    }

    #[test]
    fn test_ip4cidr() {
        assert_eq!(ip4cidr("192.168.0.0/24").unwrap(), "24");
        assert_eq!(ip4cidr("10.0.0.0/8").unwrap(), "8");
        assert_eq!(ip4cidr("10.0.1.0/29").unwrap(), "29");
        assert_eq!(ip4cidr("10.0.2.0/32").unwrap(), "32");
        assert!(matches!(ip4cidr("10.0.2/24"), Err(FuncError::Parse { .. })));
    }

    #[test]
    fn test_ip4cidr_to_mask() {
        assert_eq!(ip4cidr_to_mask("24").unwrap(), "255.255.255.0");
        assert_eq!(ip4cidr_to_mask("28").unwrap(), "255.255.255.240");
        assert_eq!(ip4cidr_to_mask("32").unwrap(), "255.255.255.255");
        assert_eq!(ip4cidr_to_mask("0").unwrap(), "0.0.0.0");
        assert!(matches!(ip4cidr_to_mask("33"), Err(FuncError::Argument { .. })));
        assert!(matches!(ip4cidr_to_mask("abc"), Err(FuncError::Argument { .. })));
        assert!(matches!(ip4cidr_to_mask("-1"), Err(FuncError::Argument { .. })));
        assert!(matches!(ip4cidr_to_mask("300"), Err(FuncError::Argument { .. })));
    }

    #[test]
    fn test_ip4cidr_to_mask_rejects_padding_and_signs() {
        for input in [" 24 ", "24 ", "+24", ""] {
            assert!(
                matches!(ip4cidr_to_mask(input), Err(FuncError::Argument { .. })),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_ip4mask_to_cidr() {
        assert_eq!(ip4mask_to_cidr("255.255.255.0").unwrap(), "24");
        assert_eq!(ip4mask_to_cidr("255.255.255.240").unwrap(), "28");
        assert_eq!(ip4mask_to_cidr("255.255.255.255").unwrap(), "32");
        assert_eq!(ip4mask_to_cidr("0.0.0.0").unwrap(), "0");
        assert!(matches!(
            ip4mask_to_cidr("255.0.255.0"),
            Err(FuncError::Argument { .. })
        ));
        assert!(matches!(ip4mask_to_cidr("255.255.0"), Err(FuncError::Parse { .. })));
    }

    #[test]
    fn test_split() {
        assert_eq!(split("10.0.0.0/24", "/", 0), "10.0.0.0");
        assert_eq!(split("10.0.0.0/24", "/", 1), "24");
        assert_eq!(split("10.0.0.0/24", "/", 2), "");
        assert_eq!(split("abc", "", 1), "b");
        assert_eq!(split("", ",", 0), "");
    }

    fn dotted_quad() -> impl Strategy<Value = String> {
        any::<u32>().prop_map(|n| Ipv4Addr::from(n).to_string())
    }

    proptest! {
        /// Advancing by one and then by n-1 equals advancing by n.
        #[test]
        fn ip4_offset_composes(addr in dotted_quad(), n in 1i64..100_000) {
            let stepped = ip4(&addr, 1).unwrap();
            prop_assert_eq!(ip4(&stepped, n - 1).unwrap(), ip4(&addr, n).unwrap());
        }

        /// Zero offset on a host address is the identity.
        #[test]
        fn ip4_zero_offset_is_identity(addr in dotted_quad()) {
            prop_assert_eq!(ip4(&addr, 0).unwrap(), addr);
        }

        /// Every contiguous mask survives mask -> cidr -> mask.
        #[test]
        fn mask_cidr_round_trip(prefix in 0u8..=32) {
            let mask = Ipv4Addr::from(prefix_mask(prefix)).to_string();
            let cidr = ip4mask_to_cidr(&mask).unwrap();
            prop_assert_eq!(ip4cidr_to_mask(&cidr).unwrap(), mask);
        }

        /// split never panics, whatever the index.
        #[test]
        fn split_never_fails(s in ".{0,20}", sep in "[/.,]", index in 0usize..10) {
            let _ = split(&s, &sep, index);
        }
    }
}
