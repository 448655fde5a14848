/// `[major, minor, patch]`, used by clients to detect compatibility
pub type RelayVersion = [u32; 3];

pub fn relay_version() -> RelayVersion {
    [
        env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or_default(),
        env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or_default(),
        env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or_default(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_version_matches_package() {
        let version = relay_version()
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".");
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
