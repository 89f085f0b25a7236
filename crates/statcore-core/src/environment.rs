/// Toggles relaxed fallbacks vs strict error reporting in the identity
/// pipeline (§4.3, §6). Shared across crates since both the identity
/// pipeline and the facade's `Config` need to agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}
