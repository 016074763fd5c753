use std::sync::OnceLock;

/// Select the process-level rustls `CryptoProvider` before the first `wss://` handshake.
///
/// rustls 0.23 panics while building a client config when more than one provider feature is
/// compiled in and none was installed. Installing `ring` once up front avoids that; if the host
/// application already installed a provider, that one is kept.
pub fn install_rustls_crypto_provider() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
