/*
 * net.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Netapi, an HTTP API client library.
 *
 * Netapi is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Netapi is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Netapi.  If not, see <http://www.gnu.org/licenses/>.
 */

//! TLS client configuration for the HTTP transport.

use std::sync::{Arc, OnceLock};

use tokio_rustls::rustls::client::ClientConfig;
use tokio_rustls::rustls::RootCertStore;

/// Build a root certificate store: platform native certs first, then webpki-roots as fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            for cert in certs {
                let _ = root_store.add(cert);
            }
        }
        Err(e) => log::debug!("native root certificates unavailable: {}", e),
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

static HTTP_CLIENT_CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();

/// TLS client config for HTTP/1.1 with ALPN `http/1.1` (native + Mozilla roots, no client auth).
/// Built once; the root store is loaded on first use.
pub fn http_client_config() -> Arc<ClientConfig> {
    HTTP_CLIENT_CONFIG
        .get_or_init(|| {
            let mut config = ClientConfig::builder()
                .with_root_certificates(build_root_store())
                .with_no_client_auth();
            config.alpn_protocols = vec![b"http/1.1".to_vec()];
            Arc::new(config)
        })
        .clone()
}
