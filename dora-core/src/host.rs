// dora-core/src/host.rs
use dora_common::config::{validate_host, ConfigStore};
use dora_common::error::{DoraError, Result};
use dora_net::RemoteClient;
use tracing::{debug, info};

use crate::ui::UserInterface;

/// Validates a new host and saves it once the device answers.
///
/// With an explicit `initial` host a failure is returned as an error. Without one the
/// user is asked, and asked again after each invalid or unreachable entry until they
/// give up, which yields `Ok(None)`.
pub async fn configure_host<U: UserInterface + ?Sized>(
    client: &RemoteClient,
    ui: &U,
    store: &ConfigStore,
    initial: Option<String>,
) -> Result<Option<String>> {
    let interactive = initial.is_none();
    let mut prefill = store.load_file()?.host;
    let mut pending = initial;

    loop {
        let raw = match pending.take() {
            Some(raw) => raw,
            None => match ui.request_host(prefill.as_deref()) {
                Some(raw) if !raw.trim().is_empty() => raw,
                _ => {
                    debug!("Host setup cancelled");
                    return Ok(None);
                }
            },
        };

        let host = match validate_host(&raw) {
            Ok(host) => host,
            Err(e) => {
                ui.show_error("Invalid host address.");
                if !interactive {
                    return Err(e);
                }
                prefill = Some(raw);
                continue;
            }
        };

        if !client.is_host_reachable(&host).await {
            ui.show_error(&format!(
                "Cannot connect to Dora.js at {host}, check your network"
            ));
            if !interactive {
                return Err(DoraError::HostUnavailable(host));
            }
            prefill = Some(raw);
            continue;
        }

        let mut config = store.load_file()?;
        config.host = Some(host.clone());
        store.save(&config)?;
        info!("Host set to {host}");
        ui.show_info(&format!("Connect {host} success"));
        return Ok(Some(host));
    }
}
