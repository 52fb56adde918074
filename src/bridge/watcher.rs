//! USB configuration watcher
//!
//! Re-arms the CDC data endpoints whenever the host (re)configures the
//! device. Idempotence comes from the edge-triggered change query; the
//! driver reports a change only once per actual transition.

use super::traits::HostTransport;

/// Poll for a configuration transition and re-initialise the data
/// endpoints when the device has just become configured.
pub fn poll<T: HostTransport>(transport: &mut T) {
    if transport.configuration_changed() && transport.is_configured() {
        log::info!("host configured device, arming data endpoints");
        transport.init_endpoints();
    }
}
