use huddle_core::utils::DEFAULT_STUN_ADDR;
use huddle_core::{HuddleConfig, IceServerConfig};
use webrtc::ice_transport::ice_server::RTCIceServer;

/// WebRTC settings for [`crate::RtcPeer`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned()],
                username: None,
                credential: None,
            }],
        }
    }
}

impl TransportConfig {
    /// Host candidates only. Enough for two peers on one machine.
    pub fn local_only() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }

    pub(crate) fn rtc_ice_servers(&self) -> Vec<RTCIceServer> {
        self.ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
            })
            .collect()
    }
}

impl From<&HuddleConfig> for TransportConfig {
    fn from(config: &HuddleConfig) -> Self {
        Self {
            ice_servers: config.ice_servers.clone(),
        }
    }
}
