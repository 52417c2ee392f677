use crate::model::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// Serialized session description, laid out like a browser
/// `RTCSessionDescriptionInit` (`{"type":"offer","sdp":"..."}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Serialized ICE candidate, laid out like `RTCIceCandidateInit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [SignalKind::Offer, SignalKind::Answer, SignalKind::Candidate];

    pub fn suffix(self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
        }
    }
}

/// `"<identity>-<kind>"`: where a sender leaves one kind of signal.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct SignalKey {
    pub sender: Identity,
    pub kind: SignalKind,
}

impl SignalKey {
    pub fn new(sender: Identity, kind: SignalKind) -> Self {
        Self { sender, kind }
    }

    /// Every key owned by `sender`, in offer/answer/candidate order.
    pub fn all_for(sender: &Identity) -> [SignalKey; 3] {
        SignalKind::ALL.map(|kind| SignalKey::new(sender.clone(), kind))
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.sender, self.kind.suffix())
    }
}

/// One signaling message. The kind travels in the key, the store value is
/// the bare payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    Offer(SessionDescription),
    Answer(SessionDescription),
    IceCandidate(IceCandidate),
}

impl SignalMessage {
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalMessage::Offer(_) => SignalKind::Offer,
            SignalMessage::Answer(_) => SignalKind::Answer,
            SignalMessage::IceCandidate(_) => SignalKind::Candidate,
        }
    }

    pub fn key_for(&self, sender: &Identity) -> SignalKey {
        SignalKey::new(sender.clone(), self.kind())
    }

    pub fn encode_payload(&self) -> Result<String, serde_json::Error> {
        match self {
            SignalMessage::Offer(desc) | SignalMessage::Answer(desc) => {
                serde_json::to_string(desc)
            }
            SignalMessage::IceCandidate(candidate) => serde_json::to_string(candidate),
        }
    }

    pub fn decode_payload(kind: SignalKind, raw: &str) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            SignalKind::Offer => SignalMessage::Offer(serde_json::from_str(raw)?),
            SignalKind::Answer => SignalMessage::Answer(serde_json::from_str(raw)?),
            SignalKind::Candidate => SignalMessage::IceCandidate(serde_json::from_str(raw)?),
        })
    }
}
