//! Serializable identifiers, resource sets, and wire message types.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Resource set identifier, unique within one client.
pub type ResourceId = u32;

/// Request number supplied by the client and echoed back in replies.
pub type RequestNo = u32;

/// Opaque transport-level identity of a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wrap a transport sender name (for example a bus unique name).
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The underlying sender name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Coarse-grained hardware resources that can be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Audio output.
    AudioPlayback,
    /// Video output.
    VideoPlayback,
    /// Audio capture.
    AudioRecording,
    /// Video capture.
    VideoRecording,
    /// Vibration motor.
    Vibra,
    /// Notification LEDs.
    Leds,
    /// Display backlight.
    Backlight,
    /// System (power) button.
    SystemButton,
    /// Lock button.
    LockButton,
    /// Zoom/scale button.
    ScaleButton,
    /// Camera snap button.
    SnapButton,
    /// Camera lens cover.
    LensCover,
}

impl ResourceKind {
    /// Every known kind, in bit order.
    pub const ALL: [Self; 12] = [
        Self::AudioPlayback,
        Self::VideoPlayback,
        Self::AudioRecording,
        Self::VideoRecording,
        Self::Vibra,
        Self::Leds,
        Self::Backlight,
        Self::SystemButton,
        Self::LockButton,
        Self::ScaleButton,
        Self::SnapButton,
        Self::LensCover,
    ];

    /// Bit position of this kind inside a [`ResourceSet`]. Bit 7 is unassigned.
    #[must_use]
    pub const fn bit_index(self) -> u32 {
        match self {
            Self::AudioPlayback => 0,
            Self::VideoPlayback => 1,
            Self::AudioRecording => 2,
            Self::VideoRecording => 3,
            Self::Vibra => 4,
            Self::Leds => 5,
            Self::Backlight => 6,
            Self::SystemButton => 8,
            Self::LockButton => 9,
            Self::ScaleButton => 10,
            Self::SnapButton => 11,
            Self::LensCover => 12,
        }
    }

    /// Single-bit mask for this kind.
    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << self.bit_index()
    }

    /// Lower-case name used in log output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AudioPlayback => "audio_playback",
            Self::VideoPlayback => "video_playback",
            Self::AudioRecording => "audio_recording",
            Self::VideoRecording => "video_recording",
            Self::Vibra => "vibra",
            Self::Leds => "leds",
            Self::Backlight => "backlight",
            Self::SystemButton => "system_button",
            Self::LockButton => "lock_button",
            Self::ScaleButton => "scale_button",
            Self::SnapButton => "snap_button",
            Self::LensCover => "lens_cover",
        }
    }
}

/// Bitset of [`ResourceKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceSet(u32);

impl ResourceSet {
    /// Mask with every known kind set.
    pub const KNOWN: Self = Self(
        (1 << 0)
            | (1 << 1)
            | (1 << 2)
            | (1 << 3)
            | (1 << 4)
            | (1 << 5)
            | (1 << 6)
            | (1 << 8)
            | (1 << 9)
            | (1 << 10)
            | (1 << 11)
            | (1 << 12),
    );

    /// Wrap raw bits as received on the wire.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The empty set, used to signal revocation.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when no bit is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when `kind` is a member.
    #[must_use]
    pub const fn contains(self, kind: ResourceKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// True when every bit of `self` is also set in `other`.
    #[must_use]
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Bits that do not name any [`ResourceKind`].
    #[must_use]
    pub const fn unknown_bits(self) -> u32 {
        self.0 & !Self::KNOWN.0
    }

    /// Iterate the known kinds contained in this set.
    pub fn kinds(self) -> impl Iterator<Item = ResourceKind> {
        ResourceKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl From<u32> for ResourceSet {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<ResourceKind> for ResourceSet {
    fn from(kind: ResourceKind) -> Self {
        Self(kind.bit())
    }
}

impl BitOr for ResourceSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for ResourceSet {
    /// Renders as `audio_playback,audio_recording (0x5)`; unknown bits only
    /// show up in the hex part.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.kinds().map(ResourceKind::name).collect();
        if names.is_empty() {
            write!(f, "<none> ({:#x})", self.0)
        } else {
            write!(f, "{} ({:#x})", names.join(","), self.0)
        }
    }
}

/// Claim mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModeFlags(u32);

impl ModeFlags {
    /// Release automatically once the grant is lost.
    pub const AUTO_RELEASE: Self = Self(1 << 0);
    /// Reply to every request, even no-op ones.
    pub const ALWAYS_REPLY: Self = Self(1 << 1);

    /// Wrap raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when all bits of `flag` are set.
    #[must_use]
    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl BitOr for ModeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for ModeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::AUTO_RELEASE) {
            names.push("auto_release");
        }
        if self.contains(Self::ALWAYS_REPLY) {
            names.push("always_reply");
        }
        if names.is_empty() {
            write!(f, "<none> ({:#x})", self.0)
        } else {
            write!(f, "{} ({:#x})", names.join(","), self.0)
        }
    }
}

/// Wire message type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Create or overwrite a claim.
    Register = 0,
    /// Remove a claim.
    Unregister = 1,
    /// Replace the masks of a claim.
    Update = 2,
    /// Ask for a grant decision.
    Acquire = 3,
    /// Give the resources back.
    Release = 4,
    /// Outbound: resources granted.
    Grant = 5,
    /// Outbound: resources advised.
    Advice = 6,
    /// Acknowledgement for any inbound request.
    Status = 8,
}

impl MessageType {
    /// Numeric tag carried on the wire.
    #[must_use]
    pub const fn tag(self) -> i32 {
        self as i32
    }

    /// Lower-case name used in log output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Unregister => "unregister",
            Self::Update => "update",
            Self::Acquire => "acquire",
            Self::Release => "release",
            Self::Grant => "grant",
            Self::Advice => "advice",
            Self::Status => "status",
        }
    }
}

impl TryFrom<i32> for MessageType {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Register),
            1 => Ok(Self::Unregister),
            2 => Ok(Self::Update),
            3 => Ok(Self::Acquire),
            4 => Ok(Self::Release),
            5 => Ok(Self::Grant),
            6 => Ok(Self::Advice),
            8 => Ok(Self::Status),
            other => Err(other),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Register/update payload describing a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Resource set identifier.
    pub id: ResourceId,
    /// Request number.
    pub reqno: RequestNo,
    /// Resources the client cannot run without.
    pub mandatory: ResourceSet,
    /// Resources the client can use when available.
    pub optional: ResourceSet,
    /// Resources the client is willing to share.
    #[serde(default)]
    pub share: ResourceSet,
    /// Application class, empty when unknown.
    #[serde(default)]
    pub class: String,
    /// Claim mode.
    #[serde(default)]
    pub mode: ModeFlags,
}

impl ResourceRecord {
    /// Record with only the mandatory mask set.
    #[must_use]
    pub fn new(id: ResourceId, reqno: RequestNo, mandatory: ResourceSet) -> Self {
        Self {
            id,
            reqno,
            mandatory,
            optional: ResourceSet::empty(),
            share: ResourceSet::empty(),
            class: String::new(),
            mode: ModeFlags::default(),
        }
    }

    /// Set the optional mask.
    #[must_use]
    pub const fn with_optional(mut self, optional: ResourceSet) -> Self {
        self.optional = optional;
        self
    }

    /// Set the shareable mask.
    #[must_use]
    pub const fn with_share(mut self, share: ResourceSet) -> Self {
        self.share = share;
        self
    }

    /// Set the application class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Set the mode flags.
    #[must_use]
    pub const fn with_mode(mut self, mode: ModeFlags) -> Self {
        self.mode = mode;
        self
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = if self.class.is_empty() {
            "<unknown>"
        } else {
            self.class.as_str()
        };
        write!(
            f,
            "id={} reqno={} mandatory={} optional={} share={} class='{}' mode={}",
            self.id, self.reqno, self.mandatory, self.optional, self.share, class, self.mode
        )
    }
}

/// Kind of outbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The resources are granted and may be used.
    Grant,
    /// Informational: what the client would get.
    Advice,
}

impl NotificationKind {
    /// Wire message type of this notification.
    #[must_use]
    pub const fn message_type(self) -> MessageType {
        match self {
            Self::Grant => MessageType::Grant,
            Self::Advice => MessageType::Advice,
        }
    }
}

/// Asynchronous grant/advice message pushed to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Grant or advice.
    pub kind: NotificationKind,
    /// Resource set the notification refers to.
    pub id: ResourceId,
    /// Request number of the request that triggered it.
    pub reqno: RequestNo,
    /// Granted or advised resources.
    pub resources: ResourceSet,
}

impl Notification {
    /// Build a grant notification.
    #[must_use]
    pub const fn grant(id: ResourceId, reqno: RequestNo, resources: ResourceSet) -> Self {
        Self {
            kind: NotificationKind::Grant,
            id,
            reqno,
            resources,
        }
    }

    /// Build an advice notification.
    #[must_use]
    pub const fn advice(id: ResourceId, reqno: RequestNo, resources: ResourceSet) -> Self {
        Self {
            kind: NotificationKind::Advice,
            id,
            reqno,
            resources,
        }
    }

    /// Wire type tag (5 for grant, 6 for advice).
    #[must_use]
    pub const fn type_tag(&self) -> i32 {
        self.kind.message_type().tag()
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) id={} reqno={} resources={}",
            self.kind.message_type(),
            self.type_tag(),
            self.id,
            self.reqno,
            self.resources
        )
    }
}

/// Error code carried by a successful [`StatusReply`].
pub const STATUS_OK: i32 = 0;

/// Acknowledgement returned synchronously for every inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    /// Always [`MessageType::Status`].
    pub kind: MessageType,
    /// Resource set the request referred to.
    pub id: ResourceId,
    /// Echoed request number.
    pub reqno: RequestNo,
    /// Zero on success, an errno-style code otherwise.
    pub errcod: i32,
    /// Human-readable status.
    pub errmsg: String,
}

impl StatusReply {
    /// Successful acknowledgement.
    #[must_use]
    pub fn ok(id: ResourceId, reqno: RequestNo) -> Self {
        Self {
            kind: MessageType::Status,
            id,
            reqno,
            errcod: STATUS_OK,
            errmsg: "OK".into(),
        }
    }

    /// Failed acknowledgement.
    #[must_use]
    pub fn error(id: ResourceId, reqno: RequestNo, errcod: i32, errmsg: impl Into<String>) -> Self {
        Self {
            kind: MessageType::Status,
            id,
            reqno,
            errcod,
            errmsg: errmsg.into(),
        }
    }

    /// True when `errcod` is zero.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.errcod == STATUS_OK
    }
}

impl fmt::Display for StatusReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} id={} reqno={} errcod={} errmsg='{}'",
            self.kind, self.id, self.reqno, self.errcod, self.errmsg
        )
    }
}
