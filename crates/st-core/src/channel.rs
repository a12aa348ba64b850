//! Channel identities and output layouts
//!
//! Canonical 7.1.4 delivery order (matches the encoder hand-off tag):
//! `[FL, FR, FC, LFE, BL, BR, SL, SR, TFL, TFR, TBL, TBR]`.
//! 5.1 uses the 6-element subset `[FL, FR, FC, LFE, SL, SR]`.

use serde::{Deserialize, Serialize};

/// One of the 12 output speaker positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    /// Front Left
    Fl,
    /// Front Right
    Fr,
    /// Front Center
    Fc,
    /// Low Frequency Effects
    Lfe,
    /// Back Left
    Bl,
    /// Back Right
    Br,
    /// Side Left
    Sl,
    /// Side Right
    Sr,
    /// Top Front Left
    Tfl,
    /// Top Front Right
    Tfr,
    /// Top Back Left
    Tbl,
    /// Top Back Right
    Tbr,
}

/// 7.1.4 channel order for delivery
pub const CHANNELS_714: [ChannelId; 12] = [
    ChannelId::Fl,
    ChannelId::Fr,
    ChannelId::Fc,
    ChannelId::Lfe,
    ChannelId::Bl,
    ChannelId::Br,
    ChannelId::Sl,
    ChannelId::Sr,
    ChannelId::Tfl,
    ChannelId::Tfr,
    ChannelId::Tbl,
    ChannelId::Tbr,
];

/// 5.1 channel order for delivery
pub const CHANNELS_51: [ChannelId; 6] = [
    ChannelId::Fl,
    ChannelId::Fr,
    ChannelId::Fc,
    ChannelId::Lfe,
    ChannelId::Sl,
    ChannelId::Sr,
];

impl ChannelId {
    /// Index within the 7.1.4 delivery order
    pub fn index(&self) -> usize {
        CHANNELS_714
            .iter()
            .position(|c| c == self)
            .expect("channel present in 7.1.4 layout")
    }

    /// Short label (e.g., "TFL")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fl => "FL",
            Self::Fr => "FR",
            Self::Fc => "FC",
            Self::Lfe => "LFE",
            Self::Bl => "BL",
            Self::Br => "BR",
            Self::Sl => "SL",
            Self::Sr => "SR",
            Self::Tfl => "TFL",
            Self::Tfr => "TFR",
            Self::Tbl => "TBL",
            Self::Tbr => "TBR",
        }
    }

    /// Height layer channel
    pub fn is_height(&self) -> bool {
        matches!(self, Self::Tfl | Self::Tfr | Self::Tbl | Self::Tbr)
    }

    /// Any ear-level surround position (sides or backs)
    pub fn is_surround(&self) -> bool {
        matches!(self, Self::Sl | Self::Sr | Self::Bl | Self::Br)
    }
}

/// Output channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputLayout {
    /// 12-channel 7.1.4 immersive bed
    Surround714,
    /// 6-channel 5.1 fold-down
    Surround51,
}

impl OutputLayout {
    /// Ordered channel tag handed to the encoder
    pub fn channels(&self) -> &'static [ChannelId] {
        match self {
            Self::Surround714 => &CHANNELS_714,
            Self::Surround51 => &CHANNELS_51,
        }
    }

    /// Number of channels in the layout
    pub fn channel_count(&self) -> usize {
        self.channels().len()
    }

    /// Layout name for logs and metadata
    pub fn name(&self) -> &'static str {
        match self {
            Self::Surround714 => "7.1.4",
            Self::Surround51 => "5.1",
        }
    }
}
