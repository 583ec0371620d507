use std::fmt;

use bazaar_db::models::NotificationType;

/// Audio cue played for a newly arrived notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    Default,
    Trade,
    Message,
    Order,
    Payment,
    Alert,
}

impl Sound {
    pub fn file_name(&self) -> &'static str {
        match self {
            Sound::Default => "notification.mp3",
            Sound::Trade => "trade.mp3",
            Sound::Message => "message.mp3",
            Sound::Order => "order.mp3",
            Sound::Payment => "payment.mp3",
            Sound::Alert => "alert.mp3",
        }
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationStyle {
    pub icon: &'static str,
    pub color: &'static str,
    pub sound: Sound,
}

pub const DEFAULT_STYLE: NotificationStyle = NotificationStyle {
    icon: "bell",
    color: "#6b7280",
    sound: Sound::Default,
};

pub fn style_for(notification_type: NotificationType) -> NotificationStyle {
    let (icon, color, sound) = match notification_type {
        NotificationType::TradeOffer => ("swap", "#8b5cf6", Sound::Trade),
        NotificationType::NewMessage => ("chat", "#3b82f6", Sound::Message),
        NotificationType::OrderUpdate => ("package", "#f59e0b", Sound::Order),
        NotificationType::PaymentComplete => ("credit-card", "#10b981", Sound::Payment),
        NotificationType::ListingApproved => ("check-circle", "#22c55e", Sound::Default),
        NotificationType::ListingRejected => ("x-circle", "#ef4444", Sound::Alert),
        NotificationType::PriceAlert => ("trending-down", "#ec4899", Sound::Alert),
        NotificationType::System => ("info", "#64748b", Sound::Default),
        NotificationType::Security => ("shield", "#dc2626", Sound::Alert),
        NotificationType::Unknown => return DEFAULT_STYLE,
    };
    NotificationStyle { icon, color, sound }
}
