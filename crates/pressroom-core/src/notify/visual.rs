use std::time::Duration;

use super::NotificationKind;

/// How long a single flash holds its transient style.
pub const DEFAULT_FLASH_HOLD: Duration = Duration::from_millis(600);

/// A flash the visual sink should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashPlan {
    /// `#RRGGBB`
    pub color: &'static str,
    pub hold: Duration,
    /// 2 for important alerts, 1 otherwise.
    pub repeats: u8,
}

impl FlashPlan {
    pub fn for_kind(kind: NotificationKind, hold: Duration) -> Self {
        Self {
            color: flash_color(kind),
            hold,
            repeats: if kind.is_important() { 2 } else { 1 },
        }
    }
}

pub fn flash_color(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::SteepingComplete => "#DCA561",
        NotificationKind::StirReminder => "#7E9CD8",
        NotificationKind::BrewingComplete | NotificationKind::Default => "#76946A",
    }
}

/// Renders visual alerts. Implementations own the timing of the flash.
pub trait VisualAlert {
    fn flash(&self, plan: &FlashPlan);
}
