use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Info,
    Error,
}

impl FlashCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(FlashCategory::Success),
            "info" | "message" => Some(FlashCategory::Info),
            "error" | "danger" => Some(FlashCategory::Error),
            _ => None,
        }
    }

    /// Category named by a flash element's `data-category`, if any
    pub fn from_attribute(value: Option<&str>) -> Option<Self> {
        Self::parse(&value?.trim().to_ascii_lowercase())
    }

    pub fn class(self) -> &'static str {
        match self {
            FlashCategory::Success => "flash-success",
            FlashCategory::Info => "flash-info",
            FlashCategory::Error => "flash-error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashPhase {
    Shown,
    Fading,
    Removed,
}

/// Auto-dismiss timeline for a flash message: shown, then faded out, then
/// removed. Each message runs its own copy; there is no cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashTimeline {
    pub dismiss_after: Duration,
    pub fade: Duration,
}

impl Default for FlashTimeline {
    fn default() -> Self {
        Self {
            dismiss_after: Duration::from_millis(4000),
            fade: Duration::from_millis(300),
        }
    }
}

impl FlashTimeline {
    pub fn new(dismiss_after: Duration, fade: Duration) -> Self {
        Self {
            dismiss_after,
            fade,
        }
    }

    /// The two sequential waits a driver schedules, with the phase entered
    /// at the end of each
    pub fn steps(&self) -> [(Duration, FlashPhase); 2] {
        [
            (self.dismiss_after, FlashPhase::Fading),
            (self.fade, FlashPhase::Removed),
        ]
    }

    /// CSS transition applied when fading starts
    pub fn transition(&self) -> String {
        format!("opacity {}ms ease", self.fade.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps() {
        let timeline = FlashTimeline::default();
        assert_eq!(
            timeline.steps(),
            [
                (Duration::from_millis(4000), FlashPhase::Fading),
                (Duration::from_millis(300), FlashPhase::Removed),
            ]
        );
        assert_eq!(timeline.transition(), "opacity 300ms ease");

        let quick = FlashTimeline::new(Duration::from_millis(1500), Duration::from_millis(120));
        assert_eq!(quick.steps()[1].0, Duration::from_millis(120));
        assert_eq!(quick.transition(), "opacity 120ms ease");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(FlashCategory::parse("success"), Some(FlashCategory::Success));
        assert_eq!(FlashCategory::parse("danger"), Some(FlashCategory::Error));
        assert_eq!(FlashCategory::parse("bogus"), None);
    }

    #[test]
    fn test_category_from_attribute() {
        assert_eq!(
            FlashCategory::from_attribute(Some(" Success ")).map(FlashCategory::class),
            Some("flash-success")
        );
        assert_eq!(
            FlashCategory::from_attribute(Some("message")).map(FlashCategory::class),
            Some("flash-info")
        );
        assert_eq!(FlashCategory::from_attribute(Some("")), None);
        assert_eq!(FlashCategory::from_attribute(None), None);
    }
}
