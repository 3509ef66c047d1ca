use serde::Deserialize;

/// Top-level configuration settings.
///
/// Only the dispatcher section exists today; it is kept as a section so a
/// host application can embed it in a larger configuration file.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub dispatcher: DispatcherConfig,
}

/// Configuration for one dispatcher instance. Immutable once the dispatcher
/// is built.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Publishing to `a:b` also publishes to `a`.
    pub subtopics: bool,
    /// Separator between topic segments. An empty marker disables subtopics.
    pub subtopic_marker: String,
    /// Emit a tracing event for every subscribe, delivery and removal.
    pub log: bool,
}

impl DispatcherConfig {
    pub fn with_subtopics(mut self, subtopics: bool) -> Self {
        self.subtopics = subtopics;
        self
    }

    pub fn with_subtopic_marker(mut self, marker: impl Into<String>) -> Self {
        self.subtopic_marker = marker.into();
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            subtopics: true,
            subtopic_marker: ":".to_string(),
            log: false,
        }
    }
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from the defaults; unknown keys are ignored.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub dispatcher: Option<PartialDispatcherSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialDispatcherSettings {
    pub subtopics: Option<bool>,
    pub subtopic_marker: Option<String>,
    pub log: Option<bool>,
}

impl PartialDispatcherSettings {
    /// Overlay the values that were provided onto `base`.
    pub fn merge_over(self, base: DispatcherConfig) -> DispatcherConfig {
        DispatcherConfig {
            subtopics: self.subtopics.unwrap_or(base.subtopics),
            subtopic_marker: self.subtopic_marker.unwrap_or(base.subtopic_marker),
            log: self.log.unwrap_or(base.log),
        }
    }
}
