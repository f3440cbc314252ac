use std::time::Duration;

/// Descriptor inmutable de una pista reproducible.
///
/// A `Track` only exists when the resolver produced a playable URI, so the
/// queue never has to deal with half-resolved entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    title: String,
    source_uri: String,
    display_url: String,
    duration: Option<Duration>,
}

impl Track {
    /// Construye un track; devuelve `None` si no hay URI reproducible
    pub fn new(
        title: impl Into<String>,
        source_uri: impl Into<String>,
        display_url: impl Into<String>,
    ) -> Option<Self> {
        let source_uri = source_uri.into();
        if source_uri.trim().is_empty() {
            return None;
        }

        let title = title.into();
        let title = if title.trim().is_empty() {
            "Sin título".to_string()
        } else {
            title
        };

        let display_url = display_url.into();
        let display_url = if display_url.trim().is_empty() {
            source_uri.clone()
        } else {
            display_url
        };

        Some(Self {
            title,
            source_uri,
            display_url,
            duration: None,
        })
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn display_url(&self) -> &str {
        &self.display_url
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}
