use crate::log::log_level::LogLevel;

/// A single log event as queued for the logger worker.
#[derive(Debug, Clone)]
pub struct LogMsg {
    pub level: LogLevel,
    /// Milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    pub text: String,
    /// Module path of the call site.
    pub target: &'static str,
}

impl LogMsg {
    /// Creates a new `LogMsg`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let msg = LogMsg::new(LogLevel::Info, "peer joined room", module_path!(), now_millis());
    /// ```
    pub fn new(
        level: LogLevel,
        text: impl Into<String>,
        target: &'static str,
        ts_ms: u128,
    ) -> Self {
        Self {
            level,
            ts_ms,
            text: text.into(),
            target,
        }
    }

    /// Render as one line of the log file.
    pub fn render(&self) -> String {
        format!(
            "[{}] {} {} | {}",
            self.level.label(),
            self.ts_ms,
            self.target,
            self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_level_target_and_text() {
        let msg = LogMsg::new(LogLevel::Warn, "dropped signal", "deepdrop::relay", 42);
        assert_eq!(msg.render(), "[WARN ] 42 deepdrop::relay | dropped signal");
    }
}
