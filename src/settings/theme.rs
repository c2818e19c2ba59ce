use super::model::Theme;

/// Receives theme changes made through the settings store.
///
/// Any `Fn(Theme)` closure works, which is what the binary and most tests use.
pub trait ThemeSink: Send + Sync {
    fn apply_theme(&self, theme: Theme);
}

impl<F> ThemeSink for F
where
    F: Fn(Theme) + Send + Sync,
{
    fn apply_theme(&self, theme: Theme) {
        self(theme)
    }
}

/// Sink for callers without a theme subsystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTheme;

impl ThemeSink for NoTheme {
    fn apply_theme(&self, _theme: Theme) {}
}
